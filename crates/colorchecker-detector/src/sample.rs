//! Robust per-patch color estimates.

use crate::grid::CandidateGrid;
use colorchecker_core::{luma, Quad, RgbImage};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Patch sampling parameters.
///
/// The outlier trim percentage lives on [`crate::DetectorConfig`] because it
/// is a top-level tuning knob.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerParams {
    /// Fraction of each corner's distance to the center removed before sampling.
    pub margin_frac: f32,
    /// Cells with fewer retained pixels are degenerate.
    pub min_pixels: usize,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            margin_frac: 0.2,
            min_pixels: 9,
        }
    }
}

/// Color estimate of one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatchSample {
    /// Trimmed mean, same encoding as the input raster.
    pub rgb: [f32; 3],
    /// Per-channel sample variance of the retained pixels.
    pub variance: [f32; 3],
    /// Pixels retained after trimming.
    pub pixels: usize,
    /// Cell quad before shrinking.
    pub quad: Quad,
    pub observed: bool,
    /// Color was interpolated from other cells.
    pub synthesized: bool,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    #[error("cell {index} has only {pixels} usable pixels")]
    DegenerateCell { index: usize, pixels: usize },
}

struct Stats {
    mean: [f32; 3],
    variance: [f32; 3],
    pixels: usize,
}

/// Trimmed statistics of the pixels inside one shrunken quad.
fn sample_cell(
    image: &RgbImage,
    quad: &Quad,
    index: usize,
    params: &SamplerParams,
    trim_percent: f32,
) -> Result<Stats, SampleError> {
    let degenerate = |pixels| SampleError::DegenerateCell { index, pixels };

    let inner = quad.shrink(params.margin_frac).ok_or(degenerate(0))?;
    let (x0, y0, x1, y1) = inner
        .pixel_bounds(image.width, image.height)
        .ok_or(degenerate(0))?;

    let mut pixels: Vec<[f32; 3]> = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            if inner.contains(Point2::new(x as f32, y as f32)) {
                pixels.push(image.get(x, y));
            }
        }
    }

    // Stable: equal luma keeps scan order.
    pixels.sort_by(|a, b| luma(*a).total_cmp(&luma(*b)));
    let k = (pixels.len() as f32 * trim_percent / 100.0).floor() as usize;
    let kept = if 2 * k < pixels.len() {
        &pixels[k..pixels.len() - k]
    } else {
        &pixels[..0]
    };
    if kept.len() < params.min_pixels.max(2) {
        return Err(degenerate(kept.len()));
    }

    let n = kept.len() as f64;
    let mut sum = [0.0f64; 3];
    for p in kept {
        for ch in 0..3 {
            sum[ch] += p[ch] as f64;
        }
    }
    let mean = sum.map(|s| s / n);
    let mut sq = [0.0f64; 3];
    for p in kept {
        for ch in 0..3 {
            let d = p[ch] as f64 - mean[ch];
            sq[ch] += d * d;
        }
    }

    Ok(Stats {
        mean: mean.map(|m| m as f32),
        variance: sq.map(|s| (s / (n - 1.0)) as f32),
        pixels: kept.len(),
    })
}

fn average<'a>(colors: impl Iterator<Item = &'a [f32; 3]>) -> Option<[f32; 3]> {
    let mut sum = [0.0f32; 3];
    let mut n = 0usize;
    for c in colors {
        for ch in 0..3 {
            sum[ch] += c[ch];
        }
        n += 1;
    }
    (n > 0).then(|| sum.map(|s| s / n as f32))
}

/// Sample every cell of `grid`, row-major.
///
/// Degenerate cells take the mean of their non-degenerate 4-neighbours, or
/// of every non-degenerate cell when no neighbour qualifies. Returns `None`
/// when no cell yields a usable sample.
pub fn sample_grid(
    image: &RgbImage,
    grid: &CandidateGrid,
    params: &SamplerParams,
    trim_percent: f32,
) -> Option<Vec<PatchSample>> {
    let stats: Vec<Result<Stats, SampleError>> = grid
        .cells
        .iter()
        .enumerate()
        .map(|(i, cell)| sample_cell(image, &cell.quad, i, params, trim_percent))
        .collect();

    let good: Vec<Option<[f32; 3]>> = stats
        .iter()
        .map(|s| s.as_ref().ok().map(|s| s.mean))
        .collect();
    let global = average(good.iter().flatten())?;

    let (rows, cols) = (grid.rows, grid.cols);
    let samples: Vec<PatchSample> = stats
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let cell = &grid.cells[i];
            match s {
                Ok(s) => PatchSample {
                    rgb: s.mean,
                    variance: s.variance,
                    pixels: s.pixels,
                    quad: cell.quad,
                    observed: cell.observed,
                    synthesized: false,
                },
                Err(err) => {
                    log::debug!("sample: {err}, interpolating");
                    let (r, c) = (i / cols, i % cols);
                    let mut neighbours = Vec::with_capacity(4);
                    if r > 0 {
                        neighbours.push(i - cols);
                    }
                    if r + 1 < rows {
                        neighbours.push(i + cols);
                    }
                    if c > 0 {
                        neighbours.push(i - 1);
                    }
                    if c + 1 < cols {
                        neighbours.push(i + 1);
                    }
                    let rgb = average(neighbours.iter().filter_map(|&j| good[j].as_ref()))
                        .unwrap_or(global);
                    PatchSample {
                        rgb,
                        variance: [0.0; 3],
                        pixels: 0,
                        quad: cell.quad,
                        observed: cell.observed,
                        synthesized: true,
                    }
                }
            }
        })
        .collect();
    Some(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCell;
    use colorchecker_core::Homography;

    fn image(w: usize, h: usize, f: impl Fn(usize, usize) -> [f32; 3]) -> RgbImage {
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        RgbImage {
            width: w,
            height: h,
            data,
        }
    }

    fn grid(rows: usize, cols: usize, side: f32, pitch: f32) -> CandidateGrid {
        let mut cells = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                cells.push(GridCell {
                    quad: Quad::from_rect(pitch * c as f32, pitch * r as f32, side, side)
                        .expect("rect"),
                    observed: true,
                });
            }
        }
        let bounding_quad =
            Quad::from_rect(0.0, 0.0, pitch * cols as f32, pitch * rows as f32).expect("rect");
        CandidateGrid {
            topology_index: 0,
            cluster_index: 0,
            rows,
            cols,
            transposed: false,
            cells,
            model: Homography::identity(),
            bounding_quad,
            rms_residual: 0.0,
            total_residual: 0.0,
            matched: rows * cols,
            unexplained: 0,
            confidence: 1.0,
        }
    }

    #[test]
    fn uniform_patch_has_zero_variance() {
        let img = image(40, 40, |_, _| [0.2, 0.4, 0.6]);
        let g = grid(1, 1, 30.0, 35.0);
        let s = sample_grid(&img, &g, &SamplerParams::default(), 10.0).expect("samples");
        assert_eq!(s.len(), 1);
        approx::assert_abs_diff_eq!(s[0].rgb[1], 0.4, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(s[0].variance[2], 0.0, epsilon = 1e-9);
        assert!(!s[0].synthesized);
    }

    #[test]
    fn trimming_removes_specular_outliers() {
        // Two bright pixels inside an otherwise flat patch.
        let img = image(40, 40, |x, y| {
            if (x, y) == (15, 15) || (x, y) == (16, 15) {
                [1.0, 1.0, 1.0]
            } else {
                [0.3, 0.3, 0.3]
            }
        });
        let g = grid(1, 1, 30.0, 35.0);
        let trimmed = sample_grid(&img, &g, &SamplerParams::default(), 10.0).expect("samples");
        approx::assert_abs_diff_eq!(trimmed[0].rgb[0], 0.3, epsilon = 1e-6);

        let raw = sample_grid(&img, &g, &SamplerParams::default(), 0.0).expect("samples");
        assert!(raw[0].rgb[0] > 0.3 + 1e-4);
        assert!(raw[0].pixels > trimmed[0].pixels);
    }

    #[test]
    fn degenerate_cell_takes_neighbour_mean() {
        let img = image(120, 40, |x, _| {
            if x < 40 {
                [0.2, 0.2, 0.2]
            } else {
                [0.6, 0.6, 0.6]
            }
        });
        let mut g = grid(1, 3, 30.0, 40.0);
        // Shrink the middle cell below the minimum pixel count.
        g.cells[1].quad = Quad::from_rect(50.0, 10.0, 2.0, 2.0).expect("rect");
        let s = sample_grid(&img, &g, &SamplerParams::default(), 10.0).expect("samples");
        assert!(s[1].synthesized);
        approx::assert_abs_diff_eq!(s[1].rgb[0], 0.4, epsilon = 1e-6);
        assert!(!s[0].synthesized && !s[2].synthesized);
    }

    #[test]
    fn all_degenerate_grid_is_dropped() {
        let img = image(20, 20, |_, _| [0.5; 3]);
        let g = grid(2, 2, 2.0, 4.0);
        assert!(sample_grid(&img, &g, &SamplerParams::default(), 10.0).is_none());
    }
}
