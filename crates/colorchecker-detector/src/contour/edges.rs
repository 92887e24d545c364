//! Edge mask: optional binomial smoothing, Sobel magnitude, hysteresis and
//! dilation. Borders are handled by clamping (replicate).

use colorchecker_core::GrayImageView;
use serde::{Deserialize, Serialize};

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];
const BINOMIAL: Kernel3 = [
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
    [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
    [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
];

/// Hysteresis thresholds on the Sobel magnitude of 8-bit luma.
///
/// A unit step of `d` gray levels produces a magnitude of `4 * d`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeThresholds {
    pub low: f32,
    pub high: f32,
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            low: 40.0,
            high: 100.0,
        }
    }
}

/// Full edge stage configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    pub thresholds: EdgeThresholds,
    /// Scale both thresholds by the image's 2–98 percentile range / 255.
    pub adaptive: bool,
    /// 3×3 binomial blur before differentiation.
    pub smoothing: bool,
    /// Number of 3×3 dilation passes applied to the edge mask.
    pub dilate: usize,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            thresholds: EdgeThresholds::default(),
            adaptive: false,
            smoothing: true,
            dilate: 1,
        }
    }
}

// Lower bound on the adaptive scale so flat images do not turn noise into edges.
const MIN_ADAPTIVE_SCALE: f32 = 0.1;

#[inline]
fn clamp_idx(v: usize, d: isize, n: usize) -> usize {
    (v as isize + d).clamp(0, n as isize - 1) as usize
}

fn convolve3(src: &[f32], w: usize, h: usize, k: &Kernel3) -> Vec<f32> {
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        let ys = [clamp_idx(y, -1, h), y, clamp_idx(y, 1, h)];
        for x in 0..w {
            let xs = [clamp_idx(x, -1, w), x, clamp_idx(x, 1, w)];
            let mut acc = 0.0;
            for (ky, &yy) in ys.iter().enumerate() {
                let row = &src[yy * w..(yy + 1) * w];
                acc += row[xs[0]] * k[ky][0] + row[xs[1]] * k[ky][1] + row[xs[2]] * k[ky][2];
            }
            out[y * w + x] = acc;
        }
    }
    out
}

/// Sobel gradient magnitude of a float image.
pub fn sobel_magnitude(src: &[f32], w: usize, h: usize) -> Vec<f32> {
    let gx = convolve3(src, w, h, &SOBEL_KERNEL_X);
    let gy = convolve3(src, w, h, &SOBEL_KERNEL_Y);
    gx.iter()
        .zip(gy.iter())
        .map(|(&x, &y)| (x * x + y * y).sqrt())
        .collect()
}

/// Intensity at the given percentile (0..=100) of an 8-bit image.
pub fn percentile(img: &GrayImageView<'_>, pct: f32) -> u8 {
    let mut hist = [0usize; 256];
    for &v in img.data {
        hist[v as usize] += 1;
    }
    let n = img.data.len();
    if n == 0 {
        return 0;
    }
    let target = ((pct.clamp(0.0, 100.0) / 100.0) * (n - 1) as f32).round() as usize;
    let mut acc = 0usize;
    for (v, &count) in hist.iter().enumerate() {
        acc += count;
        if acc > target {
            return v as u8;
        }
    }
    255
}

/// Thresholds actually applied to this image.
pub fn effective_thresholds(img: &GrayImageView<'_>, params: &EdgeParams) -> EdgeThresholds {
    if !params.adaptive {
        return params.thresholds;
    }
    let lo = percentile(img, 2.0) as f32;
    let hi = percentile(img, 98.0) as f32;
    let scale = ((hi - lo) / 255.0).max(MIN_ADAPTIVE_SCALE);
    EdgeThresholds {
        low: params.thresholds.low * scale,
        high: params.thresholds.high * scale,
    }
}

/// Strong pixels seed the mask; weak pixels join when 8-connected to it.
pub fn hysteresis(mag: &[f32], w: usize, h: usize, t: EdgeThresholds) -> Vec<bool> {
    let mut mask = vec![false; w * h];
    let mut stack = Vec::new();
    for (i, &m) in mag.iter().enumerate() {
        if m > 0.0 && m >= t.high {
            mask[i] = true;
            stack.push(i);
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = (i % w, i / w);
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let j = ny as usize * w + nx as usize;
                if !mask[j] && mag[j] > 0.0 && mag[j] >= t.low {
                    mask[j] = true;
                    stack.push(j);
                }
            }
        }
    }
    mask
}

/// 3×3 binary dilation.
pub fn dilate(mask: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mut out = vec![false; w * h];
    for y in 0..h {
        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        for x in 0..w {
            let x0 = x.saturating_sub(1);
            let x1 = (x + 1).min(w - 1);
            out[y * w + x] = (y0..=y1).any(|yy| (x0..=x1).any(|xx| mask[yy * w + xx]));
        }
    }
    out
}

/// Compute the edge mask of an 8-bit luma image.
pub fn edge_mask(img: &GrayImageView<'_>, params: &EdgeParams) -> Vec<bool> {
    let (w, h) = (img.width, img.height);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let mut buf: Vec<f32> = img.data.iter().map(|&v| v as f32).collect();
    if params.smoothing {
        buf = convolve3(&buf, w, h, &BINOMIAL);
    }
    let mag = sobel_magnitude(&buf, w, h);
    let t = effective_thresholds(img, params);
    let mut mask = hysteresis(&mag, w, h, t);
    for _ in 0..params.dilate {
        mask = dilate(&mask, w, h);
    }
    mask
}
