//! 4-connected labelling of the pixels the edge mask leaves free.

/// One connected non-edge region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    /// Label used in [`Regions::labels`] (1-based).
    pub label: u32,
    pub pixel_count: usize,
    /// First pixel in raster order: topmost row, then leftmost column.
    pub start: [usize; 2],
    /// Inclusive bounds `[x0, y0, x1, y1]`.
    pub bbox: [usize; 4],
    pub touches_border: bool,
}

/// Label image plus per-component statistics. Label 0 marks edge pixels.
#[derive(Clone, Debug)]
pub struct Regions {
    pub width: usize,
    pub height: usize,
    pub labels: Vec<u32>,
    pub components: Vec<Component>,
}

impl Regions {
    #[inline]
    pub fn label_at(&self, x: isize, y: isize) -> u32 {
        if x < 0 || y < 0 || x >= self.width as isize || y >= self.height as isize {
            return 0;
        }
        self.labels[y as usize * self.width + x as usize]
    }
}

/// Label every 4-connected run of `false` pixels in `edges`.
///
/// Components are numbered in raster order of their first pixel.
pub fn label_regions(edges: &[bool], width: usize, height: usize) -> Regions {
    let mut labels = vec![0u32; width * height];
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for start in 0..labels.len() {
        if edges[start] || labels[start] != 0 {
            continue;
        }
        let label = components.len() as u32 + 1;
        let (sx, sy) = (start % width, start / width);
        let mut comp = Component {
            label,
            pixel_count: 0,
            start: [sx, sy],
            bbox: [sx, sy, sx, sy],
            touches_border: false,
        };

        labels[start] = label;
        stack.push(start);
        while let Some(i) = stack.pop() {
            let (x, y) = (i % width, i / width);
            comp.pixel_count += 1;
            comp.bbox[0] = comp.bbox[0].min(x);
            comp.bbox[1] = comp.bbox[1].min(y);
            comp.bbox[2] = comp.bbox[2].max(x);
            comp.bbox[3] = comp.bbox[3].max(y);
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                comp.touches_border = true;
            }

            let mut visit = |j: usize| {
                if !edges[j] && labels[j] == 0 {
                    labels[j] = label;
                    stack.push(j);
                }
            };
            if x > 0 {
                visit(i - 1);
            }
            if x + 1 < width {
                visit(i + 1);
            }
            if y > 0 {
                visit(i - width);
            }
            if y + 1 < height {
                visit(i + width);
            }
        }
        components.push(comp);
    }

    Regions {
        width,
        height,
        labels,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_separates_inside_from_background() {
        // 7×7 with a one-pixel edge ring at distance 1 from the border.
        let (w, h) = (7, 7);
        let mut edges = vec![false; w * h];
        for i in 1..6 {
            edges[w + i] = true;
            edges[5 * w + i] = true;
            edges[i * w + 1] = true;
            edges[i * w + 5] = true;
        }
        let regions = label_regions(&edges, w, h);
        assert_eq!(regions.components.len(), 2);

        let outer = &regions.components[0];
        assert!(outer.touches_border);
        assert_eq!(outer.pixel_count, 24);

        let inner = &regions.components[1];
        assert!(!inner.touches_border);
        assert_eq!(inner.pixel_count, 9);
        assert_eq!(inner.start, [2, 2]);
        assert_eq!(inner.bbox, [2, 2, 4, 4]);
        assert_eq!(regions.label_at(3, 3), inner.label);
        assert_eq!(regions.label_at(-1, 3), 0);
    }

    #[test]
    fn diagonal_pixels_are_not_connected() {
        let edges = [false, true, true, false];
        let regions = label_regions(&edges, 2, 2);
        assert_eq!(regions.components.len(), 2);
    }
}
