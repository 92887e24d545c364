//! Synthetic chart scenes.
//!
//! The base scene is a 460×360 sRGB image: mid-gray background, a black
//! chart body at `[65, 395) × [65, 295)` and 4×6 patches of 40 px with a
//! 10 px black gutter starting at (85, 85).

#![allow(dead_code)]

use colorchecker_detector::{builtins, ChartTopology};

pub const WIDTH: usize = 460;
pub const HEIGHT: usize = 360;
pub const PATCH: f32 = 40.0;
pub const PITCH: f32 = 50.0;
pub const ORIGIN: f32 = 85.0;
pub const BODY: [f32; 4] = [65.0, 65.0, 395.0, 295.0];
pub const BACKGROUND: [u8; 3] = [128, 128, 128];

/// Interleaved 8-bit RGB image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Image {
    pub fn get(&self, x: usize, y: usize) -> [u8; 3] {
        let i = 3 * (y * self.width + x);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }
}

pub fn classic() -> ChartTopology {
    builtins::classic_24().expect("classic_24 builtin")
}

pub fn reference_srgb8(topology: &ChartTopology) -> Vec<[u8; 3]> {
    use colorchecker_detector::ReferenceColor;
    topology
        .spec()
        .colors
        .iter()
        .map(|c| match c {
            ReferenceColor::Srgb8(rgb) => *rgb,
            other => panic!("scene needs 8-bit references, got {other:?}"),
        })
        .collect()
}

/// Scene color at continuous base-image coordinates.
pub fn scene_color(colors: &[[u8; 3]], x: f32, y: f32) -> [u8; 3] {
    let [bx0, by0, bx1, by1] = BODY;
    if !(x >= bx0 && x < bx1 && y >= by0 && y < by1) {
        return BACKGROUND;
    }
    let (u, v) = (x - ORIGIN, y - ORIGIN);
    if u >= 0.0 && v >= 0.0 {
        let (c, r) = ((u / PITCH) as usize, (v / PITCH) as usize);
        let inside = u - c as f32 * PITCH < PATCH && v - r as f32 * PITCH < PATCH;
        if inside && r < 4 && c < 6 {
            return colors[r * 6 + c];
        }
    }
    [0, 0, 0]
}

/// Axis-aligned chart, one sample per pixel center.
pub fn render(colors: &[[u8; 3]]) -> Image {
    Image::from_fn(WIDTH, HEIGHT, |x, y| {
        scene_color(colors, x as f32 + 0.5, y as f32 + 0.5)
    })
}

/// Chart rotated by `degrees` about the image center, 4×4 supersampled.
pub fn render_rotated(colors: &[[u8; 3]], degrees: f32) -> Image {
    let (s, c) = degrees.to_radians().sin_cos();
    let (cx, cy) = (WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0);
    Image::from_fn(WIDTH, HEIGHT, |x, y| {
        let mut acc = [0u32; 3];
        for sy in 0..4 {
            for sx in 0..4 {
                let px = x as f32 + (sx as f32 + 0.5) / 4.0 - cx;
                let py = y as f32 + (sy as f32 + 0.5) / 4.0 - cy;
                // Inverse rotation back into the base scene.
                let bx = c * px + s * py + cx;
                let by = -s * px + c * py + cy;
                let rgb = scene_color(colors, bx, by);
                for ch in 0..3 {
                    acc[ch] += rgb[ch] as u32;
                }
            }
        }
        acc.map(|v| ((v + 8) / 16) as u8)
    })
}

/// Quarter turn clockwise on screen: `(x, y) -> (H - 1 - y, x)`.
pub fn rotate_cw(img: &Image) -> Image {
    Image::from_fn(img.height, img.width, |x, y| img.get(y, img.height - 1 - x))
}

/// Left-right mirror.
pub fn mirror_x(img: &Image) -> Image {
    Image::from_fn(img.width, img.height, |x, y| img.get(img.width - 1 - x, y))
}

/// Top-bottom flip.
pub fn flip_y(img: &Image) -> Image {
    Image::from_fn(img.width, img.height, |x, y| img.get(x, img.height - 1 - y))
}
