use serde::{Deserialize, Serialize};

/// Clockwise rotation of the chart as seen in the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    #[inline]
    fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// One of the 8 symmetries of a rectangular patch grid (dihedral group `D4`).
///
/// The chart is first mirrored left-to-right (when `mirrored`), then rotated
/// clockwise by `rotation`. [`Orientation::map_cell`] sends a cell of the
/// chart's canonical `rows × cols` layout to the cell it occupies in the
/// observed lattice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    pub rotation: Rotation,
    pub mirrored: bool,
}

/// All 8 orientations in search order: plain rotations first, then mirrored.
pub const ALL_ORIENTATIONS: [Orientation; 8] = [
    Orientation::new(Rotation::Deg0, false),
    Orientation::new(Rotation::Deg90, false),
    Orientation::new(Rotation::Deg180, false),
    Orientation::new(Rotation::Deg270, false),
    Orientation::new(Rotation::Deg0, true),
    Orientation::new(Rotation::Deg90, true),
    Orientation::new(Rotation::Deg180, true),
    Orientation::new(Rotation::Deg270, true),
];

impl Orientation {
    pub const IDENTITY: Orientation = Orientation::new(Rotation::Deg0, false);

    pub const fn new(rotation: Rotation, mirrored: bool) -> Self {
        Self { rotation, mirrored }
    }

    /// Dimensions `(rows, cols)` of the observed lattice for a `rows × cols` chart.
    #[inline]
    pub fn observed_dims(&self, rows: usize, cols: usize) -> (usize, usize) {
        if self.rotation.swaps_axes() {
            (cols, rows)
        } else {
            (rows, cols)
        }
    }

    /// Map chart cell `(r, c)` of a `rows × cols` chart to observed `(row, col)`.
    #[inline]
    pub fn map_cell(&self, r: usize, c: usize, rows: usize, cols: usize) -> (usize, usize) {
        debug_assert!(r < rows && c < cols);
        let c = if self.mirrored { cols - 1 - c } else { c };
        match self.rotation {
            Rotation::Deg0 => (r, c),
            Rotation::Deg90 => (c, rows - 1 - r),
            Rotation::Deg180 => (rows - 1 - r, cols - 1 - c),
            Rotation::Deg270 => (cols - 1 - c, r),
        }
    }

    /// Row-major observed index of every chart cell, in chart row-major order.
    pub fn index_map(&self, rows: usize, cols: usize) -> Vec<usize> {
        let (_, obs_cols) = self.observed_dims(rows, cols);
        let mut out = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let (orow, ocol) = self.map_cell(r, c, rows, cols);
                out.push(orow * obs_cols + ocol);
            }
        }
        out
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rot{}", self.rotation.degrees())?;
        if self.mirrored {
            write!(f, "+mirror")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_maps_are_permutations() {
        for o in ALL_ORIENTATIONS {
            let mut m = o.index_map(4, 6);
            m.sort_unstable();
            assert_eq!(m, (0..24).collect::<Vec<_>>(), "{o}");
        }
    }

    #[test]
    fn clockwise_quarter_turn_moves_top_left_to_top_right() {
        let o = Orientation::new(Rotation::Deg90, false);
        assert_eq!(o.observed_dims(4, 6), (6, 4));
        assert_eq!(o.map_cell(0, 0, 4, 6), (0, 3));
        assert_eq!(o.map_cell(3, 0, 4, 6), (0, 0));
        assert_eq!(o.map_cell(0, 5, 4, 6), (5, 3));
    }

    #[test]
    fn mirrored_variants() {
        let flip_h = Orientation::new(Rotation::Deg0, true);
        assert_eq!(flip_h.map_cell(1, 0, 4, 6), (1, 5));

        let flip_v = Orientation::new(Rotation::Deg180, true);
        assert_eq!(flip_v.map_cell(0, 2, 4, 6), (3, 2));

        let transpose = Orientation::new(Rotation::Deg270, true);
        assert_eq!(transpose.map_cell(1, 4, 4, 6), (4, 1));
    }

    #[test]
    fn all_orientations_are_distinct() {
        let maps: Vec<_> = ALL_ORIENTATIONS.iter().map(|o| o.index_map(3, 3)).collect();
        for i in 0..maps.len() {
            for j in (i + 1)..maps.len() {
                assert_ne!(maps[i], maps[j]);
            }
        }
    }
}
