//! Normalization of configured portal and base points onto the edge ring.

use portal_board_core::{BoardDimensions, GridCoord, RawPoint};

/// Portal and base positions snapped onto the edge ring of a board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardLayout {
    dimensions: BoardDimensions,
    portals: Vec<GridCoord>,
    bases: Vec<GridCoord>,
}

impl BoardLayout {
    /// Normalizes the raw points in order. Duplicates are kept.
    #[must_use]
    pub fn normalized(
        dimensions: BoardDimensions,
        portals: &[RawPoint],
        bases: &[RawPoint],
    ) -> Self {
        let snap = |point: &RawPoint| snap_to_ring(*point, dimensions);
        Self {
            dimensions,
            portals: portals.iter().map(snap).collect(),
            bases: bases.iter().map(snap).collect(),
        }
    }

    /// Bounds the layout was normalized against.
    #[must_use]
    pub const fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    /// Normalized portal positions in configuration order.
    #[must_use]
    pub fn portals(&self) -> &[GridCoord] {
        &self.portals
    }

    /// Normalized base positions in configuration order.
    #[must_use]
    pub fn bases(&self) -> &[GridCoord] {
        &self.bases
    }

    pub(crate) fn into_parts(self) -> (BoardDimensions, Vec<GridCoord>, Vec<GridCoord>) {
        (self.dimensions, self.portals, self.bases)
    }
}

/// Snaps an arbitrary point onto the edge ring.
///
/// The column is clamped first. A point that lands on the left or right edge
/// keeps its row, clamped off the corners. Any other point is pushed to the
/// bottom or top edge by flooring `y / rows` and scaling back, which is a
/// coarse snap rather than a nearest-edge projection: every `y` below `rows`
/// lands on row 0.
#[must_use]
pub fn snap_to_ring(point: RawPoint, dimensions: BoardDimensions) -> GridCoord {
    let columns = i64::from(dimensions.columns());
    let rows = i64::from(dimensions.rows());

    let x = i64::from(point.x).clamp(0, columns);
    let y = if x == 0 || x == columns {
        i64::from(point.y).clamp(1, rows - 1)
    } else {
        i64::from(point.y).div_euclid(rows) * rows
    };
    let y = y.clamp(0, rows);

    // Both components were clamped into u32 bounds above.
    GridCoord::new(x as u32, y as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> BoardDimensions {
        BoardDimensions::REFERENCE
    }

    #[test]
    fn vertical_edges_keep_row_off_the_corners() {
        let dims = reference();
        assert_eq!(snap_to_ring(RawPoint::new(0, 7), dims), GridCoord::new(0, 7));
        assert_eq!(snap_to_ring(RawPoint::new(-5, 0), dims), GridCoord::new(0, 1));
        assert_eq!(snap_to_ring(RawPoint::new(90, 40), dims), GridCoord::new(34, 18));
    }

    #[test]
    fn interior_columns_snap_rows_coarsely() {
        let dims = reference();
        assert_eq!(snap_to_ring(RawPoint::new(10, 18), dims), GridCoord::new(10, 0));
        assert_eq!(snap_to_ring(RawPoint::new(10, 19), dims), GridCoord::new(10, 19));
        assert_eq!(snap_to_ring(RawPoint::new(10, 25), dims), GridCoord::new(10, 19));
        assert_eq!(snap_to_ring(RawPoint::new(10, 50), dims), GridCoord::new(10, 19));
        assert_eq!(snap_to_ring(RawPoint::new(10, -3), dims), GridCoord::new(10, 0));
    }

    #[test]
    fn snapping_is_idempotent_and_lands_on_the_ring() {
        let dims = BoardDimensions::new(6, 4).expect("valid dimensions");
        for x in -3..10 {
            for y in -6..12 {
                let once = snap_to_ring(RawPoint::new(x, y), dims);
                assert!(dims.is_boundary(once), "{once} is off the ring");

                let raw = RawPoint::new(once.column() as i32, once.row() as i32);
                assert_eq!(snap_to_ring(raw, dims), once, "snap of {x},{y} moved twice");
            }
        }
    }

    #[test]
    fn layout_preserves_order_and_duplicates() {
        let layout = BoardLayout::normalized(
            reference(),
            &[RawPoint::new(0, 9), RawPoint::new(0, 9), RawPoint::new(5, 30)],
            &[RawPoint::new(40, 9)],
        );

        assert_eq!(
            layout.portals(),
            &[GridCoord::new(0, 9), GridCoord::new(0, 9), GridCoord::new(5, 19)]
        );
        assert_eq!(layout.bases(), &[GridCoord::new(34, 9)]);
    }
}
