#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pruning system that walls off every cell the portals cannot reach.

use portal_board_core::{
    Command, ConnectivityOracle, Event, GridCoord, StageError, TileKind, TileRenderer,
};
use portal_board_world::{self as world, query, Board};
use thiserror::Error;

/// Outcome of a pruning pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Cells converted to the obstacle category, in row-major order.
    pub converted: Vec<GridCoord>,
}

/// Errors that abort a pruning pass.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PruneError {
    /// The board refused to replace a cell.
    #[error("board refused to replace {cell}: {reason}")]
    ReplaceRejected {
        /// Cell that could not be converted.
        cell: GridCoord,
        /// Reason reported by the board.
        reason: StageError,
    },
}

/// Pure sweep converting unreachable cells into obstacles.
#[derive(Clone, Copy, Debug)]
pub struct Pruner {
    obstacle: TileKind,
}

impl Default for Pruner {
    fn default() -> Self {
        Self::new(TileKind::Wall)
    }
}

impl Pruner {
    /// Creates a pruner that converts cells into the provided category.
    #[must_use]
    pub const fn new(obstacle: TileKind) -> Self {
        Self { obstacle }
    }

    /// Converts every cell outside the oracle's reachable set.
    ///
    /// The caller is expected to have recomputed reachability against the
    /// final board. Portal and base cells are never touched, even when their
    /// template was missing and they were left empty. Cells that
    /// already hold the obstacle category are left as they are, so a second
    /// pass converts nothing. Any other empty cell is unreachable and gets filled.
    pub fn prune<R, O>(
        &self,
        board: &mut Board,
        renderer: &mut R,
        oracle: &O,
        out_events: &mut Vec<Event>,
    ) -> Result<PruneReport, PruneError>
    where
        R: TileRenderer + ?Sized,
        O: ConnectivityOracle + ?Sized,
    {
        let reachable = oracle.reachable_set();
        let portals = query::portal_positions(board);
        let bases = query::base_positions(board);
        let targets: Vec<GridCoord> = query::grid_view(board)
            .iter()
            .filter(|(cell, _)| !reachable.contains(cell))
            .filter(|(cell, _)| !portals.contains(cell) && !bases.contains(cell))
            .filter(|(_, tile)| match tile.map(|tile| tile.kind()) {
                Some(TileKind::Portal | TileKind::Base) => false,
                Some(kind) => kind != self.obstacle,
                None => true,
            })
            .map(|(cell, _)| cell)
            .collect();

        for &cell in &targets {
            let first_new = out_events.len();
            world::apply(
                board,
                renderer,
                Command::ReplaceTile {
                    cell,
                    kind: self.obstacle,
                },
                out_events,
            );
            for event in &out_events[first_new..] {
                if let Event::ReplaceRejected { reason, .. } = event {
                    return Err(PruneError::ReplaceRejected {
                        cell,
                        reason: *reason,
                    });
                }
            }
            log::debug!("pruned unreachable cell {cell}");
        }

        if !targets.is_empty() {
            log::info!("pruned {} unreachable cells", targets.len());
        }

        Ok(PruneReport { converted: targets })
    }
}
