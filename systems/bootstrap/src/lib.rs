#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that runs the complete map setup.
//!
//! Setup happens in one uninterrupted pass: the configured portal and base
//! points are snapped onto the edge ring, the board is filled, every obstacle
//! batch is scattered in order, reachability is recomputed once against the
//! final layout, and the pruner walls off whatever the portals cannot reach.

use portal_board_core::{
    BoardConfig, Command, ConfigError, ConnectivityOracle, Event, GridCoord, TileRenderer,
};
use portal_board_system_placement::{
    self as placement, Placement, PlacementError, PlacementReport,
};
use portal_board_system_pruning::{PruneError, PruneReport, Pruner};
use portal_board_world::{self as world, query, Board, BoardLayout};
use thiserror::Error;

/// Errors that abort map setup.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// The configuration failed validation.
    #[error("invalid board configuration: {0}")]
    Config(#[from] ConfigError),
    /// A placement batch could not run.
    #[error("obstacle placement failed: {0}")]
    Placement(#[from] PlacementError),
    /// The pruning pass could not complete.
    #[error("pruning failed: {0}")]
    Prune(#[from] PruneError),
}

/// Result of the fill pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FillSummary {
    /// Number of cells that received a tile.
    pub filled: usize,
    /// Cells left empty because their category had no template.
    pub missing: Vec<GridCoord>,
}

impl FillSummary {
    fn from_events(events: &[Event]) -> Self {
        let mut summary = Self::default();
        for event in events {
            match event {
                Event::GridFilled { filled, .. } => summary.filled = *filled,
                Event::TemplateMissing { cell, .. } => summary.missing.push(*cell),
                _ => {}
            }
        }
        summary
    }
}

/// Generated board together with everything that happened while building it.
#[derive(Debug)]
pub struct Generation {
    board: Board,
    fill: FillSummary,
    placements: Vec<PlacementReport>,
    pruned: PruneReport,
    events: Vec<Event>,
}

impl Generation {
    /// The generated board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Consumes the generation, yielding the board.
    #[must_use]
    pub fn into_board(self) -> Board {
        self.board
    }

    /// Outcome of the fill pass.
    #[must_use]
    pub fn fill(&self) -> &FillSummary {
        &self.fill
    }

    /// One report per configured obstacle batch, in configuration order.
    #[must_use]
    pub fn placements(&self) -> &[PlacementReport] {
        &self.placements
    }

    /// Outcome of the pruning pass.
    #[must_use]
    pub fn pruned(&self) -> &PruneReport {
        &self.pruned
    }

    /// Every event the board reported during setup.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

/// Pure bootstrap system that builds a board from configuration.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Runs the full setup pipeline.
    pub fn generate<R, O>(
        &self,
        config: &BoardConfig,
        renderer: &mut R,
        oracle: &mut O,
    ) -> Result<Generation, GenerationError>
    where
        R: TileRenderer + ?Sized,
        O: ConnectivityOracle + ?Sized,
    {
        let dimensions = config.validate()?;
        let layout = BoardLayout::normalized(dimensions, &config.portals, &config.bases);
        let mut board = Board::new(layout, config.templates.clone());
        let mut events = Vec::new();

        world::apply(&mut board, renderer, Command::FillGrid, &mut events);
        let fill = FillSummary::from_events(&events);
        if !fill.missing.is_empty() {
            log::error!(
                "{} cells left empty because their template is missing",
                fill.missing.len()
            );
        }

        let mut placement =
            Placement::new(placement::Config::new(config.seed, config.retry_factor));
        let mut placements = Vec::with_capacity(config.obstacles.len());
        for batch in &config.obstacles {
            let report = placement.scatter(&mut board, renderer, oracle, *batch, &mut events)?;
            log::info!(
                "placed {} of {} {:?} tiles ({} rejected)",
                report.placed,
                report.requested,
                batch.kind,
                report.rejected
            );
            placements.push(report);
        }

        oracle.recompute_reachability(query::grid_view(&board), query::portal_positions(&board));
        let pruned = Pruner::default().prune(&mut board, renderer, oracle, &mut events)?;

        Ok(Generation {
            board,
            fill,
            placements,
            pruned,
            events,
        })
    }
}
