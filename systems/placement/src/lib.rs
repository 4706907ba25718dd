#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Placement system that scatters obstacles over the board interior.
//!
//! Every candidate is staged on the board, validated against the connectivity
//! oracle with a full reachability recompute, and then committed or rolled
//! back. A portal therefore never loses its path to the bases, not even
//! between two placements of the same batch.

use std::collections::BTreeSet;

use portal_board_core::{
    BoardDimensions, Command, ConfigError, ConnectivityOracle, Event, GridCoord, ObstacleBatch,
    ObstacleCount, StageError, TileKind, TileRenderer,
};
use portal_board_world::{self as world, query, Board};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

const DEFAULT_RETRY_FACTOR: u32 = 16;

/// Configuration parameters required to construct the placement system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    rng_seed: u64,
    retry_factor: u32,
}

impl Config {
    /// Creates a configuration from a seed and a retry factor.
    ///
    /// A batch that requests `n` placements may draw at most
    /// `n * retry_factor` candidates before it gives up. A zero factor is
    /// raised to one.
    #[must_use]
    pub const fn new(rng_seed: u64, retry_factor: u32) -> Self {
        let retry_factor = if retry_factor == 0 { 1 } else { retry_factor };
        Self {
            rng_seed,
            retry_factor,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(0, DEFAULT_RETRY_FACTOR)
    }
}

/// Outcome of a single placement batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlacementReport {
    /// Number of placements drawn from the count range.
    pub requested: u32,
    /// Number of tiles committed.
    pub placed: u32,
    /// Number of staged tiles rolled back because they cut a portal off.
    pub rejected: u32,
    /// Number of candidates skipped because the batch already used them.
    pub duplicate_draws: u32,
    /// Whether the batch stopped because its draw budget ran out.
    pub exhausted: bool,
}

/// Errors that abort a placement batch before or during scattering.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    /// The batch's count range is invalid.
    #[error(transparent)]
    InvalidCount(#[from] ConfigError),
    /// The board holds no template for the batch's category.
    #[error("no template configured for {kind:?} obstacles")]
    MissingTemplate {
        /// Category of the batch.
        kind: TileKind,
    },
    /// The board refused to stage a candidate.
    #[error("board refused to stage {cell}: {reason}")]
    StageRejected {
        /// Candidate cell.
        cell: GridCoord,
        /// Reason reported by the board.
        reason: StageError,
    },
}

/// Placement system that scatters a tile category under connectivity validation.
#[derive(Debug)]
pub struct Placement {
    rng: ChaCha8Rng,
    retry_factor: u32,
}

impl Placement {
    /// Creates a new placement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            retry_factor: config.retry_factor,
        }
    }

    /// Runs one placement batch against the board.
    ///
    /// The number of placements is drawn from the batch's half-open count
    /// range. Each candidate is drawn uniformly from the interior; cells the
    /// batch already committed are skipped, and candidates that disconnect a
    /// portal are rolled back and stay eligible. Both kinds of miss consume the
    /// draw budget, so the batch always terminates.
    pub fn scatter<R, O>(
        &mut self,
        board: &mut Board,
        renderer: &mut R,
        oracle: &mut O,
        batch: ObstacleBatch,
        out_events: &mut Vec<Event>,
    ) -> Result<PlacementReport, PlacementError>
    where
        R: TileRenderer + ?Sized,
        O: ConnectivityOracle + ?Sized,
    {
        let count = batch.count.validate()?;
        let template_name = query::templates(board)
            .get(batch.kind)
            .map(|template| template.name.clone())
            .ok_or(PlacementError::MissingTemplate { kind: batch.kind })?;
        if let Some(cell) = query::staged_cell(board) {
            return Err(PlacementError::StageRejected {
                cell,
                reason: StageError::AlreadyStaged,
            });
        }

        let requested = self.draw_count(count);
        let mut report = PlacementReport {
            requested,
            ..PlacementReport::default()
        };

        let dimensions = query::dimensions(board);
        let interior = dimensions.interior_cell_count();
        let budget = u64::from(requested) * u64::from(self.retry_factor);
        let mut draws: u64 = 0;
        let mut used: BTreeSet<GridCoord> = BTreeSet::new();

        while report.placed < requested {
            if used.len() >= interior {
                break;
            }
            if draws >= budget {
                report.exhausted = true;
                log::warn!(
                    "{template_name} placement gave up after {draws} draws with {} of {requested} placed",
                    report.placed
                );
                break;
            }
            draws += 1;

            let cell = self.draw_interior(dimensions);
            if used.contains(&cell) {
                report.duplicate_draws += 1;
                continue;
            }

            stage(board, renderer, cell, batch.kind, out_events)?;

            if connects_every_portal(board, oracle) {
                world::apply(board, renderer, Command::CommitStaged, out_events);
                let _ = used.insert(cell);
                report.placed += 1;
            } else {
                world::apply(board, renderer, Command::RollbackStaged, out_events);
                report.rejected += 1;
                log::info!("{template_name} blocked path at {cell}. {template_name} removed.");
            }
        }

        Ok(report)
    }

    fn draw_count(&mut self, count: ObstacleCount) -> u32 {
        if count.maximum <= count.minimum {
            return count.minimum;
        }
        self.rng.gen_range(count.minimum..count.maximum)
    }

    fn draw_interior(&mut self, dimensions: BoardDimensions) -> GridCoord {
        let column = self.rng.gen_range(1..dimensions.columns());
        let row = self.rng.gen_range(1..dimensions.rows());
        GridCoord::new(column, row)
    }
}

fn stage<R>(
    board: &mut Board,
    renderer: &mut R,
    cell: GridCoord,
    kind: TileKind,
    out_events: &mut Vec<Event>,
) -> Result<(), PlacementError>
where
    R: TileRenderer + ?Sized,
{
    let first_new = out_events.len();
    world::apply(board, renderer, Command::StageTile { cell, kind }, out_events);

    for event in &out_events[first_new..] {
        if let Event::StageRejected { reason, .. } = event {
            return Err(PlacementError::StageRejected {
                cell,
                reason: *reason,
            });
        }
    }
    Ok(())
}

/// Recomputes reachability and asks the oracle for a path from every portal.
fn connects_every_portal<O>(board: &Board, oracle: &mut O) -> bool
where
    O: ConnectivityOracle + ?Sized,
{
    let grid = query::grid_view(board);
    let portals = query::portal_positions(board);
    oracle.recompute_reachability(grid, portals);
    portals
        .iter()
        .all(|portal| oracle.establish_path(grid, *portal).is_ok())
}
