#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates a portal board and prints it.

mod config;
mod layout_transfer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use portal_board_core::GridView;
use portal_board_rendering::{render_ascii, SceneRenderer};
use portal_board_system_bootstrap::Bootstrap;
use portal_board_world::{query, FloodFillOracle};

use crate::{config::Overrides, layout_transfer::BoardSnapshot};

/// Generates a board whose portals always reach the bases.
#[derive(Debug, Parser)]
#[command(name = "portal-board", version)]
struct CliArgs {
    /// TOML file describing the board. Defaults to the reference board.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for obstacle placement.
    #[arg(long)]
    seed: Option<u64>,
    /// Largest column index of the board.
    #[arg(long)]
    columns: Option<u32>,
    /// Largest row index of the board.
    #[arg(long)]
    rows: Option<u32>,
    /// Side length of a tile in world units.
    #[arg(long, value_name = "UNITS", default_value_t = 1.0)]
    tile_length: f32,
    /// Print a single-line layout string after the board.
    #[arg(long)]
    export: bool,
    /// Print a previously exported layout string instead of generating.
    #[arg(
        long,
        value_name = "LAYOUT",
        conflicts_with_all = ["config", "seed", "columns", "rows", "export"]
    )]
    decode: Option<String>,
}

/// Entry point for the portal board command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = CliArgs::parse();

    if let Some(layout) = args.decode.as_deref() {
        return print_layout(layout);
    }

    let mut config = config::load(args.config.as_deref())?;
    Overrides {
        seed: args.seed,
        columns: args.columns,
        rows: args.rows,
    }
    .apply(&mut config);

    let mut renderer = SceneRenderer::new(args.tile_length)?;
    let mut oracle = FloodFillOracle::new();
    let generation = Bootstrap
        .generate(&config, &mut renderer, &mut oracle)
        .context("failed to generate board")?;

    for (batch, report) in config.obstacles.iter().zip(generation.placements()) {
        log::info!(
            "{:?} batch: {} requested, {} placed, {} rejected, {} duplicate draws",
            batch.kind,
            report.requested,
            report.placed,
            report.rejected,
            report.duplicate_draws
        );
    }
    log::info!(
        "{} live instances, {} cells pruned",
        renderer.live_count(),
        generation.pruned().converted.len()
    );

    let board = generation.board();
    print!("{}", render_ascii(query::grid_view(board)));

    if args.export {
        let encoded = BoardSnapshot::capture(board)
            .encode()
            .context("failed to export layout")?;
        println!("{encoded}");
    }

    Ok(())
}

fn print_layout(layout: &str) -> Result<()> {
    let snapshot = BoardSnapshot::decode(layout).context("failed to decode layout")?;
    let tiles = snapshot.tiles();
    print!(
        "{}",
        render_ascii(GridView::new(&tiles, snapshot.dimensions()))
    );
    Ok(())
}
