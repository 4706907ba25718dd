#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state for the portal board generator.
//!
//! The [`Board`] owns the mapping from every coordinate to its tile. It is only
//! mutated through [`apply`], which lets systems stage a tentative tile, probe
//! connectivity against the staged state, and then commit or roll back.

mod layout;
mod navigation;

pub use layout::{snap_to_ring, BoardLayout};
pub use navigation::FloodFillOracle;

use portal_board_core::{
    BoardDimensions, Command, Event, GridCoord, StageError, TemplateSet, Tile, TileKind,
    TileRenderer,
};

/// Represents the authoritative board state.
#[derive(Debug)]
pub struct Board {
    dimensions: BoardDimensions,
    templates: TemplateSet,
    portals: Vec<GridCoord>,
    bases: Vec<GridCoord>,
    tiles: Vec<Option<Tile>>,
    staged: Option<StagedTile>,
}

impl Board {
    /// Creates an empty board for the normalized layout.
    ///
    /// Every cell stays empty until a [`Command::FillGrid`] is applied.
    #[must_use]
    pub fn new(layout: BoardLayout, templates: TemplateSet) -> Self {
        let (dimensions, portals, bases) = layout.into_parts();
        Self {
            tiles: vec![None; dimensions.cell_count()],
            dimensions,
            templates,
            portals,
            bases,
            staged: None,
        }
    }

    fn fill_kind(&self, cell: GridCoord) -> TileKind {
        if !self.dimensions.is_boundary(cell) {
            return TileKind::Floor;
        }

        if self.portals.contains(&cell) {
            TileKind::Portal
        } else if self.bases.contains(&cell) {
            TileKind::Base
        } else {
            TileKind::Wall
        }
    }

    fn fill<R>(&mut self, renderer: &mut R, out_events: &mut Vec<Event>)
    where
        R: TileRenderer + ?Sized,
    {
        if let Some(staged) = self.staged.take() {
            self.tiles[staged.index] = staged.previous;
        }

        for slot in &mut self.tiles {
            if let Some(handle) = slot.take().and_then(|tile| tile.handle()) {
                renderer.destroy(handle);
            }
        }

        let mut filled = 0;
        let mut skipped = 0;
        for cell in self.dimensions.cells() {
            let kind = self.fill_kind(cell);
            let Some(index) = self.dimensions.index(cell) else {
                continue;
            };
            let Some(template) = self.templates.get(kind) else {
                log::error!("fill has nothing to instantiate for {kind:?} at {cell}");
                out_events.push(Event::TemplateMissing { cell, kind });
                skipped += 1;
                continue;
            };

            let handle = renderer.instantiate(kind, template, cell);
            self.tiles[index] = Some(Tile::new(kind, Some(handle)));
            filled += 1;
        }

        out_events.push(Event::GridFilled { filled, skipped });
    }

    fn check_mutation(&self, cell: GridCoord, kind: TileKind) -> Result<usize, StageError> {
        let index = self.dimensions.index(cell).ok_or(StageError::OutOfBounds)?;
        if self.staged.is_some() {
            return Err(StageError::AlreadyStaged);
        }
        if self.templates.get(kind).is_none() {
            return Err(StageError::MissingTemplate);
        }
        Ok(index)
    }

    fn stage(&mut self, cell: GridCoord, kind: TileKind, out_events: &mut Vec<Event>) {
        let index = match self.check_mutation(cell, kind) {
            Ok(index) => index,
            Err(reason) => {
                out_events.push(Event::StageRejected { cell, kind, reason });
                return;
            }
        };

        let previous = self.tiles[index];
        self.tiles[index] = Some(Tile::new(kind, None));
        self.staged = Some(StagedTile {
            cell,
            index,
            kind,
            previous,
        });
        out_events.push(Event::TileStaged {
            cell,
            kind,
            previous: previous.map(|tile| tile.kind()),
        });
    }

    fn commit<R>(&mut self, renderer: &mut R, out_events: &mut Vec<Event>)
    where
        R: TileRenderer + ?Sized,
    {
        let Some(staged) = self.staged.take() else {
            return;
        };

        let placed = self.swap(
            renderer,
            staged.cell,
            staged.index,
            staged.previous,
            staged.kind,
            out_events,
        );
        if placed {
            return;
        }

        // Unreachable while the template set stays fixed after construction.
        self.tiles[staged.index] = staged.previous;
        out_events.push(Event::TileRestored {
            cell: staged.cell,
            kind: staged.previous.map(|tile| tile.kind()),
        });
    }

    fn rollback(&mut self, out_events: &mut Vec<Event>) {
        let Some(staged) = self.staged.take() else {
            return;
        };

        self.tiles[staged.index] = staged.previous;
        out_events.push(Event::TileRestored {
            cell: staged.cell,
            kind: staged.previous.map(|tile| tile.kind()),
        });
    }

    fn replace<R>(
        &mut self,
        renderer: &mut R,
        cell: GridCoord,
        kind: TileKind,
        out_events: &mut Vec<Event>,
    ) where
        R: TileRenderer + ?Sized,
    {
        match self.check_mutation(cell, kind) {
            Ok(index) => {
                let previous = self.tiles[index];
                let _ = self.swap(renderer, cell, index, previous, kind, out_events);
            }
            Err(reason) => out_events.push(Event::ReplaceRejected { cell, kind, reason }),
        }
    }

    /// Destroys the instance of the replaced tile and creates a fresh one from
    /// the category's template.
    fn swap<R>(
        &mut self,
        renderer: &mut R,
        cell: GridCoord,
        index: usize,
        previous: Option<Tile>,
        kind: TileKind,
        out_events: &mut Vec<Event>,
    ) -> bool
    where
        R: TileRenderer + ?Sized,
    {
        let Some(template) = self.templates.get(kind) else {
            return false;
        };

        if let Some(handle) = previous.and_then(|tile| tile.handle()) {
            renderer.destroy(handle);
        }

        let handle = renderer.instantiate(kind, template, cell);
        self.tiles[index] = Some(Tile::new(kind, Some(handle)));
        out_events.push(Event::TilePlaced { cell, kind, handle });
        true
    }
}

#[derive(Clone, Copy, Debug)]
struct StagedTile {
    cell: GridCoord,
    index: usize,
    kind: TileKind,
    previous: Option<Tile>,
}

/// Applies the provided command to the board, mutating state deterministically.
///
/// The renderer is asked to create or destroy instances whenever a tile is
/// filled, committed or replaced. Staging and rollback never touch it.
pub fn apply<R>(
    board: &mut Board,
    renderer: &mut R,
    command: Command,
    out_events: &mut Vec<Event>,
) where
    R: TileRenderer + ?Sized,
{
    match command {
        Command::FillGrid => board.fill(renderer, out_events),
        Command::StageTile { cell, kind } => board.stage(cell, kind, out_events),
        Command::CommitStaged => board.commit(renderer, out_events),
        Command::RollbackStaged => board.rollback(out_events),
        Command::ReplaceTile { cell, kind } => board.replace(renderer, cell, kind, out_events),
    }
}

/// Query functions that provide read-only access to the board state.
pub mod query {
    use super::Board;
    use portal_board_core::{
        BoardDimensions, GridCoord, GridView, Neighbour, TemplateSet, Tile, TileKind,
    };

    /// Bounds of the board.
    #[must_use]
    pub fn dimensions(board: &Board) -> BoardDimensions {
        board.dimensions
    }

    /// Normalized portal positions in configuration order.
    #[must_use]
    pub fn portal_positions(board: &Board) -> &[GridCoord] {
        &board.portals
    }

    /// Normalized base positions in configuration order.
    #[must_use]
    pub fn base_positions(board: &Board) -> &[GridCoord] {
        &board.bases
    }

    /// Templates the board instantiates tiles from.
    #[must_use]
    pub fn templates(board: &Board) -> &TemplateSet {
        &board.templates
    }

    /// Read-only view of the tiles, including any staged tile.
    #[must_use]
    pub fn grid_view(board: &Board) -> GridView<'_> {
        GridView::new(&board.tiles, board.dimensions)
    }

    /// Tile stored at the cell, if the cell is on the board and filled.
    #[must_use]
    pub fn tile_at(board: &Board, cell: GridCoord) -> Option<Tile> {
        grid_view(board).tile(cell)
    }

    /// Filled tiles adjacent to the cell, ordered up, right, down, left.
    #[must_use]
    pub fn neighbours(board: &Board, cell: GridCoord) -> Vec<Neighbour> {
        grid_view(board).neighbours(cell)
    }

    /// Cell currently holding a tentative tile, if any.
    #[must_use]
    pub fn staged_cell(board: &Board) -> Option<GridCoord> {
        board.staged.map(|staged| staged.cell)
    }

    /// Number of cells currently holding the category.
    #[must_use]
    pub fn kind_count(board: &Board, kind: TileKind) -> usize {
        grid_view(board).cells_of_kind(kind).count()
    }
}
