#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the portal board generator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the board executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! changed. Reachability and tile instantiation are delegated to collaborators
//! described by the [`ConnectivityOracle`] and [`TileRenderer`] traits.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest column index of the reference board layout.
pub const REFERENCE_COLUMNS: u32 = 34;

/// Largest row index of the reference board layout.
pub const REFERENCE_ROWS: u32 = 19;

const DEFAULT_SEED: u64 = 0x5eed_0f_b0a2d;
const DEFAULT_RETRY_FACTOR: u32 = 16;
const DEFAULT_WALL_COUNT: ObstacleCount = ObstacleCount::new(10, 20);

/// Commands that express all permissible board mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Populates every cell of the board from the layout and template set.
    FillGrid,
    /// Tentatively overwrites the category of a single cell.
    ///
    /// The previous tile is retained until the staging is committed or rolled
    /// back. Only one cell may be staged at a time.
    StageTile {
        /// Cell receiving the tentative category.
        cell: GridCoord,
        /// Category written into the cell.
        kind: TileKind,
    },
    /// Makes the staged tile permanent and swaps its rendered instance.
    CommitStaged,
    /// Restores the tile that occupied the staged cell before staging.
    RollbackStaged,
    /// Immediately swaps the tile at the provided cell for a new category.
    ReplaceTile {
        /// Cell receiving the new category.
        cell: GridCoord,
        /// Category written into the cell.
        kind: TileKind,
    },
}

/// Events reported by the board after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a fill pass visited every coordinate of the board.
    GridFilled {
        /// Number of cells that received a tile.
        filled: usize,
        /// Number of cells left empty because their template was missing.
        skipped: usize,
    },
    /// Reports that a cell could not be filled because no template exists for its category.
    TemplateMissing {
        /// Cell that was left empty.
        cell: GridCoord,
        /// Category that lacked a template.
        kind: TileKind,
    },
    /// Confirms that a tentative category was written into a cell.
    TileStaged {
        /// Cell holding the tentative category.
        cell: GridCoord,
        /// Category that was staged.
        kind: TileKind,
        /// Category the cell held before staging, if it was filled.
        previous: Option<TileKind>,
    },
    /// Reports that a staging request was rejected.
    StageRejected {
        /// Cell named in the request.
        cell: GridCoord,
        /// Category named in the request.
        kind: TileKind,
        /// Specific reason the request failed.
        reason: StageError,
    },
    /// Confirms that a tile was permanently placed and instantiated.
    TilePlaced {
        /// Cell that received the tile.
        cell: GridCoord,
        /// Category of the placed tile.
        kind: TileKind,
        /// Handle issued by the renderer for the new instance.
        handle: RenderHandle,
    },
    /// Confirms that a staged cell was restored to its previous tile.
    TileRestored {
        /// Cell that was restored.
        cell: GridCoord,
        /// Category the cell holds after restoration.
        kind: Option<TileKind>,
    },
    /// Reports that an immediate replacement request was rejected.
    ReplaceRejected {
        /// Cell named in the request.
        cell: GridCoord,
        /// Category named in the request.
        kind: TileKind,
        /// Specific reason the request failed.
        reason: StageError,
    },
}

/// Reasons a staging or replacement request may be rejected by the board.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum StageError {
    /// The requested cell lies outside the board.
    #[error("cell lies outside the board")]
    OutOfBounds,
    /// Another cell is currently staged and must be resolved first.
    #[error("another cell is already staged")]
    AlreadyStaged,
    /// The template set holds no template for the requested category.
    #[error("no template configured for the requested category")]
    MissingTemplate,
}

/// Signals that the connectivity oracle could not connect an origin to the network.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
#[error("no path from {origin}")]
pub struct NoPathError {
    /// Cell the path search started from.
    pub origin: GridCoord,
}

/// Errors raised while validating a board configuration.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The board is too small to hold an edge ring around an interior.
    #[error("board of {columns}x{rows} has no interior; both bounds must be at least 2")]
    DegenerateGrid {
        /// Requested largest column index.
        columns: u32,
        /// Requested largest row index.
        rows: u32,
    },
    /// An obstacle count range has its minimum above its maximum.
    #[error("obstacle count minimum {minimum} exceeds maximum {maximum}")]
    InvertedCount {
        /// Requested minimum.
        minimum: u32,
        /// Requested maximum.
        maximum: u32,
    },
    /// The placement retry factor must allow at least one draw per attempt.
    #[error("retry factor must be at least 1")]
    ZeroRetryFactor,
}

/// Cardinal directions on the board. Rows grow towards the north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards increasing row indices.
    North,
    /// Towards increasing column indices.
    East,
    /// Towards decreasing row indices.
    South,
    /// Towards decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in neighbour query order: up, right, down, left.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];
}

/// Location of a single board cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    column: u32,
    row: u32,
}

impl GridCoord {
    /// Creates a new board cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the adjacent cell in the provided direction, if it lies on the board.
    #[must_use]
    pub fn step(self, direction: Direction, dimensions: BoardDimensions) -> Option<Self> {
        let next = match direction {
            Direction::North => Self::new(self.column, self.row.checked_add(1)?),
            Direction::East => Self::new(self.column.checked_add(1)?, self.row),
            Direction::South => Self::new(self.column, self.row.checked_sub(1)?),
            Direction::West => Self::new(self.column.checked_sub(1)?, self.row),
        };
        dimensions.contains(next).then_some(next)
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Unvalidated point supplied by configuration before normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawPoint {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl RawPoint {
    /// Creates a new raw point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive bounds of the board.
///
/// `columns` and `rows` are the largest valid indices, so the board spans
/// `columns + 1` cells horizontally and `rows + 1` cells vertically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoardDimensions {
    columns: u32,
    rows: u32,
}

impl BoardDimensions {
    /// Bounds of the reference layout.
    pub const REFERENCE: Self = Self {
        columns: REFERENCE_COLUMNS,
        rows: REFERENCE_ROWS,
    };

    /// Creates validated board bounds.
    pub fn new(columns: u32, rows: u32) -> Result<Self, ConfigError> {
        if columns < 2 || rows < 2 || columns == u32::MAX || rows == u32::MAX {
            return Err(ConfigError::DegenerateGrid { columns, rows });
        }
        Ok(Self { columns, rows })
    }

    /// Largest valid column index.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Largest valid row index.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells along each row.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.columns + 1
    }

    /// Number of cells along each column.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.rows + 1
    }

    /// Total number of cells on the board.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let cells = u64::from(self.width()) * u64::from(self.height());
        usize::try_from(cells).unwrap_or(usize::MAX)
    }

    /// Number of cells strictly inside the edge ring.
    #[must_use]
    pub fn interior_cell_count(&self) -> usize {
        let cells = u64::from(self.columns - 1) * u64::from(self.rows - 1);
        usize::try_from(cells).unwrap_or(usize::MAX)
    }

    /// Reports whether the cell lies on the board.
    #[must_use]
    pub const fn contains(&self, cell: GridCoord) -> bool {
        cell.column() <= self.columns && cell.row() <= self.rows
    }

    /// Reports whether the cell lies on the outer edge ring.
    #[must_use]
    pub const fn is_boundary(&self, cell: GridCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.column() == self.columns
                || cell.row() == 0
                || cell.row() == self.rows)
    }

    /// Reports whether the cell lies strictly inside the edge ring.
    #[must_use]
    pub const fn is_interior(&self, cell: GridCoord) -> bool {
        cell.column() > 0
            && cell.column() < self.columns
            && cell.row() > 0
            && cell.row() < self.rows
    }

    /// Row-major storage offset of the cell.
    #[must_use]
    pub fn index(&self, cell: GridCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Every cell of the board in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> {
        let columns = self.columns;
        (0..=self.rows)
            .flat_map(move |row| (0..=columns).map(move |column| GridCoord::new(column, row)))
    }
}

/// Terrain category assigned to a board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    /// Open ground.
    Floor,
    /// Obstacle that blocks traversal.
    Wall,
    /// Edge opening that must stay connected to the bases.
    Portal,
    /// Edge cell acting as the destination for portal paths.
    Base,
}

impl TileKind {
    /// Every tile category.
    pub const ALL: [TileKind; 4] = [
        TileKind::Floor,
        TileKind::Wall,
        TileKind::Portal,
        TileKind::Base,
    ];

    /// Reports whether paths may cross a tile of this category.
    #[must_use]
    pub const fn is_traversable(self) -> bool {
        !matches!(self, TileKind::Wall)
    }
}

/// Opaque reference to an instance owned by the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RenderHandle(u64);

impl RenderHandle {
    /// Creates a new render handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

/// Logical contents of a filled board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    kind: TileKind,
    handle: Option<RenderHandle>,
}

impl Tile {
    /// Creates a tile of the provided category.
    ///
    /// Staged tiles carry no handle until they are committed.
    #[must_use]
    pub const fn new(kind: TileKind, handle: Option<RenderHandle>) -> Self {
        Self { kind, handle }
    }

    /// Category of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Rendered instance backing the tile, if one was created.
    #[must_use]
    pub const fn handle(&self) -> Option<RenderHandle> {
        self.handle
    }
}

/// Named prefab the rendering collaborator instantiates for a tile category.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileTemplate {
    /// Name used in diagnostics and by the renderer to pick visuals.
    pub name: String,
}

impl TileTemplate {
    /// Creates a template with the provided name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Templates for the four tile categories. Any of them may be absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSet {
    /// Template used for floor tiles.
    pub floor: Option<TileTemplate>,
    /// Template used for wall tiles.
    pub wall: Option<TileTemplate>,
    /// Template used for portal tiles.
    pub portal: Option<TileTemplate>,
    /// Template used for base tiles.
    pub base: Option<TileTemplate>,
}

impl TemplateSet {
    /// Template set with one template per category.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            floor: Some(TileTemplate::named("floorTile")),
            wall: Some(TileTemplate::named("wallTile")),
            portal: Some(TileTemplate::named("portalTile")),
            base: Some(TileTemplate::named("baseTile")),
        }
    }

    /// Template configured for the category, if any.
    #[must_use]
    pub fn get(&self, kind: TileKind) -> Option<&TileTemplate> {
        match kind {
            TileKind::Floor => self.floor.as_ref(),
            TileKind::Wall => self.wall.as_ref(),
            TileKind::Portal => self.portal.as_ref(),
            TileKind::Base => self.base.as_ref(),
        }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Half-open range `[minimum, maximum)` from which an obstacle count is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleCount {
    /// Smallest count that may be drawn.
    pub minimum: u32,
    /// Exclusive upper bound; equal to `minimum` to request exactly that many.
    pub maximum: u32,
}

impl ObstacleCount {
    /// Creates a new count range.
    #[must_use]
    pub const fn new(minimum: u32, maximum: u32) -> Self {
        Self { minimum, maximum }
    }

    /// Confirms that the range is not inverted.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.minimum > self.maximum {
            return Err(ConfigError::InvertedCount {
                minimum: self.minimum,
                maximum: self.maximum,
            });
        }
        Ok(self)
    }
}

/// One placement batch: a tile category scattered over the interior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleBatch {
    /// Category of the scattered tiles.
    #[serde(default = "wall_kind")]
    pub kind: TileKind,
    /// Range the number of placement attempts is drawn from.
    pub count: ObstacleCount,
}

fn wall_kind() -> TileKind {
    TileKind::Wall
}

/// Complete configuration surface consumed when setting up a board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Largest column index.
    pub columns: u32,
    /// Largest row index.
    pub rows: u32,
    /// Templates for the four tile categories.
    pub templates: TemplateSet,
    /// Placement batches executed in order.
    pub obstacles: Vec<ObstacleBatch>,
    /// Portal positions prior to normalization.
    pub portals: Vec<RawPoint>,
    /// Base positions prior to normalization.
    pub bases: Vec<RawPoint>,
    /// Seed for the placement random number generator.
    pub seed: u64,
    /// Number of candidate draws allowed per requested placement.
    pub retry_factor: u32,
}

impl BoardConfig {
    /// Validates the configuration and returns the board bounds it describes.
    pub fn validate(&self) -> Result<BoardDimensions, ConfigError> {
        let dimensions = BoardDimensions::new(self.columns, self.rows)?;
        for batch in &self.obstacles {
            let _ = batch.count.validate()?;
        }
        if self.retry_factor == 0 {
            return Err(ConfigError::ZeroRetryFactor);
        }
        Ok(dimensions)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        let middle_row = (REFERENCE_ROWS / 2) as i32;
        Self {
            columns: REFERENCE_COLUMNS,
            rows: REFERENCE_ROWS,
            templates: TemplateSet::standard(),
            obstacles: vec![ObstacleBatch {
                kind: TileKind::Wall,
                count: DEFAULT_WALL_COUNT,
            }],
            portals: vec![RawPoint::new(0, middle_row)],
            bases: vec![RawPoint::new(REFERENCE_COLUMNS as i32, middle_row)],
            seed: DEFAULT_SEED,
            retry_factor: DEFAULT_RETRY_FACTOR,
        }
    }
}

/// Tile found next to a queried cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbour {
    /// Direction of the neighbour relative to the queried cell.
    pub direction: Direction,
    /// Coordinate of the neighbour.
    pub cell: GridCoord,
    /// Tile stored at the neighbour.
    pub tile: Tile,
}

/// Read-only view into the dense board storage.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    tiles: &'a [Option<Tile>],
    dimensions: BoardDimensions,
}

impl<'a> GridView<'a> {
    /// Captures a new view backed by row-major tile storage.
    #[must_use]
    pub fn new(tiles: &'a [Option<Tile>], dimensions: BoardDimensions) -> Self {
        Self { tiles, dimensions }
    }

    /// Bounds of the viewed board.
    #[must_use]
    pub const fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    /// Tile stored at the cell, or `None` when the cell is empty or off the board.
    #[must_use]
    pub fn tile(&self, cell: GridCoord) -> Option<Tile> {
        self.dimensions
            .index(cell)
            .and_then(|index| self.tiles.get(index).copied().flatten())
    }

    /// Category stored at the cell, if any.
    #[must_use]
    pub fn kind(&self, cell: GridCoord) -> Option<TileKind> {
        self.tile(cell).map(|tile| tile.kind())
    }

    /// Reports whether a path may cross the cell. Empty cells block.
    #[must_use]
    pub fn is_traversable(&self, cell: GridCoord) -> bool {
        self.kind(cell).is_some_and(TileKind::is_traversable)
    }

    /// Iterates every coordinate with its stored tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, Option<Tile>)> + 'a {
        let tiles = self.tiles;
        let dimensions = self.dimensions;
        dimensions.cells().map(move |cell| {
            let tile = dimensions
                .index(cell)
                .and_then(|index| tiles.get(index).copied().flatten());
            (cell, tile)
        })
    }

    /// Cells currently holding the provided category.
    pub fn cells_of_kind(&self, kind: TileKind) -> impl Iterator<Item = GridCoord> + 'a {
        self.iter()
            .filter(move |(_, tile)| tile.is_some_and(|tile| tile.kind() == kind))
            .map(|(cell, _)| cell)
    }

    /// Filled tiles orthogonally adjacent to the cell, ordered up, right, down, left.
    #[must_use]
    pub fn neighbours(&self, cell: GridCoord) -> Vec<Neighbour> {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                let neighbour = cell.step(direction, self.dimensions)?;
                let tile = self.tile(neighbour)?;
                Some(Neighbour {
                    direction,
                    cell: neighbour,
                    tile,
                })
            })
            .collect()
    }
}

/// Collaborator that answers reachability questions about a board snapshot.
pub trait ConnectivityOracle {
    /// Recomputes the set of cells reachable from the portals and caches it.
    fn recompute_reachability(&mut self, grid: GridView<'_>, portals: &[GridCoord]);

    /// Attempts to connect the origin to the traversable network.
    fn establish_path(
        &mut self,
        grid: GridView<'_>,
        origin: GridCoord,
    ) -> Result<(), NoPathError>;

    /// Cells reachable from the portals as of the last recompute.
    fn reachable_set(&self) -> &BTreeSet<GridCoord>;
}

/// Collaborator that owns the visual instances backing board tiles.
pub trait TileRenderer {
    /// Creates an instance of the template at the cell and returns its handle.
    fn instantiate(
        &mut self,
        kind: TileKind,
        template: &TileTemplate,
        cell: GridCoord,
    ) -> RenderHandle;

    /// Destroys a previously created instance.
    fn destroy(&mut self, handle: RenderHandle);
}
