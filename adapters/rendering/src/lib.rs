#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering collaborator for the portal board generator.
//!
//! [`SceneRenderer`] stands in for an engine scene graph: it hands out
//! [`RenderHandle`] values for instantiated tiles, tracks every live instance
//! with its world-space placement, and counts destroyed instances so callers
//! can check that board mutations never leak visuals. [`render_ascii`] turns a
//! board view into a text frame for terminals and tests.

use std::collections::BTreeMap;

use glam::Vec2;
use portal_board_core::{GridCoord, GridView, RenderHandle, TileKind, TileRenderer, TileTemplate};
use thiserror::Error;

/// RGBA color used when presenting tiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Default tint for a tile category.
    #[must_use]
    pub const fn for_kind(kind: TileKind) -> Self {
        match kind {
            TileKind::Floor => Self::from_rgb_u8(0x3b, 0x3f, 0x46),
            TileKind::Wall => Self::from_rgb_u8(0x8d, 0x6e, 0x63),
            TileKind::Portal => Self::from_rgb_u8(0x58, 0x47, 0xff),
            TileKind::Base => Self::from_rgb_u8(0x2f, 0x95, 0x32),
        }
    }
}

/// Errors raised while configuring the renderer.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive side length.
    #[error("tile length must be positive, got {tile_length}")]
    InvalidTileLength {
        /// Rejected length.
        tile_length: f32,
    },
}

/// Live tile instance tracked by the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneTile {
    /// Name of the template the instance was created from.
    pub template: String,
    /// Category the instance represents.
    pub kind: TileKind,
    /// Board cell the instance sits on.
    pub cell: GridCoord,
    /// Centre of the instance in world units.
    pub position: Vec2,
    /// Tint applied to the instance.
    pub color: Color,
}

/// In-memory scene that owns tile instances on behalf of the board.
#[derive(Clone, Debug)]
pub struct SceneRenderer {
    tile_length: f32,
    next_handle: u64,
    live: BTreeMap<RenderHandle, SceneTile>,
    destroyed: usize,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self {
            tile_length: 1.0,
            next_handle: 0,
            live: BTreeMap::new(),
            destroyed: 0,
        }
    }
}

impl SceneRenderer {
    /// Creates a scene whose tiles measure `tile_length` world units per side.
    pub fn new(tile_length: f32) -> Result<Self, RenderingError> {
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }
        Ok(Self {
            tile_length,
            ..Self::default()
        })
    }

    /// Instance registered under the handle, if it is still alive.
    #[must_use]
    pub fn instance(&self, handle: RenderHandle) -> Option<&SceneTile> {
        self.live.get(&handle)
    }

    /// Iterator over live instances in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (RenderHandle, &SceneTile)> {
        self.live.iter().map(|(handle, tile)| (*handle, tile))
    }

    /// Number of instances currently alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of instances destroyed so far.
    #[must_use]
    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    /// World-space centre of the cell.
    #[must_use]
    pub fn world_position(&self, cell: GridCoord) -> Vec2 {
        Vec2::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5) * self.tile_length
    }
}

impl TileRenderer for SceneRenderer {
    fn instantiate(
        &mut self,
        kind: TileKind,
        template: &TileTemplate,
        cell: GridCoord,
    ) -> RenderHandle {
        self.next_handle += 1;
        let handle = RenderHandle::new(self.next_handle);
        let tile = SceneTile {
            template: template.name.clone(),
            kind,
            cell,
            position: self.world_position(cell),
            color: Color::for_kind(kind),
        };
        let _ = self.live.insert(handle, tile);
        handle
    }

    fn destroy(&mut self, handle: RenderHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }
}

/// Glyph used for a tile category in text frames.
#[must_use]
pub const fn glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Floor => '.',
        TileKind::Wall => '#',
        TileKind::Portal => 'P',
        TileKind::Base => 'B',
    }
}

/// Renders the board as text with the highest row first. Empty cells print as `?`.
#[must_use]
pub fn render_ascii(view: GridView<'_>) -> String {
    let dimensions = view.dimensions();
    let mut frame = String::with_capacity(dimensions.cell_count() + dimensions.height() as usize);
    for row in (0..=dimensions.rows()).rev() {
        for column in 0..=dimensions.columns() {
            let symbol = view.kind(GridCoord::new(column, row)).map_or('?', glyph);
            frame.push(symbol);
        }
        frame.push('\n');
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_board_core::{BoardDimensions, Tile};

    #[test]
    fn scene_tracks_live_and_destroyed_instances() {
        let mut scene = SceneRenderer::new(2.0).expect("valid tile length");
        let template = TileTemplate::named("wallTile");

        let first = scene.instantiate(TileKind::Wall, &template, GridCoord::new(1, 2));
        let second = scene.instantiate(TileKind::Wall, &template, GridCoord::new(0, 0));
        scene.destroy(first);
        scene.destroy(first);

        assert_ne!(first, second);
        assert_eq!(scene.live_count(), 1);
        assert_eq!(scene.destroyed_count(), 1);
        assert!(scene.instance(first).is_none());
        let survivor = scene.instance(second).expect("live instance");
        assert_eq!(survivor.template, "wallTile");
        assert_eq!(survivor.position, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn scene_rejects_non_positive_tile_length() {
        assert_eq!(
            SceneRenderer::new(0.0).err(),
            Some(RenderingError::InvalidTileLength { tile_length: 0.0 })
        );
        assert!(SceneRenderer::new(f32::NAN).is_err());
    }

    #[test]
    fn categories_have_distinct_glyphs_and_tints() {
        for (offset, kind) in TileKind::ALL.iter().enumerate() {
            for other in &TileKind::ALL[offset + 1..] {
                assert_ne!(glyph(*kind), glyph(*other));
                assert_ne!(Color::for_kind(*kind), Color::for_kind(*other));
            }
            assert_ne!(glyph(*kind), '?');
        }
    }

    #[test]
    fn ascii_frame_prints_top_row_first() {
        let dimensions = BoardDimensions::new(2, 2).expect("valid dimensions");
        let mut tiles = vec![Some(Tile::new(TileKind::Wall, None)); dimensions.cell_count()];
        let set = |tiles: &mut Vec<Option<Tile>>, column, row, tile| {
            let index = dimensions
                .index(GridCoord::new(column, row))
                .expect("on board");
            tiles[index] = tile;
        };
        set(&mut tiles, 1, 1, Some(Tile::new(TileKind::Floor, None)));
        set(&mut tiles, 0, 1, Some(Tile::new(TileKind::Portal, None)));
        set(&mut tiles, 2, 1, Some(Tile::new(TileKind::Base, None)));
        set(&mut tiles, 1, 2, None);

        let frame = render_ascii(GridView::new(&tiles, dimensions));

        assert_eq!(frame, "#?#\nP.B\n###\n");
    }
}
