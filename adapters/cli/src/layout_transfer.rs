use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use portal_board_core::{BoardDimensions, GridCoord, Tile, TileKind};
use portal_board_world::{query, Board};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "board";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "board:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of a generated board in a form that fits on a single line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BoardSnapshot {
    dimensions: BoardDimensions,
    payload: SerializableSnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SerializableSnapshot {
    tiles: Vec<Option<TileKind>>,
    portals: Vec<GridCoord>,
    bases: Vec<GridCoord>,
}

impl BoardSnapshot {
    /// Captures the categories, portals and bases of the board.
    #[must_use]
    pub(crate) fn capture(board: &Board) -> Self {
        Self {
            dimensions: query::dimensions(board),
            payload: SerializableSnapshot {
                tiles: query::grid_view(board)
                    .iter()
                    .map(|(_, tile)| tile.map(|tile| tile.kind()))
                    .collect(),
                portals: query::portal_positions(board).to_vec(),
                bases: query::base_positions(board).to_vec(),
            },
        }
    }

    /// Bounds of the captured board.
    #[must_use]
    pub(crate) const fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    /// Row-major tiles without render handles, ready for a grid view.
    #[must_use]
    pub(crate) fn tiles(&self) -> Vec<Option<Tile>> {
        self.payload
            .tiles
            .iter()
            .map(|kind| kind.map(|kind| Tile::new(kind, None)))
            .collect()
    }

    /// Encodes the snapshot into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let json = serde_json::to_vec(&self.payload).map_err(LayoutTransferError::Serialize)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.dimensions.columns(),
            self.dimensions.rows()
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let dimensions = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let payload: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        if payload.tiles.len() != dimensions.cell_count() {
            return Err(LayoutTransferError::TileCountMismatch {
                expected: dimensions.cell_count(),
                actual: payload.tiles.len(),
            });
        }
        if let Some(cell) = payload
            .portals
            .iter()
            .chain(&payload.bases)
            .find(|cell| !dimensions.is_boundary(**cell))
        {
            return Err(LayoutTransferError::OffRing(*cell));
        }

        Ok(Self {
            dimensions,
            payload,
        })
    }
}

/// Errors that can occur while encoding or decoding layout transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout payload was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The number of tiles does not match the grid dimensions.
    #[error("layout holds {actual} tiles but its dimensions need {expected}")]
    TileCountMismatch {
        /// Cells described by the dimensions.
        expected: usize,
        /// Tiles found in the payload.
        actual: usize,
    },
    /// A portal or base lies off the edge ring.
    #[error("portal or base at {0} is not on the edge ring")]
    OffRing(GridCoord),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The snapshot could not be serialised.
    #[error("could not serialise layout payload: {0}")]
    Serialize(#[source] serde_json::Error),
}

fn parse_dimensions(dimensions: &str) -> Result<BoardDimensions, LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    BoardDimensions::new(columns, rows).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_board_core::{
        Command, RawPoint, RenderHandle, TemplateSet, TileRenderer, TileTemplate,
    };
    use portal_board_world::{self as world, BoardLayout};

    #[derive(Default)]
    struct CountingRenderer {
        next: u64,
    }

    impl TileRenderer for CountingRenderer {
        fn instantiate(
            &mut self,
            _: TileKind,
            _: &TileTemplate,
            _: GridCoord,
        ) -> RenderHandle {
            self.next += 1;
            RenderHandle::new(self.next)
        }

        fn destroy(&mut self, _: RenderHandle) {}
    }

    fn board(templates: TemplateSet) -> Board {
        let dimensions = BoardDimensions::new(5, 3).expect("valid dimensions");
        let layout =
            BoardLayout::normalized(dimensions, &[RawPoint::new(0, 1)], &[RawPoint::new(5, 2)]);
        let mut board = Board::new(layout, templates);
        let mut events = Vec::new();
        world::apply(
            &mut board,
            &mut CountingRenderer::default(),
            Command::FillGrid,
            &mut events,
        );
        board
    }

    fn encode(payload: &str, dimensions: &str) -> String {
        format!("{SNAPSHOT_HEADER}:{dimensions}:{}", STANDARD_NO_PAD.encode(payload))
    }

    #[test]
    fn captured_board_survives_transfer() {
        let snapshot = BoardSnapshot::capture(&board(TemplateSet::standard()));

        let encoded = snapshot.encode().expect("snapshot encodes");
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:5x3:")));

        let decoded = BoardSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(decoded, snapshot);
        assert_eq!(decoded.tiles().len(), 24);
        assert_eq!(
            decoded.tiles()[6],
            Some(Tile::new(TileKind::Portal, None)),
            "row 1 starts with the portal"
        );
    }

    #[test]
    fn empty_cells_are_preserved() {
        let templates = TemplateSet {
            floor: None,
            ..TemplateSet::standard()
        };
        let snapshot = BoardSnapshot::capture(&board(templates));

        let encoded = snapshot.encode().expect("snapshot encodes");
        let decoded = BoardSnapshot::decode(&encoded).expect("snapshot decodes");

        assert_eq!(decoded.tiles().iter().filter(|tile| tile.is_none()).count(), 8);
    }

    #[test]
    fn rejects_foreign_prefix_and_version() {
        assert!(matches!(
            BoardSnapshot::decode("grid:v1:5x3:e30"),
            Err(LayoutTransferError::InvalidPrefix(prefix)) if prefix == "grid"
        ));
        assert!(matches!(
            BoardSnapshot::decode("board:v2:5x3:e30"),
            Err(LayoutTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            BoardSnapshot::decode("   "),
            Err(LayoutTransferError::EmptyPayload)
        ));
        assert!(matches!(
            BoardSnapshot::decode("board:v1"),
            Err(LayoutTransferError::MissingDimensions)
        ));
    }

    #[test]
    fn rejects_boards_without_interior() {
        let encoded = encode(r#"{"tiles":[],"portals":[],"bases":[]}"#, "1x3");

        assert!(matches!(
            BoardSnapshot::decode(&encoded),
            Err(LayoutTransferError::InvalidDimensions(dimensions)) if dimensions == "1x3"
        ));
    }

    #[test]
    fn rejects_tile_count_mismatch() {
        let encoded = encode(r#"{"tiles":["wall","floor"],"portals":[],"bases":[]}"#, "2x2");

        assert!(matches!(
            BoardSnapshot::decode(&encoded),
            Err(LayoutTransferError::TileCountMismatch {
                expected: 9,
                actual: 2
            })
        ));
    }

    #[test]
    fn rejects_interior_portals() {
        let tiles = vec!["\"wall\""; 9].join(",");
        let payload = format!(
            r#"{{"tiles":[{tiles}],"portals":[{{"column":1,"row":1}}],"bases":[]}}"#
        );
        let encoded = encode(&payload, "2x2");

        assert!(matches!(
            BoardSnapshot::decode(&encoded),
            Err(LayoutTransferError::OffRing(cell)) if cell == GridCoord::new(1, 1)
        ));
    }
}
