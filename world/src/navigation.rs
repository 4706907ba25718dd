//! Breadth-first connectivity oracle backing board generation.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use portal_board_core::{ConnectivityOracle, Direction, GridCoord, GridView, NoPathError, TileKind};

/// Dense flood-fill oracle seeded from the portals.
///
/// Reachability is a multi-source breadth-first search over traversable tiles.
/// Distances default to `u32::MAX` for unreachable cells so callers can tell
/// walls and sealed pockets apart from open ground. Paths are only accepted
/// when every base on the board can be reached from the origin.
#[derive(Clone, Debug, Default)]
pub struct FloodFillOracle {
    width: u32,
    distances: Vec<u32>,
    reachable: BTreeSet<GridCoord>,
    paths: BTreeMap<GridCoord, Vec<GridCoord>>,
}

impl FloodFillOracle {
    /// Creates an oracle with nothing computed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance from the nearest portal as of the last recompute.
    #[must_use]
    pub fn distance(&self, cell: GridCoord) -> Option<u32> {
        let width = usize::try_from(self.width).ok()?;
        index(width, cell).and_then(|offset| self.distances.get(offset).copied())
    }

    /// Shortest path from the origin to its nearest base, recorded by the last
    /// successful [`ConnectivityOracle::establish_path`] call for that origin.
    #[must_use]
    pub fn path_from(&self, origin: GridCoord) -> Option<&[GridCoord]> {
        self.paths.get(&origin).map(Vec::as_slice)
    }
}

impl ConnectivityOracle for FloodFillOracle {
    fn recompute_reachability(&mut self, grid: GridView<'_>, portals: &[GridCoord]) {
        let flood = Flood::from_sources(grid, portals);
        self.width = grid.dimensions().width();
        self.reachable = flood.reached().collect();
        self.distances = flood.distances;
        self.paths.clear();
    }

    fn establish_path(
        &mut self,
        grid: GridView<'_>,
        origin: GridCoord,
    ) -> Result<(), NoPathError> {
        let no_path = NoPathError { origin };
        let bases: Vec<GridCoord> = grid.cells_of_kind(TileKind::Base).collect();
        if bases.is_empty() {
            return Err(no_path);
        }

        let flood = Flood::from_sources(grid, &[origin]);
        let mut nearest: Option<(u32, GridCoord)> = None;
        for base in bases {
            let distance = flood.distance(base).ok_or(no_path)?;
            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, base));
            }
        }

        let (_, base) = nearest.ok_or(no_path)?;
        let path = flood.path_to(base).ok_or(no_path)?;
        let _ = self.paths.insert(origin, path);
        Ok(())
    }

    fn reachable_set(&self) -> &BTreeSet<GridCoord> {
        &self.reachable
    }
}

struct Flood {
    width: usize,
    distances: Vec<u32>,
    predecessors: Vec<Option<GridCoord>>,
    cells: Vec<GridCoord>,
}

impl Flood {
    fn from_sources(grid: GridView<'_>, sources: &[GridCoord]) -> Self {
        let dimensions = grid.dimensions();
        let width = usize::try_from(dimensions.width()).unwrap_or(0);
        let cell_count = dimensions.cell_count();
        let mut flood = Self {
            width,
            distances: vec![u32::MAX; cell_count],
            predecessors: vec![None; cell_count],
            cells: dimensions.cells().collect(),
        };

        let mut queue = VecDeque::new();
        for &source in sources {
            if !grid.is_traversable(source) {
                continue;
            }
            let Some(source_index) = index(width, source) else {
                continue;
            };
            if flood.distances[source_index] == 0 {
                continue;
            }
            flood.distances[source_index] = 0;
            queue.push_back(source);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(width, cell) else {
                continue;
            };
            let current_distance = flood.distances[current_index];
            if current_distance >= u32::MAX.saturating_sub(1) {
                continue;
            }
            let next_distance = current_distance + 1;

            for direction in Direction::ALL {
                let Some(neighbour) = cell.step(direction, dimensions) else {
                    continue;
                };
                if !grid.is_traversable(neighbour) {
                    continue;
                }
                let Some(neighbour_index) = index(width, neighbour) else {
                    continue;
                };
                if flood.distances[neighbour_index] <= next_distance {
                    continue;
                }
                flood.distances[neighbour_index] = next_distance;
                flood.predecessors[neighbour_index] = Some(cell);
                queue.push_back(neighbour);
            }
        }

        flood
    }

    fn distance(&self, cell: GridCoord) -> Option<u32> {
        index(self.width, cell)
            .and_then(|offset| self.distances.get(offset).copied())
            .filter(|distance| *distance != u32::MAX)
    }

    fn reached(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.cells
            .iter()
            .zip(&self.distances)
            .filter(|(_, distance)| **distance != u32::MAX)
            .map(|(cell, _)| *cell)
    }

    fn path_to(&self, destination: GridCoord) -> Option<Vec<GridCoord>> {
        let _ = self.distance(destination)?;
        let mut path = vec![destination];
        let mut cursor = destination;
        while let Some(previous) = index(self.width, cursor)
            .and_then(|offset| self.predecessors.get(offset).copied().flatten())
        {
            path.push(previous);
            cursor = previous;
        }
        path.reverse();
        Some(path)
    }
}

fn index(width: usize, cell: GridCoord) -> Option<usize> {
    let column = usize::try_from(cell.column()).ok()?;
    if column >= width {
        return None;
    }
    let row = usize::try_from(cell.row()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_board_core::{BoardDimensions, Tile};

    fn board(rows: &[&str]) -> (Vec<Option<Tile>>, BoardDimensions) {
        let columns = u32::try_from(rows[0].len() - 1).expect("small board");
        let top = u32::try_from(rows.len() - 1).expect("small board");
        let dimensions = BoardDimensions::new(columns, top).expect("valid dimensions");
        let mut tiles = vec![None; dimensions.cell_count()];
        for (offset, line) in rows.iter().enumerate() {
            let row = top - u32::try_from(offset).expect("small board");
            for (column, glyph) in line.chars().enumerate() {
                let kind = match glyph {
                    '.' => TileKind::Floor,
                    '#' => TileKind::Wall,
                    'P' => TileKind::Portal,
                    'B' => TileKind::Base,
                    _ => continue,
                };
                let cell = GridCoord::new(u32::try_from(column).expect("small board"), row);
                let slot = dimensions.index(cell).expect("on board");
                tiles[slot] = Some(Tile::new(kind, None));
            }
        }
        (tiles, dimensions)
    }

    #[test]
    fn recompute_seeds_portals_at_zero() {
        let (tiles, dimensions) = board(&["#####", "P...B", "#####"]);
        let mut oracle = FloodFillOracle::new();

        oracle.recompute_reachability(GridView::new(&tiles, dimensions), &[GridCoord::new(0, 1)]);

        assert_eq!(oracle.distance(GridCoord::new(0, 1)), Some(0));
        assert_eq!(oracle.distance(GridCoord::new(3, 1)), Some(3));
        assert_eq!(oracle.distance(GridCoord::new(2, 2)), Some(u32::MAX));
        assert_eq!(oracle.reachable_set().len(), 5);
        assert!(oracle.reachable_set().contains(&GridCoord::new(4, 1)));
    }

    #[test]
    fn recompute_respects_walls_and_empty_cells() {
        let (tiles, dimensions) = board(&["#####", "P.#.B", "#.?.#", "#####"]);
        let mut oracle = FloodFillOracle::new();

        oracle.recompute_reachability(GridView::new(&tiles, dimensions), &[GridCoord::new(0, 2)]);

        let reachable = oracle.reachable_set();
        assert!(reachable.contains(&GridCoord::new(1, 1)));
        assert!(!reachable.contains(&GridCoord::new(2, 1)), "empty slot blocks");
        assert!(!reachable.contains(&GridCoord::new(4, 2)));
    }

    #[test]
    fn establish_path_records_route_to_nearest_base() {
        let (tiles, dimensions) = board(&["#####", "P...B", "#...#", "#B###"]);
        let view = GridView::new(&tiles, dimensions);
        let mut oracle = FloodFillOracle::new();
        let origin = GridCoord::new(0, 2);

        assert_eq!(oracle.establish_path(view, origin), Ok(()));

        let path = oracle.path_from(origin).expect("path recorded");
        assert_eq!(path.first(), Some(&origin));
        assert_eq!(path.last(), Some(&GridCoord::new(1, 0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn establish_path_requires_every_base() {
        let (tiles, dimensions) = board(&["#####", "P.#.B", "#.#.#", "#B###"]);
        let view = GridView::new(&tiles, dimensions);
        let mut oracle = FloodFillOracle::new();
        let origin = GridCoord::new(0, 2);

        assert_eq!(oracle.establish_path(view, origin), Err(NoPathError { origin }));
        assert!(oracle.path_from(origin).is_none());
    }

    #[test]
    fn establish_path_fails_without_bases() {
        let (tiles, dimensions) = board(&["####", "P..#", "####"]);
        let origin = GridCoord::new(0, 1);
        let mut oracle = FloodFillOracle::new();

        assert_eq!(
            oracle.establish_path(GridView::new(&tiles, dimensions), origin),
            Err(NoPathError { origin })
        );
    }

    #[test]
    fn long_corridors_stay_reachable() {
        let columns = 70_000;
        let dimensions = BoardDimensions::new(columns, 2).expect("valid dimensions");
        let mut tiles = vec![Some(Tile::new(TileKind::Wall, None)); dimensions.cell_count()];
        for column in 0..=columns {
            let kind = match column {
                0 => TileKind::Portal,
                last if last == columns => TileKind::Base,
                _ => TileKind::Floor,
            };
            let slot = dimensions.index(GridCoord::new(column, 1)).expect("on board");
            tiles[slot] = Some(Tile::new(kind, None));
        }
        let view = GridView::new(&tiles, dimensions);
        let origin = GridCoord::new(0, 1);
        let mut oracle = FloodFillOracle::new();

        oracle.recompute_reachability(view, &[origin]);

        assert_eq!(oracle.reachable_set().len(), 70_001);
        assert_eq!(oracle.distance(GridCoord::new(columns, 1)), Some(70_000));
        assert_eq!(oracle.establish_path(view, origin), Ok(()));
        assert_eq!(oracle.path_from(origin).map(<[GridCoord]>::len), Some(70_001));
    }
}
