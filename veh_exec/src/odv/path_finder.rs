//! Finds shortest tile paths through a [`GridMap`] using a breadth-first search.
//!
//! Neighbours are expanded in the order East, North, West, South, so among paths of equal length
//! the one found first is always the same. Only walkable tiles are expanded. The goal is checked
//! before the walkable filter, which lets a path end on the home tile.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{Direction, GridMap, GridTile, TilePosition};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PathFinder {
    grid: Arc<GridMap>,
}

/// One step of a path: the tile moved onto and the direction taken to get there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    pub tile: TilePosition,
    pub direction: Direction,
}

/// An ordered list of hops, not including the start tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub hops: Vec<Hop>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathFinderReport {
    pub start: TilePosition,

    pub goal: TilePosition,

    /// Number of tiles taken off the search frontier
    pub num_expanded: usize,

    pub result: Option<Path>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathFinderError {
    #[error("No path from {start} to {goal}")]
    Unreachable {
        start: TilePosition,
        goal: TilePosition,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PathFinder {
    pub fn new(grid: Arc<GridMap>) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// Find the shortest path from `start` to `goal`.
    ///
    /// An empty path is returned if `start` and `goal` are the same tile.
    pub fn shortest_path(
        &self,
        start: TilePosition,
        goal: TilePosition,
    ) -> Result<Path, PathFinderError> {
        self.search(start, goal).0
    }

    /// As [`PathFinder::shortest_path`], also returning a report of the search.
    pub fn shortest_path_with_report(
        &self,
        start: TilePosition,
        goal: TilePosition,
    ) -> (Result<Path, PathFinderError>, PathFinderReport) {
        let (result, num_expanded) = self.search(start, goal);

        let report = PathFinderReport {
            start,
            goal,
            num_expanded,
            result: result.as_ref().ok().cloned(),
        };

        (result, report)
    }

    fn search(
        &self,
        start: TilePosition,
        goal: TilePosition,
    ) -> (Result<Path, PathFinderError>, usize) {
        if start == goal {
            return (Ok(Path::default()), 0);
        }

        // Map from tile to the tile it was reached from, which also acts as the visited set
        let mut came_from: HashMap<TilePosition, Option<Hop>> = HashMap::new();
        came_from.insert(start, None);

        let mut frontier = VecDeque::new();
        frontier.push_back(start);

        let mut num_expanded = 0;

        while let Some(current) = frontier.pop_front() {
            num_expanded += 1;

            for (next, direction) in self.grid.neighbours(current) {
                if came_from.contains_key(&next) {
                    continue;
                }

                let tile = self.grid.tile_at(next);

                if next == goal && tile != GridTile::Wall {
                    came_from.insert(
                        next,
                        Some(Hop {
                            tile: current,
                            direction,
                        }),
                    );
                    let path = Self::reconstruct(&came_from, goal);
                    debug!(
                        "Path from {} to {} found, {} hops, {} tiles expanded",
                        start,
                        goal,
                        path.len(),
                        num_expanded
                    );
                    return (Ok(path), num_expanded);
                }

                if tile.is_walkable() {
                    trace!("Expanding {} -> {} ({:?})", current, next, direction);
                    came_from.insert(
                        next,
                        Some(Hop {
                            tile: current,
                            direction,
                        }),
                    );
                    frontier.push_back(next);
                }
            }
        }

        (Err(PathFinderError::Unreachable { start, goal }), num_expanded)
    }

    /// Walk back from the goal. Each entry in `came_from` holds the previous tile and the
    /// direction taken from it.
    fn reconstruct(came_from: &HashMap<TilePosition, Option<Hop>>, goal: TilePosition) -> Path {
        let mut hops = Vec::new();
        let mut tile = goal;

        while let Some(Some(prev)) = came_from.get(&tile) {
            hops.push(Hop {
                tile,
                direction: prev.direction,
            });
            tile = prev.tile;
        }

        hops.reverse();

        Path { hops }
    }
}

impl Path {
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Hop> {
        self.hops.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hop> {
        self.hops.iter()
    }

    /// True if the hop after `index` is in the same direction as hop `index`.
    pub fn continues_straight(&self, index: usize) -> bool {
        match (self.hops.get(index), self.hops.get(index + 1)) {
            (Some(a), Some(b)) => a.direction == b.direction,
            _ => false,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::odv::DEFAULT_GRID;
    use std::collections::HashSet;

    fn finder(lines: &[&str]) -> PathFinder {
        PathFinder::new(Arc::new(GridMap::load(lines).unwrap()))
    }

    fn hop(x: i32, y: i32, direction: Direction) -> Hop {
        Hop {
            tile: TilePosition::new(x, y),
            direction,
        }
    }

    #[test]
    fn test_home_to_load() {
        let pf = finder(&DEFAULT_GRID);
        let path = pf
            .shortest_path(TilePosition::new(0, 1), TilePosition::new(1, 0))
            .unwrap();

        assert_eq!(
            path.hops,
            vec![hop(1, 1, Direction::East), hop(1, 0, Direction::North)]
        );
    }

    #[test]
    fn test_home_to_unload() {
        let pf = finder(&DEFAULT_GRID);
        let path = pf
            .shortest_path(TilePosition::new(0, 1), TilePosition::new(5, 0))
            .unwrap();

        let tiles: Vec<(i32, i32)> = path.iter().map(|h| (h.tile.x, h.tile.y)).collect();
        assert_eq!(
            tiles,
            vec![
                (1, 1),
                (1, 0),
                (2, 0),
                (3, 0),
                (3, 1),
                (3, 2),
                (4, 2),
                (5, 2),
                (5, 1),
                (5, 0)
            ]
        );
        assert_eq!(path.get(0).map(|h| h.direction), Some(Direction::East));
        assert_eq!(path.get(9).map(|h| h.direction), Some(Direction::North));
    }

    #[test]
    fn test_return_home_enters_home_as_goal() {
        let pf = finder(&DEFAULT_GRID);
        let path = pf
            .shortest_path(TilePosition::new(5, 0), TilePosition::new(0, 1))
            .unwrap();

        assert_eq!(path.len(), 10);
        assert_eq!(path.hops.last(), Some(&hop(0, 1, Direction::West)));
    }

    #[test]
    fn test_shortest_on_open_ring() {
        let pf = finder(&["H##", "#X#", "L#U"]);
        let start = TilePosition::new(0, 0);
        let goal = TilePosition::new(2, 2);

        let path = pf.shortest_path(start, goal).unwrap();

        assert_eq!(path.len(), 4);

        let mut seen = HashSet::new();
        let mut prev = start;
        for h in path.iter() {
            assert!(seen.insert(h.tile));
            assert_eq!(prev.step(h.direction), h.tile);
            prev = h.tile;
        }
        assert_eq!(prev, goal);

        // East is tried first so the top row is taken
        assert_eq!(path.get(0), Some(&hop(1, 0, Direction::East)));
    }

    #[test]
    fn test_unreachable() {
        let pf = finder(&["H#XXX", "##X#X", "L#XXX", "###XU"]);
        let start = TilePosition::new(0, 0);
        let goal = TilePosition::new(3, 1);

        assert_eq!(
            pf.shortest_path(start, goal),
            Err(PathFinderError::Unreachable { start, goal })
        );

        // Walls are never a goal
        assert!(pf
            .shortest_path(start, TilePosition::new(2, 0))
            .is_err());
    }

    #[test]
    fn test_start_is_goal() {
        let pf = finder(&DEFAULT_GRID);
        let home = TilePosition::new(0, 1);

        assert!(pf.shortest_path(home, home).unwrap().is_empty());
    }

    #[test]
    fn test_home_is_not_a_waypoint() {
        // The only route from L to U passes through H
        let pf = finder(&["L#", "H#", "U#"]);
        let path = pf
            .shortest_path(TilePosition::new(0, 0), TilePosition::new(0, 2))
            .unwrap();

        assert!(path.iter().all(|h| h.tile != TilePosition::new(0, 1)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_continues_straight() {
        let pf = finder(&DEFAULT_GRID);
        let path = pf
            .shortest_path(TilePosition::new(0, 1), TilePosition::new(5, 0))
            .unwrap();

        // E, N, E, E, S, S, E, E, N, N
        let straight: Vec<bool> = (0..path.len()).map(|i| path.continues_straight(i)).collect();
        assert_eq!(
            straight,
            vec![false, false, true, false, true, false, true, false, true, false]
        );
    }

    #[test]
    fn test_report() {
        let pf = finder(&DEFAULT_GRID);
        let (result, report) =
            pf.shortest_path_with_report(TilePosition::new(0, 1), TilePosition::new(1, 0));

        assert_eq!(report.result.as_ref(), result.as_ref().ok());
        assert!(report.num_expanded >= 1);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"num_expanded\""));
    }
}
