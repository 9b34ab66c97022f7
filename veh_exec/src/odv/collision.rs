//! # Collision checking
//!
//! Before every manual move the vehicle footprint is shifted one fine unit in the requested
//! direction and the tiles under its four corners are classified. The move is allowed when all
//! four corners are on walkable tiles, or when the home tile is involved and the move matches one
//! of the home entry or exit patterns:
//!
//! | Corners on home                     | Rest  | Direction                      |
//! |-------------------------------------|-------|--------------------------------|
//! | all four                            | -     | any                            |
//! | the leading corner (diagonal)       | Track | a home entry direction         |
//! | the leading edge (cardinal)         | Track | a home entry direction         |
//! | the trailing corner (diagonal)      | Track | reverse of an entry direction  |
//! | the trailing edge (cardinal)        | Track | reverse of an entry direction  |

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use log::trace;

use super::{Corner, Direction, Footprint, GridMap, GridTile, OdvParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of checking a move.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MoveCheck {
    pub can_move: bool,

    /// The vehicle is squarely on the load tile, approaching from the load side
    pub can_load: bool,

    /// The vehicle is squarely on the unload tile, approaching from the unload side
    pub can_unload: bool,
}

#[derive(Debug, Clone)]
pub struct CollisionChecker {
    grid: Arc<GridMap>,
    home_entry_directions: Vec<Direction>,
    load_approach_direction: Direction,
    unload_approach_direction: Direction,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CollisionChecker {
    pub fn new(grid: Arc<GridMap>, params: &OdvParams) -> Self {
        Self {
            grid,
            home_entry_directions: params.home_entry_directions.clone(),
            load_approach_direction: params.load_approach_direction,
            unload_approach_direction: params.unload_approach_direction,
        }
    }

    /// Check whether the vehicle may move one fine unit in `direction`.
    pub fn can_move_in_direction(&self, footprint: &Footprint, direction: Direction) -> MoveCheck {
        let corners = footprint.shifted(direction).corners();

        let mut tiles = [GridTile::Wall; 4];
        for (t, c) in tiles.iter_mut().zip(corners.iter()) {
            *t = self.grid.tile_at_fine(*c);
        }

        let all = |kind: GridTile| tiles.iter().all(|t| *t == kind);

        let check = MoveCheck {
            can_move: self.can_move(&tiles, direction),
            can_load: all(GridTile::Load) && direction == self.load_approach_direction,
            can_unload: all(GridTile::Unload) && direction == self.unload_approach_direction,
        };

        trace!("{:?} from {:?}: {:?} {:?}", direction, footprint.origin, tiles, check);

        check
    }

    fn can_move(&self, tiles: &[GridTile; 4], direction: Direction) -> bool {
        if tiles.iter().all(|t| t.is_walkable()) {
            return true;
        }

        if !tiles.contains(&GridTile::Home) {
            return false;
        }

        if tiles.iter().all(|t| *t == GridTile::Home) {
            return true;
        }

        // Entering home
        if self.home_entry_directions.contains(&direction)
            && Self::matches_edge(tiles, direction.leading_corners())
        {
            return true;
        }

        // Leaving home, the trailing corners are the leading corners of the reverse direction
        let reverse = direction.reverse();
        self.home_entry_directions.contains(&reverse)
            && Self::matches_edge(tiles, reverse.leading_corners())
    }

    /// True if exactly the `home` corners are on the home tile and all others on track.
    fn matches_edge(tiles: &[GridTile; 4], home: &[Corner]) -> bool {
        tiles.iter().enumerate().all(|(i, t)| {
            let on_home = home.iter().any(|c| *c as usize == i);
            if on_home {
                *t == GridTile::Home
            } else {
                *t == GridTile::Track
            }
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::odv::{FinePosition, TilePosition};

    fn checker(lines: &[&str]) -> CollisionChecker {
        CollisionChecker::new(
            Arc::new(GridMap::load(lines).unwrap()),
            &OdvParams::default(),
        )
    }

    /// Footprint with its origin at fine offset (dx, dy) inside the given tile.
    fn footprint(tile: (i32, i32), dx: i32, dy: i32) -> Footprint {
        Footprint::at(FinePosition::new(tile.0 * 10 + dx, tile.1 * 10 + dy))
    }

    const OPEN: [&str; 5] = ["H####", "#####", "#####", "#####", "L###U"];

    #[test]
    fn test_open_track_all_directions() {
        let cc = checker(&OPEN);

        for d in Direction::ALL.iter() {
            for &(dx, dy) in [(0, 0), (1, 1), (2, 2), (-1, 2), (2, -1)].iter() {
                assert_eq!(
                    cc.can_move_in_direction(&footprint((2, 2), dx, dy), *d),
                    MoveCheck {
                        can_move: true,
                        can_load: false,
                        can_unload: false
                    },
                    "{:?} at offset {:?}",
                    d,
                    (dx, dy)
                );
            }
        }
    }

    #[test]
    fn test_walls_block() {
        let cc = checker(&["H#X", "###", "L#U"]);

        // Against the east edge of (1, 0), next to the wall at (2, 0)
        let fp = footprint((1, 0), 2, 1);
        assert!(!cc.can_move_in_direction(&fp, Direction::East).can_move);
        assert!(!cc.can_move_in_direction(&fp, Direction::NorthEast).can_move);
        assert!(cc.can_move_in_direction(&fp, Direction::South).can_move);
        assert!(cc.can_move_in_direction(&fp, Direction::West).can_move);

        // Against the north edge of the grid
        let fp = footprint((1, 0), 1, -1);
        assert!(!cc.can_move_in_direction(&fp, Direction::North).can_move);
    }

    #[test]
    fn test_load_and_unload() {
        let cc = checker(&OPEN);

        // Squarely on the load tile
        let fp = footprint((0, 4), 1, 1);
        let west = cc.can_move_in_direction(&fp, Direction::West);
        assert!(west.can_move);
        assert!(west.can_load);
        assert!(!west.can_unload);

        // Wrong approach side
        assert!(!cc.can_move_in_direction(&fp, Direction::East).can_load);
        assert!(!cc.can_move_in_direction(&fp, Direction::North).can_load);

        // Only partly over the tile
        let fp = footprint((0, 4), 1, -3);
        assert!(!cc.can_move_in_direction(&fp, Direction::West).can_load);

        let fp = footprint((4, 4), 1, 1);
        let east = cc.can_move_in_direction(&fp, Direction::East);
        assert!(east.can_unload);
        assert!(!east.can_load);
        assert!(!cc.can_move_in_direction(&fp, Direction::West).can_unload);
    }

    #[test]
    fn test_load_and_unload_exclusive() {
        let cc = checker(&["H##LU", "#####"]);

        for x in 0..50 {
            for y in -2..20 {
                let fp = Footprint::at(FinePosition::new(x, y));
                for d in Direction::ALL.iter() {
                    let check = cc.can_move_in_direction(&fp, *d);
                    assert!(!(check.can_load && check.can_unload));
                }
            }
        }
    }

    #[test]
    fn test_home_entry_from_east() {
        // Home on the west edge, entered by moving West
        let cc = checker(&["XXX", "H#L", "XUX"]);

        // Leading (west) edge just at the home boundary
        let fp = footprint((1, 1), -1, 1);
        assert!(cc.can_move_in_direction(&fp, Direction::West).can_move);

        // Parked in home, can move around inside it
        let fp = footprint((0, 1), 1, 1);
        assert!(cc.can_move_in_direction(&fp, Direction::North).can_move);
        assert!(cc.can_move_in_direction(&fp, Direction::West).can_move);

        // Leaving home to the East
        let fp = footprint((0, 1), 2, 1);
        assert!(cc.can_move_in_direction(&fp, Direction::East).can_move);
    }

    #[test]
    fn test_home_entry_from_other_sides_denied() {
        // Home approached from the north (moving South) and from the west (moving East)
        let cc = checker(&["###", "#H#", "L#U"]);

        let from_north = footprint((1, 0), 1, 2);
        assert_eq!(
            cc.grid.tile_at(TilePosition::new(1, 1)),
            GridTile::Home
        );
        assert!(!cc.can_move_in_direction(&from_north, Direction::South).can_move);

        let from_west = footprint((0, 1), 2, 1);
        assert!(!cc.can_move_in_direction(&from_west, Direction::East).can_move);

        let from_south = footprint((1, 2), 1, -1);
        assert!(!cc.can_move_in_direction(&from_south, Direction::North).can_move);

        // From the east moving West is an entry direction
        let from_east = footprint((2, 1), -1, 1);
        assert!(cc.can_move_in_direction(&from_east, Direction::West).can_move);
    }

    #[test]
    fn test_home_diagonal_entry() {
        let cc = checker(&["H##", "###", "L#U"]);

        // South-east of home, the north-west corner about to cross into home
        let fp = footprint((1, 1), -1, -1);
        assert!(cc.can_move_in_direction(&fp, Direction::NorthWest).can_move);

        // Diagonal exit towards the south-east
        let fp = footprint((0, 0), 2, 2);
        assert!(cc.can_move_in_direction(&fp, Direction::SouthEast).can_move);

        // Half in home, moving diagonally along the edge
        assert!(!cc.can_move_in_direction(&fp, Direction::NorthEast).can_move);
    }
}
