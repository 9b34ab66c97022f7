//! # Grid Map
//!
//! The coarse tile grid the ODV drives on, loaded from rows of ASCII characters:
//!
//! | Char | Tile   |
//! |------|--------|
//! | `X`  | Wall   |
//! | `#`  | Track  |
//! | `H`  | Home   |
//! | `L`  | Load   |
//! | `U`  | Unload |
//!
//! Anything outside the grid is a wall.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;

use log::warn;
use ndarray::Array2;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};

use super::{pos_est, Direction, FinePosition, TilePosition};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Order in which neighbouring tiles are visited.
pub const NEIGHBOUR_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::North,
    Direction::West,
    Direction::South,
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tile grid with the positions of the special tiles. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct GridMap {
    /// Tiles indexed by `[[x, y]]`
    tiles: Array2<GridTile>,

    home: TilePosition,
    load: TilePosition,
    unload: TilePosition,
}

/// Renders a [`GridMap`] with the vehicle marked as `R`.
pub struct GridDisplay<'a> {
    map: &'a GridMap,
    robot: Option<TilePosition>,
    colored: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridTile {
    Wall,
    Track,
    Home,
    Load,
    Unload,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("The grid has no {0:?} tile")]
    MissingSpecialTile(GridTile),

    #[error("The grid has more than one {0:?} tile, found at {1} and {2}")]
    DuplicateSpecialTile(GridTile, TilePosition, TilePosition),

    #[error("The grid must be more than one tile in each direction, got {width}x{height}")]
    DegenerateGrid { width: usize, height: usize },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GridTile {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(GridTile::Wall),
            '#' => Some(GridTile::Track),
            'H' => Some(GridTile::Home),
            'L' => Some(GridTile::Load),
            'U' => Some(GridTile::Unload),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            GridTile::Wall => 'X',
            GridTile::Track => '#',
            GridTile::Home => 'H',
            GridTile::Load => 'L',
            GridTile::Unload => 'U',
        }
    }

    /// True for tiles the vehicle may drive over while in transit.
    pub fn is_walkable(&self) -> bool {
        matches!(self, GridTile::Track | GridTile::Load | GridTile::Unload)
    }
}

impl GridMap {
    /// Load a grid from its rows, northernmost first.
    ///
    /// Trailing whitespace is ignored. Short rows are padded with walls to the widest row, and
    /// unknown characters are loaded as walls.
    pub fn load<S: AsRef<str>>(lines: &[S]) -> Result<Self, ConfigError> {
        let rows: Vec<Vec<char>> = lines
            .iter()
            .map(|l| l.as_ref().trim_end().chars().collect())
            .collect();

        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);

        if width <= 1 || height <= 1 {
            return Err(ConfigError::DegenerateGrid { width, height });
        }

        let mut tiles = Array2::from_elem((width, height), GridTile::Wall);
        let mut home = None;
        let mut load = None;
        let mut unload = None;

        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.iter().enumerate() {
                let pos = TilePosition::new(x as i32, y as i32);

                let tile = match GridTile::from_char(*c) {
                    Some(t) => t,
                    None => {
                        warn!("Unknown grid character {:?} at {}, using a wall", c, pos);
                        GridTile::Wall
                    }
                };

                let special = match tile {
                    GridTile::Home => Some(&mut home),
                    GridTile::Load => Some(&mut load),
                    GridTile::Unload => Some(&mut unload),
                    _ => None,
                };
                if let Some(slot) = special {
                    if let Some(first) = *slot {
                        return Err(ConfigError::DuplicateSpecialTile(tile, first, pos));
                    }
                    *slot = Some(pos);
                }

                tiles[[x, y]] = tile;
            }
        }

        Ok(Self {
            tiles,
            home: home.ok_or(ConfigError::MissingSpecialTile(GridTile::Home))?,
            load: load.ok_or(ConfigError::MissingSpecialTile(GridTile::Load))?,
            unload: unload.ok_or(ConfigError::MissingSpecialTile(GridTile::Unload))?,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.tiles.nrows()
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.tiles.ncols()
    }

    pub fn home(&self) -> TilePosition {
        self.home
    }

    pub fn load_tile(&self) -> TilePosition {
        self.load
    }

    pub fn unload(&self) -> TilePosition {
        self.unload
    }

    /// The tile at the given position, or a wall if it's outside the grid.
    pub fn tile_at(&self, pos: TilePosition) -> GridTile {
        if pos.x < 0 || pos.y < 0 {
            return GridTile::Wall;
        }

        self.tiles
            .get([pos.x as usize, pos.y as usize])
            .copied()
            .unwrap_or(GridTile::Wall)
    }

    /// The tile containing a fine grid position.
    pub fn tile_at_fine(&self, pos: FinePosition) -> GridTile {
        self.tile_at(pos_est::to_tile(pos))
    }

    /// The four neighbours of `pos` with the direction taken to reach them, in
    /// [`NEIGHBOUR_ORDER`].
    pub fn neighbours(&self, pos: TilePosition) -> impl Iterator<Item = (TilePosition, Direction)> {
        NEIGHBOUR_ORDER.iter().map(move |d| (pos.step(*d), *d))
    }

    /// Render the grid, marking the vehicle's tile if given.
    pub fn display(&self, robot: Option<TilePosition>) -> GridDisplay<'_> {
        GridDisplay {
            map: self,
            robot,
            colored: true,
        }
    }
}

impl<'a> GridDisplay<'a> {
    /// Render without terminal colours.
    pub fn plain(self) -> Self {
        Self {
            colored: false,
            ..self
        }
    }
}

impl<'a> fmt::Display for GridDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.map.height() {
            if y > 0 {
                writeln!(f)?;
            }

            for x in 0..self.map.width() {
                let pos = TilePosition::new(x as i32, y as i32);
                let tile = self.map.tile_at(pos);

                if Some(pos) == self.robot {
                    if self.colored {
                        write!(f, "{}", 'R'.green().bold())?;
                    } else {
                        write!(f, "R")?;
                    }
                    continue;
                }

                let c = tile.to_char();
                match (self.colored, tile) {
                    (false, _) | (true, GridTile::Track) => write!(f, "{}", c)?,
                    (true, GridTile::Wall) => write!(f, "{}", c.dimmed())?,
                    (true, GridTile::Home) => write!(f, "{}", c.cyan())?,
                    (true, GridTile::Load) | (true, GridTile::Unload) => {
                        write!(f, "{}", c.yellow())?
                    }
                }
            }
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
