//! # Position estimation
//!
//! Converts between the axis motor angles, the fine grid and the tile grid. All divisions round
//! towards negative infinity so that positions just outside the grid land in the tiles beyond it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use super::{FinePosition, TilePosition, FINE_GRID_SIZE, GEAR_RATIO_TO_GRID};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Fine grid position from the x and y axis motor angles, in degrees.
pub fn current_fine_position(x_angle_deg: i32, y_angle_deg: i32) -> FinePosition {
    FinePosition::new(
        x_angle_deg.div_euclid(GEAR_RATIO_TO_GRID),
        y_angle_deg.div_euclid(GEAR_RATIO_TO_GRID),
    )
}

/// The tile containing a fine grid position.
pub fn to_tile(pos: FinePosition) -> TilePosition {
    TilePosition::new(
        pos.x.div_euclid(FINE_GRID_SIZE),
        pos.y.div_euclid(FINE_GRID_SIZE),
    )
}

/// Motor angles which put the vehicle on the given tile, as (x, y) degrees.
///
/// The y target is one fine unit into the tile so the footprint clears the northern edge.
pub fn tile_target_angles(tile: TilePosition) -> (i32, i32) {
    (
        tile.x * FINE_GRID_SIZE * GEAR_RATIO_TO_GRID,
        tile.y * FINE_GRID_SIZE * GEAR_RATIO_TO_GRID + GEAR_RATIO_TO_GRID,
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
