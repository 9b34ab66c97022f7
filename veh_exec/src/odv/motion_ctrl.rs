//! # Motion controller
//!
//! Sole owner of the two axis motors. Provides bang-bang manual driving, point-to-point tile
//! targeting, the homing cycle and the load/unload choreography. All targeting commands block
//! until the motors reach their targets.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use hub_if::{
    eqpt::{DeviceError, MotorHandle, StopBehavior},
    time::Delay,
};
use log::{debug, info, trace};

use super::{
    pos_est, Direction, FinePosition, Footprint, GridMap, OdvParams, TilePosition,
    GEAR_RATIO_TO_GRID, HOMING_DUTY, HOMING_MOTOR_ROT_SPEED,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct MotionController {
    x_motor: Box<dyn MotorHandle>,
    y_motor: Box<dyn MotorHandle>,
    delay: Box<dyn Delay>,
    grid: Arc<GridMap>,
    params: OdvParams,

    is_homed: bool,
    has_load: bool,

    /// Fine position as of the last call to `refresh_position`
    fine: FinePosition,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("Motor command failed")]
    Device(#[from] DeviceError),

    #[error("Cannot navigate to a tile before the vehicle has been homed")]
    NotHomed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionController {
    pub fn new(
        x_motor: Box<dyn MotorHandle>,
        y_motor: Box<dyn MotorHandle>,
        delay: Box<dyn Delay>,
        grid: Arc<GridMap>,
        params: &OdvParams,
    ) -> Self {
        Self {
            x_motor,
            y_motor,
            delay,
            grid,
            params: params.clone(),
            is_homed: false,
            has_load: false,
            fine: FinePosition::default(),
        }
    }

    /// Calibrate both axes against their end stops, then drive onto the home tile.
    ///
    /// The y axis is homed first, then the x axis. Each axis is driven slowly into its end stop,
    /// which is taken as the zero reference of the grid, nudged one fine unit off the stop and
    /// then driven to the home tile's target angle. Blocks until complete.
    pub fn homing_cycle(&mut self) -> Result<(), MotionError> {
        info!("Homing started");

        let (home_x, home_y) = pos_est::tile_target_angles(self.grid.home());

        self.home_axis(Axis::Y, home_y)?;
        self.home_axis(Axis::X, home_x)?;

        self.is_homed = true;
        let fine = self.refresh_position();

        info!("Homing complete, fine position {:?}", fine);

        Ok(())
    }

    /// Forget the homing calibration, the next control cycle will home again.
    pub fn reset_homing(&mut self) {
        self.is_homed = false;
    }

    /// Re-read the motor angles and update the fine position.
    pub fn refresh_position(&mut self) -> FinePosition {
        self.fine = pos_est::current_fine_position(self.x_motor.angle(), self.y_motor.angle());
        self.fine
    }

    /// Run the axes continuously towards `direction` until the next command.
    pub fn move_manual(&mut self, direction: Direction) -> Result<(), MotionError> {
        let (dx, dy) = direction.delta();
        let duty = self.params.drive_duty_pct;

        self.x_motor.set_duty_cycle(dx * duty)?;
        self.y_motor.set_duty_cycle(dy * duty)?;

        Ok(())
    }

    /// Drive both axes to the target angles of `tile`.
    ///
    /// `stop` is applied to both axes, pass `StopBehavior::None` when the next move continues in
    /// the same direction.
    pub fn navigate_to_tile(
        &mut self,
        tile: TilePosition,
        stop: StopBehavior,
    ) -> Result<(), MotionError> {
        if !self.is_homed {
            return Err(MotionError::NotHomed);
        }

        let (x, y) = pos_est::tile_target_angles(tile);
        trace!("Navigating to {} ({}, {}) deg, stop {:?}", tile, x, y, stop);

        let speed = self.params.nav_speed_degs;
        self.x_motor.run_to_angle(x, speed, stop)?;
        self.y_motor.run_to_angle(y, speed, stop)?;

        self.refresh_position();

        Ok(())
    }

    /// Drive onto the load tile and pick up a load.
    pub fn do_load(&mut self) -> Result<(), MotionError> {
        let tile = self.grid.load_tile();
        let direction = self.params.load_approach_direction;

        self.actuate(tile, direction)?;
        info!("Load picked up at {}", tile);

        Ok(())
    }

    /// Drive onto the unload tile and drop the load.
    pub fn do_unload(&mut self) -> Result<(), MotionError> {
        let tile = self.grid.unload();
        let direction = self.params.unload_approach_direction;

        self.actuate(tile, direction)?;
        info!("Load dropped at {}", tile);

        Ok(())
    }

    /// Stop both axes. Safe to call at any time.
    pub fn stop_all(&mut self) -> Result<(), MotionError> {
        self.x_motor.stop()?;
        self.y_motor.stop()?;

        Ok(())
    }

    pub fn is_homed(&self) -> bool {
        self.is_homed
    }

    pub fn has_load(&self) -> bool {
        self.has_load
    }

    pub fn fine_position(&self) -> FinePosition {
        self.fine
    }

    pub fn tile_position(&self) -> TilePosition {
        pos_est::to_tile(self.fine)
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::at(self.fine)
    }

    fn motor(&mut self, axis: Axis) -> &mut dyn MotorHandle {
        match axis {
            Axis::X => self.x_motor.as_mut(),
            Axis::Y => self.y_motor.as_mut(),
        }
    }

    fn home_axis(&mut self, axis: Axis, home_deg: i32) -> Result<(), MotionError> {
        let pause_ms = self.params.homing_pause_ms;
        let speed = self.params.nav_speed_degs;

        let stall_deg = self
            .motor(axis)
            .run_until_stalled(-HOMING_MOTOR_ROT_SPEED, HOMING_DUTY)?;
        debug!("{:?} axis stalled at {} deg", axis, stall_deg);
        self.delay.wait_ms(pause_ms);

        let motor = self.motor(axis);
        motor.reset_angle(0)?;
        motor.run_to_angle(GEAR_RATIO_TO_GRID, speed, StopBehavior::Hold)?;
        motor.run_to_angle(home_deg, speed, StopBehavior::Hold)?;
        self.delay.wait_ms(pause_ms);

        Ok(())
    }

    /// Navigate onto `tile`, push the actuation axis past the tile centre in `direction`, hold,
    /// then return to the centre and toggle the load state.
    fn actuate(&mut self, tile: TilePosition, direction: Direction) -> Result<(), MotionError> {
        self.navigate_to_tile(tile, StopBehavior::Hold)?;
        self.delay.wait_ms(self.params.settle_ms);

        let (x, y) = pos_est::tile_target_angles(tile);
        let (dx, dy) = direction.delta();
        let offset = self.params.actuation_offset_deg;
        let speed = self.params.nav_speed_degs;

        self.x_motor
            .run_to_angle(x + dx * offset, speed, StopBehavior::Hold)?;
        self.y_motor
            .run_to_angle(y + dy * offset, speed, StopBehavior::Hold)?;
        self.delay.wait_ms(self.params.actuation_hold_ms);

        self.x_motor.run_to_angle(x, speed, StopBehavior::Hold)?;
        self.y_motor.run_to_angle(y, speed, StopBehavior::Hold)?;

        self.has_load = !self.has_load;
        self.refresh_position();

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
