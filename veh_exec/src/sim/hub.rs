//! Simulated hub and motors

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use hub_if::eqpt::{
    motor::validate_duty_cycle, Color, DeviceError, Hub, MotorHandle, Port, PositiveDirection,
    Side, StatusLight, StopBehavior,
};
use log::{debug, info};

use super::SimParams;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Speed of a simulated motor at 100% duty.
///
/// Units: degrees/second
const FULL_DUTY_SPEED_DEGS: f64 = 1400.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A hub whose motors each drive a linear axis between two end stops.
///
/// Targeting commands (`run_to_angle`, `run_until_stalled`) complete instantly, while duty cycle
/// commands only move the axis when [`SimHub::step`] is called.
pub struct SimHub {
    axes: HashMap<Port, Rc<RefCell<SimAxis>>>,
    light: LogLight,
    up_side: Side,
}

/// Handle to one axis of a [`SimHub`].
pub struct SimMotor {
    port: Port,
    axis: Rc<RefCell<SimAxis>>,
}

/// A status light which logs every colour change.
#[derive(Debug)]
pub struct LogLight {
    color: Color,
}

#[derive(Debug)]
struct SimAxis {
    /// Position between the end stops, `min_deg` at the negative stop
    travel_deg: f64,

    /// Added to the travel to give the reported angle
    offset_deg: i32,

    duty_pct: i32,

    min_deg: i32,
    max_deg: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimHub {
    /// Create a hub with a motor on each of `ports`. The axes travel between `min_deg` and
    /// `max_deg` and start in the middle.
    pub fn new(ports: &[Port], min_deg: i32, max_deg: i32) -> Self {
        let axes = ports
            .iter()
            .map(|p| (*p, Rc::new(RefCell::new(SimAxis::new(min_deg, max_deg)))))
            .collect();

        Self {
            axes,
            light: LogLight::default(),
            up_side: Side::Top,
        }
    }

    pub fn from_params(params: &SimParams) -> Self {
        Self::new(&params.connected_ports, 0, params.travel_limit_deg)
    }

    /// Advance every axis by `dt_s` seconds at its current duty cycle.
    pub fn step(&mut self, dt_s: f64) {
        for axis in self.axes.values() {
            axis.borrow_mut().step(dt_s);
        }
    }

    /// Turn the simulated hub over.
    pub fn set_up_side(&mut self, side: Side) {
        if side != self.up_side {
            info!("Sim hub turned, {:?} side up", side);
        }
        self.up_side = side;
    }

    pub fn light_color(&self) -> Color {
        self.light.color
    }
}

impl Hub for SimHub {
    fn motor(
        &mut self,
        port: Port,
        positive_direction: PositiveDirection,
    ) -> Result<Box<dyn MotorHandle>, DeviceError> {
        let axis = self.axes.get(&port).ok_or(DeviceError::NoMotor(port))?;

        debug!("Sim motor opened on {} ({:?})", port, positive_direction);

        Ok(Box::new(SimMotor {
            port,
            axis: axis.clone(),
        }))
    }

    fn light(&mut self) -> &mut dyn StatusLight {
        &mut self.light
    }

    fn up_side(&self) -> Side {
        self.up_side
    }
}

impl MotorHandle for SimMotor {
    fn port(&self) -> Port {
        self.port
    }

    fn set_duty_cycle(&mut self, duty_pct: i32) -> Result<(), DeviceError> {
        self.axis.borrow_mut().duty_pct = validate_duty_cycle(duty_pct)?;
        Ok(())
    }

    /// The simulated motor stops at the target whatever the stop behaviour.
    fn run_to_angle(
        &mut self,
        target_deg: i32,
        _speed_degs: i32,
        _stop: StopBehavior,
    ) -> Result<(), DeviceError> {
        let mut axis = self.axis.borrow_mut();
        let travel = target_deg - axis.offset_deg;
        axis.set_travel(travel as f64);
        axis.duty_pct = 0;
        Ok(())
    }

    fn run_until_stalled(
        &mut self,
        speed_degs: i32,
        duty_limit_pct: i32,
    ) -> Result<i32, DeviceError> {
        validate_duty_cycle(duty_limit_pct)?;

        let mut axis = self.axis.borrow_mut();
        let stop = if speed_degs < 0 {
            axis.min_deg
        } else {
            axis.max_deg
        };
        axis.set_travel(stop as f64);
        axis.duty_pct = 0;

        Ok(axis.angle())
    }

    fn angle(&self) -> i32 {
        self.axis.borrow().angle()
    }

    fn reset_angle(&mut self, angle_deg: i32) -> Result<(), DeviceError> {
        let mut axis = self.axis.borrow_mut();
        axis.offset_deg = angle_deg - axis.travel_deg.round() as i32;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.axis.borrow_mut().duty_pct = 0;
        Ok(())
    }
}

impl SimAxis {
    fn new(min_deg: i32, max_deg: i32) -> Self {
        Self {
            travel_deg: (min_deg as f64 + max_deg as f64) / 2.0,
            offset_deg: 0,
            duty_pct: 0,
            min_deg,
            max_deg,
        }
    }

    fn angle(&self) -> i32 {
        self.travel_deg.round() as i32 + self.offset_deg
    }

    fn set_travel(&mut self, travel_deg: f64) {
        self.travel_deg = travel_deg.max(self.min_deg as f64).min(self.max_deg as f64);
    }

    fn step(&mut self, dt_s: f64) {
        if self.duty_pct != 0 {
            let speed = self.duty_pct as f64 / 100.0 * FULL_DUTY_SPEED_DEGS;
            self.set_travel(self.travel_deg + speed * dt_s);
        }
    }
}

impl Default for LogLight {
    fn default() -> Self {
        Self { color: Color::None }
    }
}

impl StatusLight for LogLight {
    fn on(&mut self, color: Color) {
        if color != self.color {
            debug!("Status light {:?}", color);
        }
        self.color = color;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
