use std::sync::Arc;

use crate::control::pid::Pid;
use crate::signal::{Signal, SignalNet};

// ---------------------------------------------------------------------------
// PID gain signal group
// ---------------------------------------------------------------------------

/// The five live-tunable parameters of one PID controller, as signals.
#[derive(Clone)]
pub struct GainSignals {
    pub p: Signal,
    pub i: Signal,
    pub d: Signal,
    pub i_min: Signal,
    pub i_max: Signal,
}

impl GainSignals {
    pub fn new(net: &Arc<SignalNet>) -> Self {
        Self {
            p: Signal::new(net),
            i: Signal::new(net),
            d: Signal::new(net),
            i_min: Signal::new(net),
            i_max: Signal::new(net),
        }
    }

    /// Copy the current gain values into a controller. Called by the loops
    /// at the top of every tick so external retuning takes effect live.
    pub fn load_into(&self, pid: &mut Pid) {
        pid.p_gain = self.p.get();
        pid.i_gain = self.i.get();
        pid.d_gain = self.d.get();
        pid.i_min = self.i_min.get();
        pid.i_max = self.i_max.get();
    }

    /// Convenience for wiring and demos: set all five values at once.
    pub fn set(&self, p: f64, i: f64, d: f64, i_min: f64, i_max: f64) {
        self.p.set(p);
        self.i.set(i);
        self.d.set(d);
        self.i_min.set(i_min);
        self.i_max.set(i_max);
    }
}

// ---------------------------------------------------------------------------
// Flight-data bus
// ---------------------------------------------------------------------------

/// The shared wiring point of the autopilot: a fixed set of named signals
/// created once at startup. Components bind to signal identity, not value —
/// sensor adapters write into the bus, the control loops read their inputs
/// from it and publish their outputs back, actuator adapters and
/// instruments subscribe where they need to.
///
/// Each field has exactly one logical writer; fan-out is unlimited.
#[derive(Clone)]
pub struct FlightData {
    // gps receiver
    pub latitude: Signal,
    pub longitude: Signal,
    pub course_over_ground: Signal,
    /// Ground speed in km/h.
    pub speed_over_ground: Signal,
    pub altitude_absolute: Signal,
    pub satellites: Signal,

    // mission controller
    pub target_course: Signal,
    pub pitch_angle_preset: Signal,
    pub roll_angle_preset: Signal,
    /// 1-based index of the waypoint being flown to; 0 = none.
    pub current_waypoint_index: Signal,

    // stick controls, range -1..+1
    pub aileron_input: Signal,
    pub elevator_input: Signal,
    pub rudder_input: Signal,
    pub throttle_input: Signal,

    // motion controller / actuators, range -1..+1
    pub aileron_output: Signal,
    pub elevator_output: Signal,
    pub rudder_output: Signal,
    pub throttle_output: Signal,
    pub roll_trim: Signal,
    pub pitch_trim: Signal,

    // motion sensor, angles in degrees (0 = level), rates in deg/s
    pub pitch_angle: Signal,
    pub roll_angle: Signal,
    pub yaw_angle: Signal,
    pub air_speed: Signal,
    pub vertical_speed: Signal,
    pub pitch_angular_rate: Signal,
    pub roll_angular_rate: Signal,
    pub yaw_angular_rate: Signal,

    // live controller tuning
    pub pitch_gains: GainSignals,
    pub roll_gains: GainSignals,
    pub course_gains: GainSignals,
}

impl FlightData {
    pub fn new(net: &Arc<SignalNet>) -> Self {
        Self {
            latitude: Signal::new(net),
            longitude: Signal::new(net),
            course_over_ground: Signal::new(net),
            speed_over_ground: Signal::new(net),
            altitude_absolute: Signal::new(net),
            satellites: Signal::new(net),

            target_course: Signal::new(net),
            pitch_angle_preset: Signal::new(net),
            roll_angle_preset: Signal::new(net),
            current_waypoint_index: Signal::new(net),

            aileron_input: Signal::new(net),
            elevator_input: Signal::new(net),
            rudder_input: Signal::new(net),
            throttle_input: Signal::new(net),

            aileron_output: Signal::new(net),
            elevator_output: Signal::new(net),
            rudder_output: Signal::new(net),
            throttle_output: Signal::new(net),
            roll_trim: Signal::new(net),
            pitch_trim: Signal::new(net),

            pitch_angle: Signal::new(net),
            roll_angle: Signal::new(net),
            yaw_angle: Signal::new(net),
            air_speed: Signal::new(net),
            vertical_speed: Signal::new(net),
            pitch_angular_rate: Signal::new(net),
            roll_angular_rate: Signal::new(net),
            yaw_angular_rate: Signal::new(net),

            pitch_gains: GainSignals::new(net),
            roll_gains: GainSignals::new(net),
            course_gains: GainSignals::new(net),
        }
    }
}
