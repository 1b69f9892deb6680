use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bus::{FlightData, GainSignals};
use crate::sched::Task;
use crate::signal::Signal;

use super::pid::Pid;

// ---------------------------------------------------------------------------
// Attitude stabilization loop
// ---------------------------------------------------------------------------

/// Default tick rate of the motion controller, Hz.
pub const DEFAULT_UPDATE_FREQUENCY: f64 = 10.0;

/// How fast a default angle decays back to level flight, degrees/second.
const DEFAULT_CORRECTION_RATE: f64 = 30.0;

/// Correction angles are clipped here before conversion to an actuator
/// value, degrees.
const MAX_ATTITUDE_ANGLE: f64 = 60.0;

/// Stick input inside this band counts as centered (stick range is -1..+1).
const STICK_DEADBAND: f64 = 0.0;

/// Cloneable control surface for flipping the stabilizer while the
/// scheduler owns the controller. Both operations are idempotent.
#[derive(Clone)]
pub struct StabilizationSwitch {
    stabilizing: Arc<AtomicBool>,
}

impl StabilizationSwitch {
    pub fn start_stabilizing(&self) {
        self.stabilizing.store(true, Ordering::Relaxed);
    }

    pub fn stop_stabilizing(&self) {
        self.stabilizing.store(false, Ordering::Relaxed);
    }

    pub fn is_stabilizing(&self) -> bool {
        self.stabilizing.load(Ordering::Relaxed)
    }
}

/// Periodic task holding pitch and roll against stick input.
///
/// While stabilizing and the stick is centered, each axis runs a PID on the
/// difference between the measured angle and a decaying "default" angle
/// (plus preset and trim), and writes a normalized actuator value. Any
/// stick deflection — or idle mode — passes the stick straight through and
/// re-anchors the default angle at the current attitude, so stabilization
/// later resumes from "here" rather than snapping back to level.
///
/// Angle inputs are expected in -180..180 degrees with 0 = level flight.
pub struct MotionController {
    stabilizing: Arc<AtomicBool>,
    default_roll_angle: f64,
    default_pitch_angle: f64,
    roll_correction_rate: f64,
    pitch_correction_rate: f64,
    pid_roll: Pid,
    pid_pitch: Pid,

    aileron_input: Signal,
    elevator_input: Signal,
    aileron_output: Signal,
    elevator_output: Signal,
    roll_angle: Signal,
    pitch_angle: Signal,
    roll_angle_preset: Signal,
    pitch_angle_preset: Signal,
    roll_trim: Signal,
    pitch_trim: Signal,
    roll_gains: GainSignals,
    pitch_gains: GainSignals,
}

impl MotionController {
    /// Bind a controller to the bus. Starts idle.
    pub fn new(bus: &FlightData) -> Self {
        Self {
            stabilizing: Arc::new(AtomicBool::new(false)),
            default_roll_angle: 0.0,
            default_pitch_angle: 0.0,
            roll_correction_rate: DEFAULT_CORRECTION_RATE,
            pitch_correction_rate: DEFAULT_CORRECTION_RATE,
            pid_roll: Pid::default(),
            pid_pitch: Pid::default(),

            aileron_input: bus.aileron_input.clone(),
            elevator_input: bus.elevator_input.clone(),
            aileron_output: bus.aileron_output.clone(),
            elevator_output: bus.elevator_output.clone(),
            roll_angle: bus.roll_angle.clone(),
            pitch_angle: bus.pitch_angle.clone(),
            roll_angle_preset: bus.roll_angle_preset.clone(),
            pitch_angle_preset: bus.pitch_angle_preset.clone(),
            roll_trim: bus.roll_trim.clone(),
            pitch_trim: bus.pitch_trim.clone(),
            roll_gains: bus.roll_gains.clone(),
            pitch_gains: bus.pitch_gains.clone(),
        }
    }

    /// Handle for starting/stopping stabilization from other threads.
    pub fn switch(&self) -> StabilizationSwitch {
        StabilizationSwitch {
            stabilizing: Arc::clone(&self.stabilizing),
        }
    }

    pub fn start_stabilizing(&self) {
        self.stabilizing.store(true, Ordering::Relaxed);
    }

    pub fn stop_stabilizing(&self) {
        self.stabilizing.store(false, Ordering::Relaxed);
    }

    /// How fast the roll default angle returns to level, degrees/second.
    pub fn set_roll_correction_rate(&mut self, degrees_per_second: f64) {
        self.roll_correction_rate = degrees_per_second;
    }

    /// How fast the pitch default angle returns to level, degrees/second.
    pub fn set_pitch_correction_rate(&mut self, degrees_per_second: f64) {
        self.pitch_correction_rate = degrees_per_second;
    }

    /// The roll angle currently held when the stick is centered.
    pub fn default_roll_angle(&self) -> f64 {
        self.default_roll_angle
    }

    /// The pitch angle currently held when the stick is centered.
    pub fn default_pitch_angle(&self) -> f64 {
        self.default_pitch_angle
    }

    fn is_stabilizing(&self) -> bool {
        self.stabilizing.load(Ordering::Relaxed)
    }
}

/// Decay `angle` toward 0 by `rate` degrees/second without overshooting.
fn decay_toward_level(angle: f64, rate: f64, dt: f64) -> f64 {
    if angle > 0.0 {
        (angle - rate * dt).max(0.0)
    } else {
        (angle + rate * dt).min(0.0)
    }
}

impl Task for MotionController {
    fn name(&self) -> &str {
        "motion-controller"
    }

    fn tick(&mut self, dt: f64) {
        let stabilizing = self.is_stabilizing();

        // Roll axis: stabilize via the ailerons when the stick is centered,
        // otherwise the stick value goes through unchanged.
        let mut aileron = self.aileron_input.get();
        if stabilizing && aileron.abs() <= STICK_DEADBAND {
            self.default_roll_angle =
                decay_toward_level(self.default_roll_angle, self.roll_correction_rate, dt);
            self.roll_gains.load_into(&mut self.pid_roll);
            let roll_error = self.roll_angle.get() - self.default_roll_angle
                + self.roll_angle_preset.get()
                - self.roll_trim.get();
            let correction = self
                .pid_roll
                .update(roll_error)
                .clamp(-MAX_ATTITUDE_ANGLE, MAX_ATTITUDE_ANGLE);
            // negated: positive roll correction deflects the stick left
            aileron = -(correction / MAX_ATTITUDE_ANGLE);
        } else {
            self.default_roll_angle = self.roll_angle.get();
        }
        self.aileron_output.set(aileron);

        // Pitch axis: same scheme via the elevator, except the preset enters
        // with the opposite sign and the output is not negated. Both
        // asymmetries encode the stick/servo sense and stay as they are.
        let mut elevator = self.elevator_input.get();
        if stabilizing && elevator.abs() <= STICK_DEADBAND {
            self.default_pitch_angle =
                decay_toward_level(self.default_pitch_angle, self.pitch_correction_rate, dt);
            self.pitch_gains.load_into(&mut self.pid_pitch);
            let pitch_error = self.pitch_angle.get() - self.default_pitch_angle
                - self.pitch_angle_preset.get()
                - self.pitch_trim.get();
            let correction = self
                .pid_pitch
                .update(pitch_error)
                .clamp(-MAX_ATTITUDE_ANGLE, MAX_ATTITUDE_ANGLE);
            elevator = correction / MAX_ATTITUDE_ANGLE;
        } else {
            self.default_pitch_angle = self.pitch_angle.get();
        }
        self.elevator_output.set(elevator);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalNet;

    fn setup() -> (FlightData, MotionController) {
        let net = SignalNet::new();
        let bus = FlightData::new(&net);
        let controller = MotionController::new(&bus);
        (bus, controller)
    }

    #[test]
    fn idle_passes_stick_through_and_tracks_attitude() {
        let (bus, mut controller) = setup();
        bus.aileron_input.set(0.7);
        bus.roll_angle.set(15.0);
        controller.tick(0.1);
        assert_eq!(bus.aileron_output.get(), 0.7);
        assert_eq!(controller.default_roll_angle(), 15.0);
    }

    #[test]
    fn deflected_stick_overrides_stabilization() {
        let (bus, mut controller) = setup();
        controller.start_stabilizing();
        bus.roll_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.aileron_input.set(-0.4);
        bus.roll_angle.set(30.0);
        controller.tick(0.1);
        assert_eq!(bus.aileron_output.get(), -0.4);
        // stabilization will resume from the current bank, not from level
        assert_eq!(controller.default_roll_angle(), 30.0);
    }

    #[test]
    fn centered_stick_stabilizes_roll() {
        let (bus, mut controller) = setup();
        controller.start_stabilizing();
        bus.roll_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.roll_angle.set(12.0);
        controller.tick(0.1);
        // error 12 deg -> correction 12 deg -> negated, normalized by 60
        let expected = -(12.0 / 60.0);
        assert!((bus.aileron_output.get() - expected).abs() < 1e-12);
    }

    #[test]
    fn pitch_output_is_not_negated_and_preset_subtracts() {
        let (bus, mut controller) = setup();
        controller.start_stabilizing();
        bus.pitch_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.pitch_angle.set(10.0);
        bus.pitch_angle_preset.set(4.0);
        controller.tick(0.1);
        // error = 10 - 0 - 4 - 0 = 6 deg
        let expected = 6.0 / 60.0;
        assert!((bus.elevator_output.get() - expected).abs() < 1e-12);
    }

    #[test]
    fn roll_preset_adds_into_the_error() {
        let (bus, mut controller) = setup();
        controller.start_stabilizing();
        bus.roll_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.roll_angle.set(0.0);
        bus.roll_angle_preset.set(-20.0);
        controller.tick(0.1);
        // error -20 -> correction -20 -> output +20/60
        assert!((bus.aileron_output.get() - 20.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn default_angle_decays_without_overshoot() {
        let (bus, mut controller) = setup();
        // anchor the tracker at 2 degrees while idle
        bus.roll_angle.set(2.0);
        controller.tick(0.1);
        assert_eq!(controller.default_roll_angle(), 2.0);

        controller.start_stabilizing();
        bus.roll_angle.set(0.0);
        controller.tick(0.05); // 30 deg/s * 0.05 s = 1.5 deg
        assert!((controller.default_roll_angle() - 0.5).abs() < 1e-12);
        controller.tick(0.05);
        assert_eq!(controller.default_roll_angle(), 0.0, "must stop at level");
        controller.tick(0.05);
        assert_eq!(controller.default_roll_angle(), 0.0);
    }

    #[test]
    fn correction_is_clamped_to_the_attitude_limit() {
        let (bus, mut controller) = setup();
        controller.start_stabilizing();
        bus.roll_gains.set(100.0, 0.0, 0.0, -5.0, 5.0);
        bus.roll_angle.set(45.0);
        controller.tick(0.1);
        // 100 * 45 clipped to 60 -> full deflection
        assert_eq!(bus.aileron_output.get(), -1.0);
    }

    #[test]
    fn switch_is_shared_and_idempotent() {
        let (bus, mut controller) = setup();
        let switch = controller.switch();
        switch.start_stabilizing();
        switch.start_stabilizing();
        assert!(switch.is_stabilizing());

        bus.roll_gains.set(1.0, 0.0, 0.0, -5.0, 5.0);
        bus.roll_angle.set(6.0);
        controller.tick(0.1);
        assert!((bus.aileron_output.get() - (-0.1)).abs() < 1e-12);

        switch.stop_stabilizing();
        bus.aileron_input.set(0.2);
        controller.tick(0.1);
        assert_eq!(bus.aileron_output.get(), 0.2);
    }
}
