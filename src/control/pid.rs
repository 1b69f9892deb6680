// ---------------------------------------------------------------------------
// PID controller (single axis)
// ---------------------------------------------------------------------------

/// Proportional-integral-derivative controller state.
///
/// Gains are plain fields so a control loop can reload them from live
/// signals every cycle. Nothing is validated: a degenerate configuration
/// (say, `i_max` below `i_min`) produces a degraded but defined response,
/// which is the contract the loops rely on while gains are being retuned.
#[derive(Debug, Clone, Default)]
pub struct Pid {
    pub p_gain: f64,
    pub i_gain: f64,
    pub d_gain: f64,
    /// Allowable integral state range, clamped after accumulation.
    pub i_min: f64,
    pub i_max: f64,
    i_state: f64,
    d_state: f64,
}

impl Pid {
    pub fn new(p_gain: f64, i_gain: f64, d_gain: f64, i_min: f64, i_max: f64) -> Self {
        Self {
            p_gain,
            i_gain,
            d_gain,
            i_min,
            i_max,
            i_state: 0.0,
            d_state: 0.0,
        }
    }

    /// Update with the derivative taken on the error.
    ///
    /// The integral state accumulates first and is clamped afterwards, so a
    /// single large error can still saturate it immediately (anti-windup).
    pub fn update(&mut self, error: f64) -> f64 {
        self.i_state += error;
        if self.i_state > self.i_max {
            self.i_state = self.i_max;
        } else if self.i_state < self.i_min {
            self.i_state = self.i_min;
        }

        let p = self.p_gain * error;
        let i = self.i_gain * self.i_state;
        let d = self.d_gain * (error - self.d_state);
        self.d_state = error;

        p + i + d
    }

    /// Update with the derivative taken on the measured position and the
    /// derivative term subtracted.
    ///
    /// This variant is immune to derivative kick on setpoint changes; its
    /// state tracks the measurement, so don't mix it with [`Pid::update`]
    /// on the same instance.
    pub fn update_positional(&mut self, error: f64, position: f64) -> f64 {
        self.i_state += error;
        if self.i_state > self.i_max {
            self.i_state = self.i_max;
        } else if self.i_state < self.i_min {
            self.i_state = self.i_min;
        }

        let p = self.p_gain * error;
        let i = self.i_gain * self.i_state;
        let d = self.d_gain * (position - self.d_state);
        self.d_state = position;

        p + i - d
    }

    /// Current integral state (for inspection while tuning).
    pub fn i_state(&self) -> f64 {
        self.i_state
    }

    /// Clear the integral and derivative state.
    pub fn reset(&mut self) {
        self.i_state = 0.0;
        self.d_state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_proportional_gain() {
        let mut pid = Pid::new(2.0, 0.0, 0.0, -10.0, 10.0);
        let out = pid.update(10.0);
        assert!((out - 20.0).abs() < 1e-12, "Pure P should output p_gain * error");
    }

    #[test]
    fn integral_clamps_after_accumulation() {
        let mut pid = Pid::new(0.0, 1.0, 0.0, -5.0, 5.0);
        let out = pid.update(10.0);
        // a single large error saturates the integrator immediately
        assert!((pid.i_state() - 5.0).abs() < 1e-12);
        assert!((out - 5.0).abs() < 1e-12);

        for _ in 0..4 {
            let out = pid.update(10.0);
            assert!((pid.i_state() - 5.0).abs() < 1e-12, "i_state must hold at i_max");
            assert!(out <= 5.0 + 1e-12, "integral component never exceeds i_gain * i_max");
        }
    }

    #[test]
    fn derivative_reacts_to_error_change() {
        let mut pid = Pid::new(0.0, 0.0, 1.0, -1.0, 1.0);
        assert!((pid.update(3.0) - 3.0).abs() < 1e-12); // first call: d_state was 0
        assert!((pid.update(3.0) - 0.0).abs() < 1e-12); // steady error, no derivative
        assert!((pid.update(1.0) - (-2.0)).abs() < 1e-12);
    }

    #[test]
    fn positional_variant_subtracts_measurement_derivative() {
        let mut pid = Pid::new(1.0, 0.0, 1.0, -1.0, 1.0);
        // position moved from 0 to 4 -> derivative term 4, subtracted
        let out = pid.update_positional(2.0, 4.0);
        assert!((out - (2.0 - 4.0)).abs() < 1e-12);
        // steady position: derivative vanishes
        let out = pid.update_positional(2.0, 4.0);
        assert!((out - 2.0).abs() < 1e-12);
    }

    #[test]
    fn reset_clears_state() {
        let mut pid = Pid::new(1.0, 1.0, 1.0, -5.0, 5.0);
        pid.update(3.0);
        pid.reset();
        assert_eq!(pid.i_state(), 0.0);
        assert!((pid.update(0.0) - 0.0).abs() < 1e-12);
    }
}
