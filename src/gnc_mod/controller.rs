use crate::dynamics::flight::Telemetry;
use crate::dynamics::state::{ControlInput, ControlState, RigidBodyState};
use crate::error::Result;

use super::pid::{Pid, PidConfig};
use super::recovery::Attitude;

/// Source of stick, throttle and configuration commands.
///
/// Implement this to plug a player model, a scripted manoeuvre or an
/// autopilot into the simulation loop.
pub trait Pilot {
    /// Compute the controls for the next step from the current state and the
    /// telemetry produced by the previous step.
    fn control(&mut self, state: &RigidBodyState, telemetry: &Telemetry, dt: f64) -> Result<ControlState>;

    /// Reset internal state (e.g., PID integrators).
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

// ---------------------------------------------------------------------------
// Constant stick
// ---------------------------------------------------------------------------

/// Holds the same controls for the whole flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoldInput {
    pub controls: ControlState,
}

impl HoldInput {
    pub fn new(controls: ControlState) -> Self {
        Self { controls }
    }
}

impl Pilot for HoldInput {
    fn control(&mut self, _state: &RigidBodyState, _telemetry: &Telemetry, _dt: f64) -> Result<ControlState> {
        Ok(self.controls)
    }

    fn name(&self) -> &str {
        "HoldInput"
    }
}

// ---------------------------------------------------------------------------
// Attitude hold autopilot
// ---------------------------------------------------------------------------

/// Holds a pitch attitude with wings level at a fixed throttle.
#[derive(Debug, Clone)]
pub struct AttitudeHold {
    /// Degrees, positive nose-down.
    pub target_pitch: f64,
    pub throttle: f64,
    pub roll_factor: f64,
    pitch_pid: Pid,
}

impl AttitudeHold {
    pub fn new(target_pitch: f64, throttle: f64) -> Self {
        Self {
            target_pitch,
            throttle,
            roll_factor: 0.02,
            pitch_pid: Pid::new(PidConfig::new(0.08, 0.02, 0.0).integral_saturation(20.0)),
        }
    }
}

impl Pilot for AttitudeHold {
    fn control(&mut self, state: &RigidBodyState, _telemetry: &Telemetry, dt: f64) -> Result<ControlState> {
        let attitude = Attitude::from_orientation(&state.orientation);
        let pitch = self.pitch_pid.update(dt, attitude.signed_pitch(), self.target_pitch)?;
        let roll = (-attitude.signed_roll() * self.roll_factor).clamp(-1.0, 1.0);

        Ok(ControlState {
            input: ControlInput::new(pitch, 0.0, roll),
            throttle: self.throttle,
            ..ControlState::default()
        })
    }

    fn reset(&mut self) {
        self.pitch_pid.reset();
    }

    fn name(&self) -> &str {
        "AttitudeHold"
    }
}
