use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};
use crate::math::clamp_magnitude;

// ---------------------------------------------------------------------------
// Rigid-body snapshot (owned by the integrator, read once per step)
// ---------------------------------------------------------------------------

/// World frame is y-up. Body frame: x right, y up, z forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBodyState {
    pub position: Vector3<f64>,             // m, world
    pub orientation: UnitQuaternion<f64>,   // body -> world
    pub velocity: Vector3<f64>,             // m/s, world
    pub angular_velocity: Vector3<f64>,     // rad/s, world
    pub mass: f64,                          // kg
    pub inertia: Vector3<f64>,              // principal moments, body, kg·m^2
}

impl RigidBodyState {
    /// Level flight along world +z at the given altitude and speed.
    pub fn level(altitude: f64, speed: f64, mass: f64, inertia: Vector3<f64>) -> Self {
        Self {
            position: Vector3::new(0.0, altitude, 0.0),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::new(0.0, 0.0, speed),
            angular_velocity: Vector3::zeros(),
            mass,
            inertia,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.mass > 0.0) {
            return Err(FlightError::Config(format!("mass must be positive, got {}", self.mass)));
        }
        if self.inertia.iter().any(|&i| !(i > 0.0)) {
            return Err(FlightError::Config(format!(
                "principal inertia must be positive, got {:?}",
                self.inertia
            )));
        }
        Ok(())
    }

    /// World-frame vector expressed in the body frame.
    pub fn to_local(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.orientation.inverse_transform_vector(v)
    }

    /// Body-frame vector expressed in the world frame.
    pub fn to_world(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.orientation * v
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * Vector3::z()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

// ---------------------------------------------------------------------------
// State derivative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dquat: Quaternion<f64>,    // NOT unit, raw quaternion derivative
    pub domega: Vector3<f64>,      // angular acceleration, world frame
}

impl RigidBodyState {
    pub fn apply(&self, d: &Deriv, dt: f64) -> RigidBodyState {
        let q_raw = self.orientation.quaternion() + d.dquat * dt;
        RigidBodyState {
            position: self.position + d.dpos * dt,
            orientation: UnitQuaternion::new_normalize(q_raw),
            velocity: self.velocity + d.dvel * dt,
            angular_velocity: self.angular_velocity + d.domega * dt,
            mass: self.mass,
            inertia: self.inertia,
        }
    }
}

// ---------------------------------------------------------------------------
// Control input
// ---------------------------------------------------------------------------

/// Normalised stick: x = pitch, y = yaw, z = roll.
///
/// Magnitude is clamped to 1, so every component is in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlInput(Vector3<f64>);

impl Default for ControlInput {
    fn default() -> Self {
        Self::centered()
    }
}

impl ControlInput {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self::from_vector(Vector3::new(pitch, yaw, roll))
    }

    pub fn from_vector(v: Vector3<f64>) -> Self {
        let v = v.map(|c| if c.is_finite() { c } else { 0.0 });
        ControlInput(clamp_magnitude(&v, 1.0))
    }

    pub fn centered() -> Self {
        ControlInput(Vector3::zeros())
    }

    pub fn pitch(&self) -> f64 { self.0.x }
    pub fn yaw(&self) -> f64 { self.0.y }
    pub fn roll(&self) -> f64 { self.0.z }

    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.0
    }

    pub fn magnitude(&self) -> f64 {
        self.0.norm()
    }
}

/// Everything the pilot/AI side hands the flight model for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub input: ControlInput,
    pub throttle: f64,
    pub afterburner: bool,
    pub flaps_deployed: bool,
    pub airbrake_deployed: bool,
    pub gear_deployed: bool,
    pub external_stores: u32,
}

impl ControlState {
    pub fn with_input(input: ControlInput) -> Self {
        Self { input, ..Default::default() }
    }
}

// ---------------------------------------------------------------------------
// Write-once force/torque accumulator
// ---------------------------------------------------------------------------

/// Force and torque about the centre of mass, world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceAccumulator {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

impl Default for ForceAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceAccumulator {
    pub fn new() -> Self {
        Self { force: Vector3::zeros(), torque: Vector3::zeros() }
    }

    pub fn add_force(&mut self, force: &Vector3<f64>) {
        self.force += force;
    }

    /// World force applied at a world point; contributes lever-arm torque.
    pub fn add_force_at_point(&mut self, body: &RigidBodyState, force: &Vector3<f64>, point: &Vector3<f64>) {
        self.force += force;
        self.torque += (point - body.position).cross(force);
    }

    /// Body-frame force through the centre of mass.
    pub fn add_relative_force(&mut self, body: &RigidBodyState, force: &Vector3<f64>) {
        self.force += body.to_world(force);
    }

    pub fn add_relative_torque(&mut self, body: &RigidBodyState, torque: &Vector3<f64>) {
        self.torque += body.to_world(torque);
    }

    pub fn merge(&mut self, other: &ForceAccumulator) {
        self.force += other.force;
        self.torque += other.torque;
    }
}
