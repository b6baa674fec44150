use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::RigidBodyState;
use crate::math::G;
use crate::physics::atmosphere;

/// Below this squared airspeed the angle of attack reads zero.
const AOA_MIN_SPEED_SQ: f64 = 0.1;

// ---------------------------------------------------------------------------
// Ground probe (collision layer collaborator)
// ---------------------------------------------------------------------------

/// Bit set selecting which collider layers count as ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub fn contains(&self, layer: u32) -> bool {
        layer < 32 && self.0 & (1 << layer) != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::ALL
    }
}

/// Downward distance query supplied by the environment.
pub trait GroundProbe {
    /// Distance from `origin` straight down (world -y) to the first collider
    /// on a layer in `mask`, or `None` if nothing is hit.
    fn probe_down(&self, origin: &Vector3<f64>, mask: LayerMask) -> Option<f64>;
}

/// Infinite horizontal plane on a single collider layer.
#[derive(Debug, Clone, Copy)]
pub struct FlatGround {
    pub elevation: f64,
    pub layer: u32,
}

impl FlatGround {
    pub fn new(elevation: f64) -> Self {
        Self { elevation, layer: 0 }
    }
}

impl GroundProbe for FlatGround {
    fn probe_down(&self, origin: &Vector3<f64>, mask: LayerMask) -> Option<f64> {
        if !mask.contains(self.layer) || origin.y < self.elevation {
            return None;
        }
        Some(origin.y - self.elevation)
    }
}

// ---------------------------------------------------------------------------
// Per-step airflow
// ---------------------------------------------------------------------------

/// Airflow seen by the airframe for one step. Rebuilt every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirflowState {
    /// Body-frame velocity with the forward component made non-negative.
    pub local_velocity: Vector3<f64>,
    /// Pitch-plane angle of attack, rad.
    pub angle_of_attack: f64,
    /// Yaw-plane angle of attack (sideslip), rad.
    pub angle_of_attack_yaw: f64,
    /// Body-frame angular velocity, rad/s.
    pub local_angular_velocity: Vector3<f64>,
    /// Body-frame acceleration from consecutive velocity samples, m/s^2.
    pub local_g_force: Vector3<f64>,
    /// Normal load factor magnitude, g.
    pub g_force: f64,
    pub air_density: f64,
    pub altitude: f64,
}

impl AirflowState {
    /// Forward airspeed, never negative.
    pub fn forward_speed(&self) -> f64 {
        self.local_velocity.z.max(0.0)
    }

    /// Local-frame airflow for a body with no acceleration history.
    pub fn from_body(body: &RigidBodyState, altitude: f64) -> Self {
        let mut local_velocity = body.to_local(&body.velocity);
        if local_velocity.z < 0.0 {
            local_velocity.z = -local_velocity.z;
        }
        let (angle_of_attack, angle_of_attack_yaw) = angles_of_attack(&local_velocity);
        AirflowState {
            local_velocity,
            angle_of_attack,
            angle_of_attack_yaw,
            local_angular_velocity: body.to_local(&body.angular_velocity),
            local_g_force: Vector3::zeros(),
            g_force: 0.0,
            air_density: atmosphere::density(altitude),
            altitude,
        }
    }
}

/// Pitch- and yaw-plane angles of attack from a body-frame velocity.
pub fn angles_of_attack(local_velocity: &Vector3<f64>) -> (f64, f64) {
    if local_velocity.norm_squared() < AOA_MIN_SPEED_SQ {
        return (0.0, 0.0);
    }
    (
        (-local_velocity.y).atan2(local_velocity.z),
        local_velocity.x.atan2(local_velocity.z),
    )
}

/// Holds the only airflow data carried between steps: the previous world
/// velocity (for the finite-difference G reading) and the last probed altitude.
#[derive(Debug, Clone, Default)]
pub struct AirflowEstimator {
    last_velocity: Option<Vector3<f64>>,
    altitude: f64,
}

impl AirflowEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    /// `dt` must already be validated positive by the caller.
    pub fn update(
        &mut self,
        body: &RigidBodyState,
        ground: &dyn GroundProbe,
        mask: LayerMask,
        dt: f64,
    ) -> AirflowState {
        // A missed probe keeps the last reading.
        if let Some(alt) = ground.probe_down(&body.position, mask) {
            self.altitude = alt;
        }

        let mut airflow = AirflowState::from_body(body, self.altitude);

        let acceleration = match self.last_velocity {
            Some(prev) => (body.velocity - prev) / dt,
            None => Vector3::zeros(),
        };
        self.last_velocity = Some(body.velocity);

        // Attenuate at high speed where single-step differences get noisy.
        let attenuation = (1.0 - airflow.local_velocity.z / 1000.0).clamp(0.0, 1.0);
        airflow.local_g_force = body.to_local(&acceleration) * attenuation;
        airflow.g_force = (airflow.local_g_force.y / G).abs();

        airflow
    }

    pub fn reset(&mut self) {
        self.last_velocity = None;
    }
}
