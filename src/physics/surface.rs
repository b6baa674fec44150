use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::RigidBodyState;
use crate::error::{FlightError, Result};
use crate::math::{move_to, normalize_or_zero, Curve};
use crate::physics::airflow::AirflowState;

/// Below this squared effective airspeed a surface produces no force.
const MIN_LIFT_SPEED_SQ: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Surface configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Wings and tailplanes: lift in the pitch plane.
    Horizontal,
    /// Fins: lift in the yaw plane.
    Vertical,
    /// Body lift, treated like a horizontal surface.
    Fuselage,
}

/// Which signal drives the surface each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRole {
    /// Ailerons, elevators, rudders: fed the rate-loop output.
    #[default]
    Control,
    /// Fed the flap deployment signal.
    Flap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub name: String,
    pub kind: SurfaceKind,
    #[serde(default)]
    pub role: SurfaceRole,
    pub position: Vector3<f64>,       // m, body frame attachment
    pub sweep_angle: f64,             // deg
    pub lift_power: f64,
    pub induced_drag: f64,
    pub input_influence: Vector3<f64>, // weight of (pitch, yaw, roll) input
    pub input_speed: f64,             // 1/s, actuator slew rate
    pub aoa_input_range: f64,         // deg of AoA bias at full deflection
    #[serde(default)]
    pub trim: f64,                    // deg
    /// Replaces the shared lift curve for this surface.
    #[serde(default)]
    pub lift_curve: Option<Curve>,
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.input_speed >= 0.0) {
            return Err(FlightError::Config(format!(
                "surface '{}': input speed must be non-negative, got {}",
                self.name, self.input_speed
            )));
        }
        if !self.position.iter().all(|c| c.is_finite()) {
            return Err(FlightError::Config(format!("surface '{}': position is not finite", self.name)));
        }
        Ok(())
    }
}

/// Curves shared by every surface of an airframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftCurves {
    /// Lift coefficient vs angle of attack in degrees.
    pub lift: Curve,
    /// Induced drag multiplier vs forward speed.
    pub induced_drag: Curve,
    /// Lift multiplier vs air density.
    pub density_response: Curve,
}

// ---------------------------------------------------------------------------
// Runtime surface
// ---------------------------------------------------------------------------

/// Output of one surface evaluation, body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceForce {
    pub force: Vector3<f64>,
    pub lift_coefficient: f64,
    pub air_density: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AeroSurface {
    config: SurfaceConfig,
    input: f64,
}

impl AeroSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self { config, input: 0.0 }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn role(&self) -> SurfaceRole {
        self.config.role
    }

    /// Smoothed deflection, always in [-1, 1].
    pub fn input(&self) -> f64 {
        self.input
    }

    /// Slew the deflection toward the weighted blend of `input`.
    pub fn set_input(&mut self, dt: f64, input: &Vector3<f64>) {
        let target = input.component_mul(&self.config.input_influence).sum();
        self.input = move_to(self.input, target, self.config.input_speed, dt, -1.0, 1.0);
    }

    /// Angle-of-attack offset from deflection and trim, degrees.
    pub fn aoa_bias(&self) -> f64 {
        self.input * self.config.aoa_input_range + self.config.trim
    }

    pub fn compute_force(&self, airflow: &AirflowState, curves: &LiftCurves) -> SurfaceForce {
        let bias = self.aoa_bias().to_radians();
        let sweep = self.config.sweep_angle.to_radians();
        let (aoa, effective_sweep, axis) = match self.config.kind {
            SurfaceKind::Horizontal | SurfaceKind::Fuselage => (
                airflow.angle_of_attack + bias,
                airflow.angle_of_attack_yaw + sweep,
                Vector3::x(),
            ),
            SurfaceKind::Vertical => (
                airflow.angle_of_attack_yaw + bias,
                airflow.angle_of_attack + sweep,
                Vector3::y(),
            ),
        };

        let lift_curve = self.config.lift_curve.as_ref().unwrap_or(&curves.lift);
        let lift_coefficient = lift_curve.evaluate(aoa.to_degrees());
        let air_density = airflow.air_density;

        let lift_velocity = airflow.local_velocity * effective_sweep.cos();
        let v2 = lift_velocity.norm_squared();
        if v2 < MIN_LIFT_SPEED_SQ {
            return SurfaceForce { force: Vector3::zeros(), lift_coefficient, air_density };
        }
        let flow_dir = normalize_or_zero(&lift_velocity);

        let lift_magnitude = v2
            * lift_coefficient
            * self.config.lift_power
            * curves.density_response.evaluate(air_density);
        let lift = flow_dir.cross(&axis) * lift_magnitude;

        let induced_magnitude = v2
            * lift_coefficient
            * lift_coefficient
            * self.config.induced_drag
            * curves.induced_drag.evaluate(airflow.forward_speed());
        let induced = -flow_dir * induced_magnitude;

        SurfaceForce { force: lift + induced, lift_coefficient, air_density }
    }

    /// World-space attachment point.
    pub fn world_point(&self, body: &RigidBodyState) -> Vector3<f64> {
        body.position + body.orientation * self.config.position
    }
}

// ---------------------------------------------------------------------------
// Surface arena
// ---------------------------------------------------------------------------

/// Stable index of a surface. Never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(usize);

impl SurfaceHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Surfaces stored in slots; removal empties a slot instead of shifting the list.
#[derive(Debug, Clone, Default)]
pub struct SurfaceArena {
    slots: Vec<Option<AeroSurface>>,
}

impl SurfaceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, surface: AeroSurface) -> SurfaceHandle {
        self.slots.push(Some(surface));
        SurfaceHandle(self.slots.len() - 1)
    }

    /// Mark the slot inactive and hand back the surface, if it was still active.
    pub fn remove(&mut self, handle: SurfaceHandle) -> Option<AeroSurface> {
        let removed = self.slots.get_mut(handle.0).and_then(Option::take);
        if let Some(s) = &removed {
            debug!("surface '{}' detached (slot {})", s.name(), handle.0);
        }
        removed
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<&AeroSurface> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: SurfaceHandle) -> Option<&mut AeroSurface> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn iter_active(&self) -> impl Iterator<Item = (SurfaceHandle, &AeroSurface)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SurfaceHandle(i), s)))
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (SurfaceHandle, &mut AeroSurface)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|s| (SurfaceHandle(i), s)))
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn find(&self, name: &str) -> Option<SurfaceHandle> {
        self.iter_active().find(|(_, s)| s.name() == name).map(|(h, _)| h)
    }
}

impl FromIterator<AeroSurface> for SurfaceArena {
    fn from_iter<I: IntoIterator<Item = AeroSurface>>(iter: I) -> Self {
        SurfaceArena { slots: iter.into_iter().map(Some).collect() }
    }
}
