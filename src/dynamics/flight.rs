use log::{debug, trace};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::{ControlState, ForceAccumulator, RigidBodyState};
use crate::error::{check_dt, FlightError, Result};
use crate::gnc::{GEnvelope, Pid, PidConfig};
use crate::math::Curve;
use crate::physics::{
    angular_damping, parasitic_drag, AeroSurface, AirflowEstimator, DragCurves, DragLoads,
    GroundProbe, LayerMask, LiftCurves, ResistanceProxy, SurfaceArena, SurfaceConfig,
    SurfaceHandle, SurfaceRole,
};

// ---------------------------------------------------------------------------
// Flight model (load-time tuning)
// ---------------------------------------------------------------------------

/// Every tuning value of an airframe. Immutable once handed to
/// [`FlightDynamics::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightModel {
    pub lift: LiftCurves,
    /// Commanded rotation rate at full stick, deg/s per (pitch, yaw, roll).
    pub steering_power: Vector3<f64>,
    /// Steering authority vs forward speed.
    pub steering_curve: Curve,
    #[serde(default = "default_pitch_target_gain")]
    pub pitch_target_gain: f64,
    pub pitch_pid: PidConfig,
    pub yaw_pid: PidConfig,
    pub roll_pid: PidConfig,
    #[serde(default)]
    pub envelope: GEnvelope,
    pub drag: DragCurves,
    #[serde(default)]
    pub drag_loads: DragLoads,
    /// Quadratic angular damping per body axis.
    pub angular_drag: Vector3<f64>,
    #[serde(default)]
    pub resistance: ResistanceProxy,
    #[serde(default)]
    pub ground_mask: LayerMask,
}

fn default_pitch_target_gain() -> f64 {
    2.5
}

impl FlightModel {
    pub fn validate(&self) -> Result<()> {
        self.pitch_pid.validate()?;
        self.yaw_pid.validate()?;
        self.roll_pid.validate()?;
        self.envelope.validate()?;
        if !self.steering_power.iter().all(|c| c.is_finite()) {
            return Err(FlightError::Config(format!(
                "steering power must be finite, got {:?}",
                self.steering_power
            )));
        }
        if self.angular_drag.iter().any(|&c| !(c >= 0.0)) {
            return Err(FlightError::Config(format!(
                "angular drag must be non-negative, got {:?}",
                self.angular_drag
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Read-only view of the last step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Telemetry {
    pub time: f64,
    /// Forward airspeed, m/s.
    pub airspeed: f64,
    /// deg
    pub angle_of_attack: f64,
    /// deg
    pub angle_of_attack_yaw: f64,
    pub g_force: f64,
    pub local_g_force: Vector3<f64>,
    /// Lift coefficient of the last surface evaluated.
    pub lift_coefficient: f64,
    /// Parasitic drag magnitude, N.
    pub drag: f64,
    pub air_density: f64,
    pub altitude: f64,
    /// Rate-loop output fed to the control surfaces.
    pub effective_input: Vector3<f64>,
    /// Scale applied by the G envelope, in (0, 1].
    pub g_limit: f64,
    pub resistance_size: f64,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            time: 0.0,
            airspeed: 0.0,
            angle_of_attack: 0.0,
            angle_of_attack_yaw: 0.0,
            g_force: 0.0,
            local_g_force: Vector3::zeros(),
            lift_coefficient: 0.0,
            drag: 0.0,
            air_density: 0.0,
            altitude: 0.0,
            effective_input: Vector3::zeros(),
            g_limit: 1.0,
            resistance_size: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Per-aircraft flight dynamics. Owns its rate loops, surfaces and airflow
/// history; reads a body snapshot and returns the forces for one step.
#[derive(Debug, Clone)]
pub struct FlightDynamics {
    model: FlightModel,
    surfaces: SurfaceArena,
    pitch_pid: Pid,
    yaw_pid: Pid,
    roll_pid: Pid,
    airflow: AirflowEstimator,
    telemetry: Telemetry,
}

impl FlightDynamics {
    pub fn new(model: FlightModel, surfaces: Vec<SurfaceConfig>) -> Result<Self> {
        model.validate()?;
        for s in &surfaces {
            s.validate()?;
        }
        let surfaces: SurfaceArena = surfaces.into_iter().map(AeroSurface::new).collect();
        debug!("flight dynamics ready: {} surfaces", surfaces.active_count());

        Ok(Self {
            pitch_pid: Pid::new(model.pitch_pid),
            yaw_pid: Pid::new(model.yaw_pid),
            roll_pid: Pid::new(model.roll_pid),
            model,
            surfaces,
            airflow: AirflowEstimator::new(),
            telemetry: Telemetry::default(),
        })
    }

    pub fn model(&self) -> &FlightModel {
        &self.model
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Compute the force and torque for one fixed step.
    ///
    /// `body` is the snapshot at the start of the step; the returned
    /// accumulator is in world frame about the centre of mass.
    pub fn step(
        &mut self,
        dt: f64,
        simulation_time: f64,
        body: &RigidBodyState,
        controls: &ControlState,
        ground: &dyn GroundProbe,
    ) -> Result<ForceAccumulator> {
        check_dt(dt)?;
        let model = &self.model;

        // 1. Airflow
        let airflow = self.airflow.update(body, ground, model.ground_mask, dt);
        let local_velocity = airflow.local_velocity;
        let input = controls.input.as_vector();

        // 2. Steering authority
        let speed = airflow.forward_speed();
        let steering = model.steering_curve.evaluate(speed);
        let max_angular_velocity = model.steering_power.map(f64::to_radians) * steering;

        // 3. G envelope
        let g_limit = model.envelope.limit(input, &max_angular_velocity, &local_velocity);
        let mut target = model.steering_power.component_mul(input) * g_limit;
        target.x *= model.pitch_target_gain;

        // 4. Rate loops
        let rate = airflow.local_angular_velocity.map(f64::to_degrees);
        let effective_input = Vector3::new(
            self.pitch_pid.update(dt, rate.x, target.x)?,
            self.yaw_pid.update(dt, rate.y, target.y)?,
            self.roll_pid.update(dt, rate.z, target.z)?,
        );

        // 5. Surfaces
        let mut accumulator = ForceAccumulator::new();
        let flap_input = Vector3::new(if controls.flaps_deployed { 1.0 } else { 0.0 }, 0.0, 0.0);
        let mut lift_coefficient = self.telemetry.lift_coefficient;
        for (_, surface) in self.surfaces.iter_active_mut() {
            let drive = match surface.role() {
                SurfaceRole::Control => &effective_input,
                SurfaceRole::Flap => &flap_input,
            };
            surface.set_input(dt, drive);

            let out = surface.compute_force(&airflow, &model.lift);
            let point = surface.world_point(body);
            accumulator.add_force_at_point(body, &body.to_world(&out.force), &point);
            lift_coefficient = out.lift_coefficient;
        }

        // 6. Parasitic drag
        let extra = model.drag_loads.extra_forward(
            controls.airbrake_deployed,
            controls.flaps_deployed,
            controls.gear_deployed,
            controls.external_stores,
        );
        let (drag, drag_magnitude) = parasitic_drag(&local_velocity, &model.drag, extra);
        accumulator.add_relative_force(body, &drag);

        // 7. Angular damping (acceleration -> torque)
        let damping = angular_damping(&airflow.local_angular_velocity, &model.angular_drag);
        accumulator.add_relative_torque(body, &damping.component_mul(&body.inertia));

        // 8. Resistance proxy
        let resistance_size = model.resistance.size(body.speed());

        trace!(
            "t={:.3} aoa={:.2} g={:.2} limit={:.3} input=({:.3}, {:.3}, {:.3})",
            simulation_time,
            airflow.angle_of_attack.to_degrees(),
            airflow.g_force,
            g_limit,
            effective_input.x,
            effective_input.y,
            effective_input.z,
        );

        self.telemetry = Telemetry {
            time: simulation_time,
            airspeed: speed,
            angle_of_attack: airflow.angle_of_attack.to_degrees(),
            angle_of_attack_yaw: airflow.angle_of_attack_yaw.to_degrees(),
            g_force: airflow.g_force,
            local_g_force: airflow.local_g_force,
            lift_coefficient,
            drag: drag_magnitude,
            air_density: airflow.air_density,
            altitude: airflow.altitude,
            effective_input,
            g_limit,
            resistance_size,
        };

        Ok(accumulator)
    }

    // -- surface management ------------------------------------------------

    pub fn add_surface(&mut self, config: SurfaceConfig) -> Result<SurfaceHandle> {
        config.validate()?;
        Ok(self.surfaces.insert(AeroSurface::new(config)))
    }

    /// Detach a surface (e.g. a wing lost to damage). Other handles stay valid.
    pub fn remove_surface(&mut self, handle: SurfaceHandle) -> Option<AeroSurface> {
        self.surfaces.remove(handle)
    }

    pub fn surface(&self, handle: SurfaceHandle) -> Option<&AeroSurface> {
        self.surfaces.get(handle)
    }

    pub fn find_surface(&self, name: &str) -> Option<SurfaceHandle> {
        self.surfaces.find(name)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceHandle, &AeroSurface)> {
        self.surfaces.iter_active()
    }

    /// Clear rate-loop integrators and airflow history.
    pub fn reset(&mut self) {
        self.pitch_pid.reset();
        self.yaw_pid.reset();
        self.roll_pid.reset();
        self.airflow.reset();
        self.telemetry = Telemetry::default();
    }
}
