use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::flight::{FlightDynamics, FlightModel};
use crate::dynamics::state::RigidBodyState;
use crate::error::{FlightError, Result};
use crate::math::Curve;
use crate::physics::{SurfaceConfig, SurfaceKind, SurfaceRole};

use super::propulsion::{Powerplant, PowerplantConfig};

// ---------------------------------------------------------------------------
// Aircraft definition
// ---------------------------------------------------------------------------

/// Complete load-time description of one airframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftConfig {
    pub name: String,
    pub mass: f64,              // kg
    pub inertia: Vector3<f64>,  // principal moments (pitch, yaw, roll axes), kg·m^2
    pub model: FlightModel,
    pub surfaces: Vec<SurfaceConfig>,
    pub powerplant: PowerplantConfig,
}

impl AircraftConfig {
    /// Parse and validate a YAML aircraft definition.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AircraftConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        if config.model.envelope.override_limiter {
            warn!("aircraft '{}' loaded with the G limiter overridden", config.name);
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        debug!("loading aircraft from {}", path.as_ref().display());
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.initial_state(0.0, 0.0).validate()?;
        self.model.validate()?;
        self.powerplant.validate()?;

        let mut names = HashSet::new();
        for s in &self.surfaces {
            s.validate()?;
            if !names.insert(s.name.as_str()) {
                return Err(FlightError::Config(format!("duplicate surface name '{}'", s.name)));
            }
        }
        Ok(())
    }

    /// Level flight along world +z.
    pub fn initial_state(&self, altitude: f64, speed: f64) -> RigidBodyState {
        RigidBodyState::level(altitude, speed, self.mass, self.inertia)
    }

    /// Runtime flight dynamics and powerplant for this airframe.
    pub fn build(&self) -> Result<(FlightDynamics, Powerplant)> {
        self.validate()?;
        let dynamics = FlightDynamics::new(self.model.clone(), self.surfaces.clone())?;
        let powerplant = Powerplant::new(self.powerplant.clone());
        debug!(
            "built '{}': {:.0} kg, {} surfaces, {} engines",
            self.name,
            self.mass,
            self.surfaces.len(),
            self.powerplant.engines.len()
        );
        Ok((dynamics, powerplant))
    }
}

// ---------------------------------------------------------------------------
// Surface builder
// ---------------------------------------------------------------------------

pub struct SurfaceBuilder {
    name: String,
    kind: SurfaceKind,
    role: SurfaceRole,
    position: Vector3<f64>,
    sweep_angle: f64,
    lift_power: f64,
    induced_drag: f64,
    input_influence: Vector3<f64>,
    input_speed: f64,
    aoa_input_range: f64,
    trim: f64,
    lift_curve: Option<Curve>,
}

impl SurfaceBuilder {
    pub fn new(name: impl Into<String>, kind: SurfaceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            role: SurfaceRole::Control,
            position: Vector3::zeros(),
            sweep_angle: 0.0,
            lift_power: 1.0,
            induced_drag: 0.1,
            input_influence: Vector3::zeros(),
            input_speed: 2.0,
            aoa_input_range: 0.0,
            trim: 0.0,
            lift_curve: None,
        }
    }

    pub fn role(mut self, v: SurfaceRole) -> Self { self.role = v; self }
    pub fn position(mut self, x: f64, y: f64, z: f64) -> Self { self.position = Vector3::new(x, y, z); self }
    pub fn sweep_angle(mut self, v: f64) -> Self { self.sweep_angle = v; self }
    pub fn lift_power(mut self, v: f64) -> Self { self.lift_power = v; self }
    pub fn induced_drag(mut self, v: f64) -> Self { self.induced_drag = v; self }
    pub fn input_speed(mut self, v: f64) -> Self { self.input_speed = v; self }
    pub fn aoa_input_range(mut self, v: f64) -> Self { self.aoa_input_range = v; self }
    pub fn trim(mut self, v: f64) -> Self { self.trim = v; self }
    pub fn lift_curve(mut self, v: Curve) -> Self { self.lift_curve = Some(v); self }

    /// Weights of the (pitch, yaw, roll) inputs driving this surface.
    pub fn input_influence(mut self, pitch: f64, yaw: f64, roll: f64) -> Self {
        self.input_influence = Vector3::new(pitch, yaw, roll);
        self
    }

    pub fn build(self) -> SurfaceConfig {
        SurfaceConfig {
            name: self.name,
            kind: self.kind,
            role: self.role,
            position: self.position,
            sweep_angle: self.sweep_angle,
            lift_power: self.lift_power,
            induced_drag: self.induced_drag,
            input_influence: self.input_influence,
            input_speed: self.input_speed,
            aoa_input_range: self.aoa_input_range,
            trim: self.trim,
            lift_curve: self.lift_curve,
        }
    }
}

// ---------------------------------------------------------------------------
// Preset aircraft
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;
    use crate::gnc::{GEnvelope, PidConfig};
    use crate::physics::{DragCurves, DragLoads, LayerMask, LiftCurves, ResistanceProxy};
    use crate::vehicle::propulsion::PowerplantKind;

    fn curve(keys: &[(f64, f64)]) -> Result<Curve> {
        Curve::new(keys.to_vec())
    }

    /// Single-engine jet trainer ("Kestrel"): 5 t, docile, 4/8 g envelope.
    pub fn trainer_jet() -> Result<AircraftConfig> {
        let model = FlightModel {
            lift: LiftCurves {
                lift: curve(&[(-90.0, 0.0), (-20.0, -1.2), (0.0, 0.0), (15.0, 1.3), (25.0, 0.8), (90.0, 0.0)])?,
                induced_drag: curve(&[(0.0, 1.0), (300.0, 0.5)])?,
                density_response: curve(&[(0.3, 0.3), (1.225, 1.0)])?,
            },
            steering_power: Vector3::new(40.0, 10.0, 120.0),
            steering_curve: curve(&[(0.0, 0.0), (50.0, 0.5), (150.0, 1.0), (400.0, 0.8)])?,
            pitch_target_gain: 2.5,
            pitch_pid: PidConfig::new(0.15, 0.05, 0.0),
            yaw_pid: PidConfig::new(0.2, 0.05, 0.0),
            roll_pid: PidConfig::new(0.05, 0.02, 0.0),
            envelope: GEnvelope::default(),
            drag: DragCurves {
                forward: curve(&[(0.0, 0.08), (340.0, 0.08), (400.0, 0.2)])?,
                backward: Curve::constant(0.1),
                left: Curve::constant(1.5),
                right: Curve::constant(1.5),
                top: Curve::constant(2.0),
                bottom: Curve::constant(2.0),
            },
            drag_loads: DragLoads { airbrake: 0.4, flaps: 0.05, gear: 0.03, external_store: 0.01 },
            angular_drag: Vector3::new(1.5, 1.5, 0.8),
            resistance: ResistanceProxy::default(),
            ground_mask: LayerMask::ALL,
        };

        let surfaces = vec![
            SurfaceBuilder::new("left_wing", SurfaceKind::Horizontal)
                .position(-3.5, 0.0, 0.0)
                .sweep_angle(15.0)
                .lift_power(10.0)
                .induced_drag(0.5)
                .input_influence(0.0, 0.0, -1.0)
                .input_speed(4.0)
                .aoa_input_range(6.0)
                .trim(2.0)
                .build(),
            SurfaceBuilder::new("right_wing", SurfaceKind::Horizontal)
                .position(3.5, 0.0, 0.0)
                .sweep_angle(15.0)
                .lift_power(10.0)
                .induced_drag(0.5)
                .input_influence(0.0, 0.0, 1.0)
                .input_speed(4.0)
                .aoa_input_range(6.0)
                .trim(2.0)
                .build(),
            SurfaceBuilder::new("elevator", SurfaceKind::Horizontal)
                .position(0.0, 0.5, -6.0)
                .lift_power(3.0)
                .induced_drag(0.3)
                .input_influence(1.0, 0.0, 0.0)
                .input_speed(3.0)
                .aoa_input_range(15.0)
                .build(),
            SurfaceBuilder::new("rudder", SurfaceKind::Vertical)
                .position(0.0, 1.5, -6.0)
                .sweep_angle(30.0)
                .lift_power(2.0)
                .induced_drag(0.3)
                .input_influence(0.0, 1.0, 0.0)
                .input_speed(3.0)
                .aoa_input_range(10.0)
                .build(),
            SurfaceBuilder::new("fuselage", SurfaceKind::Fuselage)
                .lift_power(1.0)
                .induced_drag(0.2)
                .build(),
            SurfaceBuilder::new("flaps", SurfaceKind::Horizontal)
                .role(SurfaceRole::Flap)
                .lift_power(3.0)
                .induced_drag(0.8)
                .input_influence(1.0, 0.0, 0.0)
                .input_speed(0.5)
                .aoa_input_range(8.0)
                .build(),
        ];

        Ok(AircraftConfig {
            name: "Kestrel".into(),
            mass: 5_000.0,
            inertia: Vector3::new(25_000.0, 30_000.0, 8_000.0),
            model,
            surfaces,
            powerplant: PowerplantConfig {
                kind: PowerplantKind::FixedWing,
                max_power: 30_000.0,
                throttle_speed: 0.5,
                thrust_acceleration: 2.0,
                spool_curve: curve(&[(0.0, 0.0), (1.0, 1.0)])?,
                has_afterburner: false,
                afterburner_power: 1.0,
                engines: vec![Vector3::new(0.0, 0.0, -5.0)],
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLIDER: &str = r#"
name: glider
mass: 500.0
inertia: [800.0, 1000.0, 300.0]
model:
  lift:
    lift: { keys: [[-20.0, -1.2], [0.0, 0.0], [20.0, 1.2]] }
    induced_drag: { keys: [[0.0, 1.0]] }
    density_response: { keys: [[0.0, 0.0], [1.225, 1.0]], extrapolation: linear }
  steering_power: [30.0, 10.0, 90.0]
  steering_curve: { keys: [[0.0, 0.0], [60.0, 1.0]] }
  pitch_pid: { kp: 0.1, ki: 0.02, kd: 0.0, integral_saturation: 1.0 }
  yaw_pid: { kp: 0.1, ki: 0.0, kd: 0.0, integral_saturation: 1.0 }
  roll_pid: { kp: 0.05, ki: 0.0, kd: 0.0, integral_saturation: 1.0, derivative_mode: measurement }
  drag:
    forward: { keys: [[0.0, 0.02]] }
    backward: { keys: [[0.0, 0.05]] }
    left: { keys: [[0.0, 0.5]] }
    right: { keys: [[0.0, 0.5]] }
    top: { keys: [[0.0, 0.8]] }
    bottom: { keys: [[0.0, 0.8]] }
  angular_drag: [1.0, 1.0, 1.0]
surfaces:
  - name: wing
    kind: horizontal
    position: [0.0, 0.0, 0.0]
    sweep_angle: 0.0
    lift_power: 2.0
    induced_drag: 0.1
    input_influence: [0.0, 0.0, 0.0]
    input_speed: 2.0
    aoa_input_range: 0.0
powerplant:
  kind: fixed_wing
  max_power: 0.0
  throttle_speed: 1.0
  thrust_acceleration: 1.0
  spool_curve: { keys: [[0.0, 0.0], [1.0, 1.0]] }
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let cfg = AircraftConfig::from_yaml_str(GLIDER).unwrap();
        assert_eq!(cfg.name, "glider");
        assert_eq!(cfg.model.pitch_target_gain, 2.5);
        assert_eq!(cfg.model.envelope, crate::gnc::GEnvelope::default());
        assert_eq!(cfg.model.pitch_pid.output_max, 1.0);
        assert_eq!(cfg.model.roll_pid.derivative_mode, crate::gnc::DerivativeMode::Measurement);
        assert_eq!(cfg.surfaces[0].role, SurfaceRole::Control);
        assert!(cfg.powerplant.engines.is_empty());
        let (fd, _) = cfg.build().unwrap();
        assert_eq!(fd.surfaces().count(), 1);
    }

    #[test]
    fn rejects_invalid_yaml_values() {
        let bad_mass = GLIDER.replace("mass: 500.0", "mass: -1.0");
        assert!(matches!(AircraftConfig::from_yaml_str(&bad_mass), Err(FlightError::Config(_))));

        // Curve keys out of order.
        let bad_curve = GLIDER.replace("[[0.0, 0.0], [60.0, 1.0]]", "[[60.0, 1.0], [0.0, 0.0]]");
        assert!(matches!(AircraftConfig::from_yaml_str(&bad_curve), Err(FlightError::Yaml(_))));

        assert!(matches!(AircraftConfig::from_yaml_str("name: ["), Err(FlightError::Yaml(_))));
    }

    #[test]
    fn preset_survives_yaml() {
        let preset = presets::trainer_jet().unwrap();
        let yaml = preset.to_yaml_string().unwrap();
        assert_eq!(AircraftConfig::from_yaml_str(&yaml).unwrap(), preset);
    }

    #[test]
    fn duplicate_surface_names_rejected() {
        let mut cfg = presets::trainer_jet().unwrap();
        let extra = cfg.surfaces[0].clone();
        cfg.surfaces.push(extra);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let r = AircraftConfig::load("/nonexistent/aircraft.yaml");
        assert!(matches!(r, Err(FlightError::Io(_))));
    }

    #[test]
    fn builder_defaults() {
        let s = SurfaceBuilder::new("tail", SurfaceKind::Vertical).trim(1.0).build();
        assert_eq!(s.role, SurfaceRole::Control);
        assert_eq!(s.trim, 1.0);
        assert!(s.lift_curve.is_none());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn preset_builds() {
        let cfg = presets::trainer_jet().unwrap();
        assert!(cfg.validate().is_ok());
        let (fd, pp) = cfg.build().unwrap();
        assert_eq!(fd.surfaces().count(), 6);
        assert_eq!(pp.throttle(), 0.0);
    }
}
