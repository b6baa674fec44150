use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::state::{ControlInput, ForceAccumulator, RigidBodyState};
use crate::error::{check_dt, FlightError, Result};
use crate::math::{move_to, Curve};

/// Throttle idle for rotorcraft, keeps the rotor turning.
const ROTOR_IDLE: f64 = 0.35;

// ---------------------------------------------------------------------------
// Powerplant configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerplantKind {
    /// Thrust along body forward at every engine.
    FixedWing,
    /// Rotor lift along body up, tail rotor yaw torque.
    Rotorcraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerplantConfig {
    pub kind: PowerplantKind,
    pub max_power: f64,           // N per engine
    pub throttle_speed: f64,      // 1/s at full lever
    pub thrust_acceleration: f64, // spool curve input per second
    /// Fraction of the thrust gap closed per step, sampled at `dt * thrust_acceleration`.
    pub spool_curve: Curve,
    #[serde(default)]
    pub has_afterburner: bool,
    #[serde(default = "default_afterburner_power")]
    pub afterburner_power: f64,
    /// Engine (or rotor hub) positions, body frame. Empty for gliders.
    #[serde(default)]
    pub engines: Vec<Vector3<f64>>,
}

fn default_afterburner_power() -> f64 {
    1.0
}

impl PowerplantConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_power >= 0.0) || !(self.throttle_speed >= 0.0) || !(self.thrust_acceleration >= 0.0) {
            return Err(FlightError::Config(format!(
                "powerplant rates must be non-negative (power {}, throttle {}, spool {})",
                self.max_power, self.throttle_speed, self.thrust_acceleration
            )));
        }
        if self.kind == PowerplantKind::Rotorcraft && self.engines.is_empty() {
            return Err(FlightError::Config("rotorcraft needs a rotor position".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime powerplant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerplantOutput {
    /// Lever position, [0, 1].
    pub throttle: f64,
    /// Spooled thrust fraction, [0, 1].
    pub thrust: f64,
    /// Force per engine, N.
    pub power: f64,
    /// Lever held fully back at idle.
    pub airbrake: bool,
    pub forces: ForceAccumulator,
}

#[derive(Debug, Clone)]
pub struct Powerplant {
    config: PowerplantConfig,
    throttle: f64,
    thrust: f64,
}

impl Powerplant {
    pub fn new(config: PowerplantConfig) -> Self {
        Self { config, throttle: 0.0, thrust: 0.0 }
    }

    pub fn config(&self) -> &PowerplantConfig {
        &self.config
    }

    /// Start with the lever and spool at `throttle` (airborne starts).
    pub fn with_throttle(mut self, throttle: f64) -> Self {
        self.throttle = throttle.clamp(0.0, 1.0);
        self.thrust = self.throttle;
        self
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    pub fn thrust(&self) -> f64 {
        self.thrust
    }

    /// Advance the throttle lever and engine spool, returning the engine loads
    /// for this step. `throttle_input` is in [-1, 1]: positive opens the lever,
    /// anything else closes it, at a rate proportional to the deflection.
    pub fn update(
        &mut self,
        dt: f64,
        body: &RigidBodyState,
        throttle_input: f64,
        afterburner: bool,
        control: &ControlInput,
    ) -> Result<PowerplantOutput> {
        check_dt(dt)?;
        let c = &self.config;

        let target = if throttle_input > 0.0 { 1.0 } else { 0.0 };
        self.throttle = move_to(self.throttle, target, c.throttle_speed * throttle_input.abs(), dt, 0.0, 1.0);
        let airbrake = self.throttle == 0.0 && throttle_input <= -1.0;

        let mut forces = ForceAccumulator::new();
        let power = match c.kind {
            PowerplantKind::FixedWing => {
                let spool = c.spool_curve.evaluate(dt * c.thrust_acceleration);
                self.thrust = (self.thrust + (self.throttle - self.thrust) * spool).clamp(0.0, 1.0);
                if self.thrust < 0.01 && self.throttle == 0.0 {
                    self.thrust = 0.0;
                }
                if self.thrust > 0.99 {
                    self.thrust = 1.0;
                }

                let mut power = self.thrust * c.max_power;
                if afterburner && c.has_afterburner {
                    power *= c.afterburner_power;
                }
                let force = body.forward() * power;
                for engine in &c.engines {
                    let point = body.position + body.orientation * engine;
                    forces.add_force_at_point(body, &force, &point);
                }
                power
            }
            PowerplantKind::Rotorcraft => {
                self.throttle = self.throttle.max(ROTOR_IDLE);
                self.thrust = self.throttle;
                let power = self.thrust * c.max_power;

                if let Some(rotor) = c.engines.first() {
                    let up = body.orientation * Vector3::y();
                    let point = body.position + body.orientation * rotor;
                    forces.add_force_at_point(body, &(up * power), &point);
                }
                // Tail rotor.
                forces.add_relative_torque(body, &(Vector3::y() * power * control.yaw() * 2.0));
                power
            }
        };

        Ok(PowerplantOutput { throttle: self.throttle, thrust: self.thrust, power, airbrake, forces })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.02;

    fn jet() -> PowerplantConfig {
        PowerplantConfig {
            kind: PowerplantKind::FixedWing,
            max_power: 10_000.0,
            throttle_speed: 1.0,
            thrust_acceleration: 2.0,
            spool_curve: Curve::linear(0.0, 0.0, 1.0, 1.0).unwrap(),
            has_afterburner: true,
            afterburner_power: 1.5,
            engines: vec![Vector3::new(0.0, 0.0, -4.0)],
        }
    }

    fn body() -> RigidBodyState {
        RigidBodyState::level(500.0, 100.0, 4000.0, Vector3::new(1.0e4, 1.0e4, 1.0e4))
    }

    fn run(pp: &mut Powerplant, steps: usize, input: f64, ab: bool) -> PowerplantOutput {
        let mut out = None;
        for _ in 0..steps {
            out = Some(pp.update(DT, &body(), input, ab, &ControlInput::centered()).unwrap());
        }
        out.unwrap()
    }

    #[test]
    fn throttle_moves_at_rate() {
        let mut pp = Powerplant::new(jet());
        let out = run(&mut pp, 10, 1.0, false);
        assert_relative_eq!(out.throttle, 0.2, epsilon = 1e-9);
        // Half lever moves half as fast.
        let mut pp = Powerplant::new(jet());
        let out = run(&mut pp, 10, 0.5, false);
        assert_relative_eq!(out.throttle, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn thrust_spools_and_snaps_to_full() {
        let mut pp = Powerplant::new(jet());
        let early = run(&mut pp, 20, 1.0, false);
        assert!(early.thrust < early.throttle);
        let out = run(&mut pp, 500, 1.0, false);
        assert_eq!(out.thrust, 1.0);
        assert_relative_eq!(out.power, 10_000.0);
        assert_relative_eq!(out.forces.force, Vector3::new(0.0, 0.0, 10_000.0), epsilon = 1e-9);
        // Thrust line through the CG: no torque.
        assert_relative_eq!(out.forces.torque.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn spool_down_snaps_to_zero() {
        let mut pp = Powerplant::new(jet()).with_throttle(1.0);
        let out = run(&mut pp, 1_000, -0.5, false);
        assert_eq!(out.throttle, 0.0);
        assert_eq!(out.thrust, 0.0);
        assert!(!out.airbrake);
    }

    #[test]
    fn full_back_at_idle_deploys_airbrake() {
        let mut pp = Powerplant::new(jet());
        let out = run(&mut pp, 1, -1.0, false);
        assert!(out.airbrake);
        let out = run(&mut pp, 1, 0.0, false);
        assert!(!out.airbrake);
    }

    #[test]
    fn afterburner_multiplies_power() {
        let mut pp = Powerplant::new(jet()).with_throttle(1.0);
        let dry = run(&mut pp, 1, 1.0, false);
        let wet = run(&mut pp, 1, 1.0, true);
        assert_relative_eq!(wet.power, dry.power * 1.5);

        let mut cfg = jet();
        cfg.has_afterburner = false;
        let mut pp = Powerplant::new(cfg).with_throttle(1.0);
        assert_relative_eq!(run(&mut pp, 1, 1.0, true).power, 10_000.0);
    }

    #[test]
    fn offset_engine_makes_torque() {
        let mut cfg = jet();
        cfg.engines = vec![Vector3::new(-2.0, 0.0, -4.0), Vector3::new(2.0, 0.0, -4.0)];
        let mut pp = Powerplant::new(cfg.clone()).with_throttle(1.0);
        let both = run(&mut pp, 1, 1.0, false);
        assert_relative_eq!(both.forces.torque.norm(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(both.forces.force.z, 20_000.0, epsilon = 1e-9);

        // Engine out: yaw toward the dead side.
        cfg.engines.pop();
        let mut pp = Powerplant::new(cfg).with_throttle(1.0);
        let single = run(&mut pp, 1, 1.0, false);
        assert!(single.forces.torque.y.abs() > 1.0);
    }

    #[test]
    fn rotorcraft_idles_and_lifts() {
        let cfg = PowerplantConfig {
            kind: PowerplantKind::Rotorcraft,
            engines: vec![Vector3::new(0.0, 2.0, 0.0)],
            ..jet()
        };
        let mut pp = Powerplant::new(cfg);
        let body = body();
        let out = pp.update(DT, &body, 0.0, false, &ControlInput::new(0.0, 0.5, 0.0)).unwrap();
        assert_relative_eq!(out.throttle, ROTOR_IDLE);
        assert_relative_eq!(out.forces.force, Vector3::new(0.0, 3_500.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(out.forces.torque, Vector3::new(0.0, 3_500.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn validation() {
        assert!(jet().validate().is_ok());
        let cfg = PowerplantConfig { kind: PowerplantKind::Rotorcraft, engines: vec![], ..jet() };
        assert!(cfg.validate().is_err());
        let cfg = PowerplantConfig { max_power: -1.0, ..jet() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_dt() {
        let mut pp = Powerplant::new(jet());
        let r = pp.update(0.0, &body(), 1.0, false, &ControlInput::centered());
        assert!(matches!(r, Err(FlightError::InvalidTimestep(_))));
    }
}
