use log::{debug, info};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::dynamics::flight::Telemetry;
use crate::dynamics::state::{ControlState, RigidBodyState};
use crate::error::{check_dt, FlightError, Result};
use crate::gnc::{AttitudeHold, Pilot};
use crate::physics::{FlatGround, GroundProbe, Wind};
use crate::vehicle::AircraftConfig;
use super::event::{EventDetector, GroundContactDetector, OverGDetector, SimEvent, StallDetector};
use super::integrator::rk4_step;

/// Height above ground that counts as airborne.
const AIRBORNE_CLEARANCE: f64 = 1.0;

/// Stall warning threshold for the default detector set, deg.
const STALL_AOA: f64 = 20.0;

// ---------------------------------------------------------------------------
// Configuration and output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub dt: f64,
    pub max_time: f64,
    pub gravity: Vector3<f64>,
    pub initial_altitude: f64,
    pub initial_speed: f64,
    /// Throttle lever and engine spool at t = 0.
    pub initial_throttle: f64,
    #[serde(default)]
    pub wind: Wind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,
            max_time: 120.0,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            initial_altitude: 1_000.0,
            initial_speed: 150.0,
            initial_throttle: 0.8,
            wind: Wind::default(),
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        check_dt(self.dt)?;
        if !(self.max_time > 0.0 && self.max_time.is_finite()) {
            return Err(FlightError::Config(format!(
                "max_time must be positive and finite, got {}",
                self.max_time
            )));
        }
        self.wind.validate()
    }
}

/// One recorded step: the state after integration together with the controls
/// and telemetry of the step that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub time: f64,
    pub state: RigidBodyState,
    pub controls: ControlState,
    pub telemetry: Telemetry,
    /// Spooled thrust fraction.
    pub thrust: f64,
    /// Ground probe reading at the new position; `None` below or off the ground.
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Flight {
    pub samples: Vec<Sample>,
    pub events: Vec<SimEvent>,
    /// Run ended on ground contact rather than `max_time`.
    pub landed: bool,
}

impl Flight {
    pub fn duration(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.time)
    }

    pub fn max_altitude(&self) -> f64 {
        self.samples.iter().map(|s| s.state.position.y).fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn max_g(&self) -> f64 {
        self.samples.iter().map(|s| s.telemetry.g_force).fold(0.0, f64::max)
    }
}

// ---------------------------------------------------------------------------
// Closed-loop flight
// ---------------------------------------------------------------------------

/// Fly `aircraft` under `pilot` until ground contact or `max_time`, reporting
/// events from the given detectors. Ground contact always ends the run once
/// the aircraft has been airborne.
pub fn simulate_with_detectors(
    aircraft: &AircraftConfig,
    config: &SimConfig,
    pilot: &mut dyn Pilot,
    ground: &dyn GroundProbe,
    detectors: &mut [Box<dyn EventDetector>],
) -> Result<Flight> {
    config.validate()?;
    let dt = config.dt;
    let (mut dynamics, powerplant) = aircraft.build()?;
    let mut powerplant = powerplant.with_throttle(config.initial_throttle);
    let mask = dynamics.model().ground_mask;

    let mut state = aircraft.initial_state(config.initial_altitude, config.initial_speed);
    let mut time = 0.0;
    let mut height = ground.probe_down(&state.position, mask);
    let mut airborne = height.map_or(false, |h| h > AIRBORNE_CLEARANCE);

    let capacity = (config.max_time / dt).min(200_000.0) as usize + 1;
    let mut samples = Vec::with_capacity(capacity);
    let mut events = Vec::new();
    let mut landed = false;

    samples.push(Sample {
        time,
        state: state.clone(),
        controls: ControlState::default(),
        telemetry: *dynamics.telemetry(),
        thrust: powerplant.thrust(),
        height,
    });

    info!("flying '{}' with {} for up to {:.0} s", aircraft.name, pilot.name(), config.max_time);

    while time < config.max_time {
        // Pilot and engines
        let mut controls = pilot.control(&state, dynamics.telemetry(), dt)?;
        let engine = powerplant.update(dt, &state, controls.throttle, controls.afterburner, &controls.input)?;
        controls.airbrake_deployed |= engine.airbrake;

        // Aerodynamics
        let mut loads = dynamics.step(dt, time, &state, &controls, ground)?;
        loads.merge(&engine.forces);
        loads.add_force(&config.wind.force_at(&state.position, time));

        // Integrate
        state = rk4_step(&state, &loads, &config.gravity, dt);
        time += dt;
        height = ground.probe_down(&state.position, mask);

        let sample = Sample {
            time,
            state: state.clone(),
            controls,
            telemetry: *dynamics.telemetry(),
            thrust: engine.thrust,
            height,
        };
        if let Some(prev) = samples.last() {
            for detector in detectors.iter_mut() {
                if let Some(kind) = detector.check(prev, &sample) {
                    debug!("t={:.2} {:?}", time, kind);
                    events.push(SimEvent { time, kind, state: state.clone() });
                }
            }
        }
        samples.push(sample);

        if height.map_or(false, |h| h > AIRBORNE_CLEARANCE) {
            airborne = true;
        }

        // Ground impact
        if airborne && height.map_or(true, |h| h <= 0.0) {
            landed = true;
            break;
        }
    }

    info!("flight ended at t={:.2} s ({} events)", time, events.len());
    Ok(Flight { samples, events, landed })
}

/// Fly with the default detector set: ground contact, over-G at the
/// airframe's pitch limit, stall.
pub fn simulate_with(
    aircraft: &AircraftConfig,
    config: &SimConfig,
    pilot: &mut dyn Pilot,
    ground: &dyn GroundProbe,
) -> Result<Flight> {
    let mut detectors: Vec<Box<dyn EventDetector>> = vec![
        Box::new(GroundContactDetector::new()),
        Box::new(OverGDetector::new(aircraft.model.envelope.max_g_pitch)),
        Box::new(StallDetector::new(STALL_AOA)),
    ];
    simulate_with_detectors(aircraft, config, pilot, ground, &mut detectors)
}

/// Fly level with [`AttitudeHold`] over flat ground at sea level (convenience wrapper).
pub fn simulate(aircraft: &AircraftConfig, config: &SimConfig) -> Result<Flight> {
    let mut pilot = AttitudeHold::new(0.0, config.initial_throttle);
    simulate_with(aircraft, config, &mut pilot, &FlatGround::new(0.0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
