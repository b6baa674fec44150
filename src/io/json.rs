use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::sim::event::EventKind;
use crate::sim::runner::Flight;

/// Time-stamped event without the full body state.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub time: f64,
    pub kind: EventKind,
}

/// Summary statistics computed from a flight.
#[derive(Debug, Clone, Serialize)]
pub struct FlightSummary {
    pub aircraft: String,
    pub flight_time: f64,
    pub max_altitude: f64,
    pub max_altitude_time: f64,
    pub max_speed: f64,
    pub max_g: f64,
    /// Largest |angle of attack|, deg.
    pub max_aoa: f64,
    pub landed: bool,
    /// Speed at ground contact, when the flight ended on the ground.
    pub impact_speed: Option<f64>,
    pub events: Vec<EventRecord>,
}

impl FlightSummary {
    pub fn from_flight(aircraft: &str, flight: &Flight) -> Self {
        let samples = &flight.samples;

        let (max_altitude, max_altitude_time) = samples
            .iter()
            .map(|s| (s.state.position.y, s.time))
            .fold((f64::NEG_INFINITY, 0.0), |best, cur| if cur.0 > best.0 { cur } else { best });

        let max_speed = samples.iter().map(|s| s.state.speed()).fold(0.0_f64, f64::max);
        let max_aoa = samples
            .iter()
            .map(|s| s.telemetry.angle_of_attack.abs())
            .fold(0.0_f64, f64::max);

        let impact_speed = if flight.landed {
            samples.last().map(|s| s.state.speed())
        } else {
            None
        };

        FlightSummary {
            aircraft: aircraft.to_string(),
            flight_time: flight.duration(),
            max_altitude,
            max_altitude_time,
            max_speed,
            max_g: flight.max_g(),
            max_aoa,
            landed: flight.landed,
            impact_speed,
            events: flight
                .events
                .iter()
                .map(|e| EventRecord { time: e.time, kind: e.kind.clone() })
                .collect(),
        }
    }
}

/// Write flight summary as pretty-printed JSON to a writer.
pub fn write_summary<W: Write>(writer: &mut W, summary: &FlightSummary) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, summary)?;
    writeln!(writer)?;
    Ok(())
}

/// Write flight summary JSON to a file.
pub fn write_summary_file(path: impl AsRef<Path>, summary: &FlightSummary) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnc::HoldInput;
    use crate::physics::FlatGround;
    use crate::sim::runner::{simulate_with, SimConfig};
    use crate::vehicle::presets;

    fn dropped() -> Flight {
        let config = SimConfig {
            max_time: 30.0,
            initial_altitude: 80.0,
            initial_speed: 0.0,
            initial_throttle: 0.0,
            ..SimConfig::default()
        };
        let jet = presets::trainer_jet().unwrap();
        simulate_with(&jet, &config, &mut HoldInput::default(), &FlatGround::new(0.0)).unwrap()
    }

    #[test]
    fn summary_of_a_drop() {
        let flight = dropped();
        let s = FlightSummary::from_flight("Kestrel", &flight);
        assert!(s.landed);
        assert!((s.max_altitude - 80.0).abs() < 0.1);
        assert!(s.max_altitude_time < 0.1);
        let impact = s.impact_speed.unwrap();
        assert!(impact > 20.0 && impact < 60.0, "impact at {} m/s", impact);
        assert!(s.events.iter().any(|e| matches!(e.kind, EventKind::GroundContact { .. })));
    }

    #[test]
    fn json_output_is_valid() {
        let summary = FlightSummary::from_flight("Test", &dropped());

        let mut buf = Vec::new();
        write_summary(&mut buf, &summary).unwrap();
        let json = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["aircraft"], "Test");
        assert_eq!(value["landed"], true);
        assert!(value["max_altitude"].is_number());
        assert!(value["events"].is_array());
    }
}
