use std::path::PathBuf;
use std::process;

use clap::Parser;

use airframe_sim::error::Result;
use airframe_sim::gnc::{AttitudeHold, Attitude, Pilot};
use airframe_sim::io::{write_summary, write_summary_file, write_telemetry_file, FlightSummary};
use airframe_sim::physics::FlatGround;
use airframe_sim::sim::{simulate_with, SimConfig};
use airframe_sim::vehicle::{presets, AircraftConfig};

/// Fly an airframe through a short climb and report the result.
#[derive(Parser, Debug)]
#[command(name = "airframe-sim", version)]
struct Args {
    /// Aircraft YAML config; the built-in trainer jet when omitted
    aircraft: Option<PathBuf>,

    /// Write per-step telemetry CSV here
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write the flight summary JSON here instead of stdout
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    // -----------------------------------------------------------------------
    // Aircraft
    // -----------------------------------------------------------------------
    let aircraft = match &args.aircraft {
        Some(path) => AircraftConfig::load(path)?,
        None => presets::trainer_jet()?,
    };

    let config = SimConfig {
        dt: 0.02,
        max_time: 60.0,
        initial_altitude: 1_500.0,
        initial_speed: 160.0,
        initial_throttle: 0.7,
        ..SimConfig::default()
    };

    // -----------------------------------------------------------------------
    // Run simulation: gentle climb, wings level
    // -----------------------------------------------------------------------
    let mut pilot = AttitudeHold::new(-5.0, config.initial_throttle);
    let ground = FlatGround::new(0.0);
    let flight = simulate_with(&aircraft, &config, &mut pilot, &ground)?;
    let summary = FlightSummary::from_flight(&aircraft.name, &flight);

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  FLIGHT SIMULATION: {} ({})", aircraft.name, pilot.name());
    println!("====================================================================");
    println!();
    println!("  Airframe");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Mass:          {:>8.0} kg    Surfaces:     {:>8}",
        aircraft.mass,
        aircraft.surfaces.len()
    );
    println!(
        "  G limits:      {:>8.1} g     Pitch limit:  {:>8.1} g",
        aircraft.model.envelope.max_g, aircraft.model.envelope.max_g_pitch
    );
    println!(
        "  Max power:     {:>8.0} N     Engines:      {:>8}",
        aircraft.powerplant.max_power,
        aircraft.powerplant.engines.len()
    );
    println!();

    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    if flight.events.is_empty() {
        println!("  (none)");
    }
    for e in &flight.events {
        println!("  t={:>6.1}s   alt={:>8.0}m   {:?}", e.time, e.state.position.y, e.kind);
    }
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Max altitude:  {:>8.0} m   (t={:.1} s)", summary.max_altitude, summary.max_altitude_time);
    println!("  Max speed:     {:>8.1} m/s", summary.max_speed);
    println!("  Max load:      {:>8.2} g", summary.max_g);
    println!("  Max AoA:       {:>8.2} deg", summary.max_aoa);
    println!("  Flight time:   {:>8.1} s", summary.flight_time);
    println!();

    // -----------------------------------------------------------------------
    // Telemetry table (sampled)
    // -----------------------------------------------------------------------
    println!("  Telemetry");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>9}  {:>9}  {:>7}  {:>6}  {:>7}  {:>6}",
        "t (s)", "alt (m)", "tas (m/s)", "aoa", "g", "pitch", "thrust"
    );
    println!("  {}", "─".repeat(64));

    let samples = &flight.samples;
    let sample_interval = (samples.len() / 30).max(1);
    for (i, s) in samples.iter().enumerate() {
        if i % sample_interval != 0 && i != samples.len() - 1 {
            continue;
        }
        let attitude = Attitude::from_orientation(&s.state.orientation);
        println!(
            "  {:>7.2}  {:>9.1}  {:>9.1}  {:>7.2}  {:>6.2}  {:>7.2}  {:>6.2}",
            s.time,
            s.state.position.y,
            s.telemetry.airspeed,
            s.telemetry.angle_of_attack,
            s.telemetry.g_force,
            -attitude.signed_pitch(),
            s.thrust,
        );
    }

    println!();
    println!("  Simulation: {} steps, dt={} s", samples.len(), config.dt);
    println!("====================================================================");
    println!();

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------
    if let Some(path) = &args.csv {
        write_telemetry_file(path, samples)?;
        println!("  telemetry written to {}", path.display());
    }
    match &args.json {
        Some(path) => {
            write_summary_file(path, &summary)?;
            println!("  summary written to {}", path.display());
        }
        None => write_summary(&mut std::io::stdout().lock(), &summary)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_and_exports() {
        let args = Args::try_parse_from(["airframe-sim", "jet.yaml", "--csv", "t.csv", "--json", "s.json"]).unwrap();
        assert_eq!(args.aircraft, Some(PathBuf::from("jet.yaml")));
        assert_eq!(args.csv, Some(PathBuf::from("t.csv")));
        assert_eq!(args.json, Some(PathBuf::from("s.json")));

        let args = Args::try_parse_from(["airframe-sim"]).unwrap();
        assert!(args.aircraft.is_none() && args.csv.is_none());
    }

    #[test]
    fn rejects_missing_value_and_unknown_flag() {
        assert!(Args::try_parse_from(["airframe-sim", "--csv"]).is_err());
        assert!(Args::try_parse_from(["airframe-sim", "--jsn", "out.json"]).is_err());
    }
}
