use std::io::{self, Write};
use std::path::Path;

use crate::sim::runner::Sample;

/// Write flight telemetry to CSV format.
///
/// Columns: time, pos_x, pos_y, pos_z, vel_x, vel_y, vel_z,
///          quat_w, quat_x, quat_y, quat_z, omega_x, omega_y, omega_z,
///          airspeed, aoa_deg, aoa_yaw_deg, g, lift_coeff, drag, density, altitude,
///          input_pitch, input_yaw, input_roll, g_limit, thrust, airbrake, flaps
pub fn write_telemetry<W: Write>(writer: &mut W, samples: &[Sample]) -> io::Result<()> {
    writeln!(
        writer,
        "time,pos_x,pos_y,pos_z,vel_x,vel_y,vel_z,\
         quat_w,quat_x,quat_y,quat_z,omega_x,omega_y,omega_z,\
         airspeed,aoa_deg,aoa_yaw_deg,g,lift_coeff,drag,density,altitude,\
         input_pitch,input_yaw,input_roll,g_limit,thrust,airbrake,flaps"
    )?;

    for s in samples {
        let b = &s.state;
        let t = &s.telemetry;
        let q = b.orientation.quaternion();
        writeln!(
            writer,
            "{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},\
             {:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},\
             {:.3},{:.3},{:.3},{:.3},{:.4},{:.2},{:.4},{:.2},\
             {:.4},{:.4},{:.4},{:.4},{:.4},{},{}",
            s.time,
            b.position.x, b.position.y, b.position.z,
            b.velocity.x, b.velocity.y, b.velocity.z,
            q.w, q.i, q.j, q.k,
            b.angular_velocity.x, b.angular_velocity.y, b.angular_velocity.z,
            t.airspeed,
            t.angle_of_attack,
            t.angle_of_attack_yaw,
            t.g_force,
            t.lift_coefficient,
            t.drag,
            t.air_density,
            t.altitude,
            t.effective_input.x, t.effective_input.y, t.effective_input.z,
            t.g_limit,
            s.thrust,
            u8::from(s.controls.airbrake_deployed),
            u8::from(s.controls.flaps_deployed),
        )?;
    }

    Ok(())
}

/// Write telemetry to a CSV file at the given path.
pub fn write_telemetry_file(path: impl AsRef<Path>, samples: &[Sample]) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_telemetry(&mut file, samples)?;
    file.flush()
}
