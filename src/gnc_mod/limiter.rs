use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};
use crate::math::{scale6, G};

/// Stick deflection below which no limiting is attempted.
const MIN_INPUT: f64 = 0.01;

// ---------------------------------------------------------------------------
// G envelope
// ---------------------------------------------------------------------------

/// Load-factor envelope applied to commanded rotation rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GEnvelope {
    /// Limit for every direction except nose-up pitch, g.
    pub max_g: f64,
    /// Limit for nose-up pitch (negative x input), g.
    pub max_g_pitch: f64,
    /// Disables limiting entirely.
    #[serde(default)]
    pub override_limiter: bool,
}

impl Default for GEnvelope {
    fn default() -> Self {
        Self { max_g: 4.0, max_g_pitch: 8.0, override_limiter: false }
    }
}

impl GEnvelope {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_g > 0.0 && self.max_g_pitch > 0.0) {
            return Err(FlightError::Config(format!(
                "G limits must be positive, got {} / {}",
                self.max_g, self.max_g_pitch
            )));
        }
        Ok(())
    }

    /// Envelope acceleration (m/s^2) along the normalised input direction.
    pub fn envelope(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        let (g, gp) = (self.max_g, self.max_g_pitch);
        scale6(direction, g, gp, g, g, g, g) * G
    }

    /// Scale in (0, 1] to apply to the commanded angular velocity so the
    /// resulting centripetal acceleration stays inside the envelope.
    ///
    /// The command is scaled as a whole, so the direction of the manoeuvre is
    /// preserved and only its magnitude is reduced.
    pub fn limit(
        &self,
        control_input: &Vector3<f64>,
        max_angular_velocity: &Vector3<f64>,
        local_velocity: &Vector3<f64>,
    ) -> f64 {
        if self.override_limiter || control_input.norm() < MIN_INPUT {
            return 1.0;
        }
        let direction = control_input.normalize();

        let limit = self.envelope(&direction).norm();
        let requested = direction.component_mul(max_angular_velocity);
        let actual = requested.cross(local_velocity).norm();

        if actual > limit {
            limit / actual
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fast() -> Vector3<f64> {
        Vector3::new(0.0, 0.0, 250.0)
    }

    fn rates() -> Vector3<f64> {
        // 90 deg/s pitch, 30 yaw, 180 roll.
        Vector3::new(90.0, 30.0, 180.0).map(f64::to_radians)
    }

    #[test]
    fn centered_stick_is_unlimited() {
        let env = GEnvelope::default();
        assert_eq!(env.limit(&Vector3::zeros(), &rates(), &fast()), 1.0);
        assert_eq!(env.limit(&Vector3::new(0.005, 0.0, 0.0), &rates(), &fast()), 1.0);
    }

    #[test]
    fn override_is_unlimited() {
        let env = GEnvelope { override_limiter: true, ..GEnvelope::default() };
        assert_eq!(env.limit(&Vector3::new(-1.0, 0.0, 0.0), &rates(), &fast()), 1.0);
        assert_eq!(env.limit(&Vector3::new(0.3, 0.9, -0.2), &(rates() * 100.0), &(fast() * 10.0)), 1.0);
    }

    #[test]
    fn hard_pull_is_scaled_to_envelope() {
        let env = GEnvelope::default();
        let input = Vector3::new(-1.0, 0.0, 0.0);
        let scale = env.limit(&input, &rates(), &fast());
        // Requested: 90 deg/s at 250 m/s ~ 393 m/s^2 > 8 g.
        let actual = rates().x * 250.0;
        assert_relative_eq!(scale, 8.0 * G / actual, epsilon = 1e-9);
        assert!(scale > 0.0 && scale < 1.0);
    }

    #[test]
    fn push_uses_general_limit() {
        let env = GEnvelope::default();
        let pull = env.limit(&Vector3::new(-1.0, 0.0, 0.0), &rates(), &fast());
        let push = env.limit(&Vector3::new(1.0, 0.0, 0.0), &rates(), &fast());
        assert_relative_eq!(push * 2.0, pull, epsilon = 1e-9);
    }

    #[test]
    fn gentle_input_at_low_speed_is_unlimited() {
        let env = GEnvelope::default();
        let slow = Vector3::new(0.0, 0.0, 20.0);
        assert_eq!(env.limit(&Vector3::new(-0.5, 0.0, 0.0), &rates(), &slow), 1.0);
    }

    #[test]
    fn pure_roll_produces_no_load() {
        // Rolling about the velocity vector: cross product is zero.
        let env = GEnvelope::default();
        assert_eq!(env.limit(&Vector3::new(0.0, 0.0, 1.0), &rates(), &fast()), 1.0);
    }

    #[test]
    fn scale_always_in_unit_interval() {
        let env = GEnvelope::default();
        for i in 0..20 {
            let a = i as f64 * 0.31;
            let input = Vector3::new(a.sin(), (a * 1.7).cos(), (a * 0.3).sin());
            let s = env.limit(&input, &(rates() * 3.0), &Vector3::new(10.0, -20.0, 300.0));
            assert!(s > 0.0 && s <= 1.0, "scale {} out of range", s);
        }
    }

    #[test]
    fn validation() {
        assert!(GEnvelope::default().validate().is_ok());
        assert!(GEnvelope { max_g: 0.0, ..GEnvelope::default() }.validate().is_err());
    }
}
