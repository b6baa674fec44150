use nalgebra::{UnitQuaternion, Vector3};

use crate::dynamics::state::ControlInput;
use crate::math::wrap_signed_degrees;

// ---------------------------------------------------------------------------
// Attitude angles
// ---------------------------------------------------------------------------

/// Pitch and roll of the airframe in degrees, each in [0, 360).
///
/// Pitch is positive nose-down and roll positive right-wing-up, matching the
/// sign of rotation about body x and body z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub pitch: f64,
    pub roll: f64,
}

impl Attitude {
    pub fn from_orientation(orientation: &UnitQuaternion<f64>) -> Self {
        let right = orientation * Vector3::x();
        let up = orientation * Vector3::y();
        let forward = orientation * Vector3::z();

        let pitch = (-forward.y).clamp(-1.0, 1.0).asin().to_degrees();
        let roll = right.y.atan2(up.y).to_degrees();

        Attitude { pitch: pitch.rem_euclid(360.0), roll: roll.rem_euclid(360.0) }
    }

    /// Pitch in (-180, 180].
    pub fn signed_pitch(&self) -> f64 {
        wrap_signed_degrees(self.pitch)
    }

    /// Roll in (-180, 180].
    pub fn signed_roll(&self) -> f64 {
        wrap_signed_degrees(self.roll)
    }
}

// ---------------------------------------------------------------------------
// Recovery inputs
// ---------------------------------------------------------------------------

/// Full nose-up pull while rolling wings level.
pub fn avoid_ground_input(orientation: &UnitQuaternion<f64>, roll_factor: f64) -> ControlInput {
    let attitude = Attitude::from_orientation(orientation);
    let roll = (-attitude.signed_roll() * roll_factor).clamp(-1.0, 1.0);
    ControlInput::new(-1.0, 0.0, roll)
}

/// Lower the nose toward the horizon while rolling wings level.
pub fn recover_speed_input(orientation: &UnitQuaternion<f64>, roll_factor: f64) -> ControlInput {
    let attitude = Attitude::from_orientation(orientation);
    let pitch = (-attitude.signed_pitch()).clamp(-1.0, 1.0);
    let roll = (-attitude.signed_roll() * roll_factor).clamp(-1.0, 1.0);
    ControlInput::new(pitch, 0.0, roll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rolled(deg: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), deg.to_radians())
    }

    fn pitched(deg: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), deg.to_radians())
    }

    #[test]
    fn level_is_zero() {
        let a = Attitude::from_orientation(&UnitQuaternion::identity());
        assert_relative_eq!(a.signed_pitch(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(a.signed_roll(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn roll_350_reads_minus_10() {
        let a = Attitude::from_orientation(&rolled(350.0));
        assert_relative_eq!(a.roll, 350.0, epsilon = 1e-9);
        assert_relative_eq!(a.signed_roll(), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn nose_down_is_positive_pitch() {
        let a = Attitude::from_orientation(&pitched(20.0));
        assert_relative_eq!(a.signed_pitch(), 20.0, epsilon = 1e-9);
        let a = Attitude::from_orientation(&pitched(-30.0));
        assert_relative_eq!(a.pitch, 330.0, epsilon = 1e-9);
        assert_relative_eq!(a.signed_pitch(), -30.0, epsilon = 1e-9);
    }

    #[test]
    fn avoid_ground_pulls_and_levels() {
        let input = avoid_ground_input(&rolled(30.0), 0.01);
        // Magnitude clamp shortens the vector, signs survive.
        assert!(input.pitch() < 0.0);
        assert!(input.roll() < 0.0);
        assert_eq!(input.yaw(), 0.0);

        let input = avoid_ground_input(&UnitQuaternion::identity(), 0.01);
        assert_relative_eq!(input.pitch(), -1.0);
        assert_relative_eq!(input.roll(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn recover_speed_pushes_nose_down_from_climb() {
        let input = recover_speed_input(&pitched(-40.0), 0.02);
        assert_relative_eq!(input.pitch(), 1.0);
        assert_relative_eq!(input.roll(), 0.0, epsilon = 1e-9);

        let input = recover_speed_input(&rolled(-20.0), 0.02);
        assert_relative_eq!(input.roll(), 0.4, epsilon = 1e-9);
    }
}
