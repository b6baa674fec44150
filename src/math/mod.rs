pub mod curve;
pub mod vector;

pub use curve::{Curve, Extrapolation};
pub use vector::{clamp_magnitude, move_to, normalize_or_zero, scale6, wrap_signed_degrees};

/// Standard gravity used for g-unit conversion in the flight model, m/s^2.
pub const G: f64 = 9.81;
