// ---------------------------------------------------------------------------
// Exponential atmosphere
// ---------------------------------------------------------------------------

pub const SEA_LEVEL_DENSITY: f64 = 1.225; // kg/m^3
pub const DENSITY_DECAY: f64 = 0.000_118; // 1/m

/// Air density at `altitude` metres above the probed ground.
///
/// Single-exponential fit, accurate enough for lift attenuation in the
/// troposphere. The shape of the attenuation itself is configured through the
/// density-response curve, not here.
pub fn density(altitude: f64) -> f64 {
    SEA_LEVEL_DENSITY * (-DENSITY_DECAY * altitude).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sea_level_is_exact() {
        assert_eq!(density(0.0), 1.225);
    }

    #[test]
    fn density_monotonically_decreases() {
        let rho_0 = density(0.0);
        let rho_5k = density(5_000.0);
        let rho_12k = density(12_000.0);
        assert!(rho_0 > rho_5k && rho_5k > rho_12k && rho_12k > 0.0);
    }

    #[test]
    fn matches_closed_form() {
        assert_relative_eq!(density(10_000.0), 1.225 * (-1.18_f64).exp(), epsilon = 1e-12);
    }
}
