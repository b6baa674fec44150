use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};

// ---------------------------------------------------------------------------
// Tabulated response function
// ---------------------------------------------------------------------------

/// Behaviour outside the first/last key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Hold the end value.
    #[default]
    Clamp,
    /// Extend the end segment.
    Linear,
}

/// Piecewise-linear curve over ordered `(x, y)` control points.
///
/// Used for every tabulated response in the flight model: lift coefficient vs
/// angle of attack, induced drag vs speed, steering authority vs speed, lift
/// attenuation vs air density and the six parasitic drag directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCurve", into = "RawCurve")]
pub struct Curve {
    keys: Vec<(f64, f64)>,
    extrapolation: Extrapolation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCurve {
    keys: Vec<[f64; 2]>,
    #[serde(default)]
    extrapolation: Extrapolation,
}

impl TryFrom<RawCurve> for Curve {
    type Error = FlightError;

    fn try_from(raw: RawCurve) -> Result<Self> {
        let keys = raw.keys.into_iter().map(|[x, y]| (x, y)).collect();
        Ok(Curve::new(keys)?.with_extrapolation(raw.extrapolation))
    }
}

impl From<Curve> for RawCurve {
    fn from(c: Curve) -> Self {
        RawCurve {
            keys: c.keys.into_iter().map(|(x, y)| [x, y]).collect(),
            extrapolation: c.extrapolation,
        }
    }
}

impl Curve {
    /// Build from control points. Keys must be finite and strictly increasing in x.
    pub fn new(keys: Vec<(f64, f64)>) -> Result<Self> {
        if keys.is_empty() {
            return Err(FlightError::InvalidCurve("curve needs at least one key".into()));
        }
        if keys.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(FlightError::InvalidCurve("non-finite key".into()));
        }
        if keys.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(FlightError::InvalidCurve(
                "keys must be strictly increasing in x".into(),
            ));
        }
        Ok(Self { keys, extrapolation: Extrapolation::Clamp })
    }

    pub fn constant(value: f64) -> Self {
        Self { keys: vec![(0.0, value)], extrapolation: Extrapolation::Clamp }
    }

    /// Straight line through two points, clamped outside them.
    pub fn linear(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        Self::new(vec![(x0, y0), (x1, y1)])
    }

    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    pub fn keys(&self) -> &[(f64, f64)] {
        &self.keys
    }

    /// x range covered by the keys.
    pub fn domain(&self) -> (f64, f64) {
        (self.keys[0].0, self.keys[self.keys.len() - 1].0)
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.keys.len();
        if n == 1 {
            return self.keys[0].1;
        }
        let (first, last) = (self.keys[0], self.keys[n - 1]);

        if x <= first.0 {
            return match self.extrapolation {
                Extrapolation::Clamp => first.1,
                Extrapolation::Linear => lerp_segment(first, self.keys[1], x),
            };
        }
        if x >= last.0 {
            return match self.extrapolation {
                Extrapolation::Clamp => last.1,
                Extrapolation::Linear => lerp_segment(self.keys[n - 2], last, x),
            };
        }

        // First key strictly greater than x; bounds checks above keep it in 1..n.
        let hi = self.keys.partition_point(|&(kx, _)| kx <= x);
        lerp_segment(self.keys[hi - 1], self.keys[hi], x)
    }
}

fn lerp_segment(a: (f64, f64), b: (f64, f64), x: f64) -> f64 {
    let t = (x - a.0) / (b.0 - a.0);
    a.1 + t * (b.1 - a.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lift() -> Curve {
        Curve::new(vec![(-90.0, 0.0), (-15.0, -1.2), (0.0, 0.0), (15.0, 1.2), (90.0, 0.0)]).unwrap()
    }

    #[test]
    fn interpolates_between_keys() {
        let c = lift();
        assert_relative_eq!(c.evaluate(7.5), 0.6);
        assert_relative_eq!(c.evaluate(15.0), 1.2);
        assert_relative_eq!(c.evaluate(-7.5), -0.6);
    }

    #[test]
    fn clamps_outside_domain() {
        let c = Curve::linear(0.0, 1.0, 10.0, 2.0).unwrap();
        assert_relative_eq!(c.evaluate(-5.0), 1.0);
        assert_relative_eq!(c.evaluate(50.0), 2.0);
    }

    #[test]
    fn linear_extrapolation_extends_end_segments() {
        let c = Curve::linear(0.0, 0.0, 10.0, 1.0)
            .unwrap()
            .with_extrapolation(Extrapolation::Linear);
        assert_relative_eq!(c.evaluate(20.0), 2.0);
        assert_relative_eq!(c.evaluate(-10.0), -1.0);
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(Curve::new(vec![]).is_err());
        assert!(Curve::new(vec![(1.0, 0.0), (1.0, 2.0)]).is_err());
        assert!(Curve::new(vec![(2.0, 0.0), (1.0, 2.0)]).is_err());
        assert!(Curve::new(vec![(f64::NAN, 0.0)]).is_err());
    }

    #[test]
    fn constant_curve() {
        let c = Curve::constant(0.7);
        assert_eq!(c.evaluate(-1e6), 0.7);
        assert_eq!(c.evaluate(1e6), 0.7);
        assert_eq!(c.domain(), (0.0, 0.0));
    }

    #[test]
    fn yaml_round_trip_validates() {
        let c: Curve = serde_yaml::from_str("keys: [[0, 1], [100, 0.5]]\nextrapolation: linear").unwrap();
        assert_relative_eq!(c.evaluate(50.0), 0.75);
        assert_relative_eq!(c.evaluate(200.0), 0.0);

        let bad: std::result::Result<Curve, _> = serde_yaml::from_str("keys: [[5, 1], [1, 0]]");
        assert!(bad.is_err());
    }
}
