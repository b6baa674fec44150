use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{FlightError, Result};

/// Where the wind blows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindMode {
    /// Everywhere.
    Global,
    /// Only strictly inside `radius` of `center`.
    Local { center: Vector3<f64>, radius: f64 },
    Disabled,
}

/// Horizontal wind applied as a plain world force on the airframe.
///
/// The force is `direction * speed(t)` where the direction is the compass
/// heading `direction_deg` (0 = +z, 90 = +x) and the speed gusts by
/// `round(sin(t * change_rate))` around the nominal value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(flatten)]
    pub mode: WindMode,
    pub direction_deg: f64,
    /// Nominal force magnitude, N.
    pub speed: f64,
    #[serde(default)]
    pub change_rate: f64,
}

impl Default for Wind {
    fn default() -> Self {
        Self { mode: WindMode::Disabled, direction_deg: 0.0, speed: 0.0, change_rate: 0.0 }
    }
}

impl Wind {
    pub fn global(direction_deg: f64, speed: f64) -> Self {
        Self { mode: WindMode::Global, direction_deg, speed, change_rate: 0.0 }
    }

    pub fn local(center: Vector3<f64>, radius: f64, direction_deg: f64, speed: f64) -> Self {
        Self { mode: WindMode::Local { center, radius }, direction_deg, speed, change_rate: 0.0 }
    }

    pub fn validate(&self) -> Result<()> {
        if ![self.direction_deg, self.speed, self.change_rate].iter().all(|v| v.is_finite()) {
            return Err(FlightError::Config(format!("wind parameters must be finite: {:?}", self)));
        }
        if let WindMode::Local { center, radius } = self.mode {
            if !(radius >= 0.0) || !center.iter().all(|c| c.is_finite()) {
                return Err(FlightError::Config(format!("invalid local wind area: {:?}", self.mode)));
            }
        }
        Ok(())
    }

    /// Unit horizontal direction the wind pushes toward.
    pub fn direction(&self) -> Vector3<f64> {
        let angle = self.direction_deg.to_radians();
        Vector3::new(angle.sin(), 0.0, angle.cos())
    }

    pub fn speed_at(&self, time: f64) -> f64 {
        self.speed + (time * self.change_rate).sin().round()
    }

    /// World force on a body at `position` at simulation `time`.
    pub fn force_at(&self, position: &Vector3<f64>, time: f64) -> Vector3<f64> {
        match self.mode {
            WindMode::Disabled => Vector3::zeros(),
            WindMode::Local { center, radius } if (position - center).norm() >= radius => Vector3::zeros(),
            _ => self.direction() * self.speed_at(time),
        }
    }
}
