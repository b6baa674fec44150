use serde::{Deserialize, Serialize};

use crate::error::{check_dt, FlightError, Result};

// ---------------------------------------------------------------------------
// PID Controller (single axis)
// ---------------------------------------------------------------------------

/// Source of the derivative term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeMode {
    /// D term always zero; the loop runs as PI with the D gain kept in config.
    #[default]
    Disabled,
    /// Negative rate of change of the measured value (no kick on setpoint steps).
    Measurement,
    /// Rate of change of the error.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    #[serde(default = "default_output_min")]
    pub output_min: f64,
    #[serde(default = "default_output_max")]
    pub output_max: f64,
    pub integral_saturation: f64,
    #[serde(default)]
    pub derivative_mode: DerivativeMode,
}

fn default_output_min() -> f64 { -1.0 }
fn default_output_max() -> f64 { 1.0 }

impl PidConfig {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            output_min: -1.0,
            output_max: 1.0,
            integral_saturation: 1.0,
            derivative_mode: DerivativeMode::Disabled,
        }
    }

    pub fn output_range(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    pub fn integral_saturation(mut self, v: f64) -> Self {
        self.integral_saturation = v;
        self
    }

    pub fn derivative_mode(mut self, mode: DerivativeMode) -> Self {
        self.derivative_mode = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.output_min <= self.output_max) {
            return Err(FlightError::Config(format!(
                "PID output range inverted: [{}, {}]",
                self.output_min, self.output_max
            )));
        }
        if !(self.integral_saturation >= 0.0) {
            return Err(FlightError::Config(format!(
                "PID integral saturation must be non-negative, got {}",
                self.integral_saturation
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Pid {
    config: PidConfig,
    integral: f64,
    last_error: f64,
    last_value: f64,
    derivative_initialized: bool,
}

impl Pid {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            last_error: 0.0,
            last_value: 0.0,
            derivative_initialized: false,
        }
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Drive `current` toward `target`. Output is clamped to the configured range.
    ///
    /// Fails on a non-positive `dt` without touching the accumulator.
    pub fn update(&mut self, dt: f64, current: f64, target: f64) -> Result<f64> {
        check_dt(dt)?;
        let c = &self.config;

        let error = target - current;
        let p = c.kp * error;

        self.integral = (self.integral + error * dt).clamp(-c.integral_saturation, c.integral_saturation);
        let i = c.ki * self.integral;

        let rate = match (c.derivative_mode, self.derivative_initialized) {
            (DerivativeMode::Disabled, _) | (_, false) => 0.0,
            (DerivativeMode::Measurement, true) => -(current - self.last_value) / dt,
            (DerivativeMode::Error, true) => (error - self.last_error) / dt,
        };
        let d = c.kd * rate;

        self.last_error = error;
        self.last_value = current;
        self.derivative_initialized = true;

        Ok((p + i + d).clamp(c.output_min, c.output_max))
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.last_value = 0.0;
        self.derivative_initialized = false;
    }
}
