use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::math::{normalize_or_zero, scale6, Curve};

// ---------------------------------------------------------------------------
// Parasitic drag
// ---------------------------------------------------------------------------

/// Drag coefficient per body face, each a function of the speed along that axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragCurves {
    pub forward: Curve,
    pub backward: Curve,
    pub left: Curve,
    pub right: Curve,
    pub top: Curve,
    pub bottom: Curve,
}

impl DragCurves {
    pub fn uniform(curve: Curve) -> Self {
        Self {
            forward: curve.clone(),
            backward: curve.clone(),
            left: curve.clone(),
            right: curve.clone(),
            top: curve.clone(),
            bottom: curve,
        }
    }
}

/// Additive forward drag coefficients for deployable items.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DragLoads {
    pub airbrake: f64,
    pub flaps: f64,
    pub gear: f64,
    /// Per external store (drop tank, pod).
    pub external_store: f64,
}

impl DragLoads {
    pub fn extra_forward(&self, airbrake: bool, flaps: bool, gear: bool, stores: u32) -> f64 {
        let on = |deployed: bool, c: f64| if deployed { c } else { 0.0 };
        on(airbrake, self.airbrake)
            + on(flaps, self.flaps)
            + on(gear, self.gear)
            + stores as f64 * self.external_store
    }
}

/// Whole-airframe drag in the body frame, plus its magnitude.
///
/// The direction-weighted coefficient blends the six face curves by the
/// components of the normalised local velocity.
pub fn parasitic_drag(
    local_velocity: &Vector3<f64>,
    curves: &DragCurves,
    extra_forward: f64,
) -> (Vector3<f64>, f64) {
    let dir = normalize_or_zero(local_velocity);
    if dir == Vector3::zeros() {
        return (Vector3::zeros(), 0.0);
    }
    let lv = local_velocity;
    let coefficient = scale6(
        &dir,
        curves.right.evaluate(lv.x.abs()),
        curves.left.evaluate(lv.x.abs()),
        curves.top.evaluate(lv.y.abs()),
        curves.bottom.evaluate(lv.y.abs()),
        curves.forward.evaluate(lv.z.abs()) + extra_forward,
        curves.backward.evaluate(lv.z.abs()),
    );
    let drag = -dir * (coefficient.norm() * lv.norm_squared());
    let magnitude = drag.norm();
    (drag, magnitude)
}

// ---------------------------------------------------------------------------
// Angular damping
// ---------------------------------------------------------------------------

/// Body-frame angular deceleration opposing rotation, quadratic in rate.
pub fn angular_damping(local_angular_velocity: &Vector3<f64>, coefficients: &Vector3<f64>) -> Vector3<f64> {
    let w = local_angular_velocity;
    (-normalize_or_zero(w) * w.norm_squared()).component_mul(coefficients)
}

// ---------------------------------------------------------------------------
// Resistance proxy
// ---------------------------------------------------------------------------

/// Edge length of the speed-scaled probe volume handed to the collision layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceProxy {
    pub bias: f64,
    pub damping: f64,
}

impl ResistanceProxy {
    pub fn size(&self, speed: f64) -> f64 {
        if self.damping <= 0.0 {
            return self.bias;
        }
        (self.bias * speed / self.damping).max(self.bias)
    }
}

impl Default for ResistanceProxy {
    fn default() -> Self {
        Self { bias: 1.0, damping: 100.0 }
    }
}
