use nalgebra::Vector3;

/// Scale each component by one of two factors picked by its sign.
///
/// Positive components use the `pos_*` factor, zero and negative ones use
/// `neg_*`. Used wherever a response differs per direction (drag faces,
/// G envelope).
pub fn scale6(
    v: &Vector3<f64>,
    pos_x: f64,
    neg_x: f64,
    pos_y: f64,
    neg_y: f64,
    pos_z: f64,
    neg_z: f64,
) -> Vector3<f64> {
    let pick = |c: f64, pos: f64, neg: f64| if c > 0.0 { c * pos } else { c * neg };
    Vector3::new(
        pick(v.x, pos_x, neg_x),
        pick(v.y, pos_y, neg_y),
        pick(v.z, pos_z, neg_z),
    )
}

/// Move `value` toward `target` by at most `speed * dt`, then clamp to `[min, max]`.
pub fn move_to(value: f64, target: f64, speed: f64, dt: f64, min: f64, max: f64) -> f64 {
    let step = (speed * dt).abs();
    let delta = (target - value).clamp(-step, step);
    (value + delta).clamp(min, max)
}

pub fn clamp_magnitude(v: &Vector3<f64>, max: f64) -> Vector3<f64> {
    let n = v.norm();
    if n > max && n > 0.0 {
        v * (max / n)
    } else {
        *v
    }
}

/// Normalize, or zero for vectors too short to carry a direction.
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(1e-9).unwrap_or_else(Vector3::zeros)
}

/// Map an angle in degrees into (-180, 180].
pub fn wrap_signed_degrees(deg: f64) -> f64 {
    let raw = deg.rem_euclid(360.0);
    if raw > 180.0 {
        raw - 360.0
    } else {
        raw
    }
}
