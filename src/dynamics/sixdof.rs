use nalgebra::{Quaternion, Vector3};

use crate::dynamics::state::{Deriv, ForceAccumulator, RigidBodyState};

// ---------------------------------------------------------------------------
// 6DOF Equations of motion
// ---------------------------------------------------------------------------

/// Rigid-body state derivatives under a constant force/torque plus uniform
/// gravity.
///
///   1. Translation: a = F / m + g (world)
///   2. Rotation: Euler's equation in the body frame with principal inertia,
///      I * domega = torque - omega x (I * omega), rotated back to world
///   3. Attitude: dq/dt = 0.5 * omega_world * q
pub fn derivatives(state: &RigidBodyState, accumulator: &ForceAccumulator, gravity: &Vector3<f64>) -> Deriv {
    let accel = accumulator.force / state.mass + gravity;

    // --- Euler's equation (body frame) ---
    let omega = state.to_local(&state.angular_velocity);
    let torque = state.to_local(&accumulator.torque);
    let i_vec = state.inertia;
    let i_omega = i_vec.component_mul(&omega);
    let domega_body = (torque - omega.cross(&i_omega)).component_div(&i_vec);

    // --- Quaternion kinematics (world-frame rate) ---
    let w = state.angular_velocity;
    let omega_quat = Quaternion::new(0.0, w.x, w.y, w.z);
    let dquat = omega_quat * state.orientation.quaternion() * 0.5;

    Deriv {
        dpos: state.velocity,
        dvel: accel,
        dquat,
        domega: state.to_world(&domega_body),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gravity() -> Vector3<f64> {
        Vector3::new(0.0, -9.81, 0.0)
    }

    fn body() -> RigidBodyState {
        RigidBodyState::level(1000.0, 100.0, 2000.0, Vector3::new(4000.0, 6000.0, 1000.0))
    }

    #[test]
    fn free_fall_without_forces() {
        let s = body();
        let d = derivatives(&s, &ForceAccumulator::new(), &gravity());
        assert_relative_eq!(d.dvel, gravity());
        assert_relative_eq!(d.dpos, s.velocity);
        assert_eq!(d.domega, Vector3::zeros());
    }

    #[test]
    fn force_accelerates_by_mass() {
        let s = body();
        let mut acc = ForceAccumulator::new();
        acc.add_force(&Vector3::new(0.0, 2000.0 * 9.81, 4000.0));
        let d = derivatives(&s, &acc, &gravity());
        assert_relative_eq!(d.dvel, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
    }

    #[test]
    fn torque_over_inertia() {
        let s = body();
        let mut acc = ForceAccumulator::new();
        acc.torque = Vector3::new(400.0, 0.0, 0.0);
        let d = derivatives(&s, &acc, &gravity());
        assert_relative_eq!(d.domega, Vector3::new(0.1, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn gyroscopic_coupling() {
        let mut s = body();
        s.angular_velocity = Vector3::new(1.0, 0.0, 1.0);
        let d = derivatives(&s, &ForceAccumulator::new(), &gravity());
        let (ix, iy, iz) = (s.inertia.x, s.inertia.y, s.inertia.z);
        assert_relative_eq!(d.domega.y, -(ix - iz) / iy, epsilon = 1e-12);
        assert_relative_eq!(d.domega.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn quat_deriv_zero_at_rest() {
        let d = derivatives(&body(), &ForceAccumulator::new(), &gravity());
        assert!(d.dquat.norm() < 1e-12, "No rotation -> zero quat derivative");
    }

    #[test]
    fn quat_deriv_follows_yaw_rate() {
        let mut s = body();
        s.angular_velocity = Vector3::new(0.0, 1.0, 0.0);
        let d = derivatives(&s, &ForceAccumulator::new(), &gravity());
        assert_relative_eq!(d.dquat.j, 0.5, epsilon = 1e-12);
        assert_relative_eq!(d.dquat.w, 0.0, epsilon = 1e-12);
    }
}
