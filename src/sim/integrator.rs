use nalgebra::{UnitQuaternion, Vector3};

use crate::dynamics::sixdof::derivatives;
use crate::dynamics::state::{ForceAccumulator, RigidBodyState};

// ---------------------------------------------------------------------------
// 6DOF RK4 integrator with constant loads over the step
// ---------------------------------------------------------------------------

/// Single RK4 step. The force/torque accumulator is held constant over the
/// step; the orientation is renormalised at the end.
pub fn rk4_step(
    state: &RigidBodyState,
    accumulator: &ForceAccumulator,
    gravity: &Vector3<f64>,
    dt: f64,
) -> RigidBodyState {
    let k1 = derivatives(state, accumulator, gravity);
    let k2 = derivatives(&state.apply(&k1, dt * 0.5), accumulator, gravity);
    let k3 = derivatives(&state.apply(&k2, dt * 0.5), accumulator, gravity);
    let k4 = derivatives(&state.apply(&k3, dt), accumulator, gravity);

    let new_quat_raw = state.orientation.quaternion()
        + (k1.dquat + k2.dquat * 2.0 + k3.dquat * 2.0 + k4.dquat) * (dt / 6.0);

    RigidBodyState {
        position: state.position + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        orientation: UnitQuaternion::new_normalize(new_quat_raw),
        velocity: state.velocity + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        angular_velocity: state.angular_velocity
            + (k1.domega + 2.0 * k2.domega + 2.0 * k3.domega + k4.domega) * (dt / 6.0),
        mass: state.mass,
        inertia: state.inertia,
    }
}
