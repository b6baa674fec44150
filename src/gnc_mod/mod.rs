pub mod controller;
pub mod limiter;
pub mod pid;
pub mod recovery;

pub use controller::{AttitudeHold, HoldInput, Pilot};
pub use limiter::GEnvelope;
pub use pid::{DerivativeMode, Pid, PidConfig};
pub use recovery::{avoid_ground_input, recover_speed_input, Attitude};
