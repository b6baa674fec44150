pub mod flight;
pub mod sixdof;
pub mod state;

pub use flight::{FlightDynamics, FlightModel, Telemetry};
pub use sixdof::derivatives;
pub use state::{ControlInput, ControlState, Deriv, ForceAccumulator, RigidBodyState};
