pub mod aircraft;
pub mod propulsion;

pub use aircraft::{presets, AircraftConfig, SurfaceBuilder};
pub use propulsion::{Powerplant, PowerplantConfig, PowerplantKind, PowerplantOutput};
