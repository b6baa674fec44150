pub mod airflow;
pub mod atmosphere;
pub mod drag;
pub mod surface;
pub mod wind;

pub use airflow::{AirflowEstimator, AirflowState, FlatGround, GroundProbe, LayerMask};
pub use drag::{angular_damping, parasitic_drag, DragCurves, DragLoads, ResistanceProxy};
pub use surface::{AeroSurface, LiftCurves, SurfaceArena, SurfaceConfig, SurfaceForce, SurfaceHandle, SurfaceKind, SurfaceRole};
pub use wind::{Wind, WindMode};
