pub mod cyclone;
pub mod environment;
pub mod names;
pub mod pressure_cells;
pub mod synthetic;

pub use cyclone::{Category, CycloneState, TrackPoint};
pub use environment::{Environment, LandStatus};
pub use names::{Basin, NameRegistry};
pub use pressure_cells::{Layer, PressureCell, PressureFieldModel};
