pub mod candidate;
pub mod descriptor;
pub mod generator;
pub mod registry;
pub mod scoring;
pub mod standard;

pub use candidate::*;
pub use descriptor::*;
pub use generator::*;
pub use registry::*;
pub use scoring::*;
pub use standard::*;
