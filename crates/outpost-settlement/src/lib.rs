pub mod building;
pub mod demand;
pub mod settlement;
pub mod sick_bay;

pub use building::*;
pub use demand::*;
pub use settlement::*;
pub use sick_bay::*;
