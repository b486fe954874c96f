pub mod assignment;
pub mod config;
pub mod driver;
pub mod snapshot;

pub use assignment::*;
pub use config::*;
pub use driver::*;
pub use snapshot::*;
