pub mod accident;
pub mod experience;
pub mod task;

pub use accident::*;
pub use experience::*;
pub use task::*;
