pub mod live;
pub mod queue;
pub mod workshop;

pub use live::*;
pub use queue::*;
pub use workshop::*;
