pub mod entry;
pub mod memory;
pub mod recorder;
pub mod traits;

pub use entry::*;
pub use memory::*;
pub use recorder::*;
pub use traits::*;
