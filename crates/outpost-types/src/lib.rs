pub mod error;
pub mod event;
pub mod malfunction;
pub mod process;
pub mod rating;
pub mod worker;

pub use error::*;
pub use event::*;
pub use malfunction::*;
pub use process::*;
pub use rating::*;
pub use worker::*;
