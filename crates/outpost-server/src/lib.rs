pub mod demo;
pub mod handlers;
pub mod state;

pub use handlers::router;
pub use state::AppState;
