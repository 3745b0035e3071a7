pub mod config;
pub mod errors;
pub mod logging;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
