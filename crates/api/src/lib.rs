//! HTTP surface: the tracking endpoint and the reporting/health routes.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
