//! HTTP control surface for the dirwatch service.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
