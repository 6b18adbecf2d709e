pub mod params;
pub mod rest;

pub use rest::{create_rest_router, AppState};
