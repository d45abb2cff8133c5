mod auth;
mod error;
pub mod routes;
mod service;
mod settings_store;

pub use auth::*;
pub use error::*;
pub use service::*;
pub use settings_store::*;
