pub mod api;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod runtime;
pub mod server;
pub mod store;
pub mod verify;

// Re-export commonly used types
pub use config::{Args, ServiceConfig};
pub use error::ApiError;
pub use models::{ModelCache, ModelHandle, ModelLoader};
pub use server::state::AppState;
pub use store::{ContentStore, GatewayStore, LocalStore};
