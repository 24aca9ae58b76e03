pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod listener;
pub mod models;
pub mod session;
pub mod store;

pub use auth::AuthClient;
pub use config::Config;
pub use error::{GatewayError, Operation, StoreError};
pub use filter::select;
pub use gateway::{HttpGateway, TodoGateway};
pub use listener::spawn_session_listener;
pub use models::{FilterMode, NewTodo, Todo, TodoPatch};
pub use session::Session;
pub use store::{FetchOutcome, Phase, StoreSnapshot, TodoStore};
