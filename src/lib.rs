pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;
pub mod websocket;

pub use error::{AppError, AppResult};
pub use middleware::AdminSession;
pub use response::ApiResponse;
