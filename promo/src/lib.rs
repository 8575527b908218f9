pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod post;
pub mod publish;
pub mod server;

pub use config::Configuration;
pub use error::AppError;
pub use server::{router, AppState};
