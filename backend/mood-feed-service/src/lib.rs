/// Mood Feed Service Library
///
/// Serves a social feed ranked by the viewer's self-declared mood, with
/// follow and like affinity as secondary signals.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Users, posts, comments and feed response shapes
/// - `services`: Mood ranking, pagination, augmentation, feed facade, posts
/// - `db`: Repository traits with PostgreSQL and in-memory implementations
/// - `middleware`: JWT authentication and request timing
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
