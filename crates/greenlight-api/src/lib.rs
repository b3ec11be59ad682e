//! Axum HTTP front end for traffic-camera uploads.
//!
//! This crate provides:
//! - The upload form and result pages
//! - Static serving of uploaded and annotated images
//! - Health, readiness and Prometheus endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod views;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, StartupError};
