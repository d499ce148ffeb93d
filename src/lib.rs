//! rmqform - declarative RabbitMQ provisioning over the management HTTP API

pub mod config;
pub mod error;
pub mod rabbitmq;
pub mod resource;
pub mod state;

/// Version injected at compile time via RMQFORM_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("RMQFORM_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
