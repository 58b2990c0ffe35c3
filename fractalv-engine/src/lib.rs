pub mod budget;
pub mod config;
pub mod ensemble;
pub mod hurst;
pub mod models;
pub mod sampler;
pub mod stats;
