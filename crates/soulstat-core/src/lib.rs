//! Configuration loading for the Soul Stat proxy.

pub mod config;

pub use config::Config;
