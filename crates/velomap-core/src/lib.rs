//! velomap core - domain models, CRS tagging, configuration and ports
//!
//! This crate holds the bike-share domain types shared by the spatial engine,
//! the geometry store and the CLI.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;

pub use error::{Result, VelomapError};
