//! velomap store - cached base collections and data source adapters
//!
//! The [`GeometryStore`] fetches the base datasets from a
//! [`DataSource`](velomap_core::ports::DataSource) once and shares the snapshot
//! across sessions until it goes stale.

pub mod altitude;
pub mod cache;
pub mod directory;
pub mod memory;

pub use altitude::AltitudeCache;
pub use cache::{GeometryStore, StoreOptions};
pub use directory::DirectorySource;
pub use memory::StaticSource;
