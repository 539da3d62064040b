//! Abutters Service - Feature service port and adapters
//!
//! This crate defines the spatial query port the orchestrator talks to and
//! provides an ArcGIS REST adapter plus an in-memory adapter for development
//! and testing.

pub mod arcgis;
pub mod decode;
pub mod memory;
pub mod ports;

pub use arcgis::ArcGisFeatureService;
pub use decode::FeatureDecoder;
pub use memory::MemoryFeatureService;
pub use ports::{FieldEquals, SpatialQueryClient};
