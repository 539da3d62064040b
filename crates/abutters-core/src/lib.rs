//! Abutters Core - Domain models, errors, and configuration
//!
//! This crate contains the parcel, selection and buffer models shared by the
//! geometry, service and orchestrator crates.

pub mod config;
pub mod error;
pub mod models;

pub use error::{AbuttersError, ErrorKind, Result};
