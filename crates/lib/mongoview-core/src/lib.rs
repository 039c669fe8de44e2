//! Core services for mongoview.
//!
//! This crate owns the store seam and its `MongoDB` implementation, the
//! control-plane query operations used to browse collections and documents, and
//! the startup handle that binds them together.

pub mod control;
pub mod services;
pub mod store;
