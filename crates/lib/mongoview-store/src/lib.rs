//! Data model and schema helpers for mongoview.
//!
//! This crate defines the identifier type and the result payloads shared by the
//! query pipeline and the HTTP surface.

pub mod models;
pub mod schema;

pub use models::*;
