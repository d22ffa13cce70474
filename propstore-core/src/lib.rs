#![warn(clippy::all)]

//! Core data structures for typed, column-oriented property storage
//!
//! Propstore stores per-element data (positions, types, velocities, ...) of large element sets like particles or
//! bonds as one contiguous array per property. Storages are shared between containers and cloned lazily on the
//! first modification. The best way to get started is to look at the [`PropertyContainer`](crate::containers::PropertyContainer)
//! type and the [containers](crate::containers) module.

pub extern crate nalgebra;
extern crate self as propstore_core;

pub mod containers;
/// Error types shared by all operations on properties and containers
pub mod error;
/// Defines data types, element types and the semantic roles of properties
pub mod layout;
/// Useful mathematical tools when working with property data
pub mod math;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{PropertyError, Result};
