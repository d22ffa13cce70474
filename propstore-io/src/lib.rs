#![warn(clippy::all)]

//! Binary persistence for propstore storages, property objects and containers
//!
//! Data is written as a sequence of nested, length-prefixed chunks through a [`SaveStream`](crate::stream::SaveStream)
//! and read back through a [`LoadStream`](crate::stream::LoadStream). The [`persist`] module defines the chunk
//! layouts of the individual propstore types and convenience functions for whole container files.

/// Chunked binary streams and the error type of this crate
pub mod stream;
/// Persisted layouts of storages, property objects and containers
pub mod persist;
