//! Storage and containers for per-element properties.
//!
//! # Storage model
//!
//! A property is one column of values, one value per element (e.g. the position of every particle). Its memory is a
//! [`PropertyStorage`]: a contiguous buffer of `size * stride` bytes together with the layout of one element
//! (primitive [`DataType`](crate::layout::DataType), number of vector components, and stride in bytes) plus its
//! name and semantic type id.
//!
//! Storages are shared through [`PropertyPtr`], an atomically reference-counted pointer. Sharing is copy-on-write:
//! reading never copies, and every mutating access goes through [`make_mutable`], which clones the storage first if
//! anyone else still holds it.
//!
//! # Owners
//!
//! - [`PropertyObject`] wraps one storage together with per-property metadata (element types, a display title) and
//!   change notification. Modifications happen through a [`ScopedStorage`] guard, which notifies observers once
//!   the modification is finished.
//! - [`PropertyContainer`] is an ordered set of properties that all have the same number of elements. The kind of
//!   container (e.g. [`Particles`](crate::layout::Particles) or [`Bonds`](crate::layout::Bonds)) determines which
//!   standard properties it understands. Cloning a container is cheap since all storages are shared.
//!
//! # Views
//!
//! Typed access to the values of a storage goes through views, which check the layout once on construction:
//! - [`PropertyView`] and [`PropertyViewMut`] interpret each element as one `T` (e.g. `Vector3<f64>`)
//! - [`PropertyTableView`] and [`PropertyTableViewMut`] address single components of multi-component properties
//! - [`RawPropertyView`] and [`RawPropertyViewMut`] convert values from and to the stored data type on the fly

mod storage;
pub use self::storage::*;

mod views;
pub use self::views::*;

mod table_views;
pub use self::table_views::*;

mod raw_view;
pub use self::raw_view::*;

mod notify;
pub use self::notify::*;

mod shared;
pub use self::shared::*;

mod element_type;
pub use self::element_type::*;

mod property_object;
pub use self::property_object::*;

mod container;
pub use self::container::*;
