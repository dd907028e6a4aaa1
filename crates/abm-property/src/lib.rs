//! `abm-property` — indexed storage of one property's values across all
//! agent indices.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`container`] | `PropertyContainer` trait, `new_container`, removal tracking |
//! | [`boolean`]   | `BooleanContainer` (bit-packed)                             |
//! | [`int`]       | `IntValueContainer` (compacting) + `IntContainer`, `LongContainer`, `EnumContainer` |
//! | [`dense`]     | `FloatContainer`, `DoubleContainer`                         |
//! | [`object`]    | `ObjectContainer`                                           |
//!
//! # Contract (all containers)
//!
//! - `get(i)` on an index never assigned returns the fallback value (the
//!   definition's default, or the type's zero) without storing anything.
//! - Storage covers `0..=highest assigned index` and only grows.
//!   `ensure_capacity` reserves ahead; nothing ever shrinks automatically.
//! - `remove_id(i)` does **not** clear the stored value.  The owning data
//!   manager never exposes a removed index as alive again, so the stale value
//!   is unreachable through the kernel's APIs.

pub mod boolean;
pub mod container;
pub mod dense;
pub mod int;
pub mod object;


pub use boolean::BooleanContainer;
pub use container::{new_container, NoRemovals, PropertyContainer, RemovalLog, RemovedIndices};
pub use dense::{DoubleContainer, FloatContainer};
pub use int::{EnumContainer, IntContainer, IntValueContainer, LongContainer};
pub use object::ObjectContainer;
