//! `abm-plugin` — how a simulation is assembled.
//!
//! A simulation is a set of plugins.  Each plugin names the plugins it
//! depends on, carries immutable plugin data (its initial state), and an
//! initializer the kernel runs once, in dependency order, before the first
//! plan executes.  Initializers register data managers: the stateful,
//! type-keyed components that own the model's state for the rest of the run.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`plugin`]   | `Plugin<I>`, `PluginBuilder<I>`                            |
//! | [`data`]     | `PluginData` marker trait                                  |
//! | [`resolve`]  | `resolve_load_order` (stable topological sort)             |
//! | [`registry`] | `DataManager` marker trait, `DataManagerRegistry`          |
//! | [`error`]    | `PluginError`, `PluginResult<T>`                           |
//!
//! The initializer type `I` is left open; `abm-sim` instantiates it with
//! its `PluginContext` closure type.

pub mod data;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod resolve;


pub use data::{AnyData, PluginData};
pub use error::{PluginError, PluginResult};
pub use plugin::{Plugin, PluginBuilder};
pub use registry::{DataManager, DataManagerRegistry};
pub use resolve::resolve_load_order;
