//! `abm-core` — foundational types for the `abm` simulation kernel.
//!
//! This crate is a dependency of every other `abm-*` crate.  It has no
//! `abm-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`ids`]       | `AgentIndex`, `PropertyId`, `PlanId`, `PluginId`, …        |
//! | [`value`]     | `PropertyValue`, `ValueType`, `Label`, `Equality`          |
//! | [`property`]  | `PropertyDefinition` and its validating builder            |
//! | [`events`]    | `Event` marker trait and the kernel's built-in events      |
//! | [`time`]      | `SimClock`, `SimConfig`                                    |
//! | [`rng`]       | `SimRng` (one per simulation run)                          |
//! | [`error`]     | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, `ValueType`,        |
//! |         | `Equality` and `SimConfig`.                                |

pub mod error;
pub mod events;
pub mod ids;
pub mod property;
pub mod rng;
pub mod time;
pub mod value;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use events::{AgentAdded, AgentRemoved, Event, PropertyUpdate};
pub use ids::{
    ActorId, AgentIndex, EventLabelerId, PartitionId, PlanId, PluginId, PropertyId,
    ReplicationId, ScenarioId, SubscriptionId,
};
pub use property::{PropertyDefinition, PropertyDefinitionBuilder};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig};
pub use value::{Equality, Label, ObjectHandle, PropertyValue, ValueType};
