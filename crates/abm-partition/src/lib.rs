//! `abm-partition` — continuously correct subsets of the population.
//!
//! A partition groups the agents that pass a [`Filter`] into buckets keyed
//! by the tuple of labels its [`Labeler`]s assign.  Labelers and filters
//! declare which events can change their outcome for one agent
//! ([`Sensitivity`]); the owner of a [`PartitionIndex`] forwards matching
//! events and only the affected agent is re-evaluated.
//!
//! # Crate layout
//!
//! | Module          | Contents                                             |
//! |-----------------|------------------------------------------------------|
//! | [`view`]        | `PopulationView` — what evaluation may read          |
//! | [`sensitivity`] | `Sensitivity` (event type + agent extractor)         |
//! | [`labeler`]     | `Labeler<C>`                                         |
//! | [`filter`]      | `Filter<C>`                                          |
//! | [`label_set`]   | `LabelSet` — query keys with wildcard dimensions     |
//! | [`index`]       | `Partition<C>`, `PartitionIndex<C>`                  |
//! | [`error`]       | `PartitionError`, `PartitionResult<T>`               |
//!
//! # Update protocol
//!
//! Evaluation needs `&C` while the index lives inside `C`, so every update
//! is two-phase:
//!
//! ```text
//! outcome = index.evaluate(&ctx, agent)?     // shared borrows only
//! index.apply(agent, outcome)                 // then one &mut
//! ```

pub mod error;
pub mod filter;
pub mod index;
pub mod label_set;
pub mod labeler;
pub mod sensitivity;
pub mod view;


pub use error::{PartitionError, PartitionResult};
pub use filter::Filter;
pub use index::{Outcome, Partition, PartitionIndex};
pub use label_set::LabelSet;
pub use labeler::Labeler;
pub use sensitivity::Sensitivity;
pub use view::PopulationView;
