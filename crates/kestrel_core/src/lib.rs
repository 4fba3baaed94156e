//! # Kestrel Core
//!
//! Types and traits for composing and recording training jobs.
//!
//! - **[`hyperparameters`]**: Per-algorithm typed fields and defaults, looked up by algorithm id.
//! - **[`TrainingJobForm`](form::TrainingJobForm)**: One job draft, edited only through its updaters.
//! - **[`validate`](validate::validate)**: Every rule a draft breaks, as stable messages.
//! - **[`JobPayload`](payload::JobPayload)**: The independent copy of a draft that gets persisted.
//! - **[`JobStore`](traits::JobStore)**: Trait for implementing job persistence (e.g., Filesystem, OpenDAL, HTTP).
//! - **[`StatusSource`](status::StatusSource)**: Decides when a submitted job leaves `Pending`.
//! - **[`ListViewSession`](view::ListViewSession)**: Polls a store and advances statuses between polls.

pub mod api;
pub mod clock;
pub mod constants;
pub mod error;
pub mod form;
pub mod hyperparameters;
pub mod job;
pub mod payload;
pub mod session;
pub mod status;
pub mod store;
pub mod traits;
pub mod validate;
pub mod view;

pub mod prelude {
    pub use super::api::*;
    pub use super::clock::*;
    pub use super::error::*;
    pub use super::form::*;
    pub use super::hyperparameters::{HyperparameterConfig, HyperparameterValues};
    pub use super::job::*;
    pub use super::payload::*;
    pub use super::session::*;
    pub use super::status::*;
    pub use super::store::*;
    pub use super::traits::*;
    pub use super::validate::*;
    pub use super::view::*;
}
