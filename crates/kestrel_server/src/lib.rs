//! # Kestrel Server
//!
//! A small, Axum-based server exposing a [`JobStore`](kestrel_core::traits::JobStore) over HTTP.
//!
//! Provides the [`KestrelServer`] builder, which wraps any job store in the
//! `GET`, `POST` and `DELETE /api/jobs` routes.
//!
//! ## Example
//!
//! ```no_run
//! use kestrel_server::prelude::*;
//! use kestrel_fs::FileSystemJobStore;
//!
//! # async fn run() {
//! let store = FileSystemJobStore::new("./tmp/jobs");
//!
//! let app = KestrelServer::default().build(store);
//! # }
//! ```

mod api;
mod server;

pub mod state;

pub use server::{KestrelServer, KestrelServerConfig};

pub mod prelude {
    pub use crate::state::*;
    pub use crate::{KestrelServer, KestrelServerConfig};
}
