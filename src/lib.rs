//! # Kestrel
//!
//! Compose, validate and record machine-learning training-job configurations.
//!
//! A draft is edited through named updaters, checked by the validator, turned
//! into a submission payload and recorded in a job store together with a short
//! summary. The list view polls that store and moves simulated `Pending` jobs to
//! `Running` once their delay has elapsed.
//!
//! This crate serves as an entry point, re-exporting the core logic and
//! optionally including server, client, and storage implementations via feature flags.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **`server`** | Includes the Axum-based job server (`kestrel_server`). |
//! | **`client`** | Includes the HTTP client (`kestrel_client`) for tooling. |
//! | **`fs`** | Job store on the local filesystem (`kestrel_fs`). |
//! | **`opendal`** | Job store over any OpenDAL operator (`kestrel_opendal`). |
//!
//! ## Example: Job Server
//!
//! ```toml
//! [dependencies]
//! kestrel = { version = "0.3", features = ["server", "fs"] }
//! ```
//!
//! ```rust,no_run
//! use kestrel::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = FileSystemJobStore::new("./tmp/jobs");
//!
//!     // Build
//!     let app = KestrelServer::default().build(store);
//!
//!     // Serve
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub use kestrel_core::*;

#[cfg(feature = "server")]
pub mod server {
    pub use kestrel_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use kestrel_client::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use kestrel_fs::*;
}

#[cfg(feature = "opendal")]
pub mod opendal {
    pub use kestrel_opendal::*;
}

pub mod prelude {
    pub use kestrel_core::prelude::*;

    #[cfg(feature = "server")]
    pub use kestrel_server::prelude::*;

    #[cfg(feature = "client")]
    pub use kestrel_client::KestrelClient;

    #[cfg(feature = "fs")]
    pub use kestrel_fs::FileSystemJobStore;

    #[cfg(feature = "opendal")]
    pub use kestrel_opendal::OpendalJobStore;
}
