//! # OpenDAL Server Example
//!
//! Showcases an [`OpendalJobStore`] backend server (configured for fs), using the
//! same key layout as the browser's local storage.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --example opendal_server --features "server opendal"
//! ```

use kestrel::prelude::*;
use opendal::{Operator, services::Fs};
use std::env;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Swap the builder for S3, GCS or Azure (e.g. opendal::services::S3) to keep jobs remotely.
    let root_path = env::var("KESTREL_FS_ROOT").unwrap_or_else(|_| "/tmp/kestrel_opendal".to_string());
    let builder = Fs::default().root(&root_path);

    let op = Operator::new(builder)
        .expect("Failed to build OpenDAL operator")
        .finish();

    let store = OpendalJobStore::new(op);

    // Build
    let app = KestrelServer::new(KestrelServerConfig {
        base_path: env::var("KESTREL_BASE_PATH").unwrap_or_default(),
    })
    .build(store);

    // Serve
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    println!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
