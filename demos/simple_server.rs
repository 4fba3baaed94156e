//! # Simple Server Example
//!
//! Showcases a minimal [`KestrelServer`] recording jobs on the local filesystem.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --example simple_server --features "server fs"
//! ```

use kestrel::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    // Store
    let store = FileSystemJobStore::new("./tmp/jobs");

    // Build App
    let app = KestrelServer::default().build(store);

    // Serve
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    println!("Server listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
