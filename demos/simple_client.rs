//! # Simple Client Example
//!
//! Submits one training job to a running server and prints the job list.
//!
//! ## Usage
//!
//! ```sh
//! cargo run --example simple_server --features "server fs"
//! cargo run --example simple_client --features "client"
//! ```

use kestrel::prelude::*;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let url = env::var("KESTREL_SERVER").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = KestrelClient::new(url);

    let mut session = FormSession::new(Arc::new(SystemClock), Arc::new(SimulatedDelay::default()));
    session
        .apply(|form| form.set_priority(750.0))
        .apply(|form| {
            form.update_resources(ResourcesPatch {
                gpu_count: Some(1.0),
                ..Default::default()
            })
        });

    let outcome = session.submit(&client).await;
    println!("{}", outcome.message());

    for job in client.list_jobs().await? {
        println!("{:<40} {:<10} {}", job.id, job.status, job.algorithm);
    }
    Ok(())
}
