use crate::{api, prelude::*};
use kestrel_core::constants::routes;
use kestrel_core::prelude::*;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

/// The builder for the Kestrel Server.
#[derive(Clone, Debug, Default)]
pub struct KestrelServer {
    config: KestrelServerConfig,
}

impl KestrelServer {
    pub fn new(config: KestrelServerConfig) -> Self {
        Self { config }
    }
}

#[derive(Clone, Debug, Default)]
pub struct KestrelServerConfig {
    /// Prefix for the job routes, e.g. `/training`.
    ///
    /// Defaults to the empty prefix.
    pub base_path: String,
}

impl KestrelServerConfig {
    fn jobs_route(&self) -> String {
        let base = self.base_path.trim_end_matches('/');
        match base {
            "" => routes::JOBS.to_string(),
            b if b.starts_with('/') => format!("{b}{}", routes::JOBS),
            b => format!("/{b}{}", routes::JOBS),
        }
    }
}

impl KestrelServer {
    pub fn build<S: JobStore>(self, store: S) -> Router {
        let jobs = self.config.jobs_route();
        tracing::debug!(route = %jobs, "Mounting job routes");

        Router::new()
            .route(routes::HEALTH, get(|| async { "OK" }))
            .route(
                &jobs,
                get(api::list_jobs::<S>)
                    .post(api::persist_job::<S>)
                    .delete(api::clear_jobs::<S>),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(AppState { store })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_route_is_prefixed() {
        let route = |base: &str| {
            KestrelServerConfig {
                base_path: base.into(),
            }
            .jobs_route()
        };
        assert_eq!(route(""), "/api/jobs");
        assert_eq!(route("/"), "/api/jobs");
        assert_eq!(route("/training/"), "/training/api/jobs");
        assert_eq!(route("training"), "/training/api/jobs");
    }
}
