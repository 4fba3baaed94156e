use kestrel_core::prelude::*;

#[derive(Clone)]
pub struct AppState<S: JobStore> {
    pub store: S,
}

impl<S: JobStore> AppState<S> {
    pub fn store(&self) -> &S {
        &self.store
    }
}
