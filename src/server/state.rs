//! Server state management.

use crate::convert::Converter;
use std::sync::Arc;

/// Shared application state: one converter for every request.
///
/// The converter is read-only after construction, so no lock is needed;
/// each request gets its own staging directory.
#[derive(Clone, Debug)]
pub struct AppState {
    pub converter: Arc<Converter>,
}

impl AppState {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter: Arc::new(converter),
        }
    }
}
