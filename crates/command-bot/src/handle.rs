//! Late-bound dispatcher reference.

use command_engine::Dispatcher;
use std::sync::{Arc, OnceLock};

/// Lets commands and timers reach the dispatcher that is built after them.
///
/// Registered handlers are created before the dispatcher that owns the
/// registry, so they receive an unbound handle that is bound once at
/// startup.
#[derive(Clone, Default)]
pub struct DispatcherHandle(Arc<OnceLock<Arc<Dispatcher>>>);

impl DispatcherHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the dispatcher. Later calls are ignored.
    pub fn bind(&self, dispatcher: Arc<Dispatcher>) {
        let _ = self.0.set(dispatcher);
    }

    pub fn get(&self) -> Option<&Arc<Dispatcher>> {
        self.0.get()
    }
}
