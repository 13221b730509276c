//! Lifecycle events and the cross-thread stop flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Handler = Box<dyn FnMut(&str) + Send>;

/// Multi-subscriber notification carrying the kernel name.
///
/// Fired only from `initialize`/`finalize`, never from `step`.
#[derive(Default)]
pub struct Event {
    handlers: Vec<Handler>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn fire(&mut self, kernel_name: &str) {
        for handler in &mut self.handlers {
            handler(kernel_name);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl core::fmt::Debug for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Event")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

/// Cloneable flag raised from any thread and observed at the next step
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

static_assertions::assert_impl_all!(StopHandle: Send, Sync, Clone);
static_assertions::assert_impl_all!(Event: Send);
