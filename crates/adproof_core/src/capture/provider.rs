//! Current-value providers.

use std::fmt;
use std::sync::Arc;

/// A value that is either fixed or re-read on every access.
///
/// The compositor holds providers instead of values so that a preview
/// reload between arming and recording is picked up on the next tick.
pub enum Provider<T> {
    Fixed(T),
    Dynamic(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T: Clone> Provider<T> {
    /// Wrap an accessor.
    pub fn dynamic<F>(accessor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Provider::Dynamic(Arc::new(accessor))
    }

    /// Read the current value.
    pub fn current(&self) -> T {
        match self {
            Provider::Fixed(value) => value.clone(),
            Provider::Dynamic(accessor) => accessor(),
        }
    }
}

impl<T: Clone> Clone for Provider<T> {
    fn clone(&self) -> Self {
        match self {
            Provider::Fixed(value) => Provider::Fixed(value.clone()),
            Provider::Dynamic(accessor) => Provider::Dynamic(Arc::clone(accessor)),
        }
    }
}

impl<T> From<T> for Provider<T> {
    fn from(value: T) -> Self {
        Provider::Fixed(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Provider::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}
