//! Listener handles.
//!
//! A [`Callback`] is matched by identity, not by what it does: clones of one
//! callback are interchangeable, two callbacks built from identical closures
//! are not.

use std::fmt;
use std::sync::Arc;

/// Identity of a registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(usize);

/// Shared listener receiving payloads of type `T`
pub struct Callback<T: ?Sized> {
    inner: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T: ?Sized> Callback<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn id(&self) -> CallbackId {
        CallbackId(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    pub fn call(&self, value: &T) {
        (self.inner)(value)
    }
}

impl<T: ?Sized> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T: ?Sized> Eq for Callback<T> {}

impl<T: ?Sized> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.id()).finish()
    }
}
