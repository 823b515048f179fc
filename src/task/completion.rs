//! Completion callbacks.

use super::result::ResultChannel;
use core::fmt;

/// The function type of a completion callback.
pub type Callback<T> = Box<dyn FnOnce(&ResultChannel<T>) + Send>;

//------------ Completion -----------------------------------------------------

/// An optional callback invoked once a task has reached a terminal state.
pub struct Completion<T> {
    callback: Option<Callback<T>>,
    notified: bool,
}

impl<T> Completion<T> {
    /// Creates a completion with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(&ResultChannel<T>) + Send + 'static,
    {
        Completion {
            callback: Some(Box::new(callback)),
            notified: false,
        }
    }

    /// Creates a completion without a callback.
    pub fn none() -> Self {
        Completion {
            callback: None,
            notified: false,
        }
    }

    /// Returns whether a callback is still waiting to be invoked.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Returns whether the owner has already been notified.
    pub fn is_notified(&self) -> bool {
        self.notified
    }

    /// Invokes the callback with `result` unless this happened before.
    ///
    /// Returns whether the callback ran.
    pub fn notify(&mut self, result: &ResultChannel<T>) -> bool {
        if self.notified {
            return false;
        }
        self.notified = true;
        match self.callback.take() {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> From<Option<Callback<T>>> for Completion<T> {
    fn from(callback: Option<Callback<T>>) -> Self {
        Completion {
            callback,
            notified: false,
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("callback", &self.callback.is_some())
            .field("notified", &self.notified)
            .finish()
    }
}

//============ Tests =========================================================
