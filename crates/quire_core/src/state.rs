//! Scoped open-resource state.
//!
//! A [`StateGuard`] owns the state a backend opened for one retrieval and
//! hands it back to [`Backend::release_state`] exactly once: on
//! [`StateGuard::release`], or on drop for every other exit path
//! (early returns, `?` propagation and unwinding).

use crate::backend::Backend;
use crate::error::{CoreError, CoreResult};
use tracing::debug;

/// Owner of one backend state for the duration of an operation.
pub struct StateGuard<'a, B: Backend> {
    backend: &'a B,
    state: Option<B::State>,
}

impl<'a, B: Backend> StateGuard<'a, B> {
    /// Opens a fresh state on `backend`.
    ///
    /// # Errors
    ///
    /// Returns a `Resource` error if the backend cannot open its store.
    pub fn acquire(backend: &'a B) -> CoreResult<Self> {
        let metadata = backend.metadata();
        let state = backend
            .init_state()
            .map_err(|e| CoreError::resource(metadata.data_path(), e))?;
        debug!(module = metadata.name(), "opened module state");

        Ok(Self {
            backend,
            state: Some(state),
        })
    }

    /// Returns the open state.
    ///
    /// # Panics
    ///
    /// Never panics: the state is only taken when the guard is consumed.
    pub fn state_mut(&mut self) -> &mut B::State {
        self.state
            .as_mut()
            .expect("state is held until the guard is released")
    }

    /// Releases the state now instead of at end of scope.
    pub fn release(mut self) {
        self.release_state();
    }

    fn release_state(&mut self) {
        if let Some(state) = self.state.take() {
            self.backend.release_state(state);
            debug!(module = self.backend.metadata().name(), "released module state");
        }
    }
}

impl<B: Backend> Drop for StateGuard<'_, B> {
    fn drop(&mut self) {
        self.release_state();
    }
}
