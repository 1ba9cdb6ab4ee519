//! Activation: letting a resource manager evict and restore backend resources.
//!
//! Backends that keep heavyweight resources (such as an in-memory copy of
//! their index) implement [`Activatable`]. An [`Activator`] owned by the
//! application decides when they are activated or deactivated, typically
//! under memory pressure. Activation is a performance hint: a backend must
//! serve reads correctly whether or not it was ever activated.
//!
//! Transitions are serialized by the activator. Backends are not required
//! to tolerate `activate`/`deactivate` racing each other outside of it.
//! Subjects do their work (disk I/O included) outside the registry lock, so
//! queries such as [`Activator::is_active`] never wait on a slow subject.
//! A subject must not start another transition from inside its own.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Proof that a call comes from an [`Activator`].
///
/// Only an activator can create a lock, so only it can drive transitions.
#[derive(Debug)]
pub struct Lock {
    _private: (),
}

/// Something that can release and reacquire resources on request.
///
/// Both methods default to doing nothing.
pub trait Activatable: Send + Sync {
    /// Acquires heavyweight resources ahead of use.
    fn activate(&self, _lock: &Lock) {}

    /// Releases heavyweight resources.
    fn deactivate(&self, _lock: &Lock) {}
}

/// Registry of active subjects.
pub struct Activator {
    lock: Lock,
    transition: Mutex<()>,
    active: Mutex<Vec<Arc<dyn Activatable>>>,
}

impl Activator {
    /// Creates an activator with nothing active.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lock: Lock { _private: () },
            transition: Mutex::new(()),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Activates `subject` if it is not already active.
    ///
    /// Returns true if the subject was activated by this call.
    pub fn activate(&self, subject: Arc<dyn Activatable>) -> bool {
        let _transition = self.transition.lock();
        if self.is_active(&subject) {
            return false;
        }
        subject.activate(&self.lock);

        let mut active = self.active.lock();
        active.push(subject);
        debug!(active = active.len(), "activated subject");
        true
    }

    /// Deactivates `subject` if it is active.
    ///
    /// Returns true if the subject was deactivated by this call.
    pub fn deactivate<T: Activatable + ?Sized>(&self, subject: &Arc<T>) -> bool {
        let _transition = self.transition.lock();
        let (subject, remaining) = {
            let mut active = self.active.lock();
            let Some(position) = active.iter().position(|s| same_subject(s, subject)) else {
                return false;
            };
            (active.remove(position), active.len())
        };
        subject.deactivate(&self.lock);
        debug!(active = remaining, "deactivated subject");
        true
    }

    /// Returns true if `subject` is currently active.
    pub fn is_active<T: Activatable + ?Sized>(&self, subject: &Arc<T>) -> bool {
        self.active.lock().iter().any(|s| same_subject(s, subject))
    }

    /// Returns the number of active subjects.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Deactivates every active subject, most recently activated first.
    ///
    /// Returns the number of subjects deactivated.
    pub fn deactivate_all(&self) -> usize {
        let _transition = self.transition.lock();
        let subjects = std::mem::take(&mut *self.active.lock());
        let count = subjects.len();
        for subject in subjects.iter().rev() {
            subject.deactivate(&self.lock);
        }
        if count > 0 {
            debug!(count, "deactivated all subjects");
        }
        count
    }
}

impl Default for Activator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activator")
            .field("active", &self.active_count())
            .finish()
    }
}

fn same_subject<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        activations: AtomicUsize,
        deactivations: AtomicUsize,
    }

    impl Activatable for Counting {
        fn activate(&self, _lock: &Lock) {
            self.activations.fetch_add(1, Ordering::SeqCst);
        }

        fn deactivate(&self, _lock: &Lock) {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Lightweight;

    impl Activatable for Lightweight {}

    #[test]
    fn activate_is_idempotent() {
        let activator = Activator::new();
        let subject = Arc::new(Counting::default());

        assert!(activator.activate(subject.clone()));
        assert!(!activator.activate(subject.clone()));
        assert!(activator.is_active(&subject));
        assert_eq!(subject.activations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deactivate_only_active_subjects() {
        let activator = Activator::new();
        let subject = Arc::new(Counting::default());

        assert!(!activator.deactivate(&subject));
        activator.activate(subject.clone());
        assert!(activator.deactivate(&subject));
        assert!(!activator.is_active(&subject));
        assert_eq!(subject.deactivations.load(Ordering::SeqCst), 1);
    }

    /// Subject that queries its activator while transitioning.
    struct Watching {
        activator: Arc<Activator>,
        seen: AtomicUsize,
    }

    impl Activatable for Watching {
        fn activate(&self, _lock: &Lock) {
            self.seen.store(self.activator.active_count(), Ordering::SeqCst);
        }

        fn deactivate(&self, _lock: &Lock) {
            self.seen.store(self.activator.active_count() + 100, Ordering::SeqCst);
        }
    }

    #[test]
    fn subject_can_query_activator_during_transition() {
        let activator = Arc::new(Activator::new());
        activator.activate(Arc::new(Lightweight));
        let subject = Arc::new(Watching {
            activator: Arc::clone(&activator),
            seen: AtomicUsize::new(0),
        });

        assert!(activator.activate(subject.clone()));
        assert_eq!(subject.seen.load(Ordering::SeqCst), 1);
        assert!(activator.deactivate(&subject));
        assert_eq!(subject.seen.load(Ordering::SeqCst), 101);

        activator.activate(subject.clone());
        assert_eq!(activator.deactivate_all(), 2);
        assert_eq!(subject.seen.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn deactivate_all_empties_registry() {
        let activator = Activator::new();
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        activator.activate(a.clone());
        activator.activate(b.clone());
        activator.activate(Arc::new(Lightweight));

        assert_eq!(activator.active_count(), 3);
        assert_eq!(activator.deactivate_all(), 3);
        assert_eq!(activator.active_count(), 0);
        assert_eq!(a.deactivations.load(Ordering::SeqCst), 1);
        assert_eq!(b.deactivations.load(Ordering::SeqCst), 1);
    }
}
