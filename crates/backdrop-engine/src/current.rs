//! The "most recently constructed instance" handle.
//!
//! Set when an instance is constructed; cleared only by `destroy()` on that
//! same instance. Destroying an older instance leaves a newer one current.
//! The handle is per thread. Instances own `!Send` host handles and run on
//! the thread that drives their frames, so every instance a thread can reach
//! is tracked by that thread's handle.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: Cell<Option<InstanceId>> = const { Cell::new(None) };
}

/// Process-unique identity of an effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// The most recently constructed instance on this thread, unless it has
/// been destroyed since.
pub fn current() -> Option<InstanceId> {
    CURRENT.with(Cell::get)
}

pub(crate) fn set_current(id: InstanceId) {
    CURRENT.with(|c| c.set(Some(id)));
}

/// Clear the handle if it still refers to `id`.
pub(crate) fn clear_current(id: InstanceId) -> bool {
    CURRENT.with(|c| {
        if c.get() == Some(id) {
            c.set(None);
            true
        } else {
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearing_a_stale_id_keeps_the_newer_one() {
        let old = InstanceId::next();
        let new = InstanceId::next();
        set_current(old);
        set_current(new);
        assert!(!clear_current(old));
        assert_eq!(current(), Some(new));
        assert!(clear_current(new));
        assert_eq!(current(), None);
    }

    #[test]
    fn each_thread_tracks_its_own_instance() {
        let here = InstanceId::next();
        set_current(here);
        let there = std::thread::spawn(|| {
            let before = current();
            let id = InstanceId::next();
            set_current(id);
            (before, current() == Some(id))
        })
        .join()
        .unwrap();

        assert_eq!(there, (None, true));
        assert_eq!(current(), Some(here));
        clear_current(here);
    }
}
