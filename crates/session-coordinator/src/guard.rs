//! In-flight guards for deduplicating concurrent work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single-admission guard over an asynchronous operation.
///
/// `try_acquire` admits at most one caller at a time; everyone else gets
/// `None` and is expected to skip the work rather than wait. The permit
/// releases the guard when dropped, so early returns and failures cannot
/// leave it stuck.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    flag: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to start the guarded operation.
    ///
    /// Returns `None` if another caller already holds the permit.
    pub fn try_acquire(&self) -> Option<InFlightPermit> {
        if self
            .flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(InFlightPermit {
                flag: Arc::clone(&self.flag),
            })
        } else {
            None
        }
    }

    /// True while a permit is held.
    pub fn is_held(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Held for the duration of the guarded operation; releases on drop.
#[derive(Debug)]
pub struct InFlightPermit {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let guard = InFlight::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.try_acquire().is_none());
        assert!(guard.is_held());
    }

    #[test]
    fn drop_releases() {
        let guard = InFlight::new();
        {
            let _permit = guard.try_acquire().unwrap();
        }
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn clones_share_the_flag() {
        let guard = InFlight::new();
        let other = guard.clone();
        let _permit = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }
}
