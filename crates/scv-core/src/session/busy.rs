use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Advisory busy/loading indicator.
///
/// The flag stays raised while at least one [`BusyGuard`] is alive, so a
/// nested holder (registration chaining into login) does not lower it early.
/// It does not serialize operations.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    holders: Arc<AtomicUsize>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag until the returned guard is dropped.
    #[must_use = "the flag is lowered as soon as the guard is dropped"]
    pub fn hold(&self) -> BusyGuard {
        self.holders.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            holders: Arc::clone(&self.holders),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.holders.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    holders: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let flag = BusyFlag::new();
        assert!(!flag.is_busy());
        {
            let _guard = flag.hold();
            assert!(flag.is_busy());
        }
        assert!(!flag.is_busy());
    }

    #[test]
    fn test_nested_guards_keep_flag_raised() {
        let flag = BusyFlag::new();
        let outer = flag.hold();
        let inner = flag.hold();
        drop(inner);
        assert!(flag.is_busy());
        drop(outer);
        assert!(!flag.is_busy());
    }

    #[test]
    fn test_guard_released_on_early_return() {
        fn fails(flag: &BusyFlag) -> Result<(), ()> {
            let _guard = flag.hold();
            Err(())
        }

        let flag = BusyFlag::new();
        assert!(fails(&flag).is_err());
        assert!(!flag.is_busy());
    }
}
