//! Thread-local progress prefix (spec §4.8, §9): a small owned string each
//! worker sets before printing `[Progress]` lines, so output from multiple
//! threads can be told apart without plumbing an extra parameter through
//! every call site.

use std::cell::RefCell;

thread_local! {
    static PROGRESS_PREFIX: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Current thread's progress prefix (empty string if none set).
#[must_use]
pub fn current_prefix() -> String {
    PROGRESS_PREFIX.with(|p| p.borrow().clone())
}

/// RAII guard that sets this thread's progress prefix for its lifetime and
/// restores the previous value on drop.
pub struct ProgressPrefixGuard {
    previous: String,
}

impl ProgressPrefixGuard {
    /// Set `prefix` as the current thread's progress prefix.
    #[must_use]
    pub fn set(prefix: impl Into<String>) -> Self {
        let previous = PROGRESS_PREFIX.with(|p| p.replace(prefix.into()));
        Self { previous }
    }
}

impl Drop for ProgressPrefixGuard {
    fn drop(&mut self) {
        PROGRESS_PREFIX.with(|p| *p.borrow_mut() = std::mem::take(&mut self.previous));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sets_and_restores() {
        assert_eq!(current_prefix(), "");
        {
            let _g = ProgressPrefixGuard::set("[worker-3] ");
            assert_eq!(current_prefix(), "[worker-3] ");
            {
                let _g2 = ProgressPrefixGuard::set("[worker-3/job-9] ");
                assert_eq!(current_prefix(), "[worker-3/job-9] ");
            }
            assert_eq!(current_prefix(), "[worker-3] ");
        }
        assert_eq!(current_prefix(), "");
    }
}
