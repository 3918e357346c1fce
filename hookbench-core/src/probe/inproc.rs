// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! In-process interceptor.
//!
//! Calls to instrumented functions are routed through [`InProcessInterceptor::invoke`],
//! which consults a concurrent dispatch table keyed by target address and
//! runs entry → original → exit around the real call. Unattached addresses
//! pass straight through.

use std::ffi::CStr;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{AttachError, HardValidationError};
use crate::probe::{CallArgs, Interceptor, ProbeListener, ReturnValue, StringArena};
use crate::types::Address;

/// Dispatch table of attached listeners plus the arena for rewritten strings.
#[derive(Default)]
pub struct InProcessInterceptor {
    listeners: DashMap<Address, Arc<dyn ProbeListener>>,
    arena: StringArena,
}

impl InProcessInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `original` under whatever listener is attached to `target`.
    ///
    /// The listener handle is cloned out of the table before the call so no
    /// table lock is held while user code runs.
    #[inline]
    pub fn invoke<F>(&self, target: Address, args: CallArgs, original: F) -> i64
    where
        F: FnOnce(&CallArgs) -> i64,
    {
        let listener = match self.listeners.get(&target) {
            Some(entry) => Arc::clone(entry.value()),
            None => return original(&args),
        };

        let token = listener.on_enter(&args);
        let mut ret = ReturnValue::new(original(&args));
        listener.on_leave(token, &mut ret);
        ret.raw()
    }

    /// Interned string at `raw`, if it came from this interceptor's arena.
    pub fn interned(&self, raw: i64) -> Option<&'static CStr> {
        self.arena.lookup(raw)
    }

    pub fn attached_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every attachment.
    pub fn detach_all(&self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for InProcessInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessInterceptor")
            .field("attached", &self.listeners.len())
            .field("interned", &self.arena.len())
            .finish()
    }
}

impl Interceptor for InProcessInterceptor {
    fn attach(&self, target: Address, listener: Arc<dyn ProbeListener>) -> Result<(), AttachError> {
        // Addresses in the first page can never hold code.
        if target.value() < page_size() {
            return Err(AttachError::InvalidAddress {
                address: target,
                reason: "address lies in the null page".to_string(),
            });
        }

        match self.listeners.entry(target) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AttachError::AlreadyInstrumented { address: target })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(listener);
                Ok(())
            }
        }
    }

    fn detach(&self, target: Address) -> Result<(), AttachError> {
        self.listeners
            .remove(&target)
            .map(|_| ())
            .ok_or(AttachError::NotAttached { address: target })
    }

    fn is_attached(&self, target: Address) -> bool {
        self.listeners.contains_key(&target)
    }

    fn intern(&self, value: &str) -> Result<&'static CStr, HardValidationError> {
        self.arena.intern(value)
    }
}

fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::EntryToken;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct Counting {
        enters: AtomicU64,
        leaves: AtomicU64,
    }

    impl Counting {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                enters: AtomicU64::new(0),
                leaves: AtomicU64::new(0),
            })
        }
    }

    impl ProbeListener for Counting {
        fn on_enter(&self, args: &CallArgs) -> EntryToken {
            self.enters.fetch_add(1, Ordering::Relaxed);
            EntryToken::new(*args)
        }

        fn on_leave(&self, token: EntryToken, ret: &mut ReturnValue) {
            self.leaves.fetch_add(1, Ordering::Relaxed);
            ret.replace(token.args().word(0) * 100);
        }
    }

    fn target() -> Address {
        Address::new(0x7f00_0000_1000).unwrap()
    }

    #[test]
    fn test_invoke_unattached_passes_through() {
        let interceptor = InProcessInterceptor::new();
        let out = interceptor.invoke(target(), CallArgs::ints(3, 4), |a| a.word(0) + a.word(1));
        assert_eq!(out, 7);
    }

    #[test]
    fn test_invoke_runs_listener_around_call() {
        let interceptor = InProcessInterceptor::new();
        let listener = Counting::new();
        interceptor.attach(target(), listener.clone()).unwrap();

        let out = interceptor.invoke(target(), CallArgs::ints(3, 4), |a| a.word(0) + a.word(1));
        assert_eq!(out, 300);
        assert_eq!(listener.enters.load(Ordering::Relaxed), 1);
        assert_eq!(listener.leaves.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_attach_rejects_duplicate_and_null_page() {
        let interceptor = InProcessInterceptor::new();
        interceptor.attach(target(), Counting::new()).unwrap();

        assert_eq!(
            interceptor.attach(target(), Counting::new()),
            Err(AttachError::AlreadyInstrumented { address: target() })
        );

        let low = Address::new(0x10).unwrap();
        assert!(matches!(
            interceptor.attach(low, Counting::new()),
            Err(AttachError::InvalidAddress { .. })
        ));
        assert_eq!(interceptor.attached_count(), 1);
    }

    #[test]
    fn test_detach() {
        let interceptor = InProcessInterceptor::new();
        interceptor.attach(target(), Counting::new()).unwrap();
        interceptor.detach(target()).unwrap();
        assert!(!interceptor.is_attached(target()));
        assert_eq!(
            interceptor.detach(target()),
            Err(AttachError::NotAttached { address: target() })
        );
    }
}
