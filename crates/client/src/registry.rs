//! In-flight request registry.
//!
//! At most one live entry per signature. Registering a signature that is
//! already in flight aborts the older request. Releasing an entry only
//! removes it if it still belongs to the releasing request, so a settled
//! older request can never evict its replacement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, AbortRegistration};

use crate::signature::RequestSignature;

#[derive(Debug)]
struct Entry {
    ticket: u64,
    handle: AbortHandle,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Mutex<HashMap<RequestSignature, Entry>>,
    next_ticket: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    inner: Arc<Inner>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request, cancelling any in-flight one with the same
    /// signature. The returned guard releases the entry when dropped.
    pub fn register(&self, signature: RequestSignature) -> (InFlightGuard, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);

        let previous = self
            .entries()
            .insert(signature.clone(), Entry { ticket, handle });
        if let Some(previous) = previous {
            tracing::debug!(request = %signature, "cancelling superseded request");
            previous.handle.abort();
        }

        let guard = InFlightGuard {
            registry: self.clone(),
            signature,
            ticket,
        };
        (guard, registration)
    }

    pub fn contains(&self, signature: &RequestSignature) -> bool {
        self.entries().contains_key(signature)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Abort every in-flight request (e.g. on logout).
    pub fn cancel_all(&self) {
        let drained: Vec<Entry> = self.entries().drain().map(|(_, e)| e).collect();
        for entry in drained {
            entry.handle.abort();
        }
    }

    fn release(&self, signature: &RequestSignature, ticket: u64) {
        let mut entries = self.entries();
        if entries.get(signature).is_some_and(|e| e.ticket == ticket) {
            entries.remove(signature);
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<RequestSignature, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Removes the registry entry when the request settles or is dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: InFlightRegistry,
    signature: RequestSignature,
    ticket: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.signature, self.ticket);
    }
}
