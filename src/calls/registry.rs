//! Registry of live calls keyed by identity.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hotline_core::types::CallId;
use log::debug;
use std::sync::Arc;

use super::call::Call;
use super::error::CallError;

/// Active calls, unique by id.
///
/// Lookups of unknown identities are routine: the provider may refer to
/// calls that have already gone away.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: DashMap<CallId, Arc<Call>>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call. An existing entry is never replaced.
    pub fn add(&self, call: Arc<Call>) -> Result<(), CallError> {
        match self.calls.entry(call.id()) {
            Entry::Occupied(_) => Err(CallError::DuplicateIdentity(call.id())),
            Entry::Vacant(slot) => {
                debug!("Registered {} call {}", call.direction(), call.id());
                slot.insert(call);
                Ok(())
            }
        }
    }

    /// Remove `call` if it is the registered instance for its id.
    pub fn remove(&self, call: &Call) -> Option<Arc<Call>> {
        self.calls
            .remove_if(&call.id(), |_, registered| std::ptr::eq(registered.as_ref(), call))
            .map(|(_, call)| call)
    }

    pub fn remove_by_id(&self, id: &CallId) -> Option<Arc<Call>> {
        self.calls.remove(id).map(|(_, call)| call)
    }

    pub fn lookup(&self, id: &CallId) -> Option<Arc<Call>> {
        self.calls.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &CallId) -> bool {
        self.calls.contains_key(id)
    }

    /// Drain every call. The caller owns ending them.
    pub fn remove_all(&self) -> Vec<Arc<Call>> {
        let ids: Vec<CallId> = self.calls.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter_map(|id| self.remove_by_id(id)).collect()
    }

    pub fn calls(&self) -> Vec<Arc<Call>> {
        self.calls.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
