//! Reported-URL subtree
//!
//! Layout: `reports/<domainKey>/<entryId> = url`. Entry ids are generated
//! by the store's push operation, so they are unique per domain and sort
//! in insertion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::tree::{Node, StoreError, TreeStore};

const ROOT: &str = "reports";

/// Typed access to the report subtree. Holds a shared handle to the store
/// created by the composition root.
pub struct ReportStore<S> {
    store: Arc<S>,
}

impl<S: TreeStore> ReportStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record a reported URL under the domain, returning the entry id.
    /// The URL string is stored as given; validating it is the caller's
    /// responsibility.
    pub fn report(&self, domain_key: &str, url: &str) -> Result<String, StoreError> {
        let id = self.store.push(&[ROOT, domain_key], Node::Str(url.to_string()))?;
        debug!("report {id} recorded for {domain_key}");
        Ok(id)
    }

    /// Domain keys with outstanding reports, in natural key order,
    /// truncated to `limit`. `limit = 1` yields the oldest pending domain.
    pub fn pending_domains(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        self.store.children(&[ROOT], limit)
    }

    /// All outstanding reports for a domain as `entry id -> url`. Empty
    /// when nothing is reported; absence is not an error.
    pub fn reports_for(&self, domain_key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        let mut out = BTreeMap::new();
        if let Some(Node::Branch(children)) = self.store.get(&[ROOT, domain_key])? {
            for (id, node) in children {
                if let Node::Str(url) = node {
                    out.insert(id, url);
                }
            }
        }
        Ok(out)
    }

    /// Delete exactly one report entry. Removing an entry that does not
    /// exist is a no-op.
    pub fn remove(&self, domain_key: &str, entry_id: &str) -> Result<(), StoreError> {
        self.store.delete(&[ROOT, domain_key, entry_id])
    }
}

impl<S> Clone for ReportStore<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}
