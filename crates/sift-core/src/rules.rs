//! Approved-selector subtree
//!
//! Layout:
//!
//! ```text
//! rules/<domainKey>/disabled = true
//! rules/<domainKey>/subdomains/<subdomainKey>/<pathKey>/<pushId> = selector
//! ```
//!
//! Selectors accumulate under a path in insertion order; duplicates are
//! allowed and order is significant. Rules only grow — there is no
//! deletion operation here.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;

use crate::keys::{self, KeyError};
use crate::tree::{Node, StoreError, TreeStore};
use crate::types::DomainRules;

const ROOT: &str = "rules";
const DISABLED: &str = "disabled";
const SUBDOMAINS: &str = "subdomains";

/// Error type for rule subtree access.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Key(#[from] KeyError),
    /// The stored shape does not match the scalar-selector-list model,
    /// e.g. a store written by a legacy structured-entry snapshot.
    #[error("malformed rule entry under '{0}'")]
    Malformed(String),
}

/// Typed access to the rule subtree.
pub struct RuleStore<S> {
    store: Arc<S>,
}

impl<S: TreeStore> RuleStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a selector to the ordered list at domain/subdomain/path,
    /// creating intermediate levels as needed. No uniqueness constraint.
    pub fn add_selector(
        &self,
        domain_key: &str,
        subdomain_key: &str,
        path_key: &str,
        selector: &str,
    ) -> Result<String, StoreError> {
        let id = self.store.push(
            &[ROOT, domain_key, SUBDOMAINS, subdomain_key, path_key],
            Node::Str(selector.to_string()),
        )?;
        debug!("selector {id} added under {domain_key}/{subdomain_key}");
        Ok(id)
    }

    /// Mark a domain disabled in the compiled output. Enabled is the
    /// absence of the flag; there is no explicit enable.
    pub fn disable_domain(&self, domain_key: &str) -> Result<(), StoreError> {
        self.store.set(&[ROOT, domain_key, DISABLED], Node::Bool(true))
    }

    /// Decoded rules for one domain; empty when the domain has none.
    pub fn rules_for(&self, domain_key: &str) -> Result<DomainRules, RuleError> {
        match self.store.get(&[ROOT, domain_key])? {
            Some(node) => domain_rules_from_node(domain_key, &node),
            None => Ok(DomainRules::default()),
        }
    }

    /// The entire rule subtree keyed by encoded domain — the compiler's
    /// input, fetched with a single subtree read.
    pub fn all(&self) -> Result<BTreeMap<String, Node>, StoreError> {
        match self.store.get(&[ROOT])? {
            Some(Node::Branch(children)) => Ok(children),
            _ => Ok(BTreeMap::new()),
        }
    }
}

impl<S> Clone for RuleStore<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

/// Decode one domain's subtree into [`DomainRules`]: subdomain and path
/// keys back to display strings, selector lists in stored (insertion)
/// order.
pub fn domain_rules_from_node(domain_key: &str, node: &Node) -> Result<DomainRules, RuleError> {
    let children = node
        .as_branch()
        .ok_or_else(|| RuleError::Malformed(domain_key.to_string()))?;

    let mut rules = DomainRules {
        disabled: children.get(DISABLED).and_then(Node::as_bool).filter(|d| *d),
        ..Default::default()
    };

    let Some(subdomains) = children.get(SUBDOMAINS) else {
        return Ok(rules);
    };
    let subdomains = subdomains
        .as_branch()
        .ok_or_else(|| RuleError::Malformed(domain_key.to_string()))?;

    for (sub_key, paths) in subdomains {
        let sub_name = keys::decode_domain(sub_key)?;
        let paths = paths
            .as_branch()
            .ok_or_else(|| RuleError::Malformed(format!("{domain_key}/{sub_key}")))?;

        let mut decoded_paths = BTreeMap::new();
        for (path_key, selectors) in paths {
            let path = keys::decode_path(path_key)?;
            let entries = selectors
                .as_branch()
                .ok_or_else(|| RuleError::Malformed(format!("{domain_key}/{sub_key}/{path_key}")))?;

            // Push keys sort in insertion order, so iteration order is
            // append order.
            let mut list = Vec::with_capacity(entries.len());
            for (entry_id, selector) in entries {
                let selector = selector.as_str().ok_or_else(|| {
                    RuleError::Malformed(format!("{domain_key}/{sub_key}/{path_key}/{entry_id}"))
                })?;
                list.push(selector.to_string());
            }
            decoded_paths.insert(path, list);
        }
        rules.sub_domains.insert(sub_name, decoded_paths);
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryStore;

    fn store() -> RuleStore<MemoryStore> {
        RuleStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_selectors_keep_insertion_order() {
        let rules = store();
        for selector in ["#ad", ".banner", "#ad"] {
            rules.add_selector("a+com", "b+a+com", "L2luZGV4", selector).unwrap();
        }
        let decoded = rules.rules_for("a+com").unwrap();
        let list = &decoded.sub_domains["b.a.com"][&keys::decode_path("L2luZGV4").unwrap()];
        // Duplicates are kept and order is preserved.
        assert_eq!(list, &vec!["#ad".to_string(), ".banner".to_string(), "#ad".to_string()]);
    }

    #[test]
    fn test_disable_without_selectors() {
        let rules = store();
        rules.disable_domain("a+com").unwrap();
        let decoded = rules.rules_for("a+com").unwrap();
        assert_eq!(decoded.disabled, Some(true));
        assert!(decoded.sub_domains.is_empty());
    }

    #[test]
    fn test_unknown_domain_is_empty_not_error() {
        assert!(store().rules_for("nope+com").unwrap().is_empty());
    }

    #[test]
    fn test_all_returns_every_domain() {
        let rules = store();
        let pk = keys::encode_path("/x").unwrap();
        rules.add_selector("a+com", "a+com", &pk, "#one").unwrap();
        rules.disable_domain("b+com").unwrap();
        let all = rules.all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["a+com", "b+com"]);
    }

    #[test]
    fn test_malformed_shape_is_rejected() {
        let raw = Arc::new(MemoryStore::new());
        // Legacy shape: selector stored as a scalar instead of a pushed list.
        raw.set(
            &["rules", "a+com", "subdomains", "a+com", "L2k"],
            Node::Str("#ad".into()),
        )
        .unwrap();
        let rules = RuleStore::new(raw);
        assert!(matches!(rules.rules_for("a+com"), Err(RuleError::Malformed(_))));
    }
}
