//! Sift Rule Compiler
//!
//! Flattens the entire rule store into the versioned [`RuleDocument`]
//! consumed by downstream content filters. Compilation is a pure read:
//! the rule subtree is fetched with a single subtree read, every key is
//! decoded back to its display string, and selector lists are copied
//! verbatim in stored order. The document is regenerated whole on every
//! call, never patched incrementally — two compilations without
//! intervening writes produce equal documents.

use std::collections::BTreeMap;

use log::info;

use sift_core::keys::{self, KeyError};
use sift_core::rules::{domain_rules_from_node, RuleError, RuleStore};
use sift_core::tree::{StoreError, TreeStore};
use sift_core::types::RuleDocument;

/// Cache lifetime hint stamped into every compiled document, in seconds.
pub const EXPIRE: u32 = 3600;

/// Document schema version. Bump when the document shape changes so
/// downstream consumers can detect drift; not derived from data.
pub const SCHEMA_VERSION: u32 = 1;

/// Error type for compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Compile the full rule store into a distributable rule document.
///
/// Concurrent writes during compilation may or may not be reflected (no
/// snapshot isolation), but per-path store atomicity plus the single
/// subtree read keep the output internally consistent.
pub fn compile<S: TreeStore>(rules: &RuleStore<S>) -> Result<RuleDocument, CompileError> {
    let subtree = rules.all()?;

    let mut domains = BTreeMap::new();
    for (domain_key, node) in &subtree {
        let name = keys::decode_domain(domain_key)?;
        let entry = domain_rules_from_node(domain_key, node)?;
        domains.insert(name, entry);
    }

    info!("compiled rule document for {} domain(s)", domains.len());
    Ok(RuleDocument {
        expire: EXPIRE,
        schema_version: SCHEMA_VERSION,
        generics: Vec::new(),
        domains,
    })
}
