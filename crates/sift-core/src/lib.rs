//! Sift Core Library
//!
//! This crate provides the hierarchical rule store behind the Sift curation
//! service: clients report URLs under a domain, a moderator attaches
//! CSS-selector rules to paths within a domain/subdomain, and the compiler
//! crate flattens the approved rules into a versioned document.
//!
//! # Architecture
//!
//! All state lives in an external hierarchical key-value store, modelled by
//! the [`tree::TreeStore`] trait. Reports and rules occupy two independent
//! subtrees so that removing a report never retracts an approved rule and a
//! domain can be disabled without losing its report history. The
//! [`moderation::Moderator`] composes the two stores into the review
//! workflow.
//!
//! # Modules
//!
//! - `keys`: store-safe encoding of domain and path strings
//! - `tree`: store trait, node type, and the file-backed implementation
//! - `reports`: reported-URL subtree
//! - `rules`: approved-selector subtree
//! - `moderation`: the review workflow joining reports and rules
//! - `url`: host extraction for report intake
//! - `types`: shared artifact type definitions

pub mod keys;
pub mod moderation;
pub mod reports;
pub mod rules;
pub mod tree;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use keys::{decode_domain, decode_path, encode_domain, encode_path, KeyError};
pub use moderation::{ModerationError, Moderator};
pub use reports::ReportStore;
pub use rules::{RuleError, RuleStore};
pub use tree::{MemoryStore, Node, StoreError, TreeStore};
pub use types::{DomainRules, PendingDomain, RuleDocument};
