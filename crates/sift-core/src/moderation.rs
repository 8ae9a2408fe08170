//! Moderation workflow
//!
//! The [`Moderator`] composes the report and rule stores into the review
//! cycle: report intake feeds the pending queue, `save` moves a reviewed
//! entry into the rule store, `remove` drops a report entry. Reports and
//! rules stay independent — removing a report never retracts an approved
//! rule — so reports can keep accumulating against a domain that already
//! has rules, and a domain can be disabled without losing its report
//! history.

use std::sync::Arc;

use log::debug;

use crate::keys::{self, KeyError};
use crate::reports::ReportStore;
use crate::rules::{RuleError, RuleStore};
use crate::tree::{StoreError, TreeStore};
use crate::types::PendingDomain;
use crate::url;

/// Error type for moderation operations.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// The moderation coordinator. Created once with the shared store handle
/// and used by every transport request.
pub struct Moderator<S> {
    reports: ReportStore<S>,
    rules: RuleStore<S>,
}

impl<S: TreeStore> Moderator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            reports: ReportStore::new(Arc::clone(&store)),
            rules: RuleStore::new(store),
        }
    }

    pub fn rules(&self) -> &RuleStore<S> {
        &self.rules
    }

    /// Record a reported URL. The URL must carry a non-empty hostname;
    /// everything else about it is opaque to this service.
    pub fn report(&self, raw_url: &str) -> Result<String, ModerationError> {
        let host = url::host(raw_url)
            .ok_or_else(|| ModerationError::InvalidInput(format!("no hostname in '{raw_url}'")))?;
        let domain_key = keys::encode_domain(host)?;
        Ok(self.reports.report(&domain_key, raw_url)?)
    }

    /// The oldest pending domain joined with its outstanding reports and
    /// any rules already approved for it, or `None` when nothing is
    /// pending. Nothing pending is a normal steady state, not a fault.
    ///
    /// The reports and rules reads are separate store calls with no
    /// cross-call atomicity; a write landing between them yields a result
    /// mixing two points in time. The workflow is human-paced, so this is
    /// tolerated rather than locked against.
    pub fn pending(&self) -> Result<Option<PendingDomain>, ModerationError> {
        let oldest = self.reports.pending_domains(1)?;
        let Some(domain_key) = oldest.first() else {
            return Ok(None);
        };
        let name = keys::decode_domain(domain_key)?;
        let reports = self.reports.reports_for(domain_key)?;
        let rules = self.rules.rules_for(domain_key)?;
        Ok(Some(PendingDomain { name, reports, rules }))
    }

    /// Approve a selector for domain/subdomain/path. Report entries for
    /// the domain remain until explicitly removed.
    pub fn save(
        &self,
        domain: &str,
        subdomain: &str,
        path: &str,
        selector: &str,
    ) -> Result<(), ModerationError> {
        if domain.trim().is_empty() {
            return Err(ModerationError::InvalidInput(
                "domain name must be a non-empty string".to_string(),
            ));
        }
        let domain_key = keys::encode_domain(domain)?;
        let subdomain_key = keys::encode_domain(subdomain)?;
        let path_key = keys::encode_path(path)?;
        self.rules
            .add_selector(&domain_key, &subdomain_key, &path_key, selector)?;
        debug!("rule saved for {domain}/{subdomain}{path}");
        Ok(())
    }

    /// Drop one report entry. Does not touch the rule store: a moderator
    /// may reject a report while keeping a rule it previously inspired.
    pub fn remove(&self, domain: &str, entry_id: &str) -> Result<(), ModerationError> {
        let domain_key = keys::encode_domain(domain)?;
        Ok(self.reports.remove(&domain_key, entry_id)?)
    }

    /// Mark a domain disabled in the compiled output.
    pub fn disable(&self, domain: &str) -> Result<(), ModerationError> {
        let domain_key = keys::encode_domain(domain)?;
        Ok(self.rules.disable_domain(&domain_key)?)
    }
}
