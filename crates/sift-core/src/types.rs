//! Shared type definitions for the moderation workflow and the compiled
//! rule document.
//!
//! The serde renames on [`RuleDocument`] and [`DomainRules`] reproduce the
//! wire names downstream consumers depend on; they are a compatibility
//! contract, not a style choice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rules attached to one domain: an optional disabled flag plus
/// `subdomain -> path -> ordered selector list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainRules {
    /// When present the domain is disabled in the compiled output
    /// regardless of its selector content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(rename = "subDomains", default)]
    pub sub_domains: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl DomainRules {
    pub fn is_empty(&self) -> bool {
        self.disabled.is_none() && self.sub_domains.is_empty()
    }
}

/// The flattened, versioned export of the entire rule store — the sole
/// artifact consumed by systems outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Cache lifetime hint in seconds.
    pub expire: u32,
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    /// Reserved for future global rules; always empty today.
    pub generics: Vec<serde_json::Value>,
    /// Decoded domain string -> that domain's rules.
    pub domains: BTreeMap<String, DomainRules>,
}

/// The oldest pending domain joined with its outstanding reports and any
/// rules already approved for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDomain {
    /// Decoded display name, e.g. `example.com`.
    pub name: String,
    /// Outstanding reports as `entry id -> reported URL`, in entry order.
    pub reports: BTreeMap<String, String>,
    /// Rules already approved for this domain.
    pub rules: DomainRules,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_wire_names() {
        let doc = RuleDocument {
            expire: 3600,
            schema_version: 1,
            generics: Vec::new(),
            domains: BTreeMap::new(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "expire": 3600,
                "schemaVersion": 1,
                "generics": [],
                "domains": {}
            })
        );
    }

    #[test]
    fn test_disabled_flag_omitted_when_absent() {
        let json = serde_json::to_value(DomainRules::default()).unwrap();
        assert_eq!(json, serde_json::json!({"subDomains": {}}));

        let disabled = DomainRules { disabled: Some(true), ..Default::default() };
        let json = serde_json::to_value(&disabled).unwrap();
        assert_eq!(json, serde_json::json!({"disabled": true, "subDomains": {}}));
    }
}
