//! Transport boundary
//!
//! One handler per endpoint, each mapping a core operation onto the
//! uniform response envelope:
//!
//! ```text
//! Success: { status: "ok"[, data: <result>] }
//! Error:   { status: "error", error: { id, message[, native] } }
//! ```
//!
//! The `id` and `message` of every error are fixed per endpoint so client
//! error handling stays stable regardless of store-level error text; the
//! underlying cause is preserved under `native` for diagnostics. Absence
//! of reports or rules is an empty result, never an error.

use serde_json::{json, Value};

use sift_core::moderation::{ModerationError, Moderator};
use sift_core::tree::TreeStore;

fn ok() -> Value {
    json!({"status": "ok"})
}

fn ok_data(data: Value) -> Value {
    json!({"status": "ok", "data": data})
}

fn fail(id: &str, message: &str, native: Option<String>) -> Value {
    let mut error = json!({"id": id, "message": message});
    if let Some(native) = native {
        error["native"] = Value::String(native);
    }
    json!({"status": "error", "error": error})
}

/// `sites/report` — record a reported URL.
pub fn report<S: TreeStore>(moderator: &Moderator<S>, url: &str) -> Value {
    match moderator.report(url) {
        Ok(_) => ok(),
        Err(ModerationError::InvalidInput(_)) => fail("sites/report", "Invalid URL", None),
        Err(e) => fail("sites/report", "URL can not be reported", Some(e.to_string())),
    }
}

/// `moderation/pending` — the oldest pending domain with its reports and
/// current rules, or `{domain: {}}` when nothing is pending.
pub fn pending<S: TreeStore>(moderator: &Moderator<S>) -> Value {
    match moderator.pending() {
        Ok(Some(entry)) => match serde_json::to_value(&entry) {
            Ok(domain) => ok_data(json!({"domain": domain})),
            Err(e) => fail("moderation/pending", "Pending queue unavailable", Some(e.to_string())),
        },
        Ok(None) => ok_data(json!({"domain": {}})),
        Err(e) => fail("moderation/pending", "Pending queue unavailable", Some(e.to_string())),
    }
}

/// `moderation/save` — approve a selector for domain/subdomain/path.
pub fn save<S: TreeStore>(
    moderator: &Moderator<S>,
    domain: &str,
    subdomain: &str,
    path: &str,
    selector: &str,
) -> Value {
    match moderator.save(domain, subdomain, path, selector) {
        Ok(()) => ok(),
        Err(ModerationError::InvalidInput(_)) => fail("moderation/save", "Invalid domain name", None),
        Err(e) => fail("moderation/save", "Rule can not be saved", Some(e.to_string())),
    }
}

/// `moderation/remove` — drop one report entry.
pub fn remove<S: TreeStore>(moderator: &Moderator<S>, domain: &str, entry_id: &str) -> Value {
    match moderator.remove(domain, entry_id) {
        Ok(()) => ok(),
        Err(e) => fail("moderation/remove", "Report can not be removed", Some(e.to_string())),
    }
}

/// `moderation/disable` — mark a domain disabled in the compiled output.
pub fn disable<S: TreeStore>(moderator: &Moderator<S>, domain: &str) -> Value {
    match moderator.disable(domain) {
        Ok(()) => ok(),
        Err(e) => fail("moderation/disable", "Domain can not be disabled", Some(e.to_string())),
    }
}

/// `rules/compile` — regenerate the rule document (production trigger).
pub fn compile<S: TreeStore>(moderator: &Moderator<S>) -> Value {
    document(moderator, "rules/compile")
}

/// `rules/get` — fetch the rule document (consumer-facing read). Both
/// endpoints map 1:1 onto the compiler; only the envelope id differs.
pub fn fetch<S: TreeStore>(moderator: &Moderator<S>) -> Value {
    document(moderator, "rules/get")
}

fn document<S: TreeStore>(moderator: &Moderator<S>, id: &str) -> Value {
    let doc = match sift_compiler::compile(moderator.rules()) {
        Ok(doc) => doc,
        Err(e) => return fail(id, "Rules can not be compiled", Some(e.to_string())),
    };
    match serde_json::to_value(&doc) {
        Ok(data) => ok_data(data),
        Err(e) => fail(id, "Rules can not be compiled", Some(e.to_string())),
    }
}
