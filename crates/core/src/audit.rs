//! Audit action and resource-type constants.
//!
//! These must match the values written to `audit_logs.action` and
//! `audit_logs.resource_type`.

/// Known action names for audit log entries.
pub mod actions {
    pub const HOLD_CREATED: &str = "hold.created";
    pub const HOLD_EXPIRED: &str = "hold.expired";
    pub const ORDER_CREATED: &str = "order.created";
    pub const ORDER_EXPIRED: &str = "order.expired";
    pub const PAYMENT_APPROVED: &str = "payment.approved";
    pub const PAYMENT_DENIED: &str = "payment.denied";
    pub const ORDER_REFUNDED: &str = "order.refunded";
    pub const TICKET_CHECKED_IN: &str = "ticket.checked_in";
}

/// Known resource types for audit log entries.
pub mod resources {
    pub const HOLD: &str = "hold";
    pub const ORDER: &str = "order";
    pub const PAYMENT: &str = "payment";
    pub const TICKET: &str = "ticket";
}

/// Sensitive keys removed from audit metadata before storage.
pub const SENSITIVE_FIELDS: &[&str] = &["card_token", "token", "secret", "authorization"];

/// Redact sensitive fields from a JSON value (recursively).
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn card_token_is_redacted() {
        let input = json!({ "method": "CREDIT_CARD", "card_token": "tok_123" });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["card_token"], "[REDACTED]");
        assert_eq!(out["method"], "CREDIT_CARD");
    }

    #[test]
    fn nested_values_are_redacted() {
        let input = json!({ "gateway": [{ "secret": "s" }] });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["gateway"][0]["secret"], "[REDACTED]");
    }
}
