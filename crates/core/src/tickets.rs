//! Opaque ticket codes printed as QR codes.

use rand::Rng;

/// Length of the random part of a ticket code.
pub const TICKET_CODE_LENGTH: usize = 32;

/// Prefix that makes codes recognisable when scanned.
pub const TICKET_CODE_PREFIX: &str = "TKT-";

/// Generate a fresh random ticket code.
///
/// Uniqueness is enforced by the `uq_tickets_qr_code` constraint; with 32
/// alphanumeric characters a collision is not a practical concern.
pub fn generate_ticket_code() -> String {
    let body: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TICKET_CODE_LENGTH)
        .map(char::from)
        .collect();
    format!("{TICKET_CODE_PREFIX}{body}")
}

/// Normalise a scanned code (scanners often append whitespace).
pub fn normalize_ticket_code(raw: &str) -> Option<&str> {
    let code = raw.trim();
    (!code.is_empty()).then_some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_prefix_and_length() {
        let code = generate_ticket_code();
        assert!(code.starts_with(TICKET_CODE_PREFIX));
        assert_eq!(code.len(), TICKET_CODE_PREFIX.len() + TICKET_CODE_LENGTH);
        assert!(code[TICKET_CODE_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn codes_differ() {
        assert_ne!(generate_ticket_code(), generate_ticket_code());
    }

    #[test]
    fn scanned_code_is_trimmed() {
        assert_eq!(normalize_ticket_code(" TKT-abc\n"), Some("TKT-abc"));
        assert_eq!(normalize_ticket_code("   "), None);
    }
}
