//! Input checks and message-ID generation used by the onboarding flow.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Consumer email providers. Addresses on these domains are asked for a
/// company ID so they can be tied to an organization.
pub const GENERIC_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
    "mail.com",
];

/// Punctuation accepted in place of a digit by [`is_valid_password`].
pub const PASSWORD_SYMBOLS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

/// Minimum password length, in UTF-16 code units (what a browser text field
/// reports as its length).
pub const MIN_PASSWORD_LEN: usize = 6;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Format check only; no MX or deliverability lookup.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Whether the address belongs to a consumer provider.
///
/// The domain is whatever follows the first `@`, compared case-insensitively.
/// Input without an `@` is never generic.
pub fn is_generic_domain(email: &str) -> bool {
    match email.split('@').nth(1) {
        Some(domain) => {
            let domain = domain.to_lowercase();
            GENERIC_DOMAINS.contains(&domain.as_str())
        }
        None => false,
    }
}

/// At least [`MIN_PASSWORD_LEN`] UTF-16 code units with a digit or a symbol from
/// [`PASSWORD_SYMBOLS`]. No upper bound and no case requirements.
pub fn is_valid_password(password: &str) -> bool {
    let long_enough = password.encode_utf16().count() >= MIN_PASSWORD_LEN;
    let has_number_or_symbol = password
        .chars()
        .any(|c| c.is_ascii_digit() || PASSWORD_SYMBOLS.contains(c));
    long_enough && has_number_or_symbol
}

/// Generate a message ID of the form `msg_<unix millis>_<9 base-36 chars>`.
///
/// Unique enough to key a single session's message list; not a security token.
pub fn generate_message_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("msg_{millis}_{suffix}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn email_accepts_simple_address() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.co.uk"));
    }

    #[test]
    fn email_rejects_malformed() {
        for bad in [
            "",
            "plainaddress",
            "a@b",
            "@b.com",
            "a@.com",
            "a@b.",
            "a b@c.com",
            "a@b c.com",
            "a@@b.com",
            "bob.example.com",
        ] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn generic_domains_detected_case_insensitively() {
        for domain in GENERIC_DOMAINS {
            assert!(is_generic_domain(&format!("x@{domain}")), "{domain}");
            assert!(is_generic_domain(&format!("x@{}", domain.to_uppercase())));
        }
    }

    #[test]
    fn corporate_and_malformed_are_not_generic() {
        assert!(!is_generic_domain("x@acme.io"));
        assert!(!is_generic_domain("x@mail.gmail.com"));
        assert!(!is_generic_domain("no-at-sign"));
        assert!(!is_generic_domain(""));
    }

    #[test]
    fn short_passwords_always_rejected() {
        for pw in ["", "1", "a1!", "12345", "!!!!!"] {
            assert!(!is_valid_password(pw), "{pw:?}");
        }
    }

    #[test]
    fn long_passwords_need_digit_or_symbol() {
        assert!(!is_valid_password("abcdef"));
        assert!(!is_valid_password("ABCDEFGHIJ"));
        assert!(is_valid_password("abcdef1"));
        assert!(is_valid_password("abc123"));
        assert!(is_valid_password("abcdef!"));
        assert!(is_valid_password("abcde/"));
    }

    #[test]
    fn password_length_counts_utf16_units() {
        // Five units, more than six bytes.
        assert!(!is_valid_password("ééé1é"));
        assert!(is_valid_password("éééé1é"));
        // Astral emoji are two units each: four chars, seven units.
        assert!(is_valid_password("😀😀😀1"));
        assert!(!is_valid_password("😀😀1"));
    }

    #[test]
    fn message_id_shape() {
        let id = generate_message_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "msg");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn message_ids_are_distinct() {
        let ids: HashSet<String> = (0..500).map(|_| generate_message_id()).collect();
        assert_eq!(ids.len(), 500);
    }
}
