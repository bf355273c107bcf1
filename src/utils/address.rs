//! Structural validation of raw address strings.
//!
//! Pure and synchronous: no DNS, no allocation beyond the parsed parts.

use crate::core::error::{SyntaxError, SyntaxErrorKind};
use crate::core::models::EmailAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Host;

const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 255;
const MAX_ADDRESS_LEN: usize = 254;
const MAX_LABEL_LEN: usize = 63;

// Dot-atom local part; non-ASCII letters are accepted for SMTPUTF8 mailboxes.
static LOCAL_PART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\p{L}\p{N}!#$%&'*+/=?^_`{|}~-]+(\.[\p{L}\p{N}!#$%&'*+/=?^_`{|}~-]+)*$")
        .expect("local part pattern is valid")
});

/// Parses `raw` into an [`EmailAddress`], or classifies why it cannot be one.
///
/// Surrounding whitespace is ignored. The domain is lowercased and any
/// internationalized labels are converted to their `xn--` form.
pub fn parse_address(raw: &str) -> Result<EmailAddress, SyntaxError> {
    let fail = |kind| Err(SyntaxError::new(kind));
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return fail(SyntaxErrorKind::Empty);
    }
    if trimmed.chars().any(char::is_control) {
        return fail(SyntaxErrorKind::ControlCharacter);
    }

    let (local, domain) = match trimmed.matches('@').count() {
        0 => return fail(SyntaxErrorKind::MissingAt),
        1 => trimmed.split_once('@').unwrap_or_default(),
        _ => return fail(SyntaxErrorKind::MultipleAt),
    };

    if local.is_empty() {
        return fail(SyntaxErrorKind::EmptyLocal);
    }
    if domain.is_empty() {
        return fail(SyntaxErrorKind::EmptyDomain);
    }
    if local.len() > MAX_LOCAL_LEN {
        return fail(SyntaxErrorKind::LocalTooLong);
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return fail(SyntaxErrorKind::DomainTooLong);
    }
    if !LOCAL_PART_RE.is_match(local) {
        return fail(SyntaxErrorKind::InvalidLocalPart);
    }
    if !domain.contains('.') {
        return fail(SyntaxErrorKind::DomainWithoutDot);
    }

    let ascii_domain = normalize_domain(domain)?;
    if ascii_domain.len() > MAX_DOMAIN_LEN {
        return fail(SyntaxErrorKind::DomainTooLong);
    }
    if local.len() + 1 + ascii_domain.len() > MAX_ADDRESS_LEN {
        return fail(SyntaxErrorKind::AddressTooLong);
    }

    tracing::trace!(target: "address", "Parsed '{}' -> {}@{}", raw, local, ascii_domain);
    Ok(EmailAddress {
        raw: raw.to_string(),
        local: local.to_string(),
        domain: ascii_domain,
    })
}

/// Lowercases a domain and converts it to its ASCII-compatible encoding.
pub fn normalize_domain(domain: &str) -> Result<String, SyntaxError> {
    let invalid = || SyntaxError::new(SyntaxErrorKind::InvalidDomain);

    // Host::parse percent-decodes, so anything outside letters, digits, '-' and '.'
    // is rejected before it gets the chance.
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
    {
        return Err(invalid());
    }

    let ascii = match Host::parse(&domain.to_lowercase()) {
        Ok(Host::Domain(d)) => d,
        Ok(Host::Ipv4(_)) | Ok(Host::Ipv6(_)) | Err(_) => return Err(invalid()),
    };

    let labels: Vec<&str> = ascii.split('.').collect();
    if labels.len() < 2 {
        return Err(SyntaxError::new(SyntaxErrorKind::DomainWithoutDot));
    }
    for label in &labels {
        if label.is_empty()
            || label.len() > MAX_LABEL_LEN
            || label.starts_with('-')
            || label.ends_with('-')
            || !label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(invalid());
        }
    }
    if labels
        .last()
        .is_some_and(|tld| tld.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid());
    }

    Ok(ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(raw: &str) -> SyntaxErrorKind {
        parse_address(raw).expect_err("should be rejected").kind
    }

    #[test]
    fn accepts_and_normalizes_common_addresses() {
        let addr = parse_address("  John.Doe+tag@Example.COM ").expect("valid");
        assert_eq!(addr.local, "John.Doe+tag");
        assert_eq!(addr.domain, "example.com");
        assert_eq!(addr.normalized(), "John.Doe+tag@example.com");
    }

    #[test]
    fn converts_internationalized_domains() {
        let addr = parse_address("info@bücher.de").expect("valid");
        assert_eq!(addr.domain, "xn--bcher-kva.de");
    }

    #[test]
    fn rejects_structural_problems() {
        assert_eq!(kind(""), SyntaxErrorKind::Empty);
        assert_eq!(kind("   "), SyntaxErrorKind::Empty);
        assert_eq!(kind("user.example.com"), SyntaxErrorKind::MissingAt);
        assert_eq!(kind("bad@@domain"), SyntaxErrorKind::MultipleAt);
        assert_eq!(kind("@example.com"), SyntaxErrorKind::EmptyLocal);
        assert_eq!(kind("user@"), SyntaxErrorKind::EmptyDomain);
        assert_eq!(kind("user@localhost"), SyntaxErrorKind::DomainWithoutDot);
        assert_eq!(kind("us\ter@example.com"), SyntaxErrorKind::ControlCharacter);
        assert_eq!(kind("a..b@example.com"), SyntaxErrorKind::InvalidLocalPart);
        assert_eq!(kind(".ab@example.com"), SyntaxErrorKind::InvalidLocalPart);
        assert_eq!(kind("user@exa mple.com"), SyntaxErrorKind::InvalidDomain);
        assert_eq!(kind("user@-bad.com"), SyntaxErrorKind::InvalidDomain);
        assert_eq!(kind("user@example..com"), SyntaxErrorKind::InvalidDomain);
        assert_eq!(kind("user@10.0.0.1"), SyntaxErrorKind::InvalidDomain);
        assert_eq!(kind("user@ex%41mple.com"), SyntaxErrorKind::InvalidDomain);
    }

    #[test]
    fn enforces_length_limits() {
        let long_local = format!("{}@example.com", "a".repeat(65));
        assert_eq!(kind(&long_local), SyntaxErrorKind::LocalTooLong);

        let long_domain = format!("user@{}.com", "a".repeat(260));
        assert_eq!(kind(&long_domain), SyntaxErrorKind::DomainTooLong);

        let label = "a".repeat(60);
        let domain = format!("{label}.{label}.{label}.{label}.com");
        let long_address = format!("{}@{}", "b".repeat(64), domain);
        assert_eq!(kind(&long_address), SyntaxErrorKind::AddressTooLong);

        let long_label = format!("user@{}.com", "a".repeat(64));
        assert_eq!(kind(&long_label), SyntaxErrorKind::InvalidDomain);
    }
}
