//! Informational address flags: role accounts, no-reply senders, free and
//! disposable mailbox providers, and the hosting provider behind an MX host.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;

static ROLE_PREFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "info",
        "contact",
        "hello",
        "help",
        "support",
        "admin",
        "administrator",
        "office",
        "sales",
        "press",
        "media",
        "marketing",
        "jobs",
        "careers",
        "hiring",
        "privacy",
        "security",
        "legal",
        "billing",
        "accounts",
        "team",
        "general",
        "feedback",
        "enquiries",
        "inquiries",
        "mail",
        "email",
        "postmaster",
        "hostmaster",
        "webmaster",
        "abuse",
        "noreply",
        "no-reply",
        "newsletter",
        "investors",
        "partners",
    ]
    .into_iter()
    .collect()
});

static FREE_PROVIDERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "gmail.com",
        "googlemail.com",
        "outlook.com",
        "hotmail.com",
        "live.com",
        "msn.com",
        "yahoo.com",
        "ymail.com",
        "aol.com",
        "icloud.com",
        "me.com",
        "mac.com",
        "proton.me",
        "protonmail.com",
        "gmx.com",
        "gmx.de",
        "web.de",
        "mail.com",
        "zoho.com",
        "yandex.com",
        "yandex.ru",
        "mail.ru",
    ]
    .into_iter()
    .collect()
});

static DISPOSABLE_DOMAINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mailinator.com",
        "guerrillamail.com",
        "guerrillamail.net",
        "guerrillamailblock.com",
        "sharklasers.com",
        "grr.la",
        "10minutemail.com",
        "10minutemail.net",
        "tempmail.com",
        "temp-mail.org",
        "tempmailo.com",
        "tempr.email",
        "throwawaymail.com",
        "yopmail.com",
        "yopmail.net",
        "getnada.com",
        "nada.email",
        "dispostable.com",
        "maildrop.cc",
        "mailnesia.com",
        "mintemail.com",
        "trashmail.com",
        "trashmail.de",
        "fakeinbox.com",
        "spamgourmet.com",
        "mohmal.com",
        "emailondeck.com",
        "mailcatch.com",
        "getairmail.com",
        "burnermail.io",
        "moakt.com",
        "mytemp.email",
        "tempinbox.com",
        "discard.email",
        "33mail.com",
        "inboxkitten.com",
    ]
    .into_iter()
    .collect()
});

/// Local parts that announce an unattended mailbox, compared without separators.
const NO_REPLY_PREFIXES: &[&str] = &["noreply", "donotreply", "noreplies", "mailerdaemon"];

/// Whether the local part names a function rather than a person.
pub fn is_role_account(local: &str) -> bool {
    let lower = local.to_lowercase();
    let base = lower.split('+').next().unwrap_or(&lower);
    ROLE_PREFIXES.contains(base)
}

pub fn is_free_provider(domain: &str) -> bool {
    FREE_PROVIDERS.contains(domain.trim_end_matches('.'))
}

/// Whether the domain, or any parent of it, is a throwaway mailbox service.
pub fn is_disposable_domain(domain: &str) -> bool {
    let mut candidate = domain.trim_end_matches('.');
    loop {
        if DISPOSABLE_DOMAINS.contains(candidate) {
            return true;
        }
        match candidate.split_once('.') {
            Some((_, parent)) if parent.contains('.') => candidate = parent,
            _ => return false,
        }
    }
}

/// Whether the local part is a no-reply sender such as `no-reply` or `do_not_reply`.
pub fn is_no_reply(local: &str) -> bool {
    let lower = local.to_lowercase();
    let base = lower.split('+').next().unwrap_or(&lower);
    let squashed: String = base.chars().filter(|c| !matches!(c, '-' | '_' | '.')).collect();
    NO_REPLY_PREFIXES
        .iter()
        .any(|prefix| squashed.starts_with(prefix))
}

/// Mail hosting provider inferred from domain and MX host naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    Google,
    Microsoft,
    Yahoo,
    SecureGateway,
    Other,
}

impl fmt::Display for MailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MailProvider::Google => "google",
            MailProvider::Microsoft => "microsoft",
            MailProvider::Yahoo => "yahoo",
            MailProvider::SecureGateway => "secure_gateway",
            MailProvider::Other => "other",
        };
        f.write_str(name)
    }
}

/// Identifies the provider from the domain first, then from the MX host suffix.
pub fn identify_provider(domain: &str, mx_host: &str) -> MailProvider {
    match domain {
        "gmail.com" | "googlemail.com" => return MailProvider::Google,
        "outlook.com" | "hotmail.com" | "live.com" | "msn.com" => return MailProvider::Microsoft,
        "yahoo.com" | "ymail.com" | "aol.com" => return MailProvider::Yahoo,
        _ => {}
    }

    let host = format!("{}.", mx_host.trim().trim_end_matches('.').to_lowercase());
    if host.ends_with(".google.com.") || host.ends_with(".googlemail.com.") {
        MailProvider::Google
    } else if host.contains("outlook.com") {
        MailProvider::Microsoft
    } else if host.ends_with(".yahoodns.net.") || host.contains("mx.aol.com") {
        MailProvider::Yahoo
    } else if host.ends_with(".mimecast.com.")
        || host.ends_with(".pphosted.com.")
        || host.ends_with(".ppe-hosted.com.")
        || host.ends_with(".messagelabs.com.")
        || host.contains("mxlogic.net")
    {
        MailProvider::SecureGateway
    } else {
        MailProvider::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_role_accounts_ignoring_subaddress() {
        assert!(is_role_account("Support"));
        assert!(is_role_account("info+newsletter"));
        assert!(!is_role_account("jane.doe"));
    }

    #[test]
    fn flags_no_reply_senders() {
        assert!(is_no_reply("noreply"));
        assert!(is_no_reply("No-Reply"));
        assert!(is_no_reply("do_not_reply+billing"));
        assert!(is_no_reply("no.reply.alerts"));
        assert!(is_no_reply("MAILER-DAEMON"));
        assert!(!is_no_reply("nora"));
        assert!(!is_no_reply("reply"));
    }

    #[test]
    fn flags_disposable_domains_and_their_subdomains() {
        assert!(is_disposable_domain("mailinator.com"));
        assert!(is_disposable_domain("inbox.mailinator.com"));
        assert!(is_disposable_domain("yopmail.com."));
        assert!(!is_disposable_domain("gmail.com"));
        assert!(!is_disposable_domain("com"));
        assert!(!is_disposable_domain("notmailinator.com"));
    }

    #[test]
    fn identifies_providers_from_mx_hosts() {
        assert_eq!(identify_provider("gmail.com", ""), MailProvider::Google);
        assert_eq!(
            identify_provider("acme.io", "acme-io.mail.protection.outlook.com."),
            MailProvider::Microsoft
        );
        assert_eq!(
            identify_provider("acme.io", "ALT1.ASPMX.L.GOOGLE.COM"),
            MailProvider::Google
        );
        assert_eq!(
            identify_provider("acme.io", "mx1.acme.pphosted.com"),
            MailProvider::SecureGateway
        );
        assert_eq!(identify_provider("acme.io", "mail.acme.io"), MailProvider::Other);
        assert!(is_free_provider("gmail.com"));
        assert!(!is_free_provider("acme.io"));
    }
}
