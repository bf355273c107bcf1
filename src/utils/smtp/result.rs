// src/utils/smtp/result.rs
//! Defines the result type for SMTP probe operations.

use crate::core::models::Deliverable;

/// Which envelope command produced the deciding reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStage {
    MailFrom,
    RcptTo,
}

/// Represents the outcome of a completed SMTP dialogue with one mail host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpOutcome {
    /// The host that answered.
    pub host: String,
    /// Reply code of the deciding command.
    pub code: u16,
    /// Reply text as sent by the server.
    pub message: String,
    pub stage: ReplyStage,
    /// True = Exists, False = Does Not Exist, None = Inconclusive
    pub exists: Option<bool>,
    /// Suggests if retrying later might yield a different result (e.g., greylisting).
    pub should_retry: bool,
    /// Indicates the host also accepted a random recipient on the same domain.
    pub is_catch_all: bool,
}

impl SmtpOutcome {
    /// Classifies the reply to `RCPT TO`.
    ///
    /// Only 550/551/553 prove the mailbox does not exist; 4xx replies are treated
    /// as greylisting and stay inconclusive.
    pub fn from_rcpt(host: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        let exists = match code {
            200..=299 => Some(true),
            550 | 551 | 553 => Some(false),
            _ => None,
        };
        Self {
            host: host.into(),
            code,
            message: message.into(),
            stage: ReplyStage::RcptTo,
            exists,
            should_retry: (400..500).contains(&code),
            is_catch_all: false,
        }
    }

    /// The server refused the envelope sender; nothing is learned about the recipient.
    pub fn sender_rejected(host: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            code,
            message: message.into(),
            stage: ReplyStage::MailFrom,
            exists: None,
            should_retry: (400..500).contains(&code),
            is_catch_all: false,
        }
    }

    /// The recipient exists but its mailbox is over quota (552 on `RCPT TO`).
    pub fn is_mailbox_full(&self) -> bool {
        self.stage == ReplyStage::RcptTo && self.code == 552
    }

    /// Marks the domain as accepting every recipient.
    pub fn mark_catch_all(&mut self) {
        self.is_catch_all = true;
    }

    /// Maps the dialogue onto a verdict and its reason string.
    pub fn verdict(&self) -> (Deliverable, String) {
        if self.stage == ReplyStage::MailFrom {
            return (
                Deliverable::Unknown,
                format!("smtp_sender_rejected: {}", self.code),
            );
        }
        match (self.exists, self.code) {
            (Some(true), _) if self.is_catch_all => (Deliverable::Risky, "accept_all".to_string()),
            (Some(true), _) => (Deliverable::Valid, "accepted".to_string()),
            (Some(false), code) => (Deliverable::Invalid, format!("rejected: {}", code)),
            (None, 552) => (Deliverable::Risky, "mailbox_full".to_string()),
            (None, code) if self.should_retry => (
                Deliverable::Unknown,
                format!("smtp_temporary_failure: {}", code),
            ),
            (None, code) => (
                Deliverable::Unknown,
                format!("smtp_inconclusive: {}", code),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_codes_map_to_verdicts() {
        let cases = [
            (250, Deliverable::Valid),
            (251, Deliverable::Valid),
            (550, Deliverable::Invalid),
            (551, Deliverable::Invalid),
            (553, Deliverable::Invalid),
            (552, Deliverable::Risky),
            (554, Deliverable::Unknown),
            (450, Deliverable::Unknown),
            (451, Deliverable::Unknown),
        ];
        for (code, expected) in cases {
            let (verdict, _) = SmtpOutcome::from_rcpt("mx", code, "").verdict();
            assert_eq!(verdict, expected, "code {code}");
        }
    }

    #[test]
    fn greylisting_is_retryable_and_never_invalid() {
        let outcome = SmtpOutcome::from_rcpt("mx", 451, "4.7.1 Greylisted");
        assert!(outcome.should_retry);
        assert_eq!(
            outcome.verdict(),
            (Deliverable::Unknown, "smtp_temporary_failure: 451".to_string())
        );
    }

    #[test]
    fn catch_all_and_sender_rejection() {
        let mut outcome = SmtpOutcome::from_rcpt("mx", 250, "OK");
        outcome.mark_catch_all();
        assert_eq!(outcome.verdict(), (Deliverable::Risky, "accept_all".to_string()));

        let sender = SmtpOutcome::sender_rejected("mx", 550, "sender blocked");
        assert_eq!(sender.verdict().0, Deliverable::Unknown);
    }

    #[test]
    fn only_recipient_552_means_mailbox_full() {
        assert!(SmtpOutcome::from_rcpt("mx", 552, "5.2.2 Mailbox full").is_mailbox_full());
        assert!(!SmtpOutcome::from_rcpt("mx", 550, "").is_mailbox_full());
        assert!(!SmtpOutcome::sender_rejected("mx", 552, "").is_mailbox_full());
    }
}
