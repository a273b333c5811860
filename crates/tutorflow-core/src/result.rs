//! Per-lesson confirmation results.

use serde::{Deserialize, Serialize};

/// How a held lesson was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The lesson did not take place, so payment does not apply.
    NotApplicable,
    /// Held but not paid.
    None,
    /// Paid the standard rate.
    Standard,
    /// Paid an amount entered by the operator.
    Custom,
}

impl PaymentStatus {
    /// Short human label used in acknowledgements.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotApplicable => "n/a",
            Self::None => "not paid",
            Self::Standard => "standard rate",
            Self::Custom => "custom amount",
        }
    }
}

/// The confirmed outcome of a single lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Student name, as used in the confirmation prompt.
    pub subject: String,
    /// Whether the lesson took place.
    pub held: bool,
    /// Payment status; `NotApplicable` when `held` is false.
    pub payment_status: PaymentStatus,
    /// Amount paid. Zero unless `payment_status` is `Custom`.
    pub amount: f64,
    /// Lesson length, attached once the result is collected.
    #[serde(default)]
    pub duration: String,
    /// Set when the operator never answered within the configured timeout.
    #[serde(default)]
    pub timed_out: bool,
}

impl SessionResult {
    /// Lesson did not take place.
    pub fn not_held(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            held: false,
            payment_status: PaymentStatus::NotApplicable,
            amount: 0.0,
            duration: String::new(),
            timed_out: false,
        }
    }

    /// Lesson took place and was settled with a button choice (standard or none).
    pub fn held(subject: impl Into<String>, payment_status: PaymentStatus) -> Self {
        Self {
            subject: subject.into(),
            held: true,
            payment_status,
            amount: 0.0,
            duration: String::new(),
            timed_out: false,
        }
    }

    /// Lesson took place and the operator typed the amount.
    pub fn custom(subject: impl Into<String>, amount: f64) -> Self {
        Self {
            subject: subject.into(),
            held: true,
            payment_status: PaymentStatus::Custom,
            amount,
            duration: String::new(),
            timed_out: false,
        }
    }

    /// No answer arrived before the response timeout.
    pub fn timed_out(subject: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            ..Self::not_held(subject)
        }
    }

    /// Attach the lesson duration.
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    /// One-line summary for logs and the final report.
    pub fn summary(&self) -> String {
        if self.timed_out {
            return format!("{}: no answer (timed out)", self.subject);
        }
        if !self.held {
            return format!("{}: not held", self.subject);
        }
        match self.payment_status {
            PaymentStatus::Custom => format!("{}: held, paid {:.2}", self.subject, self.amount),
            status => format!("{}: held, {}", self.subject, status.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_held_defaults() {
        let result = SessionResult::not_held("Giovanni");
        assert!(!result.held);
        assert_eq!(result.payment_status, PaymentStatus::NotApplicable);
        assert_eq!(result.amount, 0.0);
        assert!(!result.timed_out);
    }

    #[test]
    fn test_timed_out_is_not_held() {
        let result = SessionResult::timed_out("Giovanni");
        assert!(result.timed_out);
        assert!(!result.held);
        assert_eq!(result.summary(), "Giovanni: no answer (timed out)");
    }

    #[test]
    fn test_serialized_shape() {
        let result = SessionResult::custom("Anna", 40.0).with_duration("1h 30min");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["subject"], "Anna");
        assert_eq!(json["payment_status"], "custom");
        assert_eq!(json["amount"], 40.0);
        assert_eq!(json["duration"], "1h 30min");
    }

    #[test]
    fn test_summary_variants() {
        assert_eq!(
            SessionResult::held("A", PaymentStatus::Standard).summary(),
            "A: held, standard rate"
        );
        assert_eq!(SessionResult::custom("B", 35.5).summary(), "B: held, paid 35.50");
        assert_eq!(SessionResult::not_held("C").summary(), "C: not held");
    }
}
