//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a submission, generated client-side and stable
/// across retries. The sole de-duplication key for queue and remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    /// Create a new unique submission ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubmissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One unit of user-entered pledge data awaiting delivery to a backend.
///
/// Serialized with camelCase field names so the persisted queue file and
/// both transports carry the wire format the backends expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Unique identifier, set once at creation
    pub id: SubmissionId,
    /// Name entered on the pledge form
    pub student_name: String,
    /// Contact phone number
    pub phone: String,
    /// Contact email address
    pub email: String,
    /// Creation time, set once at enqueue time, never mutated
    pub timestamp: DateTime<Utc>,
    /// Whether the certificate poster was generated (always true at creation)
    pub poster_generated: bool,
    /// Whether the user downloaded the poster; mutated by the UI, ignored by
    /// queue logic
    pub poster_downloaded: bool,
    /// Consent flag for future contact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt_in: Option<bool>,
}

impl Submission {
    /// Create a new submission with a fresh ID and the current timestamp
    #[must_use]
    pub fn new(
        student_name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: SubmissionId::new(),
            student_name: student_name.into(),
            phone: phone.into(),
            email: email.into(),
            timestamp: Utc::now(),
            poster_generated: true,
            poster_downloaded: false,
            opt_in: None,
        }
    }

    /// Set the consent flag
    #[must_use]
    pub const fn with_opt_in(mut self, opt_in: bool) -> Self {
        self.opt_in = Some(opt_in);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_submission_id_unique() {
        let id1 = SubmissionId::new();
        let id2 = SubmissionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_submission_id_parse() {
        let id = SubmissionId::new();
        let parsed: SubmissionId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_submission_new_defaults() {
        let submission = Submission::new("Asha", "+91 98765", "asha@example.com");
        assert_eq!(submission.student_name, "Asha");
        assert!(submission.poster_generated);
        assert!(!submission.poster_downloaded);
        assert_eq!(submission.opt_in, None);
    }

    #[test]
    fn test_with_opt_in() {
        let submission = Submission::new("Asha", "1", "a@b.c").with_opt_in(true);
        assert_eq!(submission.opt_in, Some(true));
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let submission = Submission::new("Asha", "1", "a@b.c");
        let json = serde_json::to_string(&submission).unwrap();
        assert!(json.contains("\"studentName\""));
        assert!(json.contains("\"posterGenerated\""));
        assert!(json.contains("\"posterDownloaded\""));
        // opt_in is omitted entirely when unset
        assert!(!json.contains("optIn"));
    }

    #[test]
    fn test_serde_round_trip() {
        let submission = Submission::new("Asha", "1", "a@b.c").with_opt_in(false);
        let json = serde_json::to_string(&submission).unwrap();
        let parsed: Submission = serde_json::from_str(&json).unwrap();
        assert_eq!(submission, parsed);
    }
}
