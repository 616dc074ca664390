//! One resolution attempt: phases, recorded actions, and extraction proof.

use serde::{Deserialize, Serialize};

/// The ordered strategies the resolver attempts for one domain.
///
/// Fallback between phases is data-driven: see
/// [`next_phase`](crate::resolver::next_phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Deterministic pattern match on the current page
    Local,
    /// Authoritative registry lookup by name or identifier
    Registry,
    /// Guided navigation across the site
    SearchEngine,
    /// Re-extraction and false-positive screening of a navigation result
    Verify,
}

/// What one decision step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Click,
    Extract,
    GiveUp,
}

/// One decision step taken during guided navigation. Write-once; step
/// indices are strictly increasing within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub step_index: usize,
    pub action: ActionKind,
    /// URL, href, or phase label the action targeted
    pub target: String,
    /// Why this action was chosen (learned pattern, inference choice, ...)
    pub rationale: String,
}

/// How an identifier was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    LocalPattern,
    Registry,
    InteractiveAgent,
}

/// Confidence grade attached to an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Evidence for an extracted value. Immutable once attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRecord {
    /// Page (or registry endpoint) the value came from
    pub url: String,
    /// ~50-100 chars of text surrounding the match
    pub context_snippet: String,
    pub method: ExtractionMethod,
    pub confidence: Option<Confidence>,
}

impl ProofRecord {
    pub fn new(
        url: impl Into<String>,
        context_snippet: impl Into<String>,
        method: ExtractionMethod,
    ) -> Self {
        Self {
            url: url.into(),
            context_snippet: context_snippet.into(),
            method,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// One run of the interactive resolver for one (domain, start URL) pair.
///
/// Mutated by the resolver on every step; immutable once `resolve`
/// returns. `success=false` with `error_message=None` means the identifier
/// was genuinely not found, which is a normal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionAttempt {
    pub domain: String,
    pub start_url: String,
    pub phase_reached: Phase,
    /// Append-only; bounded by the configured `max_attempts`
    pub actions_taken: Vec<ActionRecord>,
    /// The extracted identifier, when found
    pub inn: Option<String>,
    /// Evidence for `inn`
    pub result: Option<ProofRecord>,
    /// Contact emails collected along the way
    pub emails: Vec<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ExtractionAttempt {
    /// Create a fresh attempt at the start of a resolution.
    pub fn new(domain: impl Into<String>, start_url: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            start_url: start_url.into(),
            phase_reached: Phase::Local,
            actions_taken: Vec::new(),
            inn: None,
            result: None,
            emails: Vec::new(),
            success: false,
            error_message: None,
        }
    }

    /// Create an attempt that failed before the resolver could run
    /// (no candidate URL, dead session, task timeout).
    pub fn failed(
        domain: impl Into<String>,
        start_url: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let mut attempt = Self::new(domain, start_url);
        attempt.error_message = Some(error.into());
        attempt
    }

    /// Append one decision step. Step indices are assigned here so
    /// ordering cannot be violated by callers.
    pub fn record_action(
        &mut self,
        action: ActionKind,
        target: impl Into<String>,
        rationale: impl Into<String>,
    ) {
        self.actions_taken.push(ActionRecord {
            step_index: self.actions_taken.len(),
            action,
            target: target.into(),
            rationale: rationale.into(),
        });
    }

    /// Mark the attempt successful with the extracted value and its proof.
    pub fn succeed(&mut self, inn: impl Into<String>, proof: ProofRecord) {
        self.inn = Some(inn.into());
        self.result = Some(proof);
        self.success = true;
        self.error_message = None;
    }

    /// Merge newly found emails, deduplicated, preserving first-seen order.
    pub fn add_emails(&mut self, emails: impl IntoIterator<Item = String>) {
        for email in emails {
            if !self.emails.contains(&email) {
                self.emails.push(email);
            }
        }
    }

    /// Expected-negative outcome: not found, but nothing went wrong.
    pub fn is_not_found(&self) -> bool {
        !self.success && self.error_message.is_none()
    }

    /// Fatal-per-task outcome: infrastructure fault recorded for this domain.
    pub fn is_error(&self) -> bool {
        !self.success && self.error_message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_indices_are_strictly_ordered() {
        let mut attempt = ExtractionAttempt::new("example.com", "https://example.com");
        attempt.record_action(ActionKind::Click, "/contacts", "learned pattern");
        attempt.record_action(ActionKind::Click, "/about", "inference choice");
        attempt.record_action(ActionKind::GiveUp, "", "no links left");

        let indices: Vec<usize> = attempt.actions_taken.iter().map(|a| a.step_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn outcome_classification() {
        let mut found = ExtractionAttempt::new("a.com", "https://a.com");
        found.succeed(
            "7707083893",
            ProofRecord::new("https://a.com", "ИНН 7707083893", ExtractionMethod::LocalPattern),
        );
        assert!(found.success && !found.is_error() && !found.is_not_found());

        let not_found = ExtractionAttempt::new("b.com", "https://b.com");
        assert!(not_found.is_not_found());

        let errored = ExtractionAttempt::failed("c.com", "https://c.com", "session died");
        assert!(errored.is_error());
    }

    #[test]
    fn emails_deduplicate_preserving_order() {
        let mut attempt = ExtractionAttempt::new("a.com", "https://a.com");
        attempt.add_emails(vec!["sales@a.com".to_string(), "info@a.com".to_string()]);
        attempt.add_emails(vec!["info@a.com".to_string(), "hr@a.com".to_string()]);
        assert_eq!(attempt.emails, vec!["sales@a.com", "info@a.com", "hr@a.com"]);
    }
}
