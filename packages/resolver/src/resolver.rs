//! The phased interactive resolver.
//!
//! Drives one browser tab through four ordered strategies to find one
//! company's tax identifier on one domain:
//!
//! 1. LOCAL - deterministic pattern match on the current page
//! 2. REGISTRY - authoritative lookup by extracted legal name or domain
//! 3. SEARCH_ENGINE - bounded guided navigation (learned patterns first,
//!    then a fixed fallback list, then an inference link choice)
//! 4. VERIFY - re-extraction and false-positive screening of a
//!    navigation result
//!
//! The fallback chain is a data-driven state machine: [`next_phase`] is a
//! pure function over `(Phase, PhaseOutcome)`. Phase-internal failures are
//! absorbed and advance the chain; only a dead session propagates as an
//! error. "Not found" is a normal return, never an `Err`.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::extract::{best_inn, extract_company_name, find_emails, find_inn};
use crate::learning::{bucket_markers, PatternLearningEngine};
use crate::prompts::{format_link_choice_prompt, parse_link_choice, REGISTRATION_DETAILS_GOAL};
use crate::traits::inference::Inference;
use crate::traits::page::{PageController, PageLink};
use crate::traits::registry::Registry;
use crate::types::attempt::{
    ActionKind, Confidence, ExtractionAttempt, ExtractionMethod, Phase, ProofRecord,
};
use crate::types::config::ResolveConfig;

/// Fixed fallback path patterns, tried after learned ones.
pub const DEFAULT_NAV_PATTERNS: &[&str] = &[
    "/contacts",
    "/kontakty",
    "/about",
    "/requisites",
    "/rekvizity",
    "/o-kompanii",
    "/company",
];

/// Outcome of running one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase produced (or confirmed) an identifier
    Found,
    /// The phase ran cleanly but produced nothing
    NotFound,
    /// The phase hit a recoverable failure; absorbed, fall through
    Failed,
}

/// What the state machine does after a phase settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    Continue(Phase),
    Terminate,
}

/// The fallback chain as a pure function.
///
/// LOCAL and REGISTRY terminate on success; a SEARCH_ENGINE success must
/// pass VERIFY before the attempt is final. Failure and not-found are
/// treated alike: fall through until the chain runs out.
pub fn next_phase(phase: Phase, outcome: PhaseOutcome) -> PhaseTransition {
    use PhaseOutcome::Found;
    match (phase, outcome) {
        (Phase::Local, Found) | (Phase::Registry, Found) => PhaseTransition::Terminate,
        (Phase::Local, _) => PhaseTransition::Continue(Phase::Registry),
        (Phase::Registry, _) => PhaseTransition::Continue(Phase::SearchEngine),
        (Phase::SearchEngine, Found) => PhaseTransition::Continue(Phase::Verify),
        (Phase::SearchEngine, _) => PhaseTransition::Terminate,
        (Phase::Verify, _) => PhaseTransition::Terminate,
    }
}

/// The phased state machine that drives one browser session.
///
/// Holds no per-resolution state: every `resolve` call is independent
/// given a fresh page.
pub struct InteractiveResolver<I, R> {
    inference: Arc<I>,
    registry: Arc<R>,
    learning: Arc<PatternLearningEngine>,
    config: ResolveConfig,
}

impl<I: Inference, R: Registry> InteractiveResolver<I, R> {
    pub fn new(
        inference: Arc<I>,
        registry: Arc<R>,
        learning: Arc<PatternLearningEngine>,
    ) -> Self {
        Self {
            inference,
            registry,
            learning,
            config: ResolveConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ResolveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolve one domain's identifier starting from `start_url`.
    ///
    /// Returns `Err` only for unrecoverable infrastructure faults (the
    /// initial navigation failing twice). Everything else, including
    /// exhausted attempts and the wall-clock deadline, returns a normal
    /// `ExtractionAttempt`.
    pub async fn resolve(
        &self,
        page: &dyn PageController,
        domain: &str,
        start_url: &str,
    ) -> Result<ExtractionAttempt> {
        let deadline = Instant::now() + self.config.timeout;
        let mut attempt = ExtractionAttempt::new(domain, start_url);
        info!(domain, start_url, "starting resolution");

        // Initial navigation gets one retry; a second failure means the
        // session is unusable and the fault belongs to the caller.
        if let Err(first) = page.navigate(start_url, self.config.step_timeout_ms).await {
            warn!(domain, error = %first, "initial navigation failed, retrying once");
            page.navigate(start_url, self.config.step_timeout_ms).await?;
        }

        let mut phase = Phase::Local;
        loop {
            let outcome = match phase {
                Phase::Local => {
                    attempt.phase_reached = Phase::Local;
                    self.run_local(page, &mut attempt).await
                }
                Phase::Registry => {
                    attempt.phase_reached = Phase::Registry;
                    self.run_registry(page, &mut attempt).await
                }
                Phase::SearchEngine => {
                    attempt.phase_reached = Phase::SearchEngine;
                    self.run_navigation(page, &mut attempt, deadline).await
                }
                Phase::Verify => self.run_verify(page, &mut attempt).await,
            };
            debug!(domain, phase = ?phase, outcome = ?outcome, "phase settled");

            match next_phase(phase, outcome) {
                PhaseTransition::Continue(next) => phase = next,
                PhaseTransition::Terminate => break,
            }
        }

        info!(
            domain,
            success = attempt.success,
            phase_reached = ?attempt.phase_reached,
            steps = attempt.actions_taken.len(),
            "resolution finished"
        );
        Ok(attempt)
    }

    async fn run_local(
        &self,
        page: &dyn PageController,
        attempt: &mut ExtractionAttempt,
    ) -> PhaseOutcome {
        match self
            .check_current_page(page, attempt, ExtractionMethod::LocalPattern)
            .await
        {
            Ok(true) => PhaseOutcome::Found,
            Ok(false) => PhaseOutcome::NotFound,
            Err(e) => {
                warn!(domain = %attempt.domain, error = %e, "local phase failed");
                PhaseOutcome::Failed
            }
        }
    }

    async fn run_registry(
        &self,
        page: &dyn PageController,
        attempt: &mut ExtractionAttempt,
    ) -> PhaseOutcome {
        let text = page.visible_text().await.unwrap_or_default();
        let key = match extract_company_name(&text) {
            Some(name) => name,
            // Fall back to the bare domain; registries index trade names too.
            None => attempt.domain.clone(),
        };

        match self.registry.lookup(&key).await {
            Ok(Some(record)) if !record.inn.is_empty() => {
                let confidence = if record.is_active() {
                    Confidence::High
                } else {
                    Confidence::Medium
                };
                let url = page
                    .current_url()
                    .await
                    .unwrap_or_else(|_| attempt.start_url.clone());
                let snippet = format!(
                    "{} ({})",
                    record.name,
                    record.status.as_deref().unwrap_or("status unknown")
                );
                let inn = record.inn.clone();
                attempt.succeed(
                    inn,
                    ProofRecord::new(url, snippet, ExtractionMethod::Registry)
                        .with_confidence(confidence),
                );
                PhaseOutcome::Found
            }
            Ok(_) => PhaseOutcome::NotFound,
            Err(e) => {
                warn!(domain = %attempt.domain, key = %key, error = %e, "registry phase failed");
                PhaseOutcome::Failed
            }
        }
    }

    /// Guided navigation: at most `max_attempts` decision steps, each
    /// appending exactly one ActionRecord.
    async fn run_navigation(
        &self,
        page: &dyn PageController,
        attempt: &mut ExtractionAttempt,
        deadline: Instant,
    ) -> PhaseOutcome {
        let mut visited: HashSet<String> = HashSet::new();
        if let Ok(url) = page.current_url().await {
            visited.insert(normalize_href(&url));
        }

        while attempt.actions_taken.len() < self.config.max_attempts {
            if Instant::now() >= deadline {
                debug!(domain = %attempt.domain, "deadline reached during navigation");
                return PhaseOutcome::NotFound;
            }

            let links = match page.links().await {
                Ok(links) => links,
                Err(e) => {
                    warn!(domain = %attempt.domain, error = %e, "link enumeration failed");
                    return PhaseOutcome::Failed;
                }
            };
            if links.is_empty() {
                attempt.record_action(ActionKind::GiveUp, "", "page has no links");
                return PhaseOutcome::NotFound;
            }

            let patterns = self.navigation_patterns(&attempt.domain);
            let choice = match pick_link_by_pattern(&links, &patterns, &visited) {
                Some(pick) => Some(pick),
                None => self
                    .ask_inference(&links)
                    .await
                    .map(|i| (i, "inference choice".to_string())),
            };

            let Some((index, rationale)) = choice else {
                attempt.record_action(
                    ActionKind::GiveUp,
                    "",
                    "no pattern matched and inference gave no usable choice",
                );
                return PhaseOutcome::NotFound;
            };

            let target = links[index].href.clone();
            attempt.record_action(ActionKind::Click, &target, &rationale);
            visited.insert(normalize_href(&target));

            // One retry for a transient click failure; a second failure
            // consumes the step and moves on.
            if let Err(first) = page.click(index, self.config.step_timeout_ms).await {
                debug!(target, error = %first, "click failed, retrying once");
                if let Err(second) = page.click(index, self.config.step_timeout_ms).await {
                    warn!(target, error = %second, "click failed twice, skipping step");
                    continue;
                }
            }

            match self
                .check_current_page(page, attempt, ExtractionMethod::InteractiveAgent)
                .await
            {
                Ok(true) => return PhaseOutcome::Found,
                Ok(false) => {}
                Err(e) => {
                    warn!(domain = %attempt.domain, error = %e, "page read failed after click");
                }
            }
        }

        PhaseOutcome::NotFound
    }

    /// Re-extract from the final page state before accepting a navigation
    /// result. Rejecting here clears the result: a tracking number that
    /// slipped through must not be reported as an identifier.
    async fn run_verify(
        &self,
        page: &dyn PageController,
        attempt: &mut ExtractionAttempt,
    ) -> PhaseOutcome {
        let Some(inn) = attempt.inn.clone() else {
            return PhaseOutcome::NotFound;
        };

        let text = page.visible_text().await.unwrap_or_default();
        let html = page.html_source().await.unwrap_or_default();
        let confirmed = find_inn(&text)
            .into_iter()
            .chain(find_inn(&html))
            .any(|m| m.value == inn);

        if confirmed {
            PhaseOutcome::Found
        } else {
            warn!(domain = %attempt.domain, inn, "verification rejected extracted value");
            attempt.phase_reached = Phase::Verify;
            attempt.inn = None;
            attempt.result = None;
            attempt.success = false;
            PhaseOutcome::NotFound
        }
    }

    /// Read the current page and apply local extraction; on a clean match
    /// attach the proof and mark the attempt successful.
    async fn check_current_page(
        &self,
        page: &dyn PageController,
        attempt: &mut ExtractionAttempt,
        method: ExtractionMethod,
    ) -> Result<bool> {
        let text = page.visible_text().await?;
        let html = page.html_source().await?;

        attempt.add_emails(find_emails(&text));
        attempt.add_emails(find_emails(&html));

        let mut matches = find_inn(&text);
        if matches.is_empty() {
            matches = find_inn(&html);
        }
        let Some(found) = best_inn(&matches) else {
            return Ok(false);
        };

        let url = page.current_url().await?;
        let confidence = if found.checksum_ok {
            Confidence::High
        } else {
            Confidence::Medium
        };
        let value = found.value.clone();
        let proof = ProofRecord::new(url, found.context.clone(), method)
            .with_confidence(confidence);
        attempt.succeed(value, proof);
        Ok(true)
    }

    /// Learned patterns for this domain (domain-scoped, then global),
    /// followed by the fixed fallback list, deduplicated.
    fn navigation_patterns(&self, domain: &str) -> Vec<String> {
        let mut patterns = self
            .learning
            .priority_url_patterns(domain, self.config.data_type);
        for fallback in DEFAULT_NAV_PATTERNS {
            if !patterns.iter().any(|p| p == fallback) {
                patterns.push((*fallback).to_string());
            }
        }
        patterns
    }

    async fn ask_inference(&self, links: &[PageLink]) -> Option<usize> {
        let prompt = format_link_choice_prompt(links, REGISTRATION_DETAILS_GOAL);
        match self
            .inference
            .generate(&prompt, self.config.inference_timeout_ms)
            .await
        {
            Ok(reply) => parse_link_choice(&reply, links.len()),
            Err(e) => {
                warn!(error = %e, "inference link choice failed");
                None
            }
        }
    }
}

/// Find the first unvisited link matching the highest-priority pattern,
/// by href path stem or by the bucket's localized link texts.
fn pick_link_by_pattern(
    links: &[PageLink],
    patterns: &[String],
    visited: &HashSet<String>,
) -> Option<(usize, String)> {
    for pattern in patterns {
        let stem = pattern.trim_start_matches('/');
        for (index, link) in links.iter().enumerate() {
            if visited.contains(&normalize_href(&link.href)) {
                continue;
            }
            let path = href_path(&link.href).to_lowercase();
            let text = link.text.to_lowercase();
            let text_hit = bucket_markers(pattern)
                .map(|markers| markers.iter().any(|m| text.contains(m)))
                .unwrap_or(false);
            if path.contains(stem) || text_hit {
                return Some((index, format!("matched pattern {pattern}")));
            }
        }
    }
    None
}

/// Collapse an href to a comparable key for loop avoidance.
fn normalize_href(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) => format!(
            "{}{}",
            url.host_str().unwrap_or(""),
            url.path().trim_end_matches('/')
        )
        .to_lowercase(),
        Err(_) => href.trim_end_matches('/').to_lowercase(),
    }
}

fn href_path(href: &str) -> String {
    Url::parse(href)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_chain_covers_every_state() {
        use PhaseOutcome::*;
        use PhaseTransition::*;

        assert_eq!(next_phase(Phase::Local, Found), Terminate);
        assert_eq!(next_phase(Phase::Local, NotFound), Continue(Phase::Registry));
        assert_eq!(next_phase(Phase::Local, Failed), Continue(Phase::Registry));

        assert_eq!(next_phase(Phase::Registry, Found), Terminate);
        assert_eq!(
            next_phase(Phase::Registry, NotFound),
            Continue(Phase::SearchEngine)
        );
        assert_eq!(
            next_phase(Phase::Registry, Failed),
            Continue(Phase::SearchEngine)
        );

        assert_eq!(
            next_phase(Phase::SearchEngine, Found),
            Continue(Phase::Verify)
        );
        assert_eq!(next_phase(Phase::SearchEngine, NotFound), Terminate);
        assert_eq!(next_phase(Phase::SearchEngine, Failed), Terminate);

        assert_eq!(next_phase(Phase::Verify, Found), Terminate);
        assert_eq!(next_phase(Phase::Verify, NotFound), Terminate);
        assert_eq!(next_phase(Phase::Verify, Failed), Terminate);
    }

    #[test]
    fn pattern_pick_prefers_pattern_priority_over_link_order() {
        let links = vec![
            PageLink::new("О компании", "/about"),
            PageLink::new("Контакты", "/kontakty"),
        ];
        let patterns = vec!["/contacts".to_string(), "/about".to_string()];
        let visited = HashSet::new();

        // "/contacts" is higher priority and matches the kontakty link by
        // its localized text markers, beating the earlier about link.
        let (index, rationale) = pick_link_by_pattern(&links, &patterns, &visited).unwrap();
        assert_eq!(index, 1);
        assert!(rationale.contains("/contacts"));
    }

    #[test]
    fn pattern_pick_skips_visited_links() {
        let links = vec![PageLink::new("Контакты", "https://a.com/contacts")];
        let patterns = vec!["/contacts".to_string()];
        let mut visited = HashSet::new();
        visited.insert(normalize_href("https://a.com/contacts/"));

        assert!(pick_link_by_pattern(&links, &patterns, &visited).is_none());
    }

    #[tokio::test]
    async fn navigation_patterns_follow_the_configured_data_type() {
        use crate::testing::{MockInference, MockRegistry};
        use crate::types::patterns::DataType;

        let learning = Arc::new(PatternLearningEngine::in_memory());
        learning
            .learn_from_confirmed_success(
                "a.com",
                DataType::Email,
                "info@a.com",
                &["https://a.com/rekvizity".to_string()],
            )
            .await
            .unwrap();

        let email_resolver = InteractiveResolver::new(
            Arc::new(MockInference::new()),
            Arc::new(MockRegistry::new()),
            Arc::clone(&learning),
        )
        .with_config(ResolveConfig::default().with_data_type(DataType::Email));
        assert_eq!(email_resolver.navigation_patterns("a.com")[0], "/requisites");

        // The default configuration steers by identifier patterns, so the
        // email-learned bucket does not jump the fallback list.
        let inn_resolver = InteractiveResolver::new(
            Arc::new(MockInference::new()),
            Arc::new(MockRegistry::new()),
            learning,
        );
        assert_eq!(inn_resolver.navigation_patterns("a.com")[0], "/contacts");
    }

    #[test]
    fn href_normalization_ignores_trailing_slash_and_case() {
        assert_eq!(
            normalize_href("https://A.com/Contacts/"),
            normalize_href("https://a.com/Contacts")
        );
    }
}
