//! Batch extraction orchestrator.
//!
//! Fans a set of domains out over the interactive resolver with bounded
//! concurrency. One domain's fault never becomes a batch fault: every
//! input domain comes back with an `ExtractionAttempt`, failed tasks
//! folded into that domain's `error_message`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indexmap::{IndexMap, IndexSet};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::resolver::InteractiveResolver;
use crate::traits::candidates::CandidateUrls;
use crate::traits::inference::Inference;
use crate::traits::page::PageSession;
use crate::traits::registry::Registry;
use crate::types::attempt::ExtractionAttempt;
use crate::types::batch::{BatchRun, BatchStats};
use crate::types::config::BatchConfig;

/// Fan-out coordinator over the interactive resolver.
///
/// Owns the page session factory and the candidate-URL provider; the
/// learning engine travels inside the resolver. All collaborators are
/// `Arc`-shared into the spawned tasks.
pub struct BatchOrchestrator<S, C, I, R> {
    session: Arc<S>,
    candidates: Arc<C>,
    resolver: Arc<InteractiveResolver<I, R>>,
    config: BatchConfig,
}

impl<S, C, I, R> BatchOrchestrator<S, C, I, R>
where
    S: PageSession + 'static,
    C: CandidateUrls + 'static,
    I: Inference + 'static,
    R: Registry + 'static,
{
    pub fn new(
        session: Arc<S>,
        candidates: Arc<C>,
        resolver: Arc<InteractiveResolver<I, R>>,
    ) -> Self {
        Self {
            session,
            candidates,
            resolver,
            config: BatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve identifiers for `domains` with bounded concurrency.
    ///
    /// All tasks are spawned at submission; a semaphore admits at most
    /// `concurrency_limit` into actual work. Never returns an error:
    /// per-domain faults, timeouts, and even task panics are folded into
    /// that domain's attempt. The returned run has one entry per input
    /// domain, in input order.
    pub async fn resolve_batch(&self, domains: Vec<String>) -> BatchRun {
        let started_at = Utc::now();
        let domains: Vec<String> = domains.into_iter().collect::<IndexSet<_>>().into_iter().collect();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit));

        // Backstop over the resolver's own deadline, so a hung page
        // cannot hold a permit forever.
        let task_budget = self.resolver.config().timeout + self.config.task_grace;

        info!(
            domains = domains.len(),
            concurrency_limit = self.config.concurrency_limit,
            "starting batch resolution"
        );

        let mut handles = Vec::with_capacity(domains.len());
        for domain in &domains {
            let domain = domain.clone();
            let task_domain = domain.clone();
            let semaphore = Arc::clone(&semaphore);
            let session = Arc::clone(&self.session);
            let candidates = Arc::clone(&self.candidates);
            let resolver = Arc::clone(&self.resolver);

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                resolve_one(
                    session.as_ref(),
                    candidates.as_ref(),
                    resolver.as_ref(),
                    &task_domain,
                    task_budget,
                )
                .await
            });
            handles.push((domain, handle));
        }

        let mut results: IndexMap<String, ExtractionAttempt> =
            IndexMap::with_capacity(handles.len());
        for (domain, handle) in handles {
            let attempt = match handle.await {
                Ok(attempt) => attempt,
                // A panic in one task is still just that domain's failure.
                Err(e) => {
                    warn!(domain = %domain, error = %e, "resolution task aborted");
                    ExtractionAttempt::failed(&domain, "", format!("resolution task aborted: {e}"))
                }
            };
            results.insert(domain, attempt);
        }

        let stats = BatchStats::from_results(results.values());
        info!(
            succeeded = stats.succeeded,
            not_found = stats.not_found,
            errored = stats.errored,
            "batch resolution finished"
        );

        BatchRun {
            domains,
            concurrency_limit: self.config.concurrency_limit,
            results,
            started_at,
            finished_at: Utc::now(),
            stats,
        }
    }
}

/// Resolve one domain end to end; never returns an error.
async fn resolve_one<S, C, I, R>(
    session: &S,
    candidates: &C,
    resolver: &InteractiveResolver<I, R>,
    domain: &str,
    budget: Duration,
) -> ExtractionAttempt
where
    S: PageSession,
    C: CandidateUrls,
    I: Inference,
    R: Registry,
{
    let start_url = match candidates.candidate_url(domain).await {
        Ok(Some(url)) => url,
        Ok(None) => {
            debug!(domain, "no crawl candidate URL");
            let e = crate::error::ResolveError::NoCandidateUrl {
                domain: domain.to_string(),
            };
            return ExtractionAttempt::failed(domain, "", e.to_string());
        }
        Err(e) => return ExtractionAttempt::failed(domain, "", e.to_string()),
    };

    let page = match session.open_page().await {
        Ok(page) => page,
        Err(e) => return ExtractionAttempt::failed(domain, &start_url, e.to_string()),
    };

    let attempt = match tokio::time::timeout(
        budget,
        resolver.resolve(page.as_ref(), domain, &start_url),
    )
    .await
    {
        Ok(Ok(attempt)) => attempt,
        Ok(Err(e)) => ExtractionAttempt::failed(domain, &start_url, e.to_string()),
        Err(_) => ExtractionAttempt::failed(
            domain,
            &start_url,
            format!("resolution timed out after {} s", budget.as_secs()),
        ),
    };

    if let Err(e) = page.close().await {
        debug!(domain, error = %e, "page close failed");
    }

    attempt
}
