//! Aggregation run: every category through every extractor, then dedupe.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::dedupe::dedupe;
use crate::error::{AggregateError, AggregateResult};
use crate::extractors::default_extractors;
use crate::fetchers::PoliteFetcher;
use crate::traits::aggregate::AggregateSource;
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::JobRecord;

/// Per-extractor tallies for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Records produced before deduplication
    pub records: usize,

    /// Categories for which the extractor failed outright
    pub failures: usize,
}

/// One contained extractor failure.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: String,
    pub category: String,
    pub error: String,
}

/// Summary of an aggregation run.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub sources: BTreeMap<String, SourceStats>,
    pub failures: Vec<SourceFailure>,

    /// Records before deduplication
    pub collected: usize,

    /// Records in the final list
    pub unique: usize,

    /// (extractor, category) runs that succeeded
    pub succeeded: usize,
}

impl AggregateReport {
    /// Whether any extractor failed during the run.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs the configured extractors over the configured categories.
///
/// Extractors run sequentially in registration order for each category in
/// order, so output order (and ids) follow category, then source, then page.
pub struct Aggregator {
    extractors: Vec<Arc<dyn SourceExtractor>>,
    categories: Vec<String>,
}

impl Aggregator {
    pub fn new(extractors: Vec<Arc<dyn SourceExtractor>>, categories: Vec<String>) -> Self {
        Self {
            extractors,
            categories,
        }
    }

    /// The standard portal set plus search fallback over a shared fetcher.
    pub fn from_config(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self::new(default_extractors(fetcher, config), config.categories.clone())
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Scrape everything, dedupe, and number the result 1..=n.
    ///
    /// A failing extractor contributes no records for that category. The run
    /// only fails when there is nothing to do or when every single extractor
    /// call returned an error. Paged portals skip unreachable pages instead of
    /// failing, so a network outage can still end in an empty success.
    pub async fn run(&self) -> AggregateResult<(Vec<JobRecord>, AggregateReport)> {
        if self.extractors.is_empty() || self.categories.is_empty() {
            return Err(AggregateError::NoSources);
        }

        let mut report = AggregateReport::default();
        let mut collected = Vec::new();

        for category in &self.categories {
            for extractor in &self.extractors {
                let stats = report
                    .sources
                    .entry(extractor.name().to_string())
                    .or_default();

                match extractor.extract(category).await {
                    Ok(jobs) => {
                        debug!(source = extractor.name(), category = %category, found = jobs.len(), "Source done");
                        stats.records += jobs.len();
                        report.succeeded += 1;
                        collected.extend(jobs);
                    }
                    Err(e) => {
                        warn!(source = extractor.name(), category = %category, error = %e, "Source failed, continuing");
                        stats.failures += 1;
                        report.failures.push(SourceFailure {
                            source: extractor.name().to_string(),
                            category: category.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        if report.succeeded == 0 {
            let last = report
                .failures
                .last()
                .map(|f| format!("{} ({}): {}", f.source, f.category, f.error))
                .unwrap_or_default();
            return Err(AggregateError::Failed(format!(
                "all {} source runs failed; last: {}",
                report.failures.len(),
                last
            )));
        }

        report.collected = collected.len();
        let mut jobs = dedupe(collected);
        for (index, job) in jobs.iter_mut().enumerate() {
            job.id = Some(index as u32 + 1);
        }
        report.unique = jobs.len();

        info!(
            collected = report.collected,
            unique = report.unique,
            failures = report.failures.len(),
            "Aggregation complete"
        );
        for (source, stats) in &report.sources {
            info!(source = %source, records = stats.records, failures = stats.failures, "Source summary");
        }

        Ok((jobs, report))
    }
}

#[async_trait]
impl AggregateSource for Aggregator {
    async fn aggregate(&self) -> AggregateResult<Vec<JobRecord>> {
        self.run().await.map(|(jobs, _)| jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, ExtractResult};
    use crate::types::job::Source;

    /// Produces one record per category with a link under `host`, or fails.
    struct StubExtractor {
        name: &'static str,
        host: &'static str,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SourceExtractor for StubExtractor {
        fn name(&self) -> &str {
            self.name
        }

        async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
            if self.fail_on == Some(category) || self.fail_on == Some("*") {
                return Err(ExtractError::Status {
                    url: format!("https://{}/", self.host),
                    status: 503,
                });
            }
            let link = format!("https://{}/{}", self.host, category.to_lowercase());
            Ok(vec![JobRecord::new(category, Source::Other, category, "ACME", "Chile", &link)])
        }
    }

    fn stub(name: &'static str, host: &'static str, fail_on: Option<&'static str>) -> Arc<dyn SourceExtractor> {
        Arc::new(StubExtractor { name, host, fail_on })
    }

    fn categories() -> Vec<String> {
        vec!["Planner".to_string(), "CPFR".to_string()]
    }

    #[tokio::test]
    async fn test_order_dedupe_and_ids() {
        let aggregator = Aggregator::new(
            vec![
                stub("a", "a.cl", None),
                stub("b", "b.cl", None),
                // duplicates every link of "a"
                stub("mirror", "a.cl", None),
            ],
            categories(),
        );

        let (jobs, report) = aggregator.run().await.unwrap();

        let links: Vec<_> = jobs.iter().map(|j| j.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://a.cl/planner", "https://b.cl/planner", "https://a.cl/cpfr", "https://b.cl/cpfr"]
        );
        let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(report.collected, 6);
        assert_eq!(report.unique, 4);
        assert_eq!(report.sources["mirror"].records, 2);
    }

    #[tokio::test]
    async fn test_failing_source_is_contained() {
        let aggregator = Aggregator::new(
            vec![stub("flaky", "f.cl", Some("Planner")), stub("ok", "o.cl", None)],
            categories(),
        );

        let (jobs, report) = aggregator.run().await.unwrap();

        assert_eq!(jobs.len(), 3);
        assert!(report.has_failures());
        assert_eq!(report.failures[0].source, "flaky");
        assert_eq!(report.failures[0].category, "Planner");
        assert_eq!(report.sources["flaky"], SourceStats { records: 1, failures: 1 });
    }

    #[test]
    fn test_from_config_uses_configured_categories() {
        let fetcher = Arc::new(PoliteFetcher::new(
            Arc::new(crate::testing::MockTransport::new()),
            crate::types::config::FetcherConfig::default(),
        ));
        let config = ScrapeConfig::default().with_categories(["CPFR", "Planner"]);

        let aggregator = Aggregator::from_config(fetcher, &config);

        assert_eq!(aggregator.categories(), ["CPFR".to_string(), "Planner".to_string()]);
        assert_eq!(aggregator.extractors.len(), 6);
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let aggregator = Aggregator::new(vec![stub("down", "d.cl", Some("*"))], categories());
        let result = aggregator.run().await;
        assert!(matches!(result, Err(AggregateError::Failed(msg)) if msg.contains("all 2 source runs failed")));
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let no_extractors = Aggregator::new(Vec::new(), categories());
        assert!(matches!(no_extractors.aggregate().await, Err(AggregateError::NoSources)));

        let no_categories = Aggregator::new(vec![stub("a", "a.cl", None)], Vec::new());
        assert!(matches!(no_categories.aggregate().await, Err(AggregateError::NoSources)));
    }
}
