//! Search-engine fallback: portal-restricted results, optionally enriched.
//!
//! Search engines often answer scrapers with a consent page, a captcha or a
//! "sorry" interstitial while still returning 200. Those are detected before
//! parsing and yield zero records: a blocked search scraped nothing, it is
//! not an unreachable source.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::enrich::{DetailEnricher, DetailInfo};
use super::fetch_listing;
use super::html::{element_text, first_text, selector};
use crate::error::ExtractResult;
use crate::fetchers::PoliteFetcher;
use crate::normalize::{canonicalize, parse_relative_age, truncate_chars};
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::{JobRecord, Source};
use crate::types::page::FetchRequest;

const SEARCH_URL: &str = "https://www.google.com/search";

/// Portals the query is restricted to.
const SITES: &[&str] = &[
    "linkedin.com/jobs",
    "laborum.cl",
    "chiletrabajos.cl",
    "getonbrd.com",
    "computrabajo.cl",
    "trabajando.cl",
    "bne.cl",
    "empleospublicos.cl",
    "cl.indeed.com",
];

/// Markers of a non-results page, matched against the lowercased final URL
/// and the start of the lowercased body.
const BLOCK_SIGNALS: &[&str] = &[
    "consent.google.com",
    "/sorry/",
    "unusual traffic",
    "our systems have detected unusual traffic",
    "recaptcha",
    "before you continue to google",
];

/// How much of the body is inspected for block signals.
const BLOCK_SCAN_CHARS: usize = 2500;

const SNIPPET_POSTED_CHARS: usize = 90;
const SNIPPET_REQUIREMENT_CHARS: usize = 160;

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    /// Canonical, absolute http(s) link
    pub link: String,
    pub snippet: String,
}

pub struct SearchExtractor {
    fetcher: Arc<PoliteFetcher>,
    enricher: Option<DetailEnricher>,
    search_url: String,
    max_days: u32,
    results: u32,
}

impl SearchExtractor {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self {
            fetcher,
            enricher: None,
            search_url: SEARCH_URL.to_string(),
            max_days: config.max_days,
            results: config.search_results_per_category,
        }
    }

    /// Visit each result's page (except portals that hide postings) for
    /// better title, company and date.
    pub fn with_enricher(mut self, enricher: DetailEnricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    fn search_request(&self, category: &str) -> FetchRequest {
        FetchRequest::new(&self.search_url)
            .with_query("q", search_query(category))
            .with_query("num", self.results.to_string())
            .with_query("hl", "es")
            .with_query("gl", "cl")
            .with_query("filter", "0")
            .with_query("tbs", format!("qdr:d{}", self.max_days))
    }
}

/// `"{category} empleo Chile (site:a OR site:b …)"`
pub fn search_query(category: &str) -> String {
    let sites = SITES
        .iter()
        .map(|site| format!("site:{}", site))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{} empleo Chile ({})", category, sites)
}

#[async_trait]
impl SourceExtractor for SearchExtractor {
    fn name(&self) -> &str {
        "google"
    }

    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
        let page = fetch_listing(&self.fetcher, self.search_request(category)).await?;

        if is_block_page(&page.body, &page.final_url) {
            warn!(category, url = %page.final_url, "Search engine served a block page");
            return Ok(Vec::new());
        }

        let hits: Vec<SearchHit> = parse_search_results(&page.body)?
            .into_iter()
            .take(self.results as usize)
            .collect();
        debug!(category, hits = hits.len(), "Parsed search results");

        let mut jobs = Vec::with_capacity(hits.len());
        for hit in hits {
            let source = Source::from_url(&hit.link);
            let detail = match &self.enricher {
                Some(enricher) if !source.obfuscates_anonymous_access() => {
                    enricher.enrich(&hit.link).await
                }
                _ => DetailInfo::default(),
            };
            jobs.push(hit_to_record(category, &hit, &detail));
        }

        info!(category, found = jobs.len(), "Search fallback complete");
        Ok(jobs)
    }
}

/// Whether a 200 response is really a consent, captcha or rate-limit page.
pub fn is_block_page(body: &str, final_url: &str) -> bool {
    if body.is_empty() {
        return true;
    }
    let url = final_url.to_lowercase();
    let head = truncate_chars(body, BLOCK_SCAN_CHARS).to_lowercase();
    BLOCK_SIGNALS
        .iter()
        .any(|signal| url.contains(signal) || head.contains(signal))
}

/// Organic results from a results page, skipping entries without an
/// http(s) link or a title element.
pub fn parse_search_results(html: &str) -> ExtractResult<Vec<SearchHit>> {
    let document = Html::parse_document(html);
    let modern = selector("div.tF2Cxc")?;
    let legacy = selector("div.g")?;
    let link = selector("a[href]")?;
    let heading = selector("h3")?;
    let snippets = [
        selector("div.VwiC3b")?,
        selector("span.aCOpRe")?,
        selector("div.IsZvec")?,
    ];

    let mut blocks: Vec<_> = document.select(&modern).collect();
    if blocks.is_empty() {
        blocks = document.select(&legacy).collect();
    }

    let hits = blocks
        .into_iter()
        .filter_map(|block| {
            let anchor = block.select(&link).next()?;
            let title = element_text(block.select(&heading).next()?);
            let link = canonicalize(anchor.value().attr("href")?);
            if !link.starts_with("http") {
                return None;
            }
            let snippet = snippets
                .iter()
                .map(|s| first_text(block, s))
                .find(|text| !text.is_empty())
                .unwrap_or_default();

            Some(SearchHit {
                title,
                link,
                snippet,
            })
        })
        .collect();

    Ok(hits)
}

/// Build a record from a result and whatever its detail page revealed.
pub fn hit_to_record(category: &str, hit: &SearchHit, detail: &DetailInfo) -> JobRecord {
    let role = [detail.title.as_str(), hit.title.as_str()]
        .into_iter()
        .find(|title| !title.is_empty())
        .unwrap_or(category);

    let company = if detail.company.is_empty() || detail.company.eq_ignore_ascii_case("google") {
        "Empresa"
    } else {
        detail.company.as_str()
    };

    let mut job = JobRecord::new(
        category,
        Source::from_url(&hit.link),
        role,
        company,
        "Chile",
        &hit.link,
    );

    job = if detail.posted.is_empty() {
        job.with_posted_label(&truncate_chars(&hit.snippet, SNIPPET_POSTED_CHARS))
    } else {
        job.with_posted_label(&detail.posted)
            .with_hours_ago(parse_relative_age(&detail.posted))
    };

    if !hit.snippet.is_empty() {
        job = job.with_requirement(format!(
            "{}...",
            truncate_chars(&hit.snippet, SNIPPET_REQUIREMENT_CHARS)
        ));
    }

    job
}
