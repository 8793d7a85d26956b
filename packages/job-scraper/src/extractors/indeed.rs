//! Indeed search extractor: JSON-LD first, anchor scan as fallback.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::Html;
use std::sync::Arc;

use super::html::{element_text, selector};
use super::structured::json_ld_postings;
use super::{collect_pages, matches_category};
use crate::error::ExtractResult;
use crate::fetchers::PoliteFetcher;
use crate::normalize::{parse_posted, resolve};
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::{JobRecord, Source};
use crate::types::page::FetchRequest;

const BASE_URL: &str = "https://cl.indeed.com";

/// Results per Indeed page (`start` offset step).
const PAGE_SIZE: u32 = 10;

pub struct IndeedExtractor {
    fetcher: Arc<PoliteFetcher>,
    base_url: String,
    max_days: u32,
    pages: u32,
}

impl IndeedExtractor {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
            max_days: config.max_days,
            pages: config.indeed_pages,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_request(&self, category: &str, page: u32) -> FetchRequest {
        FetchRequest::new(format!("{}/jobs", self.base_url.trim_end_matches('/')))
            .with_query("q", category)
            .with_query("l", "Chile")
            .with_query("fromage", self.max_days.to_string())
            .with_query("start", (page * PAGE_SIZE).to_string())
    }
}

#[async_trait]
impl SourceExtractor for IndeedExtractor {
    fn name(&self) -> &str {
        "indeed"
    }

    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
        let requests = (0..self.pages)
            .map(|page| self.search_request(category, page))
            .collect();

        Ok(collect_pages(self.name(), &self.fetcher, requests, |body| {
            parse_indeed(body, category, &self.base_url, self.max_days, Utc::now())
        })
        .await)
    }
}

/// Parse an Indeed results page.
///
/// Structured `JobPosting` data wins when it yields any record; otherwise
/// `viewjob` anchors are scanned and labeled with the search window.
pub fn parse_indeed(
    html: &str,
    category: &str,
    base_url: &str,
    max_days: u32,
    now: DateTime<Utc>,
) -> ExtractResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);

    let structured: Vec<JobRecord> = json_ld_postings(&document)?
        .into_iter()
        .filter_map(|posting| {
            let title = posting.title();
            if title.is_empty() || !matches_category(&title, category) {
                return None;
            }
            let link = resolve(base_url, posting.url.as_deref()?);
            if link.is_empty() {
                return None;
            }
            let company = posting.company().unwrap_or_else(|| "Empresa".to_string());
            let location = posting.location().unwrap_or_else(|| "Chile".to_string());
            let posted = posting.date_posted();

            Some(
                JobRecord::new(category, Source::Indeed, &title, &company, &location, &link)
                    .with_posted_label(&posted)
                    .with_hours_ago(parse_posted(&posted, now)),
            )
        })
        .collect();

    if !structured.is_empty() {
        return Ok(structured);
    }

    let anchors = selector(r#"a[href*="/viewjob?"]"#)?;
    let label = format!("≤ {} días (Indeed filter)", max_days);

    let jobs = document
        .select(&anchors)
        .filter_map(|anchor| {
            let title = element_text(anchor);
            if title.is_empty() || !matches_category(&title, category) {
                return None;
            }
            let link = resolve(base_url, anchor.value().attr("href")?);
            Some(
                JobRecord::new(category, Source::Indeed, &title, "(ver en link)", "Chile", &link)
                    .with_posted_label(&label),
            )
        })
        .collect();

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{html_document, json_ld_script, MockClock, MockTransport};
    use crate::types::config::FetcherConfig;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_prefers_json_ld() {
        let html = html_document(&format!(
            "{}<a href=\"/viewjob?jk=zzz\">Planner anchor</a>",
            json_ld_script(&json!([
                {
                    "@type": "JobPosting",
                    "title": "Supply Planner",
                    "hiringOrganization": {"name": "Andes Foods"},
                    "jobLocation": [{"address": {"addressLocality": "Santiago", "addressRegion": "RM"}}],
                    "url": "https://cl.indeed.com/viewjob?jk=abc&utm_source=x",
                    "datePosted": "2026-10-14T12:00:00Z"
                },
                {"@type": "JobPosting", "title": "Planner sin link"},
                {"@type": "JobPosting", "title": "Contador", "url": "https://cl.indeed.com/viewjob?jk=c"}
            ]))
        ));

        let jobs = parse_indeed(&html, "planner", BASE_URL, 5, now()).unwrap();

        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.role, "Supply Planner");
        assert_eq!(job.company, "Andes Foods");
        assert_eq!(job.location, "Santiago");
        assert_eq!(job.link, "https://cl.indeed.com/viewjob?jk=abc");
        assert_eq!(job.posted_raw, "2026-10-14T12:00:00Z");
        assert_eq!(job.posted_hours_ago, Some(48));
        assert_eq!(job.source, Source::Indeed);
    }

    #[test]
    fn test_anchor_fallback_without_structured_data() {
        let html = html_document(
            r#"<a href="/viewjob?jk=111&from=serp">Demand Planner</a>
               <a href="/cmp/acme">Planner company page</a>"#,
        );

        let jobs = parse_indeed(&html, "Planner", BASE_URL, 3, now()).unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].link, "https://cl.indeed.com/viewjob?jk=111&from=serp");
        assert_eq!(jobs[0].company, "(ver en link)");
        assert_eq!(jobs[0].posted_raw, "≤ 3 días (Indeed filter)");
        assert_eq!(jobs[0].posted_hours_ago, None);
    }

    #[tokio::test]
    async fn test_extract_sends_search_params() {
        let transport = Arc::new(MockTransport::new().with_page("https://cl.indeed.com/jobs", 200, ""));
        let fetcher = Arc::new(
            PoliteFetcher::new(transport.clone(), FetcherConfig::default())
                .with_clock(Arc::new(MockClock::new())),
        );

        let jobs = IndeedExtractor::new(fetcher, &ScrapeConfig::default())
            .extract("Product Manager")
            .await
            .unwrap();

        assert!(jobs.is_empty());
        assert_eq!(
            transport.calls(),
            vec!["https://cl.indeed.com/jobs?q=Product+Manager&l=Chile&fromage=5&start=0".to_string()]
        );
    }
}
