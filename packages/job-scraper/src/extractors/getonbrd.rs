//! GetOnBrd listing extractor.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

use super::html::{element_text, selector, text_segments};
use super::{collect_pages, matches_category, page_request};
use crate::error::ExtractResult;
use crate::fetchers::PoliteFetcher;
use crate::normalize::resolve;
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::{JobRecord, Source};

const BASE_URL: &str = "https://www.getonbrd.com";

pub struct GetOnBrdExtractor {
    fetcher: Arc<PoliteFetcher>,
    base_url: String,
    pages: u32,
}

impl GetOnBrdExtractor {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
            pages: config.getonbrd_pages,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceExtractor for GetOnBrdExtractor {
    fn name(&self) -> &str {
        "getonbrd"
    }

    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
        let listing = format!("{}/jobs", self.base_url.trim_end_matches('/'));
        let requests = (1..=self.pages).map(|p| page_request(&listing, p)).collect();

        Ok(collect_pages(self.name(), &self.fetcher, requests, |body| {
            parse_getonbrd(body, category, &self.base_url)
        })
        .await)
    }
}

/// Parse a GetOnBrd listing page.
///
/// Cards are anchors into `/jobs/`; the first text node is the title. Company
/// and date are not in the listing markup.
pub fn parse_getonbrd(html: &str, category: &str, base_url: &str) -> ExtractResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);
    let cards = selector(r#"a[href^="/jobs/"]"#)?;

    let jobs = document
        .select(&cards)
        .filter_map(|card| {
            let text = element_text(card);
            if text.is_empty() || !matches_category(&text, category) {
                return None;
            }
            let role = text_segments(card).into_iter().next().unwrap_or(text);
            let link = resolve(base_url, card.value().attr("href")?);

            Some(JobRecord::new(
                category,
                Source::GetOnBrd,
                &role,
                "(ver en link)",
                "Chile/Remoto",
                &link,
            ))
        })
        .collect();

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::html_document;

    #[test]
    fn test_parse_cards() {
        let html = html_document(
            r#"
            <a href="/jobs/data/bi-analyst-acme"><strong>Business Intelligence Analyst</strong>
                <span>ACME · Remote</span></a>
            <a href="/jobs/programming/backend-dev">Backend Developer</a>
            <a href="https://www.getonbrd.com/jobs/bi">Business Intelligence Lead</a>
            "#,
        );

        let jobs = parse_getonbrd(&html, "business intelligence", BASE_URL).unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].role, "Business Intelligence Analyst");
        assert_eq!(jobs[0].company, "(ver en link)");
        assert_eq!(jobs[0].location, "Chile/Remoto");
        assert_eq!(jobs[0].link, "https://www.getonbrd.com/jobs/data/bi-analyst-acme");
        assert_eq!(jobs[0].posted_raw, "");
        assert_eq!(jobs[0].posted_hours_ago, None);
    }
}
