//! Laborum listing extractor.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

use super::html::{element_text, selector, text_segments};
use super::{collect_pages, matches_category, page_request};
use crate::error::ExtractResult;
use crate::fetchers::PoliteFetcher;
use crate::normalize::{parse_relative_age, resolve};
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::{JobRecord, Source};

const BASE_URL: &str = "https://www.laborum.cl";

/// The recency listing only exists for windows up to a week.
const MAX_LISTING_DAYS: u32 = 7;

pub struct LaborumExtractor {
    fetcher: Arc<PoliteFetcher>,
    base_url: String,
    max_days: u32,
    pages: u32,
}

impl LaborumExtractor {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
            max_days: config.max_days,
            pages: config.laborum_pages,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn listing_url(&self) -> String {
        format!(
            "{}/empleos-publicacion-menor-a-{}-dias.html",
            self.base_url.trim_end_matches('/'),
            self.max_days.min(MAX_LISTING_DAYS)
        )
    }
}

#[async_trait]
impl SourceExtractor for LaborumExtractor {
    fn name(&self) -> &str {
        "laborum"
    }

    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
        let listing = self.listing_url();
        let requests = (1..=self.pages).map(|p| page_request(&listing, p)).collect();

        Ok(collect_pages(self.name(), &self.fetcher, requests, |body| {
            parse_laborum(body, category, &self.base_url, self.max_days)
        })
        .await)
    }
}

/// Parse a Laborum listing page.
///
/// Anchors text reads "role - company" (or separate text nodes). The listing
/// only guarantees the recency window, so `posted_at` carries that label and
/// hours come from whatever freshness text the anchor shows.
pub fn parse_laborum(
    html: &str,
    category: &str,
    base_url: &str,
    max_days: u32,
) -> ExtractResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);
    let anchors = selector(r#"a[href*="/empleos/"]"#)?;
    let label = format!("≤ {} días (listado)", max_days);

    let jobs = document
        .select(&anchors)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if href.contains("empleos-publicacion") {
                return None;
            }

            let text = element_text(anchor);
            if text.is_empty() || !matches_category(&text, category) {
                return None;
            }

            let parts: Vec<String> = text_segments(anchor)
                .iter()
                .flat_map(|segment| segment.split(" - "))
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect();
            let role = parts.first().map(String::as_str).unwrap_or(&text);
            let company = parts.get(1).map(String::as_str).unwrap_or("Confidencial");

            let link = resolve(base_url, href);
            Some(
                JobRecord::new(category, Source::Laborum, role, company, "Chile", &link)
                    .with_posted_label(&label)
                    .with_hours_ago(parse_relative_age(&text)),
            )
        })
        .collect();

    Ok(jobs)
}
