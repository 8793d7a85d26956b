//! Chiletrabajos listing extractor.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

use super::html::{element_text, next_element_siblings, selector};
use super::{collect_pages, matches_category, page_request};
use crate::error::ExtractResult;
use crate::fetchers::PoliteFetcher;
use crate::normalize::resolve;
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::{JobRecord, Source};

const BASE_URL: &str = "https://www.chiletrabajos.cl";

/// Sibling elements after a title that may hold its details.
const DETAIL_SIBLINGS: usize = 3;

pub struct ChiletrabajosExtractor {
    fetcher: Arc<PoliteFetcher>,
    base_url: String,
    pages: u32,
}

impl ChiletrabajosExtractor {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self {
            fetcher,
            base_url: BASE_URL.to_string(),
            pages: config.chiletrabajos_pages,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceExtractor for ChiletrabajosExtractor {
    fn name(&self) -> &str {
        "chiletrabajos"
    }

    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
        let listing = format!("{}/encuentra-un-empleo", self.base_url.trim_end_matches('/'));
        let requests = (1..=self.pages).map(|p| page_request(&listing, p)).collect();

        Ok(collect_pages(self.name(), &self.fetcher, requests, |body| {
            parse_chiletrabajos(body, category, &self.base_url)
        })
        .await)
    }
}

/// Parse a Chiletrabajos listing page.
///
/// Each `h2` holding a link is a posting title. Of the next few sibling
/// elements, the first `h3` reads "company, location" and the second carries
/// the posted text.
pub fn parse_chiletrabajos(
    html: &str,
    category: &str,
    base_url: &str,
) -> ExtractResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);
    let headings = selector("h2")?;
    let links = selector("a[href]")?;

    let jobs = document
        .select(&headings)
        .filter_map(|h2| {
            let anchor = h2.select(&links).next()?;
            let title = element_text(anchor);
            if !matches_category(&title, category) {
                return None;
            }
            let link = resolve(base_url, anchor.value().attr("href")?);

            let details: Vec<String> = next_element_siblings(h2, DETAIL_SIBLINGS)
                .into_iter()
                .filter(|sibling| sibling.value().name() == "h3")
                .map(element_text)
                .collect();

            let (company, location) = match details.first() {
                Some(company_location) => match company_location.split_once(',') {
                    Some((company, location)) => (company.trim(), location.trim()),
                    None => (company_location.as_str(), ""),
                },
                None => ("", ""),
            };
            let company = if company.is_empty() { "Empresa" } else { company };
            let location = if location.is_empty() { "Chile" } else { location };
            let posted = details.get(1).map(String::as_str).unwrap_or_default();

            Some(
                JobRecord::new(category, Source::Chiletrabajos, &title, company, location, &link)
                    .with_posted(posted),
            )
        })
        .collect();

    Ok(jobs)
}
