//! EmpleosPúblicos (public sector) extractor.

use async_trait::async_trait;
use scraper::Html;
use std::sync::Arc;

use super::html::{element_text, selector};
use super::{fetch_listing, matches_category};
use crate::error::ExtractResult;
use crate::fetchers::PoliteFetcher;
use crate::normalize::resolve;
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::{JobRecord, Source};
use crate::types::page::FetchRequest;

const LISTING_URL: &str = "https://www.empleospublicos.cl/pub/convocatorias/convocatorias.aspx";

/// Shorter anchor texts are navigation, not titles.
const MIN_TITLE_CHARS: usize = 4;

pub struct EmpleosPublicosExtractor {
    fetcher: Arc<PoliteFetcher>,
    listing_url: String,
    max_items: usize,
}

impl EmpleosPublicosExtractor {
    pub fn new(fetcher: Arc<PoliteFetcher>, config: &ScrapeConfig) -> Self {
        Self {
            fetcher,
            listing_url: LISTING_URL.to_string(),
            max_items: config.public_sector_max_items,
        }
    }

    /// Point at a different listing page.
    pub fn with_listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = url.into();
        self
    }
}

#[async_trait]
impl SourceExtractor for EmpleosPublicosExtractor {
    fn name(&self) -> &str {
        "empleospublicos"
    }

    /// A single listing page; a failed fetch fails this source for the category.
    async fn extract(&self, category: &str) -> ExtractResult<Vec<JobRecord>> {
        let page = fetch_listing(&self.fetcher, FetchRequest::new(&self.listing_url)).await?;
        parse_empleos_publicos(&page.body, category, &self.listing_url, self.max_items)
    }
}

/// Parse the public-sector call listing, keeping at most `max_items` records.
pub fn parse_empleos_publicos(
    html: &str,
    category: &str,
    listing_url: &str,
    max_items: usize,
) -> ExtractResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);
    let anchors = selector(r#"a[href*="convocatoria"]"#)?;

    let jobs = document
        .select(&anchors)
        .filter_map(|anchor| {
            let title = element_text(anchor);
            if title.chars().count() < MIN_TITLE_CHARS || !matches_category(&title, category) {
                return None;
            }
            let link = resolve(listing_url, anchor.value().attr("href")?);
            Some(
                JobRecord::new(
                    category,
                    Source::EmpleosPublicos,
                    &title,
                    "Servicio Civil / Institución",
                    "Chile",
                    &link,
                )
                .with_posted_label("(ver plazos en link)"),
            )
        })
        .take(max_items)
        .collect();

    Ok(jobs)
}
