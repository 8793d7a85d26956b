//! Detail-page enrichment for search-engine results.
//!
//! Search snippets rarely carry a clean title, company or date. The enricher
//! visits the posting itself (through the polite fetcher, with a smaller retry
//! budget) and reads what generic markup exposes.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, warn};

use super::html::{element_text, selector};
use crate::error::ExtractResult;
use crate::fetchers::{random_browser_agent, PoliteFetcher};
use crate::normalize::clean_text;
use crate::security::LinkGuard;
use crate::types::page::FetchRequest;

lazy_static! {
    static ref POSTED: Regex = Regex::new(
        r"(publicado|actualizado)\s+hace\s+\d+\s+(minutos|minuto|horas|hora|días|día|dias|dia)"
    )
    .unwrap();
}

/// What a detail page revealed; empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub title: String,
    pub company: String,
    pub posted: String,
}

impl DetailInfo {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.company.is_empty() && self.posted.is_empty()
    }
}

pub struct DetailEnricher {
    fetcher: Arc<PoliteFetcher>,
    guard: LinkGuard,
    max_retries: u32,
}

impl DetailEnricher {
    pub fn new(fetcher: Arc<PoliteFetcher>, max_retries: u32) -> Self {
        Self {
            fetcher,
            guard: LinkGuard::new(),
            max_retries,
        }
    }

    pub fn with_guard(mut self, guard: LinkGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Fetch and parse a posting page.
    ///
    /// Blocked links, failed fetches and non-200 responses yield an empty
    /// [`DetailInfo`]; enrichment never fails the result it decorates.
    pub async fn enrich(&self, link: &str) -> DetailInfo {
        if let Err(e) = self.guard.check(link) {
            warn!(link, error = %e, "Refusing to fetch detail page");
            return DetailInfo::default();
        }

        let request = FetchRequest::new(link)
            .with_header("User-Agent", random_browser_agent())
            .with_max_retries(self.max_retries);

        let page = match self.fetcher.fetch(request).await {
            Ok(page) if page.is_success() => page,
            Ok(page) => {
                debug!(link, status = page.status, "Detail page unavailable");
                return DetailInfo::default();
            }
            Err(e) => {
                debug!(link, error = %e, "Detail page fetch failed");
                return DetailInfo::default();
            }
        };

        match parse_detail(&page.body) {
            Ok(info) => info,
            Err(e) => {
                warn!(link, error = %e, "Failed to parse detail page");
                DetailInfo::default()
            }
        }
    }
}

/// Read title, site name and "publicado hace N …" text from a posting page.
pub fn parse_detail(html: &str) -> ExtractResult<DetailInfo> {
    let document = Html::parse_document(html);
    let heading = selector("h1, h2")?;
    let site_name = selector(r#"meta[property="og:site_name"]"#)?;

    let title = document
        .select(&heading)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let company = document
        .select(&site_name)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(clean_text)
        .unwrap_or_default();

    let text = clean_text(&document.root_element().text().collect::<Vec<_>>().join(" ")).to_lowercase();
    let posted = POSTED
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    Ok(DetailInfo {
        title,
        company,
        posted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClock, MockTransport};
    use crate::types::config::FetcherConfig;

    const DETAIL: &str = r#"<html><head>
        <meta property="og:site_name" content=" Computrabajo Chile ">
        </head><body>
        <nav><h2>Menú</h2></nav>
        <h1>Jefe de   Proyectos TI</h1>
        <p>Publicado hace 3 horas en Santiago</p>
        </body></html>"#;

    #[test]
    fn test_parse_detail() {
        let info = parse_detail(DETAIL).unwrap();
        // first heading in document order
        assert_eq!(info.title, "Menú");
        assert_eq!(info.company, "Computrabajo Chile");
        assert_eq!(info.posted, "publicado hace 3 horas");
    }

    #[test]
    fn test_parse_detail_missing_fields() {
        let info = parse_detail("<html><body><p>Sin datos</p></body></html>").unwrap();
        assert!(info.is_empty());
    }

    fn enricher(transport: Arc<MockTransport>) -> DetailEnricher {
        let fetcher = Arc::new(
            PoliteFetcher::new(transport, FetcherConfig::default())
                .with_clock(Arc::new(MockClock::new())),
        );
        DetailEnricher::new(fetcher, 2)
    }

    #[tokio::test]
    async fn test_enrich_uses_reduced_retry_budget() {
        let transport = Arc::new(MockTransport::new().with_page("https://cl.computrabajo.com/", 503, ""));
        let info = enricher(transport.clone())
            .enrich("https://cl.computrabajo.com/ofertas/1")
            .await;

        assert!(info.is_empty());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_enrich_refuses_internal_links() {
        let transport = Arc::new(MockTransport::new());
        let info = enricher(transport.clone()).enrich("http://169.254.169.254/latest").await;

        assert!(info.is_empty());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_enrich_reads_page() {
        let transport = Arc::new(MockTransport::new().with_page("https://www.trabajando.cl/", 200, DETAIL));
        let info = enricher(transport).enrich("https://www.trabajando.cl/oferta/9").await;
        assert_eq!(info.company, "Computrabajo Chile");
    }

    #[tokio::test]
    async fn test_custom_guard_blocks_host() {
        let transport = Arc::new(MockTransport::new().with_page("https://www.trabajando.cl/", 200, DETAIL));
        let info = enricher(transport.clone())
            .with_guard(LinkGuard::new().block_host("www.trabajando.cl"))
            .enrich("https://www.trabajando.cl/oferta/9")
            .await;

        assert!(info.is_empty());
        assert_eq!(transport.call_count(), 0);
    }
}
