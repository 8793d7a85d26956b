//! Source extractors, one per portal plus the search-engine fallback.
//!
//! Every extractor fetches through the shared [`PoliteFetcher`] and hands the
//! body to a pure `parse_*` function, so parsing is testable against HTML
//! fixtures without a network. Selectors track live markup and are expected
//! to drift.

pub mod chiletrabajos;
pub mod empleos_publicos;
pub mod enrich;
pub mod getonbrd;
pub mod html;
pub mod indeed;
pub mod laborum;
pub mod search;
pub mod structured;

pub use chiletrabajos::{parse_chiletrabajos, ChiletrabajosExtractor};
pub use empleos_publicos::{parse_empleos_publicos, EmpleosPublicosExtractor};
pub use enrich::{parse_detail, DetailEnricher, DetailInfo};
pub use getonbrd::{parse_getonbrd, GetOnBrdExtractor};
pub use indeed::{parse_indeed, IndeedExtractor};
pub use laborum::{parse_laborum, LaborumExtractor};
pub use search::{is_block_page, parse_search_results, SearchExtractor, SearchHit};
pub use structured::{json_ld_postings, JobPosting, StructuredBlock};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ExtractError, ExtractResult};
use crate::fetchers::{random_browser_agent, PoliteFetcher};
use crate::traits::extractor::SourceExtractor;
use crate::types::config::ScrapeConfig;
use crate::types::job::JobRecord;
use crate::types::page::{FetchRequest, FetchedPage};

/// Case-insensitive substring relevance check.
pub fn matches_category(text: &str, category: &str) -> bool {
    text.to_lowercase().contains(&category.to_lowercase())
}

/// Listing URL for a 1-based page number; page 1 carries no `page` parameter.
pub(crate) fn page_request(base_url: &str, page: u32) -> FetchRequest {
    let request = FetchRequest::new(base_url);
    if page <= 1 {
        request
    } else {
        request.with_query("page", page.to_string())
    }
}

/// Fetch a page with a rotating browser user agent; anything but 200 is an error.
pub(crate) async fn fetch_listing(
    fetcher: &PoliteFetcher,
    request: FetchRequest,
) -> ExtractResult<FetchedPage> {
    let page = fetcher
        .fetch(request.with_header("User-Agent", random_browser_agent()))
        .await?;

    if !page.is_success() {
        return Err(ExtractError::Status {
            url: page.url,
            status: page.status,
        });
    }
    Ok(page)
}

/// Fetch listing pages in order and parse each; pages that fail are skipped.
pub(crate) async fn collect_pages<F>(
    source: &str,
    fetcher: &PoliteFetcher,
    requests: Vec<FetchRequest>,
    parse: F,
) -> Vec<JobRecord>
where
    F: Fn(&str) -> ExtractResult<Vec<JobRecord>>,
{
    let mut jobs = Vec::new();

    for request in requests {
        let url = request.url.clone();
        let page = match fetch_listing(fetcher, request).await {
            Ok(page) => page,
            Err(e) => {
                warn!(source, url = %url, error = %e, "Skipping listing page");
                continue;
            }
        };

        match parse(&page.body) {
            Ok(found) => {
                debug!(source, url = %page.url, found = found.len(), "Parsed listing page");
                jobs.extend(found);
            }
            Err(e) => warn!(source, url = %page.url, error = %e, "Failed to parse listing page"),
        }
    }

    jobs
}

/// The standard extractor set: direct portals first, search fallback last.
pub fn default_extractors(
    fetcher: Arc<PoliteFetcher>,
    config: &ScrapeConfig,
) -> Vec<Arc<dyn SourceExtractor>> {
    let mut search = SearchExtractor::new(fetcher.clone(), config);
    if config.enrich_details {
        search = search.with_enricher(DetailEnricher::new(fetcher.clone(), config.detail_max_retries));
    }

    vec![
        Arc::new(LaborumExtractor::new(fetcher.clone(), config)),
        Arc::new(ChiletrabajosExtractor::new(fetcher.clone(), config)),
        Arc::new(GetOnBrdExtractor::new(fetcher.clone(), config)),
        Arc::new(IndeedExtractor::new(fetcher.clone(), config)),
        Arc::new(EmpleosPublicosExtractor::new(fetcher, config)),
        Arc::new(search),
    ]
}
