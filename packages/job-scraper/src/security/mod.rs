//! Safety checks for links the scraper did not choose itself.
//!
//! Search-engine results point anywhere; before a detail page is visited its
//! URL goes through [`LinkGuard`].

mod link_guard;

pub use link_guard::LinkGuard;
