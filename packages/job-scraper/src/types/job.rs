//! The canonical job record every extractor produces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalize::{canonicalize, clean_text, parse_relative_age, truncate_chars};

/// Maximum characters kept in [`JobRecord::role`].
pub const ROLE_MAX_CHARS: usize = 140;

/// Maximum characters kept in [`JobRecord::company`].
pub const COMPANY_MAX_CHARS: usize = 120;

/// Maximum characters kept in [`JobRecord::location`].
pub const LOCATION_MAX_CHARS: usize = 80;

/// Origin portal of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "LABORUM")]
    Laborum,
    #[serde(rename = "CHILETRABAJOS")]
    Chiletrabajos,
    #[serde(rename = "GETONBRD")]
    GetOnBrd,
    #[serde(rename = "INDEED")]
    Indeed,
    #[serde(rename = "EMPLEOSPÚBLICOS")]
    EmpleosPublicos,
    #[serde(rename = "LINKEDIN")]
    LinkedIn,
    #[serde(rename = "COMPUTRABAJO")]
    Computrabajo,
    #[serde(rename = "TRABAJANDO")]
    Trabajando,
    #[serde(rename = "BNE")]
    Bne,
    #[serde(rename = "OTRO")]
    Other,
}

impl Source {
    /// The wire tag, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Laborum => "LABORUM",
            Source::Chiletrabajos => "CHILETRABAJOS",
            Source::GetOnBrd => "GETONBRD",
            Source::Indeed => "INDEED",
            Source::EmpleosPublicos => "EMPLEOSPÚBLICOS",
            Source::LinkedIn => "LINKEDIN",
            Source::Computrabajo => "COMPUTRABAJO",
            Source::Trabajando => "TRABAJANDO",
            Source::Bne => "BNE",
            Source::Other => "OTRO",
        }
    }

    /// Infer the portal from a posting link.
    pub fn from_url(url: &str) -> Self {
        let lowered = url.to_lowercase();
        if lowered.contains("linkedin.com") {
            Source::LinkedIn
        } else if lowered.contains("laborum.cl") {
            Source::Laborum
        } else if lowered.contains("chiletrabajos.cl") {
            Source::Chiletrabajos
        } else if lowered.contains("getonbrd.com") {
            Source::GetOnBrd
        } else if lowered.contains("computrabajo") {
            Source::Computrabajo
        } else if lowered.contains("trabajando.cl") {
            Source::Trabajando
        } else if lowered.contains("bne.cl") {
            Source::Bne
        } else if lowered.contains("empleospublicos.cl") {
            Source::EmpleosPublicos
        } else if lowered.contains("indeed.") {
            Source::Indeed
        } else {
            Source::Other
        }
    }

    /// Portals that hide posting details from anonymous visitors.
    ///
    /// Detail-page enrichment is skipped for these.
    pub fn obfuscates_anonymous_access(&self) -> bool {
        matches!(self, Source::LinkedIn)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized job posting.
///
/// Text fields are cleaned and truncated on construction, and the link is
/// canonicalized, so every extractor produces records with the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Search category that produced this record
    pub category: String,

    /// Job title
    pub role: String,

    pub company: String,

    pub location: String,

    pub source: Source,

    /// Original freshness text (may be empty)
    #[serde(rename = "posted_at", default)]
    pub posted_raw: String,

    /// Hours since posting, when it could be determined
    pub posted_hours_ago: Option<u32>,

    /// Canonical absolute URL, or empty
    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    /// 1-based position in one aggregation run's output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

impl JobRecord {
    /// Create a record, enforcing the field bounds and link canonicalization.
    pub fn new(
        category: impl Into<String>,
        source: Source,
        role: &str,
        company: &str,
        location: &str,
        link: &str,
    ) -> Self {
        Self {
            category: category.into(),
            role: bounded(role, ROLE_MAX_CHARS),
            company: bounded(company, COMPANY_MAX_CHARS),
            location: bounded(location, LOCATION_MAX_CHARS),
            source,
            posted_raw: String::new(),
            posted_hours_ago: None,
            link: canonicalize(link),
            requirements: Vec::new(),
            id: None,
        }
    }

    /// Set freshness text and derive `posted_hours_ago` from it.
    pub fn with_posted(mut self, raw: &str) -> Self {
        self.posted_raw = clean_text(raw);
        self.posted_hours_ago = parse_relative_age(&self.posted_raw);
        self
    }

    /// Set freshness text without touching `posted_hours_ago`.
    pub fn with_posted_label(mut self, label: &str) -> Self {
        self.posted_raw = clean_text(label);
        self
    }

    pub fn with_hours_ago(mut self, hours: Option<u32>) -> Self {
        self.posted_hours_ago = hours;
        self
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    /// Replace the title (detail-page enrichment).
    pub fn set_role(&mut self, role: &str) {
        self.role = bounded(role, ROLE_MAX_CHARS);
    }

    /// Replace the company (detail-page enrichment).
    pub fn set_company(&mut self, company: &str) {
        self.company = bounded(company, COMPANY_MAX_CHARS);
    }

    /// Identity used for deduplication.
    ///
    /// The canonical link when present, otherwise `source|role|company`.
    pub fn dedupe_key(&self) -> String {
        let link = canonicalize(&self.link);
        if link.is_empty() {
            format!("{}|{}|{}", self.source, self.role, self.company)
        } else {
            link
        }
    }
}

fn bounded(text: &str, max: usize) -> String {
    truncate_chars(&clean_text(text), max)
}
