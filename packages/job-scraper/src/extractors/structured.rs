//! JSON-LD `JobPosting` extraction.
//!
//! Portals embed schema.org data in several shapes: a single object, an array
//! of objects, or an `@graph` wrapper. Each script tag is parsed on its own
//! and each posting is validated field by field, so one malformed block never
//! hides the others.

use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::html::selector;
use crate::error::ExtractResult;
use crate::normalize::clean_text;

/// One parsed JSON-LD node.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredBlock {
    Posting(JobPosting),
    List(Vec<StructuredBlock>),
    Graph(Vec<StructuredBlock>),
    /// Another schema.org type, or a posting that failed validation
    Other,
}

impl StructuredBlock {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                StructuredBlock::List(items.into_iter().map(Self::from_value).collect())
            }
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.remove("@graph") {
                    return StructuredBlock::Graph(
                        items.into_iter().map(Self::from_value).collect(),
                    );
                }
                let value = Value::Object(map);
                if !is_job_posting(&value) {
                    return StructuredBlock::Other;
                }
                match serde_json::from_value::<JobPosting>(value) {
                    Ok(posting) => StructuredBlock::Posting(posting),
                    Err(e) => {
                        debug!(error = %e, "Skipping malformed JobPosting block");
                        StructuredBlock::Other
                    }
                }
            }
            _ => StructuredBlock::Other,
        }
    }

    /// Flatten into postings, in document order.
    pub fn into_postings(self) -> Vec<JobPosting> {
        match self {
            StructuredBlock::Posting(posting) => vec![posting],
            StructuredBlock::List(blocks) | StructuredBlock::Graph(blocks) => {
                blocks.into_iter().flat_map(Self::into_postings).collect()
            }
            StructuredBlock::Other => Vec::new(),
        }
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "JobPosting",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("JobPosting")),
        _ => false,
    }
}

/// The `JobPosting` fields the aggregator reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hiring_organization: Option<Organization>,
    #[serde(default)]
    pub job_location: Option<OneOrMany<Place>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date_posted: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Organization {
    Named {
        #[serde(default)]
        name: Option<String>,
    },
    Plain(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn first(&self) -> Option<&T> {
        match self {
            OneOrMany::One(item) => Some(item),
            OneOrMany::Many(items) => items.first(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Postal {
        #[serde(rename = "addressLocality", default)]
        locality: Option<String>,
        #[serde(rename = "addressRegion", default)]
        region: Option<String>,
    },
    Plain(String),
}

impl JobPosting {
    pub fn title(&self) -> String {
        clean_text(self.title.as_deref().unwrap_or_default())
    }

    pub fn company(&self) -> Option<String> {
        let name = match self.hiring_organization.as_ref()? {
            Organization::Named { name } => name.as_deref()?,
            Organization::Plain(name) => name.as_str(),
        };
        Some(clean_text(name)).filter(|n| !n.is_empty())
    }

    /// Locality, else region, of the first location.
    pub fn location(&self) -> Option<String> {
        let address = self.job_location.as_ref()?.first()?.address.as_ref()?;
        let text = match address {
            Address::Postal { locality, region } => {
                let locality = locality.as_deref().map(clean_text).filter(|l| !l.is_empty());
                locality.or_else(|| region.as_deref().map(clean_text))?
            }
            Address::Plain(text) => clean_text(text),
        };
        Some(text).filter(|t| !t.is_empty())
    }

    pub fn date_posted(&self) -> String {
        clean_text(self.date_posted.as_deref().unwrap_or_default())
    }
}

/// Every valid `JobPosting` in the document's JSON-LD script tags.
pub fn json_ld_postings(document: &Html) -> ExtractResult<Vec<JobPosting>> {
    let scripts = selector(r#"script[type="application/ld+json"]"#)?;

    let postings = document
        .select(&scripts)
        .filter_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => Some(StructuredBlock::from_value(value)),
                Err(e) => {
                    debug!(error = %e, "Skipping unparseable JSON-LD script");
                    None
                }
            }
        })
        .flat_map(StructuredBlock::into_postings)
        .collect();

    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{html_document, json_ld_script};
    use serde_json::json;

    fn postings(body: &str) -> Vec<JobPosting> {
        json_ld_postings(&Html::parse_document(&html_document(body))).unwrap()
    }

    #[test]
    fn test_single_list_and_graph_shapes() {
        let single = json_ld_script(&json!({"@type": "JobPosting", "title": "A"}));
        let list = json_ld_script(&json!([
            {"@type": "JobPosting", "title": "B"},
            {"@type": "Organization", "name": "x"}
        ]));
        let graph = json_ld_script(&json!({"@context": "https://schema.org", "@graph": [
            {"@type": ["JobPosting"], "title": "C"}
        ]}));

        let titles: Vec<_> = postings(&format!("{}{}{}", single, list, graph))
            .iter()
            .map(JobPosting::title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_malformed_blocks_are_skipped_individually() {
        let broken = r#"<script type="application/ld+json">{"@type": "JobPosting", </script>"#;
        let wrong_types = json_ld_script(&json!({"@type": "JobPosting", "title": 42}));
        let good = json_ld_script(&json!({"@type": "JobPosting", "title": "Planner"}));

        let found = postings(&format!("{}{}{}", broken, wrong_types, good));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title(), "Planner");
    }

    #[test]
    fn test_field_accessors() {
        let posting: JobPosting = serde_json::from_value(json!({
            "@type": "JobPosting",
            "title": "  Demand   Planner ",
            "hiringOrganization": {"@type": "Organization", "name": "ACME"},
            "jobLocation": [{"address": {"addressRegion": "RM"}}],
            "datePosted": "2026-10-14"
        }))
        .unwrap();

        assert_eq!(posting.title(), "Demand Planner");
        assert_eq!(posting.company().as_deref(), Some("ACME"));
        assert_eq!(posting.location().as_deref(), Some("RM"));
        assert_eq!(posting.date_posted(), "2026-10-14");

        let sparse: JobPosting = serde_json::from_value(json!({
            "hiringOrganization": "Plain Co",
            "jobLocation": {"address": {"addressLocality": "Valparaíso"}}
        }))
        .unwrap();
        assert_eq!(sparse.company().as_deref(), Some("Plain Co"));
        assert_eq!(sparse.location().as_deref(), Some("Valparaíso"));
        assert_eq!(sparse.title(), "");
    }
}
