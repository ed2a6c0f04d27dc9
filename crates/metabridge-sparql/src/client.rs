//! [`OntologySource`] over a SPARQL 1.1 query endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::{debug, warn};

use metabridge_core::config::{SourceSettings, SparqlSettings};
use metabridge_core::names::{clean_label, shorten_uri};
use metabridge_core::{ChildRef, Error, NodeAttributes, NodeType, OntologySource, Result};

use crate::queries;
use crate::results::{SparqlResults, Term};
use crate::vocab;

/// Media type of SPARQL JSON results.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// SPARQL endpoint client.
#[derive(Clone)]
pub struct SparqlSource {
    client: Client,
    endpoint: String,
    prefixes: IndexMap<String, String>,
}

impl SparqlSource {
    /// Create a client for `endpoint`.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        prefixes: IndexMap<String, String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            prefixes,
        })
    }

    /// Create a client from the configured source and client settings.
    pub fn from_settings(
        source: &SourceSettings,
        sparql: &SparqlSettings,
        prefixes: &IndexMap<String, String>,
    ) -> Result<Self> {
        Self::new(
            source.endpoint.clone(),
            Duration::from_secs(sparql.timeout_secs),
            prefixes.clone(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn select(&self, op: &'static str, query: String) -> Result<SparqlResults> {
        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Fetch(format!(
                "{} query failed with HTTP {}: {}",
                op, status, body
            )));
        }

        let body = response.text().await?;
        let results: SparqlResults = serde_json::from_str(&body)
            .map_err(|e| Error::Fetch(format!("{} returned malformed results: {}", op, e)))?;

        debug!(
            subsystem = "sparql",
            component = "client",
            op,
            row_count = results.results.bindings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Query answered"
        );
        Ok(results)
    }
}

/// Collapse `?element ?type` rows into one reference per element.
///
/// Element order is the order of first appearance. When an element has
/// several types the first recognised one wins.
fn child_refs(results: &SparqlResults) -> Vec<ChildRef> {
    let mut refs: IndexMap<String, Option<String>> = IndexMap::new();
    for row in &results.results.bindings {
        let Some(element) = row.get("element") else {
            continue;
        };
        let declared = row.get("type").map(|t| t.value.clone());
        let slot = refs.entry(element.value.clone()).or_insert(None);
        let replace = match (slot.as_deref(), declared.as_deref()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(current), Some(new)) => !is_known_type(current) && is_known_type(new),
        };
        if replace {
            *slot = declared;
        }
    }
    refs.into_iter()
        .map(|(uri, node_type)| ChildRef { uri, node_type })
        .collect()
}

fn is_known_type(raw: &str) -> bool {
    raw.parse::<NodeType>().is_ok()
}

/// Fold `?p ?o` rows into node attributes.
fn node_attributes(
    uri: &str,
    results: &SparqlResults,
    prefixes: &IndexMap<String, String>,
) -> NodeAttributes {
    let mut attrs = NodeAttributes {
        name: shorten_uri(uri, prefixes),
        ..Default::default()
    };

    for row in &results.results.bindings {
        let (Some(p), Some(o)) = (row.get("p"), row.get("o")) else {
            continue;
        };
        let value = || clean_label(&o.value);
        match p.value.as_str() {
            vocab::PREF_LABEL => attrs.pref_labels.insert(value(), o.lang()),
            vocab::DISPLAY_LABEL => attrs.display_labels.insert(value(), o.lang()),
            vocab::ALT_LABEL => attrs.alt_labels.insert(value(), o.lang()),
            vocab::DESCRIPTION => attrs.descriptions.insert(value(), o.lang()),
            vocab::NOTATION => attrs.notations.insert(value(), o.lang()),
            vocab::UNIT => attrs.units.insert(value(), o.lang()),
            vocab::DISPLAY => set_once(&mut attrs.display, o),
            vocab::DATATYPE => set_once(&mut attrs.datatype, o),
            _ => {}
        }
    }
    attrs
}

fn set_once(slot: &mut Option<String>, term: &Term) {
    if slot.is_none() {
        *slot = Some(clean_label(&term.value));
    }
}

#[async_trait]
impl OntologySource for SparqlSource {
    async fn top_elements(&self) -> Result<Vec<ChildRef>> {
        let results = self.select("top_elements", queries::top_elements()).await?;
        Ok(child_refs(&results))
    }

    async fn children(&self, uri: &str) -> Result<Vec<ChildRef>> {
        let results = self.select("children", queries::children(uri)?).await?;
        Ok(child_refs(&results))
    }

    async fn attributes(&self, uri: &str) -> Result<NodeAttributes> {
        let results = self.select("attributes", queries::attributes(uri)?).await?;
        if results.results.bindings.is_empty() {
            warn!(
                subsystem = "sparql",
                component = "client",
                node_uri = uri,
                "Node has no triples"
            );
        }
        Ok(node_attributes(uri, &results, &self.prefixes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(json: serde_json::Value) -> SparqlResults {
        serde_json::from_value(json).unwrap()
    }

    fn uri(value: &str) -> serde_json::Value {
        serde_json::json!({"type": "uri", "value": value})
    }

    #[test]
    fn test_child_refs_keep_order_and_prefer_known_type() {
        let r = results(serde_json::json!({"results": {"bindings": [
            {"element": uri("urn:b"), "type": uri("http://www.w3.org/2002/07/owl#Thing")},
            {"element": uri("urn:a"), "type": uri("http://www.w3.org/2004/02/skos/core#Concept")},
            {"element": uri("urn:b"), "type": uri("http://www.w3.org/2004/02/skos/core#Collection")},
            {"element": uri("urn:c")}
        ]}}));
        let refs = child_refs(&r);
        let uris: Vec<_> = refs.iter().map(|c| c.uri.as_str()).collect();
        assert_eq!(uris, ["urn:b", "urn:a", "urn:c"]);
        assert_eq!(
            refs[0].node_type.as_deref(),
            Some("http://www.w3.org/2004/02/skos/core#Collection")
        );
        assert_eq!(refs[2].node_type, None);
    }

    #[test]
    fn test_node_attributes_fold() {
        let r = results(serde_json::json!({"results": {"bindings": [
            {"p": uri(vocab::PREF_LABEL), "o": {"type": "literal", "value": "Body  weight\n", "xml:lang": "en"}},
            {"p": uri(vocab::PREF_LABEL), "o": {"type": "literal", "value": "Körpergewicht", "xml:lang": "de"}},
            {"p": uri(vocab::NOTATION), "o": {"type": "literal", "value": "29463-7"}},
            {"p": uri(vocab::DATATYPE), "o": {"type": "literal", "value": "float"}},
            {"p": uri(vocab::UNIT), "o": {"type": "literal", "value": "kg"}},
            {"p": uri(vocab::DISPLAY), "o": {"type": "literal", "value": "i2b2hidden"}},
            {"p": uri(vocab::RDF_TYPE), "o": uri("http://www.w3.org/2004/02/skos/core#Concept")}
        ]}}));
        let mut prefixes = IndexMap::new();
        prefixes.insert(vocab::DWH.to_string(), "dwh:".to_string());

        let attrs = node_attributes("http://data.dzl.de/ont/dwh#Weight", &r, &prefixes);
        assert_eq!(attrs.name, "dwh:Weight");
        assert_eq!(attrs.pref_labels.effective(), "Body weight");
        assert_eq!(attrs.pref_labels.len(), 2);
        assert_eq!(attrs.notations.get_index(0), Some(("29463-7", "")));
        assert_eq!(attrs.datatype.as_deref(), Some("float"));
        assert_eq!(attrs.units.len(), 1);
        assert_eq!(attrs.display.as_deref(), Some("i2b2hidden"));
    }
}
