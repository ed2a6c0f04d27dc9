//! SparqlSource against a fake endpoint.

use std::time::Duration;

use indexmap::IndexMap;
use metabridge_core::{
    project_tree, ChildRef, Error, NodeType, OntologySource, PathConfig, TargetTable, TreeBuilder,
};
use metabridge_sparql::{SparqlSource, SPARQL_RESULTS_JSON};
use serde_json::{json, Value};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const DWH: &str = "http://data.dzl.de/ont/dwh#";

/// Decoded `query` form field of a request.
fn query_of(request: &Request) -> String {
    let body = String::from_utf8_lossy(&request.body).to_string();
    reqwest::Url::parse(&format!("http://form/?{}", body))
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "query")
                .map(|(_, v)| v.to_string())
        })
        .unwrap_or_default()
}

fn query_contains(needles: &'static [&'static str]) -> impl Fn(&Request) -> bool + Send + Sync {
    move |request: &Request| {
        let query = query_of(request);
        needles.iter().all(|n| query.contains(n))
    }
}

fn sparql_json(bindings: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", SPARQL_RESULTS_JSON)
        .set_body_json(json!({"head": {"vars": []}, "results": {"bindings": bindings}}))
}

fn uri(value: &str) -> Value {
    json!({"type": "uri", "value": value})
}

fn literal(value: &str, lang: Option<&str>) -> Value {
    match lang {
        Some(lang) => json!({"type": "literal", "value": value, "xml:lang": lang}),
        None => json!({"type": "literal", "value": value}),
    }
}

fn attr(p: &str, o: Value) -> Value {
    json!({"p": uri(p), "o": o})
}

fn source(server: &MockServer) -> SparqlSource {
    let mut prefixes = IndexMap::new();
    prefixes.insert(DWH.to_string(), "dwh:".to_string());
    SparqlSource::new(server.uri(), Duration::from_secs(5), prefixes).unwrap()
}

#[tokio::test]
async fn test_children_sends_form_query_with_accept_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("accept", SPARQL_RESULTS_JSON))
        .and(query_contains(&[
            "skos:narrower",
            "<http://data.dzl.de/ont/dwh#Vitals>",
        ]))
        .respond_with(sparql_json(json!([
            {"element": uri("http://data.dzl.de/ont/dwh#Weight"),
             "type": uri("http://www.w3.org/2004/02/skos/core#Concept")},
            {"element": uri("http://data.dzl.de/ont/dwh#Height"),
             "type": uri("http://www.w3.org/2004/02/skos/core#Concept")}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let children = source(&server)
        .children("http://data.dzl.de/ont/dwh#Vitals")
        .await
        .unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].uri, "http://data.dzl.de/ont/dwh#Weight");
    assert_eq!(
        children[0].node_type.as_deref().map(|t| t.parse::<NodeType>().unwrap()),
        Some(NodeType::Concept)
    );
}

#[tokio::test]
async fn test_http_error_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = source(&server).top_elements().await.unwrap_err();
    assert!(matches!(err, Error::Fetch(ref m) if m.contains("503")), "{err}");
}

#[tokio::test]
async fn test_malformed_body_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = source(&server).attributes("urn:x").await.unwrap_err();
    assert!(matches!(err, Error::Fetch(_)));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sparql_json(json!([])).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = SparqlSource::new(server.uri(), Duration::from_millis(200), IndexMap::new())
        .unwrap();
    assert!(matches!(
        client.children("urn:x").await.unwrap_err(),
        Error::Fetch(_)
    ));
}

#[tokio::test]
async fn test_builds_and_projects_a_tree_from_the_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(query_contains(&["?p ?o", "<http://data.dzl.de/ont/dwh#Vitals>"]))
        .respond_with(sparql_json(json!([
            attr("http://www.w3.org/2004/02/skos/core#prefLabel", literal("Vital signs", Some("en"))),
            attr("http://www.w3.org/2004/02/skos/core#prefLabel", literal("Vitalparameter", Some("de")))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_contains(&["?p ?o", "<http://data.dzl.de/ont/dwh#Weight>"]))
        .respond_with(sparql_json(json!([
            attr("http://www.w3.org/2004/02/skos/core#prefLabel", literal("Body weight", Some("en"))),
            attr("http://www.w3.org/2004/02/skos/core#notation", literal("29463-7", None)),
            attr("http://data.dzl.de/ont/dwh#datatype", literal("float", None)),
            attr("http://data.dzl.de/ont/dwh#unit", literal("kg", None))
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_contains(&["skos:narrower", "<http://data.dzl.de/ont/dwh#Vitals>"]))
        .respond_with(sparql_json(json!([
            {"element": uri("http://data.dzl.de/ont/dwh#Weight"),
             "type": uri("http://www.w3.org/2004/02/skos/core#Concept")}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(query_contains(&["skos:narrower", "<http://data.dzl.de/ont/dwh#Weight>"]))
        .respond_with(sparql_json(json!([])))
        .mount(&server)
        .await;

    let source = source(&server);
    let paths = PathConfig::default();
    let outcome = TreeBuilder::new(&source, "dzl", &paths)
        .build(&ChildRef::new(
            "http://data.dzl.de/ont/dwh#Vitals",
            "http://www.w3.org/2004/02/skos/core#Concept",
        ))
        .await
        .unwrap();

    let tree = outcome.tree;
    assert_eq!(tree.len(), 2);
    let root = tree.node(tree.root());
    assert_eq!(root.name, "dwh:Vitals");
    assert_eq!(root.pref_label(), "Vital signs");

    let rows = project_tree(&tree).rows;
    assert_eq!(rows.len(TargetTable::Ontology), 2);
    assert_eq!(rows.len(TargetTable::TableAccess), 1);
    assert_eq!(rows.len(TargetTable::ConceptDimension), 1);

    let weight = &rows.rows(TargetTable::Ontology)[1];
    let metadata = weight
        .get(TargetTable::Ontology, "c_metadataxml")
        .and_then(|f| f.as_text())
        .unwrap();
    assert!(metadata.contains("<DataType>Float</DataType>"));
    assert!(metadata.contains("<NormalUnits>kg</NormalUnits>"));
}
