//! Query text sent to the endpoint.
//!
//! Node URIs are spliced in as IRI references; [`iri`] rejects anything
//! that could break out of the `<...>` form.

use metabridge_core::{Error, Result};

const PREFIXES: &str = "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>\n\
                        PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
                        PREFIX dwh: <http://data.dzl.de/ont/dwh#>\n";

/// `<uri>`, or a fetch error for characters not allowed in an IRI reference.
pub fn iri(uri: &str) -> Result<String> {
    let forbidden = |c: char| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\');
    if uri.is_empty() || uri.chars().any(forbidden) {
        return Err(Error::Fetch(format!("not a valid IRI: '{}'", uri)));
    }
    Ok(format!("<{}>", uri))
}

/// Top concepts of every scheme, with their types.
pub fn top_elements() -> String {
    format!(
        "{PREFIXES}SELECT ?element ?type WHERE {{\n\
         \x20 ?scheme skos:hasTopConcept ?element .\n\
         \x20 OPTIONAL {{ ?element rdf:type ?type }}\n\
         }}"
    )
}

/// Direct children of `uri`: narrower concepts and collection members.
pub fn children(uri: &str) -> Result<String> {
    let node = iri(uri)?;
    Ok(format!(
        "{PREFIXES}SELECT ?element ?type WHERE {{\n\
         \x20 {{ {node} skos:narrower ?element }}\n\
         \x20 UNION {{ ?element skos:broader {node} }}\n\
         \x20 UNION {{ {node} skos:member ?element }}\n\
         \x20 OPTIONAL {{ ?element rdf:type ?type }}\n\
         }}"
    ))
}

/// Every predicate/object pair of `uri`.
pub fn attributes(uri: &str) -> Result<String> {
    Ok(format!("SELECT ?p ?o WHERE {{ {} ?p ?o }}", iri(uri)?))
}
