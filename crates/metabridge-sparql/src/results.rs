//! `application/sparql-results+json` response shape.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SparqlResults {
    pub results: Bindings,
}

#[derive(Debug, Deserialize)]
pub struct Bindings {
    pub bindings: Vec<HashMap<String, Term>>,
}

/// One bound RDF term.
#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(rename = "xml:lang", default)]
    pub lang: Option<String>,
}

impl Term {
    pub fn lang(&self) -> &str {
        self.lang.as_deref().unwrap_or("")
    }
}

impl SparqlResults {
    /// Value of `var` in each row that binds it.
    pub fn column<'a>(&'a self, var: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.results.bindings.iter().filter_map(move |row| row.get(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bindings_with_lang() {
        let json = r#"{
            "head": {"vars": ["p", "o"]},
            "results": {"bindings": [
                {"p": {"type": "uri", "value": "http://www.w3.org/2004/02/skos/core#prefLabel"},
                 "o": {"type": "literal", "value": "Weight", "xml:lang": "en"}},
                {"p": {"type": "uri", "value": "http://www.w3.org/2004/02/skos/core#notation"},
                 "o": {"type": "literal", "value": "29463-7"}}
            ]}
        }"#;
        let parsed: SparqlResults = serde_json::from_str(json).unwrap();
        let objects: Vec<_> = parsed.column("o").collect();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].lang(), "en");
        assert_eq!(objects[1].lang(), "");
        assert_eq!(objects[1].kind, "literal");
    }
}
