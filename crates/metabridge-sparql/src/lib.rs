//! # metabridge-sparql
//!
//! Reads ontologies from a SPARQL 1.1 endpoint. Children are found through
//! `skos:narrower`, `skos:broader` and `skos:member`; descriptive attributes
//! come from a single `?p ?o` query per node.

pub mod client;
pub mod queries;
pub mod results;
pub mod vocab;

pub use client::{SparqlSource, SPARQL_RESULTS_JSON};
