//! Predicate and type URIs read from the ontology store.

pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const DWH: &str = "http://data.dzl.de/ont/dwh#";

pub const PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const ALT_LABEL: &str = "http://www.w3.org/2004/02/skos/core#altLabel";
pub const NOTATION: &str = "http://www.w3.org/2004/02/skos/core#notation";
pub const DESCRIPTION: &str = "http://purl.org/dc/elements/1.1/description";

pub const DISPLAY_LABEL: &str = "http://data.dzl.de/ont/dwh#displayLabel";
pub const DISPLAY: &str = "http://data.dzl.de/ont/dwh#display";
pub const DATATYPE: &str = "http://data.dzl.de/ont/dwh#datatype";
pub const UNIT: &str = "http://data.dzl.de/ont/dwh#unit";
