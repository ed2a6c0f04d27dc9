//! Node name normalisation.

use indexmap::IndexMap;

/// Replace configured namespaces in `uri` with their short prefixes.
///
/// Mappings are applied in configuration order.
///
/// ```
/// use indexmap::IndexMap;
/// use metabridge_core::names::shorten_uri;
///
/// let mut prefixes = IndexMap::new();
/// prefixes.insert("http://data.dzl.de/ont/dwh#".to_string(), "dwh:".to_string());
/// assert_eq!(shorten_uri("http://data.dzl.de/ont/dwh#Weight", &prefixes), "dwh:Weight");
/// ```
pub fn shorten_uri(uri: &str, prefixes: &IndexMap<String, String>) -> String {
    prefixes
        .iter()
        .fold(uri.to_string(), |acc, (namespace, prefix)| {
            acc.replace(namespace.as_str(), prefix)
        })
}

/// Collapse whitespace runs into single spaces and trim.
pub fn clean_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_uri_unmapped_is_unchanged() {
        let prefixes = IndexMap::new();
        assert_eq!(shorten_uri("urn:x:y", &prefixes), "urn:x:y");
    }

    #[test]
    fn test_shorten_uri_applies_in_order() {
        let mut prefixes = IndexMap::new();
        prefixes.insert("http://loinc.org/owl#".to_string(), "loinc:".to_string());
        prefixes.insert("http://data.dzl.de/ont/".to_string(), "dzl:".to_string());
        assert_eq!(
            shorten_uri("http://loinc.org/owl#29463-7", &prefixes),
            "loinc:29463-7"
        );
        assert_eq!(
            shorten_uri("http://data.dzl.de/ont/dwh#A", &prefixes),
            "dzl:dwh#A"
        );
    }

    #[test]
    fn test_clean_label() {
        assert_eq!(clean_label("  Body \n weight\t(kg) "), "Body weight (kg)");
        assert_eq!(clean_label(""), "");
    }
}
