use serde::Serialize;
use serde_json::Value;

/// JSON Feed version URL, fixed for every response
pub const JSONFEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

/// One supported marketplace region: country code, Carousell's internal
/// geocode id, and the site domain serving that region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Country {
    pub code: &'static str,
    pub geocode: &'static str,
    pub domain: &'static str,
}

/// Region used when no country is given or the code is unknown
pub const DEFAULT_COUNTRY: Country = Country {
    code: "SG",
    geocode: "1880251",
    domain: "www.carousell.sg",
};

/// All supported regions, looked up by 2-letter code
pub const COUNTRIES: [Country; 9] = [
    Country { code: "AU", geocode: "2077456", domain: "au.carousell.com" },
    Country { code: "CA", geocode: "6251999", domain: "ca.carousell.com" },
    Country { code: "HK", geocode: "1819730", domain: "www.carousell.com.hk" },
    Country { code: "ID", geocode: "1643084", domain: "id.carousell.com" },
    Country { code: "MY", geocode: "1733045", domain: "www.carousell.com.my" },
    Country { code: "NZ", geocode: "2186224", domain: "nz.carousell.com" },
    Country { code: "PH", geocode: "1694008", domain: "www.carousell.ph" },
    Country { code: "TW", geocode: "1668284", domain: "tw.carousell.com" },
    DEFAULT_COUNTRY,
];

/// Resolve a country code against the static table, case-insensitively.
/// Unknown codes fall back to the default region rather than failing.
pub fn matching_country(code: &str) -> Country {
    COUNTRIES
        .iter()
        .find(|country| country.code.eq_ignore_ascii_case(code))
        .copied()
        .unwrap_or(DEFAULT_COUNTRY)
}

/// Author attached to a feed item
#[derive(Debug, Clone, Serialize)]
pub struct JsonFeedAuthor {
    pub name: String,
}

/// One feed entry, built from a single listing card
#[derive(Debug, Clone, Serialize)]
pub struct JsonFeedItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub content_html: String,
    pub date_published: String,
    pub author: Option<JsonFeedAuthor>,
    pub image: Option<String>,
}

/// Top-level JSON Feed envelope
#[derive(Debug, Clone, Serialize)]
pub struct JsonFeed {
    pub version: &'static str,
    pub title: String,
    pub home_page_url: String,
    pub favicon: String,
    pub items: Vec<JsonFeedItem>,
}

/// Recursively drop empty values (null, false, zero, empty string, empty
/// array, empty object) so that no empty-valued key reaches the wire, at any
/// nesting depth. Pruning an already-pruned structure changes nothing.
pub fn prune_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, prune_empty(value)))
                .filter(|(_, value)| !is_empty(value))
                .collect(),
        ),
        Value::Array(values) => Value::Array(
            values
                .into_iter()
                .map(prune_empty)
                .filter(|value| !is_empty(value))
                .collect(),
        ),
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !*flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(values) => values.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn country_lookup_is_case_insensitive() {
        assert_eq!(matching_country("tw").code, "TW");
        assert_eq!(matching_country("TW").code, "TW");
        assert_eq!(matching_country("Tw").domain, "tw.carousell.com");
    }

    #[test]
    fn unknown_country_falls_back_to_default() {
        assert_eq!(matching_country("XX"), DEFAULT_COUNTRY);
        assert_eq!(matching_country(""), DEFAULT_COUNTRY);
    }

    #[test]
    fn prune_removes_empty_values_at_depth() {
        let pruned = prune_empty(json!({
            "title": "feed",
            "empty_text": "",
            "missing": null,
            "nested": { "list": [], "inner": { "blank": "" } },
            "items": [ { "name": "" }, { "name": "kept" } ],
        }));

        assert_eq!(
            pruned,
            json!({ "title": "feed", "items": [ { "name": "kept" } ] })
        );
    }

    #[test]
    fn prune_keeps_populated_values() {
        let value = json!({ "a": 1, "b": "x", "c": [ "y" ], "d": { "e": true } });
        assert_eq!(prune_empty(value.clone()), value);
    }

    #[test]
    fn prune_is_a_fixed_point() {
        let once = prune_empty(json!({
            "version": "https://jsonfeed.org/version/1.1",
            "title": "www.carousell.sg - bag",
            "items": [ { "title": "[S$5] bag", "author": { "name": "" } } ],
        }));
        assert_eq!(prune_empty(once.clone()), once);
    }

    #[test]
    fn author_with_empty_name_prunes_away_entirely() {
        let pruned = prune_empty(json!({
            "items": [ { "title": "t", "author": { "name": "" } } ],
        }));
        assert_eq!(pruned, json!({ "items": [ { "title": "t" } ] }));
    }
}
