use serde::Deserialize;

use crate::models::{matching_country, Country, DEFAULT_COUNTRY};

/// Raw search parameters as they arrive on the query string.
/// Everything is optional text here; [`SearchQuery::from_params`] turns it
/// into a usable query or a list of validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub country: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub used_only: Option<String>,
    pub strict: Option<String>,
}

/// A fully validated search request
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub country: Country,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub used_only: bool,
    pub strict: bool,
}

impl SearchQuery {
    /// Validate raw parameters into a typed query. Errors accumulate instead
    /// of failing fast, so one response can report every bad field. No
    /// cross-field checks: min above max passes through as given.
    pub fn from_params(params: SearchParams) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();

        let query = match params.query {
            Some(query) if !query.is_empty() => query,
            _ => {
                errors.push("Invalid query".to_string());
                String::new()
            }
        };

        let country_code = match params.country {
            Some(code) if !code.is_empty() => code,
            _ => DEFAULT_COUNTRY.code.to_string(),
        };
        if country_code.chars().count() != 2 {
            errors.push("Invalid country".to_string());
        }
        // Unknown codes resolve to the default region, deliberately without
        // an error; only a wrong-length code is rejected.
        let country = matching_country(&country_code);

        let min_price = parse_price(params.min_price.as_deref(), "Invalid min price", &mut errors);
        let max_price = parse_price(params.max_price.as_deref(), "Invalid max price", &mut errors);

        let used_only = truthy(params.used_only.as_deref());
        let strict = truthy(params.strict.as_deref());

        if errors.is_empty() {
            Ok(SearchQuery {
                query,
                country,
                min_price,
                max_price,
                used_only,
                strict,
            })
        } else {
            Err(errors)
        }
    }
}

/// Parse an optional price bound. Empty input counts as absent; anything
/// other than plain digits records the given error message.
fn parse_price(input: Option<&str>, message: &str, errors: &mut Vec<String>) -> Option<u64> {
    let text = match input {
        Some(text) if !text.is_empty() => text,
        _ => return None,
    };

    if text.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(value) = text.parse::<u64>() {
            return Some(value);
        }
    }

    errors.push(message.to_string());
    None
}

/// Accepts the tokens `yes` and `true`, case-insensitively, surrounding
/// whitespace ignored; everything else is false.
fn truthy(input: Option<&str>) -> bool {
    matches!(
        input.map(|text| text.trim().to_lowercase()).as_deref(),
        Some("yes") | Some("true")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: Option<&str>) -> SearchParams {
        SearchParams {
            query: query.map(str::to_string),
            ..SearchParams::default()
        }
    }

    #[test]
    fn full_query_validates() {
        let raw = SearchParams {
            query: Some("red shoes".to_string()),
            country: Some("tw".to_string()),
            min_price: Some("10".to_string()),
            max_price: Some("50".to_string()),
            used_only: Some("yes".to_string()),
            strict: Some("TRUE".to_string()),
        };

        let query = SearchQuery::from_params(raw).expect("valid query");

        assert_eq!(query.query, "red shoes");
        assert_eq!(query.country.code, "TW");
        assert_eq!(query.min_price, Some(10));
        assert_eq!(query.max_price, Some(50));
        assert!(query.used_only);
        assert!(query.strict);
    }

    #[test]
    fn missing_query_is_invalid() {
        let errors = SearchQuery::from_params(params(None)).unwrap_err();
        assert_eq!(errors, vec!["Invalid query"]);
    }

    #[test]
    fn empty_query_is_invalid() {
        let errors = SearchQuery::from_params(params(Some(""))).unwrap_err();
        assert_eq!(errors, vec!["Invalid query"]);
    }

    #[test]
    fn absent_country_defaults_without_error() {
        let query = SearchQuery::from_params(params(Some("bag"))).expect("valid query");
        assert_eq!(query.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn wrong_length_country_records_exactly_one_country_error() {
        let raw = SearchParams {
            country: Some("SGP".to_string()),
            ..params(Some("bag"))
        };

        let errors = SearchQuery::from_params(raw).unwrap_err();

        assert_eq!(errors, vec!["Invalid country"]);
    }

    #[test]
    fn unknown_two_letter_country_silently_defaults() {
        let raw = SearchParams {
            country: Some("XX".to_string()),
            ..params(Some("bag"))
        };

        let query = SearchQuery::from_params(raw).expect("valid query");

        assert_eq!(query.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn empty_country_string_counts_as_absent() {
        let raw = SearchParams {
            country: Some(String::new()),
            ..params(Some("bag"))
        };

        let query = SearchQuery::from_params(raw).expect("valid query");

        assert_eq!(query.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn non_numeric_prices_are_rejected() {
        let raw = SearchParams {
            min_price: Some("abc".to_string()),
            max_price: Some("1.5".to_string()),
            ..params(Some("bag"))
        };

        let errors = SearchQuery::from_params(raw).unwrap_err();

        assert_eq!(errors, vec!["Invalid min price", "Invalid max price"]);
    }

    #[test]
    fn min_above_max_passes_validation() {
        let raw = SearchParams {
            min_price: Some("10".to_string()),
            max_price: Some("5".to_string()),
            ..params(Some("bag"))
        };

        let query = SearchQuery::from_params(raw).expect("valid query");

        assert_eq!(query.min_price, Some(10));
        assert_eq!(query.max_price, Some(5));
    }

    #[test]
    fn errors_accumulate_across_fields() {
        let raw = SearchParams {
            query: None,
            country: Some("XYZ".to_string()),
            min_price: Some("ten".to_string()),
            ..SearchParams::default()
        };

        let errors = SearchQuery::from_params(raw).unwrap_err();

        assert_eq!(
            errors,
            vec!["Invalid query", "Invalid country", "Invalid min price"]
        );
    }

    #[test]
    fn flags_accept_truthy_tokens_only() {
        for token in ["yes", "YES", "true", "True", " yes "] {
            let raw = SearchParams {
                used_only: Some(token.to_string()),
                ..params(Some("bag"))
            };
            let query = SearchQuery::from_params(raw).expect("valid query");
            assert!(query.used_only, "token {:?} should be truthy", token);
        }

        for token in ["no", "1", "", "on"] {
            let raw = SearchParams {
                strict: Some(token.to_string()),
                ..params(Some("bag"))
            };
            let query = SearchQuery::from_params(raw).expect("valid query");
            assert!(!query.strict, "token {:?} should be falsy", token);
        }
    }
}
