//! Query-string flags that steer the diagnostic output

use std::collections::HashMap;
use url::form_urlencoded;

/// Query parameters keyed by name, first occurrence wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFlags {
    params: HashMap<String, String>,
}

impl QueryFlags {
    /// Parses the query part of a request target (`/path?query#fragment`).
    pub fn from_target(target: &str) -> Self {
        let query = target
            .split_once('?')
            .map(|(_, rest)| rest.split_once('#').map_or(rest, |(q, _)| q))
            .unwrap_or("");
        Self::parse(query)
    }

    /// Parses an `application/x-www-form-urlencoded` query.
    ///
    /// Pairs with an empty value are skipped, so `?echo-body=` behaves like
    /// the flag was never given.
    pub fn parse(query: &str) -> Self {
        let mut params = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// `echo-body`: only `false` keeps the request body out of the response
    pub fn echo_body(&self) -> bool {
        self.get("echo-body") != Some("false")
    }

    /// `return-100`: only `false` suppresses the provisional `100 Continue`
    pub fn return_100(&self) -> bool {
        self.get("return-100") != Some("false")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_query() {
        let flags = QueryFlags::from_target("/foo");
        assert!(flags.echo_body());
        assert!(flags.return_100());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let flags = QueryFlags::from_target("/?echo-body=false&echo-body=true");
        assert!(!flags.echo_body());

        let flags = QueryFlags::from_target("/?return-100=true&return-100=false");
        assert!(flags.return_100());
    }

    #[test]
    fn test_unknown_values_fall_back_to_defaults() {
        let flags = QueryFlags::from_target("/?echo-body=no&return-100=0");
        assert!(flags.echo_body());
        assert!(flags.return_100());
    }

    #[test]
    fn test_empty_value_is_ignored() {
        let flags = QueryFlags::from_target("/?echo-body=&echo-body=false");
        assert!(!flags.echo_body());
    }

    #[test]
    fn test_decoding_and_fragment() {
        let flags = QueryFlags::from_target("/x?return%2D100=false&note=a+b#echo-body=false");
        assert!(!flags.return_100());
        assert!(flags.echo_body());
        assert_eq!(flags.get("note"), Some("a b"));
    }
}
