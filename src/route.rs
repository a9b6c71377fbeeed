//! Route and query state
//!
//! Navigation state a view is resolved against: named route parameters plus
//! the current query string. The app owns one [`Location`] and a history
//! stack; descriptor resolution only ever reads a `Location` value, so the
//! search text and the resolved descriptors cannot drift apart.

use std::collections::HashMap;

/// Query key carrying the current search text.
pub const SEARCH_KEY: &str = "query";

/// Query key carrying the pagination cursor.
pub const CURSOR_KEY: &str = "cursor";

/// Route parameters and query values for one screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
}

impl Location {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self {
            params,
            query: HashMap::new(),
        }
    }

    /// Look up a route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Look up a query value, defaulting to the empty string.
    pub fn query_value(&self, key: &str) -> &str {
        self.query.get(key).map(|s| s.as_str()).unwrap_or("")
    }

    /// Current search text.
    pub fn search(&self) -> &str {
        self.query_value(SEARCH_KEY)
    }

    /// Set the search text and drop any pagination cursor, since a cursor
    /// from the previous result set is meaningless for a new search.
    pub fn set_search(&mut self, text: &str) {
        self.query.insert(SEARCH_KEY.to_string(), text.to_string());
        self.query.remove(CURSOR_KEY);
    }

    /// Current pagination cursor, if any.
    pub fn cursor(&self) -> Option<&str> {
        self.query.get(CURSOR_KEY).map(|s| s.as_str())
    }

    pub fn set_cursor(&mut self, cursor: &str) {
        self.query.insert(CURSOR_KEY.to_string(), cursor.to_string());
    }

    pub fn clear_cursor(&mut self) {
        self.query.remove(CURSOR_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_search_drops_cursor() {
        let mut loc = Location::default();
        loc.set_cursor("0:100:0");
        loc.set_search("foo");
        assert_eq!(loc.search(), "foo");
        assert!(loc.cursor().is_none());
    }

    #[test]
    fn missing_query_value_is_empty() {
        let loc = Location::default();
        assert_eq!(loc.search(), "");
        assert!(loc.cursor().is_none());
    }
}
