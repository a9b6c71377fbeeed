//! Resource descriptors and their resolution
//!
//! Views declare resources as [`ResourceSpec`]s: a path template with
//! `{param}` placeholders plus optional search/cursor query bindings.
//! [`resolve`] turns the declared list into concrete [`ResourceDescriptor`]s
//! for the current [`Location`]. Resolution is pure; it is re-run whenever
//! the route parameters or the search text change.

use crate::route::{Location, CURSOR_KEY};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Declarative resource entry in a view definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSpec {
    /// Unique key the result store files this resource under.
    pub name: String,
    /// API path template, e.g. `/projects/{org}/{project}/files/`.
    pub path: String,
    /// Static query parameters.
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    /// Query parameter to carry the live search text. Always sent when
    /// declared, even while the search text is empty.
    #[serde(default)]
    pub search_param: Option<String>,
    /// Query parameter to carry the pagination cursor. Sent only while a
    /// cursor is present in the location.
    #[serde(default)]
    pub cursor_param: Option<String>,
}

/// A resolved request spec: concrete path and query, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error("unresolved route parameter `{param}` in `{path}`")]
    MissingParam { param: String, path: String },
    #[error("duplicate resource name `{0}`")]
    DuplicateName(String),
}

/// Resolve a declared resource list against the current location.
///
/// Output order follows declaration order; the store keys off it. All
/// descriptors are dispatched together, so the order carries no execution
/// guarantee.
pub fn resolve(
    specs: &[ResourceSpec],
    location: &Location,
) -> Result<Vec<ResourceDescriptor>, ResolveError> {
    let mut descriptors = Vec::with_capacity(specs.len());

    for spec in specs {
        if descriptors
            .iter()
            .any(|d: &ResourceDescriptor| d.name == spec.name)
        {
            return Err(ResolveError::DuplicateName(spec.name.clone()));
        }

        let path = substitute_params(&spec.path, location)?;

        let mut query: Vec<(String, String)> = spec
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(param) = &spec.search_param {
            query.push((param.clone(), location.search().to_string()));
        }

        if let Some(param) = &spec.cursor_param {
            if let Some(cursor) = location.query.get(CURSOR_KEY) {
                query.push((param.clone(), cursor.clone()));
            }
        }

        descriptors.push(ResourceDescriptor {
            name: spec.name.clone(),
            path,
            query,
        });
    }

    Ok(descriptors)
}

/// Replace `{param}` placeholders from the location's route parameters.
fn substitute_params(template: &str, location: &Location) -> Result<String, ResolveError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            // Unbalanced brace: treat the remainder as literal.
            out.push_str(&rest[open..]);
            return Ok(out);
        };

        let param = &after[..close];
        match location.param(param) {
            Some(value) => out.push_str(value),
            None => {
                return Err(ResolveError::MissingParam {
                    param: param.to_string(),
                    path: template.to_string(),
                })
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn spec(name: &str, path: &str) -> ResourceSpec {
        ResourceSpec {
            name: name.to_string(),
            path: path.to_string(),
            query: BTreeMap::new(),
            search_param: None,
            cursor_param: None,
        }
    }

    fn location() -> Location {
        let mut params = HashMap::new();
        params.insert("org".to_string(), "acme".to_string());
        params.insert("project".to_string(), "web".to_string());
        Location::new(params)
    }

    #[test]
    fn substitutes_route_params() {
        let descriptors = resolve(
            &[spec("project", "/projects/{org}/{project}/")],
            &location(),
        )
        .unwrap();
        assert_eq!(descriptors[0].path, "/projects/acme/web/");
    }

    #[test]
    fn missing_param_is_an_error() {
        let err = resolve(&[spec("project", "/teams/{team}/")], &location()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingParam { ref param, .. } if param == "team"));
    }

    #[test]
    fn search_param_is_always_sent() {
        let mut files = spec("files", "/projects/{org}/{project}/files/");
        files.search_param = Some("query".to_string());

        let descriptors = resolve(&[files.clone()], &location()).unwrap();
        assert_eq!(
            descriptors[0].query,
            vec![("query".to_string(), String::new())]
        );

        let mut loc = location();
        loc.set_search("foo");
        let descriptors = resolve(&[files], &loc).unwrap();
        assert_eq!(
            descriptors[0].query,
            vec![("query".to_string(), "foo".to_string())]
        );
    }

    #[test]
    fn cursor_param_is_sent_only_when_present() {
        let mut files = spec("files", "/projects/{org}/{project}/files/");
        files.cursor_param = Some("cursor".to_string());

        let descriptors = resolve(&[files.clone()], &location()).unwrap();
        assert!(descriptors[0].query.is_empty());

        let mut loc = location();
        loc.set_cursor("0:100:0");
        let descriptors = resolve(&[files], &loc).unwrap();
        assert_eq!(
            descriptors[0].query,
            vec![("cursor".to_string(), "0:100:0".to_string())]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut files = spec("files", "/projects/{org}/{project}/files/");
        files
            .query
            .insert("sort".to_string(), "-date".to_string());
        files
            .query
            .insert("checksum".to_string(), "sha1".to_string());
        files.search_param = Some("query".to_string());

        let a = resolve(&[files.clone()], &location()).unwrap();
        let b = resolve(&[files], &location()).unwrap();
        assert_eq!(a, b);
        // Static pairs come out in key order, bindings after.
        assert_eq!(a[0].query[0].0, "checksum");
        assert_eq!(a[0].query[1].0, "sort");
        assert_eq!(a[0].query[2].0, "query");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = resolve(
            &[spec("project", "/a/"), spec("project", "/b/")],
            &location(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateName(_)));
    }

    #[test]
    fn unbalanced_brace_is_literal() {
        let descriptors = resolve(&[spec("raw", "/odd/{path")], &location()).unwrap();
        assert_eq!(descriptors[0].path, "/odd/{path");
    }
}
