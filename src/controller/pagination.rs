//! Continuation-link parsing
//!
//! Paginated endpoints return a `Link` header of the form:
//!
//! ```text
//! <https://host/path/?cursor=0:0:1>; rel="previous"; results="false"; cursor="0:0:1",
//! <https://host/path/?cursor=0:100:0>; rel="next"; results="true"; cursor="0:100:0"
//! ```
//!
//! Anything malformed degrades to "no further pages" rather than failing the
//! resource the header arrived with.

/// One direction of a continuation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub url: String,
    pub cursor: Option<String>,
    /// Whether following the link yields results. Servers mark dead-end
    /// links with `results="false"`; absent means assume results.
    pub results: bool,
}

/// Forward/backward cursor links for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub previous: Option<PageLink>,
    pub next: Option<PageLink>,
}

impl PageLinks {
    pub fn has_next(&self) -> bool {
        self.next.as_ref().is_some_and(|l| l.results)
    }

    pub fn has_previous(&self) -> bool {
        self.previous.as_ref().is_some_and(|l| l.results)
    }
}

/// Parse a raw `Link` header. Returns `None` when no usable link is found.
pub fn parse_link_header(raw: &str) -> Option<PageLinks> {
    let mut links = PageLinks::default();
    let mut found = false;

    for entry in raw.split(',') {
        let Some(link) = parse_entry(entry.trim()) else {
            continue;
        };
        match link.0.as_str() {
            "previous" => {
                links.previous = Some(link.1);
                found = true;
            }
            "next" => {
                links.next = Some(link.1);
                found = true;
            }
            _ => {}
        }
    }

    found.then_some(links)
}

/// Parse one `<url>; key="value"; ...` entry into (rel, link).
fn parse_entry(entry: &str) -> Option<(String, PageLink)> {
    let start = entry.find('<')?;
    let end = entry.find('>')?;
    if end <= start {
        return None;
    }
    let url = entry[start + 1..end].to_string();

    let mut rel = None;
    let mut cursor = None;
    let mut results = true;

    for part in entry[end + 1..].split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches('"');
        match key {
            "rel" => rel = Some(value.to_string()),
            "cursor" => cursor = Some(value.to_string()),
            "results" => results = value != "false",
            _ => {}
        }
    }

    Some((
        rel?,
        PageLink {
            url,
            cursor,
            results,
        },
    ))
}
