// Link header parsing
// Author: kelexine (https://github.com/kelexine)

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use std::collections::HashMap;

/// `<url>` followed by parameters up to the next `<`, one of which is `rel="..."`.
static LINK_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([^>]*)>\s*;[^<]*?\brel\s*=\s*"([^"]*)""#).expect("link pattern is valid")
});

/// Relation name → URL mapping taken from a `Link` header such as
/// `<https://api.github.com/gists?page=2>; rel="next", <...?page=5>; rel="last"`.
///
/// Entries that do not parse are skipped, so a malformed header reads as
/// "relation absent" instead of an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRelations {
    links: HashMap<String, String>,
}

impl LinkRelations {
    pub fn parse(header: &str) -> Self {
        let mut links = HashMap::new();
        for captures in LINK_ENTRY.captures_iter(header) {
            let url = captures[1].trim();
            // rel may hold several space-separated relation types
            for rel in captures[2].split_whitespace() {
                links
                    .entry(rel.to_ascii_lowercase())
                    .or_insert_with(|| url.to_string());
            }
        }
        Self { links }
    }

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.links.get(rel).map(String::as_str)
    }

    /// The `next` URL, if present and absolute.
    pub fn next(&self) -> Option<Url> {
        self.get("next").and_then(|url| Url::parse(url).ok())
    }

    /// The `page` query parameter of the `last` URL.
    pub fn last_page(&self) -> Option<u32> {
        let url = Url::parse(self.get("last")?).ok()?;
        let page = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())?;
        page.parse().ok()
    }
}
