//! Directory-index scraping for datasets published as plain web directories.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Extracts the file names an index page links to, in document order.
///
/// Every `<a href>` is resolved against `base_url`. Kept:
/// - links to the base directory itself, as the `""` sentinel;
/// - links to a file directly inside the base directory, as its bare name.
///
/// Dropped: links with a query or fragment (column-sort links), links into
/// sub-directories, links outside the base directory or to another origin,
/// and repeats.
pub fn parse_index(html: &str, base_url: &str) -> Result<Vec<String>, url::ParseError> {
    let base = Url::parse(base_url)?;
    let base_path = base.path();
    let dir_path = &base_path[..base_path.rfind('/').map(|i| i + 1).unwrap_or(0)];

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        if !element.value().name().eq_ignore_ascii_case("a") {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            tracing::debug!("skipping unparsable index link {:?}", href);
            continue;
        };
        if resolved.query().is_some() || resolved.fragment().is_some() {
            continue;
        }
        if resolved.scheme() != base.scheme()
            || resolved.host_str() != base.host_str()
            || resolved.port_or_known_default() != base.port_or_known_default()
        {
            continue;
        }
        let Some(rest) = resolved.path().strip_prefix(dir_path) else {
            continue;
        };
        if rest.contains('/') {
            continue;
        }
        if seen.insert(rest.to_string()) {
            files.push(rest.to_string());
        }
    }

    Ok(files)
}
