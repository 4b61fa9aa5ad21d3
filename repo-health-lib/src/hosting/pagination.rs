//! Parsing of the `Link` pagination header.

use url::Url;

/// Return the page number carried by the `rel="last"` entry of a `Link` header.
///
/// Returns `None` when there is no `last` entry or its target has no usable `page`
/// query parameter.
#[must_use]
pub fn last_page(link_header: &str) -> Option<u64> {
    link_header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        if !parts.any(|param| param.trim() == r#"rel="last""#) {
            return None;
        }

        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        page_param(target)
    })
}

fn page_param(target: &str) -> Option<u64> {
    if let Ok(url) = Url::parse(target) {
        return url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok());
    }

    // Relative or elided targets: take the last `page=` occurrence.
    let (_, tail) = target.rsplit_once("page=")?;
    tail.split(|c: char| !c.is_ascii_digit()).next()?.parse().ok()
}
