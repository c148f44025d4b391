//! Service URL normalization.

use tracing::warn;

/// Stand-in service URL used when the request URL is unavailable.
pub const MISSING_SERVICE_URL: &str = "urn:ras:missing-service-url";

const TICKET_PARAM: &str = "ticket";

/// Returns `url` without the `ticket` parameter the CAS server appended.
///
/// Only parameters whose decoded name is exactly `ticket` are removed,
/// wherever they appear.
/// Empty segments left behind are collapsed and a bare `?` is dropped. A URL
/// without a ticket comes back untouched, which makes the function
/// idempotent.
pub fn strip_ticket(url: Option<&str>) -> String {
    let Some(url) = url else {
        warn!("No request URL available, using placeholder service URL");
        return MISSING_SERVICE_URL.to_string();
    };

    let (without_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };

    let Some((base, query)) = without_fragment.split_once('?') else {
        return url.to_string();
    };

    if !query.split('&').any(is_ticket) {
        return url.to_string();
    }

    let kept: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty() && !is_ticket(segment))
        .collect();

    let mut clean = base.to_string();
    if !kept.is_empty() {
        clean.push('?');
        clean.push_str(&kept.join("&"));
    }
    if let Some(fragment) = fragment {
        clean.push('#');
        clean.push_str(fragment);
    }
    clean
}

/// Compares the percent-decoded name, the same view the query map has.
fn is_ticket(segment: &str) -> bool {
    url::form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(name, _)| name == TICKET_PARAM)
}
