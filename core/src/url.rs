//! Resource URL composition.
//!
//! URLs are built by plain string joining. Nothing is normalized or
//! percent-encoded; callers hand in segments that are already safe to place
//! in a path.

/// Join `host` and `segment` as `"{host}/{segment}"`.
pub fn build_url(host: &str, segment: &str) -> String {
    let mut url = String::with_capacity(host.len() + 1 + segment.len());
    url.push_str(host);
    url.push('/');
    url.push_str(segment);
    url
}
