//! Mapping between request URLs and manifest resource keys.
//!
//! Keys are origin-relative paths without the leading slash
//! (`assets/logo.png`); the entry document is always `/`.

/// Resource key of the entry document.
pub const ROOT_KEY: &str = "/";

fn strip_origin<'a>(origin: &str, url: &'a str) -> &'a str {
    match url.strip_prefix(origin) {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => url,
    }
}

/// Resource key of a request already resident in a store.
///
/// Unlike [`request_resource_key`] no cache-busting marker is removed, so a
/// stored `?v=` URL never matches a manifest key.
pub fn stored_resource_key(origin: &str, url: &str) -> String {
    let key = strip_origin(origin, url);
    if key.is_empty() { ROOT_KEY.to_string() } else { key.to_string() }
}

/// Resource key of an intercepted request.
///
/// Drops a `?v=` cache-busting marker and everything after it, and folds the
/// bare origin and fragment-routed paths (`origin/#/...`) onto `/`.
pub fn request_resource_key(origin: &str, url: &str) -> String {
    let mut key = strip_origin(origin, url);
    if let Some(idx) = key.find("?v=") {
        key = &key[..idx];
    }

    let fragment_route = url.strip_prefix(origin).is_some_and(|rest| rest.starts_with("/#"));
    if url == origin || fragment_route || key.is_empty() {
        return ROOT_KEY.to_string();
    }
    key.to_string()
}

/// Absolute URL for a resource key.
pub fn resource_url(origin: &str, key: &str) -> String {
    if key == ROOT_KEY {
        format!("{origin}/")
    } else {
        format!("{origin}/{}", key.trim_start_matches('/'))
    }
}
