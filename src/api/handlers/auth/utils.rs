//! Small helpers shared by the auth handlers.

/// Normalize an email before handing it to the session store.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Same-site redirect guard.
///
/// Anything that is not a site-relative path (absolute URLs,
/// protocol-relative `//host`, backslash tricks) collapses to `/`.
pub(crate) fn sanitize_redirect(raw: Option<&str>) -> String {
    match raw {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
