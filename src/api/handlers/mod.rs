//! API handlers and shared helpers.

pub mod auth;
pub mod health;
pub mod root;

use regex::Regex;

/// Lightweight email sanity check used before contacting the session store.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
