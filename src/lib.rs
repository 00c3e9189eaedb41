//! # Hubgate (Session-Gated SSO Gateway)
//!
//! `hubgate` is the edge-authentication gateway of the hub dashboard. It
//! gates every non-public route on a valid session, bridges client-held
//! sessions into HTTP cookies, and issues single-use SSO redirect URLs for
//! federated sub-applications.
//!
//! ## Session Model
//!
//! All durable auth state (credentials, sessions, SSO tickets) lives in an
//! external session store consumed over HTTPS. Hubgate never mutates that
//! state directly; it requests mutations and relays results.
//!
//! - **Cookie pair:** A session is mirrored into two `HttpOnly` cookies so
//!   server-side requests can see what the browser SDK holds.
//! - **Fail closed:** The route gate treats every store error or absence of
//!   cookies as "logged out" and answers with a login redirect carrying the
//!   original destination in `redirectedFrom`.
//! - **Tickets:** SSO links are minted by the store on explicit user action;
//!   expiry and single-use enforcement are the store's contract.

pub mod api;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
