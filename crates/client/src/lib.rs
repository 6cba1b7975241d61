//! Network client for precache.
//!
//! This crate provides the reqwest-backed implementation of the worker's
//! `Network` contract and the URL handling it relies on.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, normalize_origin, parse_request_url};
