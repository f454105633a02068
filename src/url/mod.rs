//! URL handling module
//!
//! This module provides seed normalization, href scheme detection and
//! resolution, fetch dedup keys, and public-suffix-aware domain matching.

mod domain;
mod normalize;

pub use domain::{
    extract_domain, is_german_domain, registrable_domain, same_site, url_registrable_domain,
};
pub use normalize::{dedup_key, homepage_id, href_scheme, normalize_seed, resolve_href};
