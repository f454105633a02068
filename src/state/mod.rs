//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `SeedState`/`SeedProgress`: where each seed's traversal stands
//! - `HostState`: per-host request spacing for politeness

mod host_state;
mod seed_state;

pub use host_state::{HostState, MAX_CRAWL_DELAY};
pub use seed_state::{SeedProgress, SeedState};
