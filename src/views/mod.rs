//! Screen-level reads and writes over the backend repository.
//!
//! Each function issues fresh queries against the repository and returns what the
//! screen shows; nothing is cached or patched locally between calls.

pub mod advertisements;
pub mod categories;
pub mod filter;
pub mod moderation;
