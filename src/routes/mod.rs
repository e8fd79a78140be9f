//! Router Module Index
//!
//! Routes are split by who may reach them. Access control is attached per module
//! through extractors rather than left to individual handler bodies.

/// Anonymous, read-only routes (approved advertisements only).
pub mod public;

/// Routes requiring a session (`SignedIn` extractor).
pub mod authenticated;

/// Routes requiring the admin role (`AdminViewer` extractor).
pub mod admin;
