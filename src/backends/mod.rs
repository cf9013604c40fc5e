//! Backends module - File selection and file operations
//!
//! Provides:
//! - filter: Ignore rules and file name patterns
//! - scan: Directory walking with walkdir
//! - rewrite: In-place normalization through a temporary file
//! - pool: Bounded worker pool

pub mod filter;
pub mod pool;
pub mod rewrite;
pub mod scan;
