//! Flows module - Operations combining scanning, rewriting and reporting
//!
//! Provides:
//! - run: Normalize a file or a tree and report the outcome

pub mod run;
