//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Line normalization over byte streams
//! - Per-file results and run counters
//! - Rendering functions for different output formats
//! - Path normalization utilities
//! - Cooperative cancellation

pub mod cancel;
pub mod model;
pub mod normalize;
pub mod paths;
pub mod render;
