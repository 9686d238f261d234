//! GitLake Common Library
//!
//! Shared types and utilities for the GitLake workspace:
//!
//! - **Error Handling**: the pipeline error taxonomy and result alias
//! - **Keys**: pure derivations for landing ids, file formats, and object keys
//! - **Logging**: tracing initialization shared by all binaries
//!
//! # Example
//!
//! ```
//! use gitlake_common::keys::blob_object_key;
//!
//! let key = blob_object_key("rust-lang/rust", "abc123", "src/lib.rs");
//! assert_eq!(key, "rust-lang_rust/abc123/src_lib.rs");
//! ```

pub mod error;
pub mod keys;
pub mod logging;

// Re-export commonly used types
pub use error::{GitLakeError, Result};
