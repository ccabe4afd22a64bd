//! Shared test fixtures for the Scribe workspace.
//!
//! - [`GitRemote`]: a throwaway git repository that tests clone from
//! - [`python_tree`]: writes a small Python source tree to disk

mod fixtures;

pub use fixtures::*;
