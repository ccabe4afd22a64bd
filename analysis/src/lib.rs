//! # Analysis
//!
//! Finds Python functions that lack a docstring and drafts one with a
//! language model.

pub mod drafter;
pub mod inventory;
pub mod llm;

pub use drafter::Drafter;
pub use inventory::{
    Inventory, UndocumentedFunctions, find_undocumented, parse_functions, parse_source
};
pub use llm::{MockChatModel, OpenAiChatModel};
