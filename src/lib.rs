//! letc - front end for a small C-like language
//!
//! Scanning, parsing and type checking. The checked tree is the hand-off
//! point to a code generator.

pub mod feedback;
pub mod frontend;
pub mod types;
pub mod utils;
