//! Core type definitions for Tincture
//!
//! Token names and token sets, theme records (current and legacy), and the
//! active theme selection state shared by the engine and storage.

mod theme_types;
mod token_types;

pub use theme_types::*;
pub use token_types::*;
