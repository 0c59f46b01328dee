//! Macro input: console layouts and the text parser.

pub mod layout;
pub mod parse;
pub mod types;

pub use layout::{Binding, ConsoleLayout, Direction, LayoutError};
pub use parse::{ParseOptions, format, parse};
pub use types::{ButtonId, InputAction, MacroBody, ParseError, ParseErrorReason};
