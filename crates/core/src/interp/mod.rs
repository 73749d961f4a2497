//! Restricted content-stream interpretation.

pub mod interpreter;

pub use interpreter::{LayoutInterpreter, PageLayout, TextRun};
