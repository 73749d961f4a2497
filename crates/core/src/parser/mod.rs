//! PDF syntax parsing.
//!
//! - `lexer`: byte-level tokenizer shared by file objects and content streams
//! - `pdf_parser`: object assembly and content-stream operation parsing

pub mod lexer;
pub mod pdf_parser;

pub use lexer::{Keyword, Lexer, Token};
pub use pdf_parser::{ContentParser, ObjectParser, Operation};
