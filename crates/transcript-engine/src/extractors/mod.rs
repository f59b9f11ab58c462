// Per-document extraction: plain text from markup, metadata from filenames
pub mod filename;
pub mod text;

pub use filename::{extract_date, extract_identifier, parse_metadata};
pub use text::{extract_text, try_extract_text};
