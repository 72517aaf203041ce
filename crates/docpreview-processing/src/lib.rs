//! Docpreview Processing Library
//!
//! External tool invocation for the conversion pipeline: rendering an office
//! document to PDF and inspecting the rendered file.

pub mod command;
pub mod converter;
pub mod metadata;

pub use command::{CommandOutput, CommandRunner, ProcessError, SystemCommandRunner};
pub use converter::DocumentConverter;
pub use metadata::{content_hash, parse_page_size, MetadataError, MetadataExtractor, PageSize};
