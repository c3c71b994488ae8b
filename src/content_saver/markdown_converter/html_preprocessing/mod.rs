//! HTML preprocessing functionality for markdown conversion.
//!
//! This module provides three main functions:
//! 1. `extract_main_content` - Intelligently extracts the primary content from HTML
//! 2. `clean_html_content` - Removes scripts, styles, ads, and other non-content elements
//! 3. `preprocess_tables` - Normalizes tables by expanding colspan/rowspan and detecting layout tables
//!
//! These functions prepare HTML for optimal markdown conversion.

// Submodules
mod main_content_extraction;
mod html_cleaning;
mod table_preprocessing;
mod expressive_code;
mod code_block_protection;

// Re-export public API
pub use main_content_extraction::{
    extract_main_content, extract_main_content_with_stats, CleanStats, ExtractionStrategy,
};
pub use html_cleaning::clean_html_content;
pub use html_cleaning::normalize_html_structure;
pub use table_preprocessing::preprocess_tables;
pub use expressive_code::{preprocess_expressive_code, convert_br_to_newlines_in_code};
pub use code_block_protection::CodeBlockProtector;
