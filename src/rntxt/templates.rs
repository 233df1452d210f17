//! RomanText header template
//!
//! The header is a fixed four-line block; only composer and title vary per
//! score. Values are inserted unescaped (`{{{ }}}`), RomanText has no markup.

use serde::Serialize;

use crate::config::{DEFAULT_ANALYST, DEFAULT_PROOFREADER};
use crate::score::Metadata;

const HEADER_TEMPLATE: &str = include_str!("templates/header.rntxt.mustache");

/// Context data for header rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderContext {
    pub composer: String,
    pub title: String,
    pub analyst: String,
    pub proofreader: String,
}

impl HeaderContext {
    /// Header for a score's metadata with the default credits.
    /// Missing composer or title render as empty values.
    pub fn new(metadata: &Metadata) -> Self {
        // Absent reference records render empty, not as a placeholder
        Self {
            composer: metadata.composer.clone().unwrap_or_default(),
            title: metadata.title.clone().unwrap_or_default(),
            analyst: DEFAULT_ANALYST.to_string(),
            proofreader: DEFAULT_PROOFREADER.to_string(),
        }
    }

    pub fn analyst<S: Into<String>>(mut self, analyst: S) -> Self {
        self.analyst = analyst.into();
        self
    }

    pub fn proofreader<S: Into<String>>(mut self, proofreader: S) -> Self {
        self.proofreader = proofreader.into();
        self
    }
}

/// Render the header block, one `Field: value` line each
pub fn render_header(context: &HeaderContext) -> Result<String, mustache::Error> {
    let template = mustache::compile_str(HEADER_TEMPLATE)?;
    template.render_to_string(context)
}
