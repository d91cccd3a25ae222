//! Structural selection of page sub-trees.

use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::Document;

/// A compiled CSS query. An empty query selects the whole document.
#[derive(Debug, Clone)]
pub struct StructuralQuery {
    selector: Option<Selector>,
}

impl StructuralQuery {
    /// Compile a query string.
    pub fn compile(query: &str) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Self { selector: None });
        }
        let selector =
            Selector::parse(query).map_err(|e| AppError::selector(query, format!("{e:?}")))?;
        Ok(Self {
            selector: Some(selector),
        })
    }

    pub fn is_whole_document(&self) -> bool {
        self.selector.is_none()
    }

    /// Every matching sub-tree in document order. No match yields an empty
    /// document, which callers must not mistake for "unchanged".
    pub fn select(&self, html: &Html) -> Document {
        match &self.selector {
            None => Document::from_html(html),
            Some(selector) => Document::from_elements(html.select(selector)),
        }
    }
}
