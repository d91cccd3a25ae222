//! Inclusion and exclusion patterns applied to reduced text.

use regex::Regex;

use crate::error::{AppError, Result};

/// Compiled inclusion/exclusion patterns of a target.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl Filter {
    /// Compile the patterns. `None` or empty disables that stage.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A filter that only keeps the exclusion stage.
    pub fn exclusion_only(&self) -> Self {
        Self {
            include: None,
            exclude: self.exclude.clone(),
        }
    }

    /// Keep every inclusion match on its own line, then delete every
    /// exclusion match.
    pub fn apply(&self, text: &str) -> String {
        let included = match &self.include {
            Some(include) => include.find_iter(text).fold(String::new(), |mut out, m| {
                out.push_str(m.as_str());
                out.push('\n');
                out
            }),
            None => text.to_string(),
        };

        match &self.exclude {
            Some(exclude) => exclude.replace_all(&included, "").into_owned(),
            None => included,
        }
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| Regex::new(p).map_err(|e| AppError::pattern(p, e)))
        .transpose()
}
