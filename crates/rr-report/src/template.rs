//! Static HTML template with literal `{{NAME}}` placeholders.
//!
//! Rendering is plain token replacement: there are no conditionals, loops or
//! escaping. Values are inserted verbatim, so callers must sanitize any
//! untrusted text themselves.

use crate::error::{ReportError, Result};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Placeholder names understood by the report generator.
pub mod tokens {
    /// Report title.
    pub const TITLE: &str = "TITLE";
    /// Evaluation value.
    pub const EVALUATION: &str = "EVALUATION";
    /// Free-form message.
    pub const MESSAGE: &str = "MESSAGE";
    /// Concatenated error pair rows.
    pub const ERROR_ROWS: &str = "ERROR_ROWS";
    /// Number of error pairs.
    pub const ERROR_COUNT: &str = "ERROR_COUNT";
    /// `<img>` markup (or placeholder) for result 1.
    pub const RESULT_1: &str = "RESULT_1";
    /// `<img>` markup (or placeholder) for result 2.
    pub const RESULT_2: &str = "RESULT_2";
    /// Bare relative path of result 1.
    pub const RESULT_1_SRC: &str = "RESULT_1_SRC";
    /// Bare relative path of result 2.
    pub const RESULT_2_SRC: &str = "RESULT_2_SRC";

    /// Every name above.
    pub const ALL: &[&str] = &[
        TITLE,
        EVALUATION,
        MESSAGE,
        ERROR_ROWS,
        ERROR_COUNT,
        RESULT_1,
        RESULT_2,
        RESULT_1_SRC,
        RESULT_2_SRC,
    ];

    /// Whether `name` is one of the generator's placeholders.
    pub fn is_known(name: &str) -> bool {
        ALL.contains(&name)
    }
}

const BUILTIN_TEMPLATE: &str = include_str!("templates/report.html");

/// Token name to replacement text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
}

impl Substitutions {
    /// Empty substitution set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the value for `name` (without braces).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace the value for `name` (without braces).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Loaded template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: Option<PathBuf>,
    text: String,
}

impl Template {
    /// Read a template file (UTF-8).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReportError::TemplateNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ReportError::io(path, e)
            }
        })?;
        Ok(Self {
            source: Some(path.to_path_buf()),
            text,
        })
    }

    /// The template shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_text(BUILTIN_TEMPLATE)
    }

    /// Wrap in-memory template text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: None,
            text: text.into(),
        }
    }

    /// File the template was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn tokens(&self) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut rest = self.text.as_str();
        while let Some(start) = rest.find("{{") {
            let candidate = &rest[start + 2..];
            match candidate.find("}}") {
                Some(end) if is_token_name(&candidate[..end]) => {
                    let name = &candidate[..end];
                    if !found.iter().any(|f| f == name) {
                        found.push(name.to_string());
                    }
                    rest = &candidate[end + 2..];
                }
                _ => rest = &rest[start + 1..],
            }
        }
        found
    }

    /// Substitute placeholders, leaving the template untouched.
    pub fn render(&self, substitutions: &Substitutions) -> String {
        render(&self.text, substitutions)
    }
}

fn is_token_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Replace every `{{NAME}}` that has a substitution, in a single pass.
///
/// Inserted text is never rescanned, so values containing `{{...}}` come
/// through literally. Placeholders without a substitution are kept as-is.
pub fn render(raw: &str, substitutions: &Substitutions) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start + 2..];
        let matched = candidate
            .find("}}")
            .and_then(|end| substitutions.get(&candidate[..end]).map(|value| (end, value)));
        match matched {
            Some((end, value)) => {
                out.push_str(value);
                rest = &candidate[end + 2..];
            }
            None => {
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
