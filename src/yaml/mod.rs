//! YAML file parsing with source-annotated diagnostics

use miette::{Diagnostic, IntoDiagnostic, NamedSource, Result, SourceSpan};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

/// YAML parse failure pointing at the offending location in the file
#[derive(Debug, Error, Diagnostic)]
#[error("failed to parse {filename}: {message}")]
#[diagnostic(code(kct::yaml::parse))]
pub struct YamlParseError {
    filename: String,

    #[source_code]
    src: NamedSource<String>,

    #[label("{message}")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlParseError {
    fn new(err: &serde_yml::Error, source: &str, path: &Path) -> Self {
        let offset = err
            .location()
            .map(|loc| loc.index().min(source.len().saturating_sub(1)))
            .unwrap_or(0);
        let message = err.to_string();
        let filename = path.display().to_string();

        Self {
            help: suggest_fix(&message),
            src: NamedSource::new(&filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            filename,
            message,
        }
    }
}

fn suggest_fix(message: &str) -> Option<String> {
    let lower = message.to_lowercase();

    if lower.contains("tab") {
        return Some("indent with spaces; YAML does not allow tabs".to_string());
    }
    if lower.contains("duplicate") {
        return Some("a key appears twice in the same mapping; remove one".to_string());
    }
    if lower.contains("mapping values are not allowed") {
        return Some("check for a missing space after ':' or inconsistent indentation".to_string());
    }

    None
}

/// Parse one entity file, wrapping failures with source diagnostics
pub fn parse_yaml_file<T: DeserializeOwned + 'static>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    serde_yml::from_str(&content)
        .map_err(|e| YamlParseError::new(&e, &content, path).into())
}
