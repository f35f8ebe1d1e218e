//! Sequence definition parsing, validation, and filesystem operations.
//!
//! Converts between YAML files and the in-memory `SequenceDefinition`,
//! validates structural constraints (step names, job templates, fact filter
//! syntax), and provides discovery for sequence files on disk. Validation
//! collects every violation before failing so the caller gets one complete
//! error report.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sequor_types::error::ValidationError;
use sequor_types::sequence::{RecoveryAction, SequenceDefinition};
use thiserror::Error;

use crate::fact::is_valid_pattern;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading sequence definitions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// YAML parse failure.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Structural validation failure; lists every violation found.
    #[error(transparent)]
    ValidationError(#[from] ValidationError),

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a YAML string into a validated `SequenceDefinition`.
///
/// Runs `validate_definition` after deserialization, so the returned value
/// is guaranteed to be structurally valid.
pub fn parse_sequence_yaml(yaml: &str) -> Result<SequenceDefinition, DefinitionError> {
    let def: SequenceDefinition =
        serde_yaml_ng::from_str(yaml).map_err(|e| DefinitionError::ParseError(e.to_string()))?;
    validate_definition(&def)?;
    Ok(def)
}

/// Serialize a `SequenceDefinition` to a YAML string.
pub fn serialize_sequence_yaml(def: &SequenceDefinition) -> Result<String, DefinitionError> {
    serde_yaml_ng::to_string(def).map_err(|e| DefinitionError::ParseError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate structural constraints on a `SequenceDefinition`.
///
/// Checks:
/// - Sequence name is non-empty
/// - At least one step exists
/// - Every step has a non-empty name, unique within the sequence
/// - Every step has a non-empty job template
/// - `on_failure: fallback` steps carry a non-empty fallback template
/// - Every fact filter is a syntactically valid glob pattern
///
/// All violations are collected; the returned `ValidationError` enumerates
/// every one of them, not just the first.
pub fn validate_definition(def: &SequenceDefinition) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    if def.name.trim().is_empty() {
        violations.push("sequence name must not be empty".to_string());
    }
    if def.steps.is_empty() {
        violations.push("sequence must have at least one step".to_string());
    }

    let mut seen_names = HashSet::new();
    for (index, step) in def.steps.iter().enumerate() {
        // Position-based label so violations stay attributable even when
        // the name itself is the problem.
        let label = if step.name.trim().is_empty() {
            format!("step {}", index + 1)
        } else {
            format!("step '{}'", step.name)
        };

        if step.name.trim().is_empty() {
            violations.push(format!("{label} has an empty name"));
        } else if !seen_names.insert(step.name.as_str()) {
            violations.push(format!("duplicate step name: '{}'", step.name));
        }

        if step.job_template.is_empty() {
            violations.push(format!("{label} has an empty job template"));
        }

        if step.on_failure == RecoveryAction::Fallback && step.fallback_job_template.is_none() {
            violations.push(format!(
                "{label} is configured for fallback but has no fallback job template"
            ));
        }
        if let Some(fallback) = &step.fallback_job_template {
            if fallback.is_empty() {
                violations.push(format!("{label} has an empty fallback job template"));
            }
        }

        for pattern in &step.fact_filters {
            if !is_valid_pattern(pattern) {
                violations.push(format!("{label} has an invalid fact filter: '{pattern}'"));
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(violations))
    }
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

/// Load a sequence definition from a YAML file.
pub fn load_sequence_file(path: &Path) -> Result<SequenceDefinition, DefinitionError> {
    let content = std::fs::read_to_string(path)?;
    parse_sequence_yaml(&content)
}

/// Save a sequence definition to a YAML file.
///
/// Creates parent directories if they don't exist.
pub fn save_sequence_file(path: &Path, def: &SequenceDefinition) -> Result<(), DefinitionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serialize_sequence_yaml(def)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Discover all sequence YAML files under `base_dir`.
///
/// Scans for `.yaml` and `.yml` files recursively. Files that fail to parse
/// or validate are skipped with a warning -- they may not be sequences.
pub fn discover_sequences(
    base_dir: &Path,
) -> Result<Vec<(PathBuf, SequenceDefinition)>, DefinitionError> {
    let mut results = Vec::new();
    if !base_dir.exists() {
        return Ok(results);
    }
    discover_recursive(base_dir, &mut results)?;
    results.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(results)
}

fn discover_recursive(
    dir: &Path,
    results: &mut Vec<(PathBuf, SequenceDefinition)>,
) -> Result<(), DefinitionError> {
    let entries = std::fs::read_dir(dir)?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            discover_recursive(&path, results)?;
        } else if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                match load_sequence_file(&path) {
                    Ok(def) => results.push((path, def)),
                    Err(_) => {
                        tracing::warn!(?path, "skipping unparseable sequence file");
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve a sequence by name within `base_dir`.
///
/// Matches either the definition's `name` field or the file stem, so
/// `discovery` finds both `anything.yaml` with `name: discovery` and
/// `discovery.yaml`.
pub fn find_sequence(
    base_dir: &Path,
    name: &str,
) -> Result<Option<SequenceDefinition>, DefinitionError> {
    for (path, def) in discover_sequences(base_dir)? {
        if def.name == name {
            return Ok(Some(def));
        }
        if path.file_stem().and_then(|s| s.to_str()) == Some(name) {
            return Ok(Some(def));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
