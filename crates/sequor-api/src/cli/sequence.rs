//! Sequence catalog CLI commands: validate a file, list the directory.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use sequor_core::sequence::{DefinitionError, discover_sequences, load_sequence_file};

/// Validate a sequence YAML file and report every violation found.
pub fn validate_file(path: &Path, json: bool) -> Result<()> {
    match load_sequence_file(path) {
        Ok(def) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "valid": true,
                        "name": def.name,
                        "steps": def.steps.len(),
                    }))?
                );
            } else {
                println!();
                println!(
                    "  {} {} is a valid sequence ({}: {} steps)",
                    style("✓").green().bold(),
                    path.display(),
                    style(&def.name).cyan(),
                    def.steps.len()
                );
                println!();
            }
            Ok(())
        }
        Err(DefinitionError::ValidationError(err)) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "valid": false,
                        "violations": err.violations,
                    }))?
                );
            } else {
                println!();
                println!(
                    "  {} {} is not a valid sequence:",
                    style("✗").red().bold(),
                    path.display()
                );
                for violation in &err.violations {
                    println!("    {} {}", style("•").dim(), violation);
                }
                println!();
            }
            anyhow::bail!("sequence file failed validation");
        }
        Err(err) => Err(err.into()),
    }
}

/// List sequence definitions discovered under `dir`.
pub fn list_sequences(dir: &Path, json: bool) -> Result<()> {
    let discovered = discover_sequences(dir)?;

    if json {
        let entries: Vec<serde_json::Value> = discovered
            .iter()
            .map(|(path, def)| {
                serde_json::json!({
                    "name": def.name,
                    "description": def.description,
                    "steps": def.steps.len(),
                    "path": path,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if discovered.is_empty() {
        println!();
        println!(
            "  {} No sequences found in {}. Drop sequence YAML files there to get started.",
            style("i").blue().bold(),
            style(dir.display().to_string()).dim()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Steps").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("File").fg(Color::White),
    ]);

    for (path, def) in &discovered {
        table.add_row(vec![
            Cell::new(&def.name).fg(Color::Cyan),
            Cell::new(def.steps.len()),
            Cell::new(&def.description),
            Cell::new(path.display().to_string()),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_SEQUENCE: &str = "\
name: discovery-chain
steps:
  - name: recon
    job_template:
      adversary_id: a-1
";

    #[test]
    fn validate_file_accepts_valid_sequence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(VALID_SEQUENCE.as_bytes()).unwrap();
        assert!(validate_file(file.path(), true).is_ok());
    }

    #[test]
    fn validate_file_reports_structural_violations() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"name: broken\nsteps: []\n").unwrap();
        let err = validate_file(file.path(), true).unwrap_err();
        assert!(err.to_string().contains("failed validation"));
    }

    #[test]
    fn list_sequences_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");
        assert!(list_sequences(&missing, true).is_ok());
    }
}
