//! Check command implementation
//!
//! Provides the `mixfix check` command with support for:
//! - Multiple unit files and directories
//! - S-expression, pretty or JSON tree output
//! - JSON diagnostics for editor integration

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::frontend::parser::ParseOptions;
use crate::frontend::registry::OperatorTable;
use crate::frontend::session::{run_unit, SessionError, UnitSource};
use crate::frontend::tree::ParseNode;
use crate::util::config::{EngineConfig, OutputFormat, CONFIG_FILE_NAME};
use crate::util::diagnostic::emitter::json::LspDiagnostic;
use crate::util::diagnostic::{Diagnostic, EmitterConfig, JsonEmitter, TextEmitter, ToDiagnostic};
use crate::util::span::SourceFile;

/// Unit file extension
pub const UNIT_EXTENSION: &str = "ron";

/// Options for the check command
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    /// Tree output format; `Json` also switches diagnostics to JSON
    pub format: OutputFormat,
    /// Colored diagnostics
    pub colors: bool,
    /// Expand chains before printing
    pub desugar_chains: bool,
    /// Parse each unit's expressions on the rayon pool
    pub parallel: bool,
    pub parse: ParseOptions,
}

impl From<&EngineConfig> for CheckOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            format: config.output.format,
            colors: config.output.colors,
            desugar_chains: config.output.desugar_chains,
            parallel: config.parser.parallel,
            parse: ParseOptions {
                juxtaposition: config.parser.juxtaposition,
            },
        }
    }
}

/// Result of one expression: the printed tree, or its diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionOutcome {
    pub text: String,
    pub output: Result<String, Vec<Diagnostic>>,
}

/// Result of one unit file
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub path: PathBuf,
    /// Set when the unit could not be loaded or declared
    pub failure: Option<UnitFailure>,
    pub expressions: Vec<ExpressionOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub message: String,
    pub diagnostic: Option<Diagnostic>,
}

impl From<SessionError> for UnitFailure {
    fn from(error: SessionError) -> Self {
        Self {
            diagnostic: error.diagnostic(),
            message: error.to_string(),
        }
    }
}

impl UnitOutcome {
    pub fn has_errors(&self) -> bool {
        self.failure.is_some() || self.expressions.iter().any(|e| e.output.is_err())
    }
}

/// Check every unit under `paths`; returns whether all of them passed
pub fn check_paths(
    paths: &[PathBuf],
    options: &CheckOptions,
) -> Result<bool> {
    let files = collect_unit_files(paths)?;
    if files.is_empty() {
        eprintln!("No .{} unit files found in the specified paths", UNIT_EXTENSION);
        return Ok(true);
    }

    let outcomes: Vec<UnitOutcome> = files
        .iter()
        .map(|file| check_unit_file(file, options))
        .collect();

    if options.format == OutputFormat::Json {
        output_json(&outcomes)?;
    } else {
        output_text(&outcomes, options);
    }

    let failed = outcomes.iter().filter(|o| o.has_errors()).count();
    tracing::info!(units = outcomes.len(), failed, "check finished");
    if failed == 0 && options.format != OutputFormat::Json {
        println!(
            "✓ All checks passed ({} unit{})",
            files.len(),
            if files.len() == 1 { "" } else { "s" }
        );
    }
    Ok(failed == 0)
}

/// Load, declare and parse a single unit file
pub fn check_unit_file(
    path: &Path,
    options: &CheckOptions,
) -> UnitOutcome {
    let mut outcome = UnitOutcome {
        path: path.to_path_buf(),
        failure: None,
        expressions: Vec::new(),
    };
    let unit = match UnitSource::load(path) {
        Ok(unit) => unit,
        Err(error) => {
            outcome.failure = Some(error.into());
            return outcome;
        }
    };

    match run_unit(&unit, &options.parse, options.parallel) {
        Ok((frozen, reports)) => {
            outcome.expressions = reports
                .into_iter()
                .map(|report| ExpressionOutcome {
                    output: match report.result {
                        Ok(node) => Ok(render_tree(&node, &frozen.snapshot, options)),
                        Err(errors) => Err(errors.iter().map(ToDiagnostic::to_diagnostic).collect()),
                    },
                    text: report.text,
                })
                .collect();
        }
        Err(error) => outcome.failure = Some(error.into()),
    }
    outcome
}

/// Print a tree in the configured format
pub fn render_tree(
    node: &ParseNode,
    table: &OperatorTable,
    options: &CheckOptions,
) -> String {
    let desugared;
    let node = if options.desugar_chains {
        desugared = node.desugar_chains(table);
        &desugared
    } else {
        node
    };
    match options.format {
        OutputFormat::Sexp => node.sexp(table).to_string(),
        OutputFormat::Pretty => node.to_source(table),
        OutputFormat::Json => serde_json::to_string(node).unwrap_or_else(|_| "null".to_string()),
    }
}

/// Output results in JSON format
fn output_json(outcomes: &[UnitOutcome]) -> Result<()> {
    #[derive(Serialize)]
    struct ExpressionResult<'a> {
        text: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        tree: Option<serde_json::Value>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        diagnostics: Vec<LspDiagnostic>,
    }

    #[derive(Serialize)]
    struct UnitResult<'a> {
        file: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<&'a str>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        diagnostics: Vec<LspDiagnostic>,
        expressions: Vec<ExpressionResult<'a>>,
    }

    let results: Vec<UnitResult<'_>> = outcomes
        .iter()
        .map(|outcome| UnitResult {
            file: outcome.path.display().to_string(),
            error: outcome.failure.as_ref().map(|f| f.message.as_str()),
            diagnostics: outcome
                .failure
                .iter()
                .filter_map(|f| f.diagnostic.as_ref())
                .map(JsonEmitter::to_lsp_diagnostic)
                .collect(),
            expressions: outcome
                .expressions
                .iter()
                .map(|expression| match &expression.output {
                    Ok(tree) => ExpressionResult {
                        text: &expression.text,
                        tree: serde_json::from_str(tree).ok(),
                        diagnostics: Vec::new(),
                    },
                    Err(diagnostics) => ExpressionResult {
                        text: &expression.text,
                        tree: None,
                        diagnostics: diagnostics.iter().map(JsonEmitter::to_lsp_diagnostic).collect(),
                    },
                })
                .collect(),
        })
        .collect();

    let json = serde_json::to_string_pretty(&results).context("Failed to encode results")?;
    println!("{}", json);
    Ok(())
}

/// Output trees to stdout and diagnostics to stderr
fn output_text(
    outcomes: &[UnitOutcome],
    options: &CheckOptions,
) {
    let emitter = TextEmitter::with_config(EmitterConfig {
        use_colors: options.colors,
        ..Default::default()
    });

    for outcome in outcomes {
        let file = outcome.path.display().to_string();
        if let Some(failure) = &outcome.failure {
            match &failure.diagnostic {
                Some(diagnostic) => eprintln!("{}: {}", file, emitter.render(diagnostic)),
                None => eprintln!("error: {}", failure.message),
            }
            continue;
        }

        for (index, expression) in outcome.expressions.iter().enumerate() {
            match &expression.output {
                Ok(tree) => println!("{}", tree),
                Err(diagnostics) => {
                    let source =
                        SourceFile::new(format!("{}#{}", file, index + 1), expression.text.clone());
                    for diagnostic in diagnostics {
                        eprintln!("{}", emitter.render_with_source(diagnostic, Some(&source)));
                    }
                }
            }
        }
    }
}

/// Collect all unit files from the given paths
pub fn collect_unit_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let is_unit = |path: &Path| {
        path.extension().and_then(|s| s.to_str()) == Some(UNIT_EXTENSION)
            && path.file_name().and_then(|s| s.to_str()) != Some(CONFIG_FILE_NAME)
    };
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(anyhow::anyhow!("Path does not exist: {}", path.display()));
        }

        if path.is_file() {
            if is_unit(path) {
                files.push(path.clone());
            } else {
                eprintln!("Warning: Skipping non-unit file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
                let entry = entry.with_context(|| {
                    format!("Failed to read directory entry in {}", path.display())
                })?;
                if entry.file_type().is_file() && is_unit(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const UNIT: &str = r#"(
        directives: [
            Category((name: "Add")),
            Operator(name: "plus", form: "$a + $b", category: "Add", right: Some(strict)),
            Import(operator: "plus"),
        ],
        expressions: [(text: "a + b + c"), (text: "a b")],
    )"#;

    fn options() -> CheckOptions {
        CheckOptions::from(&EngineConfig::default())
    }

    #[test]
    fn test_collect_skips_config_and_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("nested");
        fs::create_dir(&subdir).unwrap();
        fs::write(temp_dir.path().join("a.ron"), UNIT).unwrap();
        fs::write(subdir.join("b.ron"), UNIT).unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "()").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "not a unit").unwrap();

        let files = collect_unit_files(&[temp_dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(collect_unit_files(&[temp_dir.path().join("missing")]).is_err());
    }

    #[test]
    fn test_check_unit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("unit.ron");
        fs::write(&path, UNIT).unwrap();

        let outcome = check_unit_file(&path, &options());
        assert!(outcome.failure.is_none());
        assert!(outcome.has_errors());
        assert_eq!(
            outcome.expressions[0].output,
            Ok("(plus (plus a b) c)".to_string())
        );
        let diagnostics = outcome.expressions[1].output.as_ref().unwrap_err();
        assert_eq!(diagnostics[0].code, "E0302");
    }

    #[test]
    fn test_pretty_and_json_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("unit.ron");
        fs::write(&path, UNIT).unwrap();

        let mut options = options();
        options.format = OutputFormat::Pretty;
        let outcome = check_unit_file(&path, &options);
        assert_eq!(
            outcome.expressions[0].output,
            Ok("( a + b ) + c".to_string())
        );

        options.format = OutputFormat::Json;
        let outcome = check_unit_file(&path, &options);
        let tree = outcome.expressions[0].output.as_ref().unwrap();
        let value: serde_json::Value = serde_json::from_str(tree).unwrap();
        assert!(value.get("Apply").is_some());
    }

    #[test]
    fn test_declaration_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.ron");
        fs::write(
            &path,
            r#"(directives: [Operator(name: "plus", form: "$a + $b", category: "Nope")])"#,
        )
        .unwrap();

        let outcome = check_unit_file(&path, &options());
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.diagnostic.unwrap().code, "E0102");
        assert!(outcome.expressions.is_empty());
    }

    #[test]
    fn test_malformed_unit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.ron");
        fs::write(&path, "(directives: [").unwrap();

        let outcome = check_unit_file(&path, &options());
        let failure = outcome.failure.unwrap();
        assert!(failure.diagnostic.is_none());
        assert!(failure.message.starts_with("malformed unit"));
    }
}
