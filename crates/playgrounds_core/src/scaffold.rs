use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;
use serde_json::Value;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::connection::ConnectionTarget;
use crate::error::{ImportError, ImportResult};
use crate::snapshot::Snapshot;

pub const DEFAULT_INDEX_NAME: &str = "default";
pub const SEARCH_INDEX_FILENAME: &str = "search-index.json";
pub const SCRIPT_FILENAME: &str = "playground.mongodb.js";

const STRUCTURED_EXTENSIONS: &[&str] = &["json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub index_name: String,
    pub mappings: String,
    pub database_name: String,
    pub collection_name: String,
    pub aggregation_pipeline: String,
}

impl ProjectConfig {
    pub fn from_snapshot(snapshot: &Snapshot, target: &ConnectionTarget) -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            mappings: snapshot.search_config.index_definition.clone(),
            database_name: target.database_name.clone(),
            collection_name: target.collection_name.clone(),
            aggregation_pipeline: snapshot.search_config.aggregation_pipeline.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "search-index.json", escape = "none")]
struct SearchIndexTemplate<'a> {
    index_name: &'a str,
    database_name: &'a str,
    collection_name: &'a str,
    mappings: &'a str,
}

#[derive(Template)]
#[template(path = "playground.mongodb.js", escape = "none")]
struct ScriptTemplate<'a> {
    database_name: &'a str,
    collection_name: &'a str,
    aggregation_pipeline: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ScaffoldReport {
    pub project_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub formatted: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Materialize a fresh project directory from `config`.
///
/// `project_dir` must not exist yet. Any render or write failure aborts with
/// [`ImportError::ScaffoldFatal`]; JSON files that do not parse are left as
/// rendered and reported in [`ScaffoldReport::warnings`].
pub fn scaffold_project(
    project_dir: &Path,
    config: &ProjectConfig,
) -> ImportResult<ScaffoldReport> {
    fs::create_dir(project_dir).map_err(|err| {
        ImportError::ScaffoldFatal(format!(
            "failed to create {}: {err}",
            project_dir.display()
        ))
    })?;

    let rendered = render_files(config)?;
    let mut files = Vec::with_capacity(rendered.len());
    for (filename, content) in rendered {
        let path = project_dir.join(filename);
        fs::write(&path, content).map_err(|err| {
            ImportError::ScaffoldFatal(format!("failed to write {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), "wrote project file");
        files.push(path);
    }

    let (formatted, warnings) = format_structured_files(project_dir)?;
    Ok(ScaffoldReport {
        project_dir: project_dir.to_path_buf(),
        files,
        formatted,
        warnings,
    })
}

fn render_files(config: &ProjectConfig) -> ImportResult<Vec<(&'static str, String)>> {
    let search_index = SearchIndexTemplate {
        index_name: &config.index_name,
        database_name: &config.database_name,
        collection_name: &config.collection_name,
        mappings: &config.mappings,
    }
    .render()
    .map_err(|err| render_error(SEARCH_INDEX_FILENAME, err))?;

    let script = ScriptTemplate {
        database_name: &config.database_name,
        collection_name: &config.collection_name,
        aggregation_pipeline: &config.aggregation_pipeline,
    }
    .render()
    .map_err(|err| render_error(SCRIPT_FILENAME, err))?;
    let script = with_trailing_newline(script);

    Ok(vec![
        (SEARCH_INDEX_FILENAME, search_index),
        (SCRIPT_FILENAME, script),
    ])
}

fn with_trailing_newline(mut content: String) -> String {
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content
}

fn render_error(filename: &str, err: askama::Error) -> ImportError {
    ImportError::ScaffoldFatal(format!("failed to render {filename}: {err}"))
}

/// Re-indent every structured file under `dir` in place.
fn format_structured_files(dir: &Path) -> ImportResult<(Vec<PathBuf>, Vec<String>)> {
    let mut formatted = Vec::new();
    let mut warnings = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            ImportError::ScaffoldFatal(format!("failed to walk {}: {err}", dir.display()))
        })?;
        if !entry.file_type().is_file() || !is_structured(entry.path()) {
            continue;
        }
        let path = entry.path();
        let content = fs::read_to_string(path).map_err(|err| {
            ImportError::ScaffoldFatal(format!("failed to read {}: {err}", path.display()))
        })?;
        match format_json(&content) {
            Ok(pretty) => {
                fs::write(path, pretty).map_err(|err| {
                    ImportError::ScaffoldFatal(format!(
                        "failed to write {}: {err}",
                        path.display()
                    ))
                })?;
                formatted.push(path.to_path_buf());
            }
            Err(err) => {
                let message = format!("left {} unformatted: {err}", path.display());
                warn!("{message}");
                warnings.push(message);
            }
        }
    }
    Ok((formatted, warnings))
}

fn is_structured(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|ext| {
            STRUCTURED_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Two-space indentation, source key order, trailing newline.
pub fn format_json(content: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(content)?;
    let mut pretty = serde_json::to_string_pretty(&value)?;
    pretty.push('\n');
    Ok(pretty)
}
