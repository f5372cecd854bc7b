//! File and directory orchestration.
//!
//! One [`FileReport`] per analyzed file, one [`FunctionRecord`] per function
//! it contains. A function whose graph build fails still yields a record:
//! the error string is attached and, when the fallback is enabled, the
//! simplified splitter supplies a best-effort line set.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;

use crate::ast::{self, function_name, lower_function};
use crate::cfg::FlowGraph;
use crate::config::Config;
use crate::output::create_progress_bar;
use crate::splitter;

/// Split-line result of one function.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FunctionRecord {
    /// Function name.
    pub name: String,
    /// Sorted block boundary lines.
    pub split_lines: Vec<usize>,
    /// Present only when the graph build failed; `split_lines` then holds
    /// the degraded fallback result (or nothing, with the fallback off).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Split-line results of one file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileReport {
    /// Path of the analyzed file, as given.
    pub file: String,
    /// Per-function records in source order.
    pub functions: Vec<FunctionRecord>,
    /// Union of all function split lines, sorted.
    pub split_lines: Vec<usize>,
    /// Present only when the file could not be analyzed at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn failed(file: &str, error: String) -> Self {
        Self {
            file: file.to_owned(),
            functions: Vec::new(),
            split_lines: Vec::new(),
            error: Some(error),
        }
    }
}

/// Analyzes one source text.
///
/// `fallback` controls whether failed function builds degrade to the
/// simplified splitter instead of an empty line set.
#[must_use]
pub fn analyze_source(source: &str, file: &str, fallback: bool) -> FileReport {
    let tree = match ast::parse_tree(source) {
        Ok(tree) => tree,
        Err(err) => return FileReport::failed(file, err.to_string()),
    };
    let nodes = ast::function_nodes(tree.root_node());
    if nodes.is_empty() {
        let mut report =
            FileReport::failed(file, "no function definitions found".to_owned());
        if fallback {
            // Best effort for headers and snippets: every non-blank line.
            report.split_lines = source
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, _)| i + 1)
                .collect();
        }
        return report;
    }

    let mut functions = Vec::new();
    let mut merged = BTreeSet::new();
    for node in nodes {
        let name =
            function_name(node, source).unwrap_or_else(|| "<anonymous>".to_owned());
        let record = match lower_function(node, source)
            .and_then(|func| FlowGraph::from_function(&func))
        {
            Ok(graph) => FunctionRecord {
                name,
                split_lines: graph.split_lines(),
                error: None,
            },
            Err(err) => {
                let mut lines = Vec::new();
                if fallback {
                    if let Some(body) = node.child_by_field_name("body") {
                        splitter::collect_block_lines(body, &mut lines);
                        lines.sort_unstable();
                        lines.dedup();
                    }
                }
                FunctionRecord {
                    name,
                    split_lines: lines,
                    error: Some(err.to_string()),
                }
            }
        };
        merged.extend(record.split_lines.iter().copied());
        functions.push(record);
    }
    FileReport {
        file: file.to_owned(),
        functions,
        split_lines: merged.into_iter().collect(),
        error: None,
    }
}

/// Analyzes every matching file under the given paths in parallel.
///
/// Directories are walked gitignore-aware; explicit file arguments are
/// analyzed regardless of extension. Reports come back sorted by path.
pub fn analyze_paths(paths: &[PathBuf], config: &Config) -> Result<Vec<FileReport>> {
    let files = collect_source_files(paths, &config.extensions());
    let fallback = config.fallback();

    let progress = create_progress_bar(files.len() as u64);
    let mut reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let display = path.to_string_lossy().to_string();
            let report = match fs::read_to_string(path) {
                Ok(source) => analyze_source(&source, &display, fallback),
                Err(err) => FileReport::failed(&display, err.to_string()),
            };
            progress.inc(1);
            report
        })
        .collect();
    progress.finish_and_clear();

    reports.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(reports)
}

fn has_matching_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn collect_source_files(paths: &[PathBuf], extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        let walker = WalkBuilder::new(path)
            .hidden(true)
            .parents(true)
            .git_ignore(true)
            .git_exclude(true)
            .build();
        for entry in walker.flatten() {
            let entry_path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file())
                && has_matching_extension(entry_path, extensions)
            {
                files.push(entry_path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}
