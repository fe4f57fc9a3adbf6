//! Parse every statement in a directory concurrently.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_import::{ImportSummary, ImportableTransaction, project};
use tally_ingest::StatementParser;

use crate::load_statement;

/// A `*.pdf` with its extractor output in a sibling `*.json`.
#[derive(Debug, Clone)]
pub struct StatementFiles {
    pub pdf: PathBuf,
    pub text_runs: PathBuf,
}

pub fn discover(dir: &Path) -> Result<Vec<StatementFiles>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let pdf = entry?.path();
        let is_pdf = pdf
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }
        let text_runs = pdf.with_extension("json");
        if text_runs.exists() {
            found.push(StatementFiles { pdf, text_runs });
        } else {
            warn!("no text runs next to {}, skipping", pdf.display());
        }
    }
    found.sort_by(|a, b| a.pdf.file_name().cmp(&b.pdf.file_name()));
    Ok(found)
}

/// Each statement is parsed on the blocking pool; results come back in
/// file-name order regardless of completion order.
pub async fn run(
    parser: StatementParser,
    files: Vec<StatementFiles>,
    account: &str,
) -> Result<(Vec<ImportableTransaction>, ImportSummary)> {
    let parser = Arc::new(parser);
    let handles: Vec<_> = files
        .into_iter()
        .map(|files| {
            let parser = Arc::clone(&parser);
            let account = account.to_string();
            tokio::task::spawn_blocking(move || {
                let result = load_statement(&files.pdf, &files.text_runs).and_then(|(pdf, doc)| {
                    parser
                        .parse(&pdf, &doc)
                        .with_context(|| format!("parsing {}", files.pdf.display()))
                });
                (files, result.map(|outcome| {
                    let records = project(&outcome.statement, &account);
                    let summary = ImportSummary::new(records.len(), outcome.skipped_entries());
                    (records, summary)
                }))
            })
        })
        .collect();

    let mut records = Vec::new();
    let mut total = ImportSummary::default();
    for handle in handles {
        let (files, result) = handle.await.context("statement worker panicked")?;
        match result {
            Ok((mut batch, summary)) => {
                info!("{}: {summary}", files.pdf.display());
                records.append(&mut batch);
                total.merge(summary);
            }
            Err(err) => warn!("{}: {err:#}", files.pdf.display()),
        }
    }
    Ok((records, total))
}
