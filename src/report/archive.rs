use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::report::{human, json};
use crate::runner::RunResult;

const INDEX_FILE: &str = "runs.jsonl";

/// 报告产物写入器
///
/// 文件名由集合名 slug + run id 组成，重复运行不会互相覆盖。
pub struct ReportWriter {
    out_dir: PathBuf,
}

/// One line per run in the shared index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub run_id: String,
    pub collection: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ReportWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.out_dir.exists() {
            fs::create_dir_all(&self.out_dir)?;
        }
        Ok(())
    }

    fn artifact_path(&self, run: &RunResult, extension: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}-{}.{}", slug(&run.collection), run.run_id, extension))
    }

    /// 写结构化报告，返回产物路径
    pub fn write_json(&self, run: &RunResult) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.artifact_path(run, "json");
        fs::write(&path, json::render(run)?)?;
        Ok(path)
    }

    /// 写人类可读报告，返回产物路径
    pub fn write_human(&self, run: &RunResult) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.artifact_path(run, "md");
        fs::write(&path, human::render(run))?;
        Ok(path)
    }

    /// Append a summary line to the shared run index.
    ///
    /// # Concurrency Strategy
    /// Independent collections may run concurrently and share one output
    /// directory. Artifact files never collide (unique run id in the name),
    /// but the index is shared, so the append happens under an exclusive
    /// `fs2` file lock. The lock is held only for the duration of the write.
    pub fn append_index(&self, run: &RunResult) -> Result<()> {
        self.ensure_dir()?;

        let entry = IndexEntry {
            run_id: run.run_id.clone(),
            collection: run.collection.clone(),
            started_at: run.started_at,
            duration_ms: run.duration_ms,
            total: run.totals.total,
            passed: run.totals.passed,
            failed: run.totals.failed,
            skipped: run.totals.skipped,
        };
        let line = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.out_dir.join(INDEX_FILE))?;

        file.lock_exclusive()?;
        writeln!(file, "{}", line)?;

        // Unlock happens when the handle drops
        drop(file);

        Ok(())
    }
}

/// 集合名转文件名安全的 slug
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        out.push_str("collection");
    }

    out
}
