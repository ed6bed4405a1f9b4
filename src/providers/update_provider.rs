use std::path::{Path, PathBuf};
use std::process::Output;

use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const UPDATE_LOG_TAIL: usize = 50;

/// Result of comparing the working tree against `origin/main`
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCheck {
    pub update_count: u32,
    /// First 8 characters of HEAD, or "unknown"
    pub current_version: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateLogs {
    pub lines: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateApply {
    pub success: bool,
    pub details: String,
}

/// Version-control operations behind the admin update endpoints
///
/// Nothing here returns an error: git or filesystem failures are folded
/// into the result so the endpoints can answer with `status: "error"`.
pub struct UpdateProvider {
    repository_dir: PathBuf,
}

impl UpdateProvider {
    pub fn new(repository_dir: impl Into<PathBuf>) -> Self {
        Self {
            repository_dir: repository_dir.into(),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.repository_dir.join("logs").join("updates.log")
    }

    async fn git(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.repository_dir)
            .output()
            .await
    }

    pub async fn check(&self) -> UpdateCheck {
        let current_version = match self.git(&["rev-parse", "HEAD"]).await {
            Ok(out) if out.status.success() => {
                let hash = String::from_utf8_lossy(&out.stdout).trim().to_string();
                hash.chars().take(8).collect()
            }
            Ok(_) => "unknown".to_string(),
            Err(e) => {
                tracing::warn!("git rev-parse failed to start: {}", e);
                return UpdateCheck {
                    update_count: 0,
                    current_version: "unknown".to_string(),
                    error: Some(e.to_string()),
                };
            }
        };

        if let Err(e) = self.git(&["fetch", "origin"]).await {
            tracing::warn!("git fetch failed to start: {}", e);
        }

        let update_count = match self.git(&["rev-list", "--count", "HEAD..origin/main"]).await {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().parse().unwrap_or(0),
            Ok(_) => 0,
            Err(e) => {
                return UpdateCheck {
                    update_count: 0,
                    current_version,
                    error: Some(e.to_string()),
                };
            }
        };

        UpdateCheck {
            update_count,
            current_version,
            error: None,
        }
    }

    /// Last lines of the update log; a missing log is an empty list
    pub async fn logs(&self) -> UpdateLogs {
        let path = self.log_path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return UpdateLogs { lines: Vec::new(), error: None };
        }

        match fs::read_to_string(&path).await {
            Ok(contents) => UpdateLogs {
                lines: tail(&contents, UPDATE_LOG_TAIL),
                error: None,
            },
            Err(e) => UpdateLogs {
                lines: vec![format!("Error reading logs: {}", e)],
                error: Some(e.to_string()),
            },
        }
    }

    /// `git pull origin main`, bracketed by two log lines
    pub async fn apply(&self, initiated_by: &str) -> UpdateApply {
        if let Err(e) = self.append_log(&format!("Update initiated by {}", initiated_by)).await {
            return UpdateApply {
                success: false,
                details: format!("Update process failed: {}", e),
            };
        }

        let (success, details) = match self.git(&["pull", "origin", "main"]).await {
            Ok(out) if out.status.success() => (true, String::from_utf8_lossy(&out.stdout).trim().to_string()),
            Ok(out) => (false, String::from_utf8_lossy(&out.stderr).trim().to_string()),
            Err(e) => (false, e.to_string()),
        };

        let outcome = if success { "successful" } else { "failed" };
        if let Err(e) = self.append_log(&format!("Update {}: {}", outcome, details)).await {
            tracing::warn!("Could not record update outcome: {}", e);
        }

        UpdateApply { success, details }
    }

    async fn append_log(&self, message: &str) -> std::io::Result<()> {
        let path = self.log_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        let line = format!("[{}] {}\n", Utc::now().to_rfc3339(), message);
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    pub fn repository_dir(&self) -> &Path {
        &self.repository_dir
    }
}

fn tail(contents: &str, count: usize) -> Vec<String> {
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].iter().map(|line| line.trim().to_string()).collect()
}
