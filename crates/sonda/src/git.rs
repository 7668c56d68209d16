//! Version-control status of a routine file.
//!
//! Shells out to `git` in the file's directory. Nothing here fails: a missing
//! `git` binary or a file outside any repository is reported in
//! [`GitStatus::message`].

use std::path::Path;
use std::process::Command;

use serde::Serialize;
use tracing::debug;

use crate::source::decode;

/// Git facts about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    /// Whether the file is inside a git work tree.
    pub tracked_repository: bool,
    /// Checked-out branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Porcelain status line for the file; `None` when unmodified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Last commit touching the file: `<hash> <date> <author> <subject>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    /// Why information is missing, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Collect git status for `file`.
#[must_use]
pub fn status(file: &Path) -> GitStatus {
    let Some(dir) = file.parent() else {
        return unavailable("file has no parent directory");
    };
    let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    let branch = match git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]) {
        Ok(branch) => branch,
        Err(message) => return unavailable(&message),
    };
    let status = git(dir, &["status", "--porcelain", "--", &file_name])
        .ok()
        .filter(|s| !s.is_empty());
    let last_commit = git(
        dir,
        &["log", "-1", "--date=short", "--format=%h %ad %an %s", "--", &file_name],
    )
    .ok()
    .filter(|s| !s.is_empty());

    GitStatus {
        tracked_repository: true,
        branch: Some(branch),
        status,
        last_commit,
        message: None,
    }
}

fn unavailable(message: &str) -> GitStatus {
    GitStatus {
        message: Some(message.to_string()),
        ..GitStatus::default()
    }
}

fn git(dir: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| format!("git is not available: {e}"))?;

    if output.status.success() {
        Ok(decode(output.stdout).trim().to_string())
    } else {
        let stderr = decode(output.stderr).trim().to_string();
        debug!(dir = %dir.display(), ?args, stderr = %stderr, "git command failed");
        Err(if stderr.is_empty() {
            format!("git {} failed", args.join(" "))
        } else {
            stderr
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_outside_repository_reports_message() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("PCMCTF43.prw");
        std::fs::write(&file, "User Function PCMCTF43()\n").unwrap();

        let result = status(&file);

        assert!(!result.tracked_repository);
        assert!(result.branch.is_none());
        assert!(result.message.is_some());
    }

    #[test]
    fn unavailable_serializes_only_message() {
        let json = serde_json::to_value(unavailable("no repo")).unwrap();
        assert_eq!(json, serde_json::json!({"tracked_repository": false, "message": "no repo"}));
    }
}
