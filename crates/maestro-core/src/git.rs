//! Version-control provenance of a project
//!
//! Asks `git` about the project directory. Anything short of a clean answer
//! (git not installed, not a repository, no commits) yields `None`.

use maestro_render::{GitProvenance, ProgramInfo};
use std::path::Path;
use tokio::process::Command;

/// Short program name shown in outputs
pub const PROGRAM_NAME: &str = "maestro";

/// Full program name used as document title
pub const PROGRAM_FULL_NAME: &str = "Maestro Procedure Composer";

/// Git provenance of `dir`, if it is inside a repository with commits
pub async fn discover(dir: &Path) -> Option<GitProvenance> {
    let head = git(dir, &["log", "-1", "--format=%h%n%cI"]).await?;
    let mut lines = head.lines();
    let hash = lines.next()?.trim().to_string();
    let date = commit_date(lines.next().unwrap_or_default().trim());
    if hash.is_empty() {
        return None;
    }

    let uncommitted = git(dir, &["status", "--porcelain"])
        .await
        .is_some_and(|status| !status.trim().is_empty());

    tracing::debug!(dir = %dir.display(), %hash, uncommitted, "discovered git provenance");
    Some(GitProvenance {
        hash,
        date,
        uncommitted,
    })
}

/// Program identity for documents rendered from `project_dir`
pub async fn program_info(project_dir: &Path, repo_url: Option<&str>) -> ProgramInfo {
    let info = ProgramInfo::new(PROGRAM_NAME, crate::VERSION)
        .with_full_name(PROGRAM_FULL_NAME)
        .with_git(discover(project_dir).await);
    match repo_url {
        Some(url) => info.with_repo_url(url),
        None => info,
    }
}

async fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .await
        .map_err(|e| tracing::debug!(error = %e, "git unavailable"))
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// `2024-01-05` from a strict ISO 8601 commit date; other text unchanged
fn commit_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_date_is_shortened() {
        assert_eq!(commit_date("2024-01-05T13:45:10+01:00"), "2024-01-05");
        assert_eq!(commit_date("yesterday"), "yesterday");
    }

    #[tokio::test]
    async fn plain_directory_has_no_provenance() {
        let dir = tempfile::tempdir().unwrap();
        // a temp dir is not a repository; git may also be absent
        assert_eq!(discover(dir.path()).await, None);
    }

    #[tokio::test]
    async fn program_info_carries_identity() {
        let dir = tempfile::tempdir().unwrap();
        let info = program_info(dir.path(), Some("https://example.org/p")).await;
        assert_eq!(info.name, PROGRAM_NAME);
        assert_eq!(info.full_name, PROGRAM_FULL_NAME);
        assert_eq!(info.repo_url.as_deref(), Some("https://example.org/p"));
        assert_eq!(info.git, None);
    }
}
