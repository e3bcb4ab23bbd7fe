//! Git synchronization and health checks for a resource's working copy.
//!
//! Shells out to the git CLI rather than linking a git implementation. The only
//! output parsed is the `# branch.ab +<ahead> -<behind>` header of
//! `git status --porcelain=v2 --branch`:
//!
//! ```text
//! # branch.oid 3f2c...
//! # branch.head main
//! # branch.upstream origin/main
//! # branch.ab +0 -3        <- 3 commits to pull: unhealthy
//! ```

use crate::config::GitConfig;
use crate::error::{Error, Result};
use crate::types::{CommandResult, HealthCheckResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const BRANCH_AB_MARKER: &str = "# branch.ab ";

/// Ahead/behind counts against the upstream branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GitStatusResult {
    pub ahead: u64,
    pub behind: u64,
    pub has_remote_branch: bool,
}

impl GitStatusResult {
    pub fn is_up_to_date(&self) -> bool {
        self.behind == 0
    }
}

/// Parse `git status --porcelain=v2 --branch` output.
///
/// Without a `# branch.ab` line there is nothing to compare against, which is
/// not an error. A malformed `# branch.ab` line is.
pub fn parse_porcelain_status(output: &str) -> Result<GitStatusResult> {
    let Some(line) = output.lines().find(|l| l.starts_with(BRANCH_AB_MARKER)) else {
        return Ok(GitStatusResult::default());
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(Error::GitStatusParse(line.to_string()));
    }

    let ahead = parse_count(fields[2], '+').ok_or_else(|| Error::GitStatusParse(line.to_string()))?;
    let behind = parse_count(fields[3], '-').ok_or_else(|| Error::GitStatusParse(line.to_string()))?;

    Ok(GitStatusResult {
        ahead,
        behind,
        has_remote_branch: true,
    })
}

fn parse_count(field: &str, sign: char) -> Option<u64> {
    let digits = field.strip_prefix(sign)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Runs fetch/status/pull against one working copy.
#[derive(Debug, Clone)]
pub struct GitSyncEngine {
    program: String,
    working_dir: PathBuf,
}

impl GitSyncEngine {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: "git".to_string(),
            working_dir: working_dir.into(),
        }
    }

    /// Engine for `config`, using `fallback_dir` when no working dir is configured.
    pub fn from_config(config: &GitConfig, fallback_dir: &Path) -> Self {
        Self {
            program: config.program.clone(),
            working_dir: config
                .working_dir
                .clone()
                .unwrap_or_else(|| fallback_dir.to_path_buf()),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Run git with `args`. Cancellation stops waiting; the git process itself is
    /// left to finish on its own.
    async fn run(&self, args: &[&str], cancel: &CancellationToken) -> Result<Output> {
        debug!(args = ?args, dir = %self.working_dir.display(), "Running git command");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.working_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output();

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            output = output => output?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(args = ?args, stderr = %stderr.trim(), "Git command failed");
        }

        Ok(output)
    }

    /// Fetch, then compare the local branch with its upstream.
    pub async fn fetch_and_check_status(&self, cancel: &CancellationToken) -> HealthCheckResult {
        self.fetch_and_status(cancel).await.0
    }

    /// Like [`fetch_and_check_status`](Self::fetch_and_check_status), also
    /// returning the parsed comparison when one was obtained.
    pub async fn fetch_and_status(
        &self,
        cancel: &CancellationToken,
    ) -> (HealthCheckResult, Option<GitStatusResult>) {
        match self.run(&["fetch"], cancel).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                return (HealthCheckResult::unhealthy(failure_text("fetch failed", &output)), None);
            }
            Err(Error::Cancelled) => return (HealthCheckResult::unknown("cancelled"), None),
            Err(e) => return (HealthCheckResult::unhealthy(format!("fetch failed: {}", e)), None),
        }

        match self.status(cancel).await {
            Ok(status) if status.is_up_to_date() => (HealthCheckResult::healthy(), Some(status)),
            Ok(status) => {
                info!(
                    dir = %self.working_dir.display(),
                    behind = status.behind,
                    "Working copy is behind its upstream"
                );
                (HealthCheckResult::unhealthy("not up to date"), Some(status))
            }
            Err(Error::Cancelled) => (HealthCheckResult::unknown("cancelled"), None),
            Err(e @ Error::GitStatusParse(_)) => {
                error!(dir = %self.working_dir.display(), error = %e, "Unparseable git status");
                (HealthCheckResult::unhealthy(e.to_string()), None)
            }
            Err(e) => (HealthCheckResult::unhealthy(e.to_string()), None),
        }
    }

    /// Query and parse the branch comparison without fetching.
    pub async fn status(&self, cancel: &CancellationToken) -> Result<GitStatusResult> {
        let output = self
            .run(&["status", "--porcelain=v2", "--branch"], cancel)
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::command_failed("git status", other.to_string()),
            })?;

        if !output.status.success() {
            return Err(Error::Other(failure_text("status failed", &output)));
        }

        parse_porcelain_status(&String::from_utf8_lossy(&output.stdout))
    }

    /// Pull. `error_message` carries git's stderr whatever the outcome.
    pub async fn pull(&self, cancel: &CancellationToken) -> CommandResult {
        let output = match self.run(&["pull"], cancel).await {
            Ok(output) => output,
            Err(e) => return CommandResult::failure(e.to_string()),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if output.status.success() {
            info!(dir = %self.working_dir.display(), "Pulled latest changes");
            CommandResult {
                success: true,
                error_message: Some(stderr),
            }
        } else {
            CommandResult::failure(failure_text("pull failed", &output))
        }
    }
}

/// `<what>: <stderr>`, falling back to the exit status when stderr is empty.
fn failure_text(what: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("{} ({})", what, output.status)
    } else {
        format!("{}: {}", what, stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HealthStatus;

    #[test]
    fn test_parse_behind_is_unhealthy() {
        let status = parse_porcelain_status("# branch.ab +0 -3").unwrap();
        assert_eq!(
            status,
            GitStatusResult {
                ahead: 0,
                behind: 3,
                has_remote_branch: true
            }
        );
        assert!(!status.is_up_to_date());
    }

    #[test]
    fn test_parse_ahead_only_is_up_to_date() {
        let status = parse_porcelain_status("# branch.ab +2 -0").unwrap();
        assert_eq!(status.ahead, 2);
        assert!(status.is_up_to_date());
    }

    #[test]
    fn test_parse_full_output() {
        let output = "# branch.oid 3f2c1a\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +1 -4\n1 .M N... 100644 100644 100644 a b src/lib.rs\n";
        let status = parse_porcelain_status(output).unwrap();
        assert_eq!((status.ahead, status.behind), (1, 4));
    }

    #[test]
    fn test_parse_without_upstream() {
        let output = "# branch.oid 3f2c1a\n# branch.head feature/x\n";
        let status = parse_porcelain_status(output).unwrap();
        assert!(!status.has_remote_branch);
        assert!(status.is_up_to_date());
        assert!(parse_porcelain_status("").unwrap().is_up_to_date());
    }

    #[test]
    fn test_parse_malformed_lines_fail() {
        for line in [
            "# branch.ab +1",
            "# branch.ab ",
            "# branch.ab +x -1",
            "# branch.ab +1 -y",
            "# branch.ab 1 -1",
            "# branch.ab +1 3",
            "# branch.ab -1 +1",
            "# branch.ab + -",
        ] {
            assert!(
                matches!(parse_porcelain_status(line), Err(Error::GitStatusParse(_))),
                "expected parse failure for {:?}",
                line
            );
        }
    }

    #[cfg(unix)]
    mod with_fake_git {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        /// Write a shell script standing in for git; `body` sees git's args.
        fn fake_git(body: &str) -> (TempDir, GitSyncEngine) {
            let dir = tempfile::tempdir().unwrap();
            let script = dir.path().join("fake-git");
            std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

            let engine = GitSyncEngine::new(dir.path()).with_program(script.to_string_lossy());
            (dir, engine)
        }

        const BEHIND: &str = r#"
case "$1" in
  fetch) exit 0 ;;
  status)
    [ "$2" = "--porcelain=v2" ] && [ "$3" = "--branch" ] || exit 9
    printf '# branch.oid abc\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +0 -3\n'
    ;;
esac
"#;

        #[tokio::test]
        async fn test_health_behind_upstream() {
            let (_dir, engine) = fake_git(BEHIND);
            let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
            assert_eq!(health, HealthCheckResult::unhealthy("not up to date"));
        }

        #[tokio::test]
        async fn test_fetch_and_status_queries_once() {
            let (dir, engine) = fake_git(&format!(
                "echo \"$1\" >> \"$(dirname \"$0\")/calls\"\n{}",
                BEHIND
            ));

            let (health, status) = engine.fetch_and_status(&CancellationToken::new()).await;
            assert_eq!(health, HealthCheckResult::unhealthy("not up to date"));
            let status = status.unwrap();
            assert_eq!((status.ahead, status.behind), (0, 3));
            assert!(status.has_remote_branch);

            let calls = std::fs::read_to_string(dir.path().join("calls")).unwrap();
            assert_eq!(calls, "fetch\nstatus\n");
        }

        #[tokio::test]
        async fn test_health_up_to_date() {
            let (_dir, engine) = fake_git(
                r#"[ "$1" = "status" ] && printf '# branch.head main\n# branch.ab +2 -0\n'; exit 0"#,
            );
            let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
            assert_eq!(health.status, HealthStatus::Healthy);
        }

        #[tokio::test]
        async fn test_health_without_upstream() {
            let (_dir, engine) = fake_git(
                r#"[ "$1" = "status" ] && printf '# branch.head main\n'; exit 0"#,
            );
            let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
            assert!(health.is_healthy());
        }

        #[tokio::test]
        async fn test_health_fetch_failure() {
            let (_dir, engine) = fake_git(
                r#"[ "$1" = "fetch" ] && { echo "fatal: unable to access remote" >&2; exit 128; }; exit 0"#,
            );
            let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
            assert_eq!(health.status, HealthStatus::Unhealthy);
            assert_eq!(
                health.description.as_deref(),
                Some("fetch failed: fatal: unable to access remote")
            );
        }

        #[tokio::test]
        async fn test_health_status_failure_without_stderr() {
            let (_dir, engine) = fake_git(r#"[ "$1" = "status" ] && exit 2; exit 0"#);
            let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
            assert_eq!(health.status, HealthStatus::Unhealthy);
            let description = health.description.unwrap();
            assert!(description.starts_with("status failed"));
        }

        #[tokio::test]
        async fn test_health_malformed_status() {
            let (_dir, engine) = fake_git(
                r#"[ "$1" = "status" ] && printf '# branch.ab +1\n'; exit 0"#,
            );
            let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
            assert_eq!(health.status, HealthStatus::Unhealthy);
            assert!(health.description.unwrap().contains("Malformed git status line"));
        }

        #[tokio::test]
        async fn test_health_cancelled() {
            let (_dir, engine) = fake_git("sleep 5");
            let cancel = CancellationToken::new();
            cancel.cancel();
            let health = engine.fetch_and_check_status(&cancel).await;
            assert_eq!(health.status, HealthStatus::Unknown);
        }

        #[tokio::test]
        async fn test_status_reports_counts() {
            let (_dir, engine) = fake_git(BEHIND);
            let status = engine.status(&CancellationToken::new()).await.unwrap();
            assert_eq!(status.behind, 3);
            assert!(status.has_remote_branch);
        }

        #[tokio::test]
        async fn test_pull_success_keeps_stderr() {
            let (_dir, engine) = fake_git(
                r#"[ "$1" = "pull" ] && { echo "From origin" >&2; echo "Updating 1..2"; }; exit 0"#,
            );
            let result = engine.pull(&CancellationToken::new()).await;
            assert!(result.success);
            assert_eq!(result.error_message.as_deref(), Some("From origin"));
        }

        #[tokio::test]
        async fn test_pull_success_with_empty_stderr() {
            let (_dir, engine) = fake_git("exit 0");
            let result = engine.pull(&CancellationToken::new()).await;
            assert!(result.success);
            assert_eq!(result.error_message.as_deref(), Some(""));
        }

        #[tokio::test]
        async fn test_pull_failure() {
            let (_dir, engine) = fake_git(
                r#"echo "error: Your local changes would be overwritten" >&2; exit 1"#,
            );
            let result = engine.pull(&CancellationToken::new()).await;
            assert!(!result.success);
            assert_eq!(
                result.error_message.as_deref(),
                Some("pull failed: error: Your local changes would be overwritten")
            );
        }

        #[tokio::test]
        async fn test_pull_failure_without_stderr() {
            let (_dir, engine) = fake_git("exit 1");
            let result = engine.pull(&CancellationToken::new()).await;
            assert!(!result.success);
            assert!(!result.error_message.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_git_binary() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GitSyncEngine::new(dir.path()).with_program("/nonexistent/git");

        let health = engine.fetch_and_check_status(&CancellationToken::new()).await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.description.unwrap().starts_with("fetch failed"));

        let result = engine.pull(&CancellationToken::new()).await;
        assert!(!result.success);
        assert!(!result.error_message.unwrap().is_empty());
    }

    #[test]
    fn test_status_without_git_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GitSyncEngine::new(dir.path()).with_program("/nonexistent/git");

        let err = tokio_test::assert_err!(tokio_test::block_on(
            engine.status(&CancellationToken::new())
        ));
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[test]
    fn test_from_config_falls_back_to_dir() {
        let config = GitConfig::default();
        let engine = GitSyncEngine::from_config(&config, Path::new("/src/shop"));
        assert_eq!(engine.working_dir(), Path::new("/src/shop"));

        let config = GitConfig {
            program: "git".to_string(),
            working_dir: Some(PathBuf::from("/src/other")),
        };
        let engine = GitSyncEngine::from_config(&config, Path::new("/src/shop"));
        assert_eq!(engine.working_dir(), Path::new("/src/other"));
    }
}
