//! Debugger attachment.
//!
//! Two strategies, chosen by [`DebuggerConfig`]:
//!
//! - **url**: POST (empty body) to `<preferred base url><path>`, letting the
//!   application attach a debugger to itself.
//! - **attach**: take the pid the orchestrator reported, walk down to the real
//!   worker process (skipping the launcher), and spawn the configured debugger
//!   with `<pid>` substituted in its argument template.
//!
//! Neither strategy retries. The spawned debugger is detached and outlives the
//! attach call.

use crate::config::{DebuggerConfig, PID_PLACEHOLDER};
use crate::error::{Error, Result};
use crate::process::{AncestryResolver, ProcessInfo};
use crate::snapshot::ResourceSnapshotStore;
use crate::types::CommandResult;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the configured attach strategy against a resource.
#[derive(Clone)]
pub struct DebuggerAttachment {
    store: Arc<ResourceSnapshotStore>,
    resolver: AncestryResolver,
    strategy: DebuggerConfig,
    http: reqwest::Client,
}

impl DebuggerAttachment {
    pub fn new(
        store: Arc<ResourceSnapshotStore>,
        resolver: AncestryResolver,
        strategy: DebuggerConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            strategy,
            http: reqwest::Client::new(),
        }
    }

    /// Attach a debugger to `resource`, reporting the outcome uniformly.
    pub async fn attach(&self, resource: &str, cancel: &CancellationToken) -> CommandResult {
        let result = match &self.strategy {
            DebuggerConfig::Url { path } => self.attach_via_url(resource, path, cancel).await,
            DebuggerConfig::Attach {
                program,
                arguments,
                launcher_process_names,
            } => self
                .attach_to_process(resource, program, arguments, launcher_process_names, cancel)
                .await
                .map(|_| ()),
        };

        if let Err(ref e) = result {
            warn!(resource = %resource, error = %e, "Debugger attach failed");
        }
        result.into()
    }

    async fn attach_via_url(
        &self,
        resource: &str,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let base_url = self
            .store
            .get_preferred_url(resource)
            .ok_or(Error::NoUrlFound)?;
        let url = join_url(&base_url, path);
        debug!(resource = %resource, url = %url, "Requesting debugger attach");

        let request = self.http.post(&url).body("").send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        info!(resource = %resource, url = %url, "Debugger attach requested");
        Ok(())
    }

    /// Returns the pid the debugger was attached to.
    async fn attach_to_process(
        &self,
        resource: &str,
        program: &str,
        arguments: &str,
        launcher_process_names: &[String],
        cancel: &CancellationToken,
    ) -> Result<u32> {
        let root_pid = self.store.get_pid(resource).ok_or(Error::NoPidFound)?;

        // Enumerating the process table blocks
        let resolver = self.resolver.clone();
        let launchers = launcher_process_names.to_vec();
        let search = tokio::task::spawn_blocking(move || {
            resolver.find_descendant(root_pid, |p| !is_launcher(p, &launchers))
        });

        let found = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            found = search => found.map_err(|e| Error::Other(e.to_string()))?,
        };
        let worker = found.ok_or(Error::NoChildProcessFound)?;

        let args = render_arguments(arguments, worker.pid)?;
        debug!(
            resource = %resource,
            launcher_pid = root_pid,
            worker_pid = worker.pid,
            "Resolved worker process"
        );

        DetachedProcess::spawn(program, &args)?.detach();
        info!(resource = %resource, pid = worker.pid, program = %program, "Debugger launched");
        Ok(worker.pid)
    }
}

/// Whether `process` is one of the configured launchers (case-insensitive,
/// `.exe` ignored).
pub fn is_launcher(process: &ProcessInfo, launcher_names: &[String]) -> bool {
    let name = process.name.to_ascii_lowercase();
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    launcher_names
        .iter()
        .any(|launcher| launcher.eq_ignore_ascii_case(name))
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    } else {
        format!("{}{}", base_url, path)
    }
}

/// Substitute `pid` into the argument template and split it into words.
pub fn render_arguments(template: &str, pid: u32) -> Result<Vec<String>> {
    let rendered = template.replace(PID_PLACEHOLDER, &pid.to_string());
    shell_words::split(&rendered).map_err(|e| Error::ArgumentTemplate(e.to_string()))
}

/// A spawned helper process that is meant to outlive its spawner.
pub struct DetachedProcess {
    program: String,
    child: Child,
}

impl DetachedProcess {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| Error::DebuggerSpawn {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            program: program.to_string(),
            child,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Release ownership without waiting for or killing the process.
    pub fn detach(self) -> Option<u32> {
        let pid = self.child.id();
        debug!(program = %self.program, pid = ?pid, "Detaching helper process");
        // Dropping a tokio Child neither kills nor waits; the runtime reaps it
        // in the background once it exits.
        drop(self.child);
        pid
    }
}
