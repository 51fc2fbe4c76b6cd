//! ACME Runner (C1): supervises the external ACME client process.
//!
//! Captures stdout/stderr as complete strings on exit; classification of
//! those strings against the outcome markers belongs to the coordinator.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};

use crate::prelude::*;

/// A running (or just-finished) invocation of the external ACME client.
/// stdout/stderr are drained concurrently with the child's execution so a
/// chatty client can never deadlock on a full pipe buffer.
pub struct RunnerHandle {
	child: Child,
	stdout_task: Option<JoinHandle<String>>,
	stderr_task: Option<JoinHandle<String>>,
}

/// stdout/stderr captured from a finished run, plus the exit code.
#[derive(Clone, Debug)]
pub struct RunOutcome {
	pub rc: i32,
	pub stdout: String,
	pub stderr: String,
}

/// Launch the ACME client at `acme_bin` (a bare name resolved against `PATH`,
/// or an absolute path) with `argv`, piping stdout/stderr for capture.
pub fn start(acme_bin: &str, acme_home: &PathBuf, argv: &[String]) -> ClResult<RunnerHandle> {
	info!(?argv, "starting ACME client");
	let mut child = Command::new(acme_bin)
		.args(argv)
		.env("HOME", acme_home)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn()
		.map_err(Error::Io)?;

	let mut stdout = child.stdout.take().ok_or_else(|| Error::Internal("no stdout pipe".into()))?;
	let mut stderr = child.stderr.take().ok_or_else(|| Error::Internal("no stderr pipe".into()))?;
	let stdout_task = tokio::spawn(async move {
		let mut buf = String::new();
		let _ = stdout.read_to_string(&mut buf).await;
		buf
	});
	let stderr_task = tokio::spawn(async move {
		let mut buf = String::new();
		let _ = stderr.read_to_string(&mut buf).await;
		buf
	});

	Ok(RunnerHandle { child, stdout_task: Some(stdout_task), stderr_task: Some(stderr_task) })
}

impl RunnerHandle {
	/// Returns `Some(outcome)` if the process exited before `deadline`,
	/// `None` if it is still running (the caller is expected to poll again).
	pub async fn wait_or_exit(&mut self, deadline: Instant) -> ClResult<Option<RunOutcome>> {
		let remaining = deadline.saturating_duration_since(Instant::now());
		if remaining.is_zero() {
			return Ok(None);
		}
		match timeout(remaining, self.child.wait()).await {
			Ok(status) => {
				let rc = status.map_err(Error::Io)?.code().unwrap_or(-1);
				Ok(Some(self.capture(rc).await?))
			}
			Err(_) => Ok(None),
		}
	}

	/// Block until the process exits, however long that takes.
	pub async fn finish(mut self) -> ClResult<RunOutcome> {
		let status = self.child.wait().await.map_err(Error::Io)?;
		let rc = status.code().unwrap_or(-1);
		self.capture(rc).await
	}

	async fn capture(&mut self, rc: i32) -> ClResult<RunOutcome> {
		let stdout = match self.stdout_task.take() {
			Some(task) => task.await.unwrap_or_default(),
			None => String::new(),
		};
		let stderr = match self.stderr_task.take() {
			Some(task) => task.await.unwrap_or_default(),
			None => String::new(),
		};
		Ok(RunOutcome { rc, stdout, stderr })
	}
}

/// Deadline helper: `Instant::now() + seconds`.
pub fn deadline_in(seconds: u64) -> Instant {
	Instant::now() + Duration::from_secs(seconds)
}

// vim: ts=4
