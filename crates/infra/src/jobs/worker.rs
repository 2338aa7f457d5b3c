//! Worker execution strategies.
//!
//! The worker is an opaque script taking four positional arguments
//! (partner id, source path, destination path, distinguishing token). It
//! writes a log whose name contains the token. [`LocalStrategy`] runs it as a
//! child process; [`RemoteStrategy`] copies it to a host over `scp` and runs
//! it over `ssh`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime};

use async_trait::async_trait;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info};

use super::poller::{LogSource, tail_lines};

/// Maximum stdout or stderr size captured per stream (10 MiB).
const MAX_OUTPUT_BYTES: u64 = 10 * 1024 * 1024;

/// Timeout for the short remote probes (`ls`, `tail`).
const REMOTE_PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// `ssh`/`scp` exit status for connection-level failures.
const SSH_TRANSPORT_EXIT: i32 = 255;

/// Where the worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Local,
    Remote,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Local => "local",
            ExecutionMode::Remote => "remote",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ExecutionMode::Local),
            "remote" => Ok(ExecutionMode::Remote),
            other => Err(format!("unknown execution mode '{other}'")),
        }
    }
}

/// Positional arguments of one worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    pub partner_id: String,
    pub source_path: String,
    pub destination_path: String,
    /// Per-run token used to find this run's log among many.
    pub token: String,
}

impl WorkerInvocation {
    pub fn args(&self) -> [&str; 4] {
        [
            &self.partner_id,
            &self.source_path,
            &self.destination_path,
            &self.token,
        ]
    }
}

/// Captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// Worker process or transport failure.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("{0}")]
    Precondition(String),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command failed ({code}): {command}\n{stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("Script execution timed out after {} seconds", .after.as_secs())]
    Timeout { command: String, after: Duration },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("Timeout waiting for success marker. Latest log tail:\n{tail}")]
    PollTimeout { tail: String },
    #[error("log access failed: {0}")]
    Log(#[from] std::io::Error),
}

/// Spawn `cmd`, capture stdout/stderr and enforce `timeout`.
///
/// The child is killed if the timeout fires. A non-zero exit is returned as
/// [`ExecutionError::NonZeroExit`].
pub async fn run_command(cmd: &mut Command, timeout: Duration) -> Result<CommandOutput, ExecutionError> {
    let command = describe(cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    info!(command = %command, "running command");
    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
        program: cmd.as_std().get_program().to_string_lossy().into_owned(),
        source,
    })?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(source)) => {
            return Err(ExecutionError::Spawn {
                program: command,
                source,
            });
        }
        // `child` is dropped on return, which kills it.
        Err(_elapsed) => {
            return Err(ExecutionError::Timeout {
                command,
                after: timeout,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();
    let exit_code = status.code().unwrap_or(-1);
    let duration_ms = start.elapsed().as_millis() as u64;

    debug!(command = %command, exit_code, duration_ms, stdout = %stdout, stderr = %stderr, "command finished");

    if exit_code != 0 {
        return Err(ExecutionError::NonZeroExit {
            command,
            code: exit_code,
            stderr,
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        exit_code,
        duration_ms,
    })
}

async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
        // Keep the pipe drained past the cap so the child never blocks on it.
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}

fn describe(cmd: &Command) -> String {
    let std = cmd.as_std();
    std::iter::once(std.get_program())
        .chain(std.get_args())
        .map(|s| shell_quote(&s.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Restrict `s` to characters safe in a file name and an unquoted glob.
fn file_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Parse a `HH:MM` or `HH:MM:SS` time of day.
pub fn parse_run_at(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

/// Wait from `now` until the next occurrence of `run_at`.
///
/// A time already passed today is scheduled for the same time tomorrow.
pub fn delay_until(run_at: NaiveTime, now: NaiveDateTime) -> Duration {
    let mut target = now.date().and_time(run_at);
    if target < now {
        target += chrono::Duration::days(1);
    }
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// How a job's worker is driven and where its logs live.
#[async_trait]
pub trait ExecutionStrategy: LogSource {
    fn mode(&self) -> ExecutionMode;

    /// Configuration required before anything runs.
    fn ensure_ready(&self) -> Result<(), ExecutionError> {
        Ok(())
    }

    /// Time of day the invocation is deferred to, if any.
    fn run_at(&self) -> Option<NaiveTime> {
        None
    }

    /// Run the worker to completion (or until `timeout`).
    async fn run(
        &self,
        invocation: &WorkerInvocation,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError>;
}

/// Runs the worker script as a child process on this host.
#[derive(Debug, Clone)]
pub struct LocalStrategy {
    script: PathBuf,
    logs_dir: PathBuf,
}

impl LocalStrategy {
    pub fn new(script: impl Into<PathBuf>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            logs_dir: logs_dir.into(),
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }
}

#[async_trait]
impl LogSource for LocalStrategy {
    async fn latest_log(&self, token: &str) -> Result<Option<String>, ExecutionError> {
        let mut entries = match tokio::fs::read_dir(&self.logs_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.contains(token) || !name.ends_with(".log") {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
                newest = Some((modified, entry.path()));
            }
        }

        Ok(newest.map(|(_, path)| path.to_string_lossy().into_owned()))
    }

    async fn read_tail(&self, locator: &str, lines: usize) -> Result<String, ExecutionError> {
        let content = tokio::fs::read_to_string(locator).await?;
        Ok(tail_lines(&content, lines))
    }
}

#[async_trait]
impl ExecutionStrategy for LocalStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Local
    }

    async fn run(
        &self,
        invocation: &WorkerInvocation,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        tokio::fs::create_dir_all(&self.logs_dir).await?;

        let mut cmd = Command::new("bash");
        cmd.arg(&self.script).args(invocation.args());
        run_command(&mut cmd, timeout).await
    }
}

/// Connection settings for [`RemoteStrategy`].
#[derive(Debug, Clone, Default)]
pub struct RemoteTarget {
    pub host: Option<String>,
    pub user: String,
    pub key_path: Option<PathBuf>,
    /// Directory on the host where the worker writes its logs.
    pub logs_dir: String,
    pub run_at: Option<NaiveTime>,
}

/// Copies the worker script to a host and runs it over the remote shell.
#[derive(Debug, Clone)]
pub struct RemoteStrategy {
    script: PathBuf,
    target: RemoteTarget,
}

impl RemoteStrategy {
    pub fn new(script: impl Into<PathBuf>, target: RemoteTarget) -> Self {
        Self {
            script: script.into(),
            target,
        }
    }

    fn credentials(&self) -> Result<(&str, &Path), ExecutionError> {
        match (&self.target.host, &self.target.key_path) {
            (Some(host), Some(key)) if !host.is_empty() && !key.as_os_str().is_empty() => {
                Ok((host, key))
            }
            _ => Err(ExecutionError::Precondition(
                "Missing ec2_host or key_path".to_string(),
            )),
        }
    }

    fn destination(&self, host: &str) -> String {
        format!("{}@{}", self.target.user, host)
    }

    fn ssh(&self, remote_command: &str) -> Result<Command, ExecutionError> {
        let (host, key) = self.credentials()?;
        let mut cmd = Command::new("ssh");
        cmd.arg("-i")
            .arg(key)
            .args(["-o", "StrictHostKeyChecking=no", "-o", "BatchMode=yes"])
            .arg(self.destination(host))
            .arg(remote_command);
        Ok(cmd)
    }

    /// Path the script is staged at on the host for this run.
    pub fn remote_script_path(invocation: &WorkerInvocation) -> String {
        format!(
            "/tmp/analyze_feed_{}_{}.sh",
            file_safe(&invocation.partner_id),
            file_safe(&invocation.token)
        )
    }

    /// Remote shell command that makes the staged script executable and runs it.
    pub fn remote_invocation(invocation: &WorkerInvocation) -> String {
        let script = shell_quote(&Self::remote_script_path(invocation));
        let args = invocation
            .args()
            .iter()
            .map(|a| shell_quote(a))
            .collect::<Vec<_>>()
            .join(" ");
        format!("chmod +x {script} && bash {script} {args}")
    }

    /// Remote shell command printing the newest log in `logs_dir` whose name
    /// contains `token` verbatim, as the worker received it.
    pub fn log_listing(logs_dir: &str, token: &str) -> String {
        format!(
            "ls -t {}/*{}* 2>/dev/null | head -n1",
            shell_quote(logs_dir),
            shell_quote(token)
        )
    }

    async fn run_transport(
        &self,
        cmd: &mut Command,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        match run_command(cmd, timeout).await {
            Err(ExecutionError::NonZeroExit { code, stderr, .. }) if code == SSH_TRANSPORT_EXIT => {
                Err(ExecutionError::Transport(stderr.trim().to_string()))
            }
            other => other,
        }
    }
}

#[async_trait]
impl LogSource for RemoteStrategy {
    async fn latest_log(&self, token: &str) -> Result<Option<String>, ExecutionError> {
        let listing = Self::log_listing(&self.target.logs_dir, token);
        let output = self
            .run_transport(&mut self.ssh(&listing)?, REMOTE_PROBE_TIMEOUT)
            .await?;
        let path = output.stdout.trim();
        Ok((!path.is_empty()).then(|| path.to_string()))
    }

    async fn read_tail(&self, locator: &str, lines: usize) -> Result<String, ExecutionError> {
        let tail = format!("tail -n {lines} {}", shell_quote(locator));
        let output = self
            .run_transport(&mut self.ssh(&tail)?, REMOTE_PROBE_TIMEOUT)
            .await?;
        Ok(output.stdout)
    }
}

#[async_trait]
impl ExecutionStrategy for RemoteStrategy {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Remote
    }

    fn ensure_ready(&self) -> Result<(), ExecutionError> {
        self.credentials().map(|_| ())
    }

    fn run_at(&self) -> Option<NaiveTime> {
        self.target.run_at
    }

    async fn run(
        &self,
        invocation: &WorkerInvocation,
        timeout: Duration,
    ) -> Result<CommandOutput, ExecutionError> {
        let (host, key) = self.credentials()?;
        let remote_script = Self::remote_script_path(invocation);

        let mut scp = Command::new("scp");
        scp.arg("-i")
            .arg(key)
            .args(["-o", "StrictHostKeyChecking=no", "-o", "BatchMode=yes"])
            .arg(&self.script)
            .arg(format!("{}:{}", self.destination(host), remote_script));
        self.run_transport(&mut scp, timeout).await?;

        let mut ssh = self.ssh(&Self::remote_invocation(invocation))?;
        self.run_transport(&mut ssh, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn invocation(token: &str) -> WorkerInvocation {
        WorkerInvocation {
            partner_id: "p1".to_string(),
            source_path: "s3://a/in".to_string(),
            destination_path: "s3://a/out".to_string(),
            token: token.to_string(),
        }
    }

    fn write_script(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".sh")
            .tempfile()
            .expect("create temp file");
        writeln!(f, "#!/bin/bash").expect("write shebang");
        write!(f, "{body}").expect("write body");
        f
    }

    #[test]
    fn quoting() {
        assert_eq!(shell_quote("s3://bucket/key.csv"), "s3://bucket/key.csv");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("$(rm -rf /)"), "'$(rm -rf /)'");
    }

    #[test]
    fn remote_invocation_quotes_every_argument() {
        let mut inv = invocation("run 1");
        inv.partner_id = "p;1".to_string();

        assert_eq!(
            RemoteStrategy::remote_invocation(&inv),
            "chmod +x /tmp/analyze_feed_p_1_run_1.sh && bash /tmp/analyze_feed_p_1_run_1.sh \
             'p;1' s3://a/in s3://a/out 'run 1'"
        );
    }

    #[tokio::test]
    async fn remote_log_listing_matches_the_raw_token() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["analyze_feed_p1_batch_42.log", "analyze_feed_p1_batch.42.log"] {
            std::fs::write(dir.path().join(name), "log").unwrap();
        }
        let logs_dir = dir.path().to_string_lossy().into_owned();

        for (token, expected) in [
            ("batch.42", Some("analyze_feed_p1_batch.42.log")),
            ("batch*", None),
            ("run 7", None),
        ] {
            let listing = RemoteStrategy::log_listing(&logs_dir, token);
            let output = run_command(Command::new("sh").arg("-c").arg(&listing), Duration::from_secs(5))
                .await
                .unwrap();
            let found = output.stdout.trim();
            match expected {
                Some(name) => assert_eq!(found, dir.path().join(name).to_string_lossy()),
                None => assert!(found.is_empty(), "{token} matched {found}"),
            }
        }
    }

    #[test]
    fn run_at_formats() {
        assert_eq!(parse_run_at("07:30").unwrap(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(
            parse_run_at(" 23:05:09 ").unwrap(),
            NaiveTime::from_hms_opt(23, 5, 9).unwrap()
        );
        assert!(parse_run_at("7pm").is_err());
    }

    #[test]
    fn delay_until_later_today_or_tomorrow() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let later = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
        assert_eq!(delay_until(later, now), Duration::from_secs(30 * 60));

        let earlier = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(delay_until(earlier, now), Duration::from_secs(23 * 3600));

        let same = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert_eq!(delay_until(same, now), Duration::ZERO);
    }

    #[test]
    fn execution_mode_parses_case_insensitively() {
        assert_eq!("Remote".parse::<ExecutionMode>().unwrap(), ExecutionMode::Remote);
        assert!("cloud".parse::<ExecutionMode>().is_err());
    }

    #[tokio::test]
    async fn local_run_writes_a_findable_log() {
        let logs = tempfile::tempdir().unwrap();
        let script = write_script(&format!(
            "echo \"partner=$1\" > {dir}/analyze_feed_partner_$1_$4.log\n\
             echo 'Upload completed: s3://a/out/result.csv' >> {dir}/analyze_feed_partner_$1_$4.log\n\
             echo 'Script finished successfully at: now' >> {dir}/analyze_feed_partner_$1_$4.log\n\
             echo done\n",
            dir = logs.path().display()
        ));
        let strategy = LocalStrategy::new(script.path(), logs.path());

        let output = strategy
            .run(&invocation("tok123"), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "done");

        let log = strategy.latest_log("tok123").await.unwrap().unwrap();
        assert!(log.ends_with("analyze_feed_partner_p1_tok123.log"));
        assert!(strategy.latest_log("other").await.unwrap().is_none());

        let tail = strategy.read_tail(&log, 2).await.unwrap();
        assert_eq!(
            tail,
            "Upload completed: s3://a/out/result.csv\nScript finished successfully at: now"
        );
    }

    #[tokio::test]
    async fn local_nonzero_exit_carries_stderr() {
        let logs = tempfile::tempdir().unwrap();
        let script = write_script("echo 'bad feed' >&2\nexit 3\n");
        let strategy = LocalStrategy::new(script.path(), logs.path());

        let err = strategy
            .run(&invocation("t"), Duration::from_secs(10))
            .await
            .unwrap_err();

        match err {
            ExecutionError::NonZeroExit { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert!(stderr.contains("bad feed"));
            }
            other => panic!("expected non-zero exit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn output_past_the_capture_cap_does_not_stall_the_worker() {
        let logs = tempfile::tempdir().unwrap();
        let script = write_script("head -c 12582912 /dev/zero | tr '\\0' x\necho done >&2\n");
        let strategy = LocalStrategy::new(script.path(), logs.path());

        let output = strategy
            .run(&invocation("t"), Duration::from_secs(20))
            .await
            .unwrap();

        assert_eq!(output.stdout.len() as u64, MAX_OUTPUT_BYTES);
        assert_eq!(output.stderr.trim(), "done");
    }

    #[tokio::test]
    async fn local_timeout_kills_the_worker() {
        let logs = tempfile::tempdir().unwrap();
        let script = write_script("sleep 30\n");
        let strategy = LocalStrategy::new(script.path(), logs.path());

        let err = strategy
            .run(&invocation("t"), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_logs_dir_means_no_log_yet() {
        let strategy = LocalStrategy::new("/nonexistent.sh", "/nonexistent/logs/dir");
        assert!(strategy.latest_log("t").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remote_without_credentials_is_a_precondition_failure() {
        let strategy = RemoteStrategy::new(
            "worker.sh",
            RemoteTarget {
                host: Some("10.0.0.1".to_string()),
                user: "ec2-user".to_string(),
                ..Default::default()
            },
        );

        assert!(matches!(
            strategy.ensure_ready(),
            Err(ExecutionError::Precondition(_))
        ));
        let err = strategy
            .run(&invocation("t"), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing ec2_host or key_path");
    }
}
