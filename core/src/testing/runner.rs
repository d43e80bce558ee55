use std::{io, process::Stdio, time::Duration};

use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    process::{Child, ChildStderr, ChildStdin, ChildStdout, Command},
    sync::oneshot,
    time::Instant,
};

use super::{command::SubjectCommand, result::*};

#[derive(Debug, Clone)]
pub struct TestRunner {
    cmd: SubjectCommand,
    execution_time_limit: Duration,
}

/// Growable capture buffers for one run.
#[derive(Debug, Default)]
struct Captured {
    merged: Vec<u8>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl TestRunner {
    pub const DEFAULT_EXEC_TIME_LIMIT: Duration = Duration::from_millis(5000);
    const READ_CHUNK_SIZE: usize = 8 * 1024;
    /// How long to keep reading after the subject exits. Background processes
    /// it left behind may hold the pipes open indefinitely.
    const DRAIN_AFTER_EXIT: Duration = Duration::from_millis(100);

    pub fn new(cmd: SubjectCommand) -> Self {
        Self {
            cmd,
            execution_time_limit: Self::DEFAULT_EXEC_TIME_LIMIT,
        }
    }

    pub fn execution_time_limit(mut self, limit: Duration) -> Self {
        self.execution_time_limit = limit;
        self
    }

    pub fn get_command(&self) -> &SubjectCommand {
        &self.cmd
    }

    /// Runs the subject once, feeding `input` to its stdin.
    ///
    /// The child is always reaped before this returns, whichever way the run
    /// ends. Exit status is recorded but never turned into a failure.
    pub async fn run(&self, input: &str) -> ExecutionResult {
        let start_at = Instant::now();

        let mut proc = match Command::new(self.cmd.program())
            .args(self.cmd.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(proc) => proc,
            Err(e) => {
                return ExecutionResult::failed(ExecFailure::Spawn(e), start_at.elapsed());
            }
        };

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (proc.stdin.take(), proc.stdout.take(), proc.stderr.take())
        else {
            Self::reap(&mut proc).await;
            let e = io::Error::new(io::ErrorKind::Other, "Failed to open stdio pipes");
            return ExecutionResult::failed(ExecFailure::Io(e), start_at.elapsed());
        };

        let mut captured = Captured::default();
        let (exit_tx, exit_rx) = oneshot::channel();

        let res = tokio::time::timeout(self.execution_time_limit, async {
            let (fed, collected, exit_status) = tokio::join!(
                Self::feed_stdin(stdin, input.as_bytes()),
                Self::collect_output(stdout, stderr, exit_rx, &mut captured),
                async {
                    let exit_status = proc.wait().await;
                    let _ = exit_tx.send(());
                    exit_status
                },
            );
            fed?;
            collected?;
            exit_status
        })
        .await;

        let execution_time = start_at.elapsed();

        let (status, failure) = match res {
            Err(_) => {
                Self::reap(&mut proc).await;
                (None, Some(ExecFailure::Timeout(self.execution_time_limit)))
            }
            Ok(Err(e)) => {
                Self::reap(&mut proc).await;
                (None, Some(ExecFailure::Io(e)))
            }
            Ok(Ok(exit_status)) => (exit_status.code(), None),
        };

        ExecutionResult {
            captured_output: String::from_utf8_lossy(&captured.merged).into(),
            stdout: String::from_utf8_lossy(&captured.stdout).into(),
            stderr: String::from_utf8_lossy(&captured.stderr).into(),
            status,
            execution_time,
            failure,
        }
    }

    async fn feed_stdin(mut stdin: ChildStdin, input: &[u8]) -> io::Result<()> {
        match stdin.write_all(input).await {
            // The subject may exit without reading its input.
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
            res => res?,
        }
        drop(stdin); // NOTE: closing stdin is what delivers EOF to the subject
        Ok(())
    }

    /// Reads both streams until they close, or until `DRAIN_AFTER_EXIT` has
    /// passed since `exited` fired.
    async fn collect_output(
        mut stdout: ChildStdout,
        mut stderr: ChildStderr,
        mut exited: oneshot::Receiver<()>,
        captured: &mut Captured,
    ) -> io::Result<()> {
        let mut out_chunk = vec![0u8; Self::READ_CHUNK_SIZE];
        let mut err_chunk = vec![0u8; Self::READ_CHUNK_SIZE];
        let (mut out_open, mut err_open) = (true, true);
        let mut drain_deadline: Option<Instant> = None;

        while out_open || err_open {
            tokio::select! {
                _ = &mut exited, if drain_deadline.is_none() => {
                    drain_deadline = Some(Instant::now() + Self::DRAIN_AFTER_EXIT);
                },
                _ = tokio::time::sleep_until(drain_deadline.unwrap_or_else(Instant::now)),
                    if drain_deadline.is_some() =>
                {
                    log::debug!("Subject exited but left its output pipes open; stop reading");
                    break;
                },
                n = stdout.read(&mut out_chunk), if out_open => match n? {
                    0 => out_open = false,
                    n => {
                        captured.merged.extend_from_slice(&out_chunk[..n]);
                        captured.stdout.extend_from_slice(&out_chunk[..n]);
                    }
                },
                n = stderr.read(&mut err_chunk), if err_open => match n? {
                    0 => err_open = false,
                    n => {
                        captured.merged.extend_from_slice(&err_chunk[..n]);
                        captured.stderr.extend_from_slice(&err_chunk[..n]);
                    }
                },
            }
        }
        Ok(())
    }

    async fn reap(proc: &mut Child) {
        proc.kill()
            .await
            .unwrap_or_else(|e| log::warn!("Failed to kill subject process: {:#}", e));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sh(script: &str) -> SubjectCommand {
        SubjectCommand::new("sh", ["-c", script])
    }

    fn runner(cmd: SubjectCommand) -> TestRunner {
        TestRunner::new(cmd).execution_time_limit(Duration::from_millis(2000))
    }

    #[tokio::test]
    async fn should_capture_stdout() {
        let cmd = SubjectCommand::new("awk", ["{ s += $1 } END { print s }"]);
        let res = runner(cmd).run("1\n2").await;
        assert!(res.failure.is_none(), "{:?}", res.failure);
        assert_eq!(res.captured_output, "3\n");
        assert_eq!(res.stdout, "3\n");
        assert_eq!(res.stderr, "");
        assert_eq!(res.status, Some(0));
    }

    #[tokio::test]
    async fn should_succeed_even_if_stdin_is_not_read() {
        let big_input = "x".repeat(1 << 20);
        let res = runner(sh("echo hello_123")).run(&big_input).await;
        assert!(res.failure.is_none(), "{:?}", res.failure);
        assert_eq!(res.captured_output, "hello_123\n");
    }

    #[tokio::test]
    async fn should_merge_stderr_into_captured_output() {
        let res = runner(sh("echo out; sleep 0.1; echo err >&2")).run("").await;
        assert!(res.failure.is_none());
        assert_eq!(res.captured_output, "out\nerr\n");
        assert_eq!(res.stdout, "out\n");
        assert_eq!(res.stderr, "err\n");
    }

    #[tokio::test]
    async fn should_ignore_exit_code() {
        let res = runner(sh("echo 3; exit 42")).run("").await;
        assert!(res.failure.is_none());
        assert_eq!(res.status, Some(42));
        assert_eq!(res.captured_output, "3\n");
    }

    #[tokio::test]
    async fn should_capture_large_output() {
        let res = runner(sh("yes | head -n 100000")).run("").await;
        assert!(res.failure.is_none(), "{:?}", res.failure);
        assert_eq!(res.stdout.len(), 200_000);
        assert_eq!(res.captured_output.len(), 200_000);
    }

    #[tokio::test]
    async fn should_time_out() {
        let cmd = SubjectCommand::parse("sleep 5").unwrap();
        let r = TestRunner::new(cmd).execution_time_limit(Duration::from_millis(300));
        let res = r.run("").await;
        assert!(matches!(res.failure, Some(ExecFailure::Timeout(_))));
        assert_eq!(res.status, None);
        assert!(res.execution_time < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn should_not_wait_for_background_process_holding_pipes() {
        let r = TestRunner::new(sh("echo 3; sleep 5 &"))
            .execution_time_limit(Duration::from_millis(1500));
        let res = r.run("").await;
        assert!(res.failure.is_none(), "{:?}", res.failure);
        assert_eq!(res.status, Some(0));
        assert_eq!(res.captured_output, "3\n");
        assert!(res.execution_time < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn should_report_spawn_error() {
        let cmd = SubjectCommand::parse("./casegrade-no-such-executable --flag").unwrap();
        let res = runner(cmd).run("1").await;
        match res.failure {
            Some(ExecFailure::Spawn(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected spawn failure, got {:?}", other),
        }
        assert_eq!(res.captured_output, "");
    }
}
