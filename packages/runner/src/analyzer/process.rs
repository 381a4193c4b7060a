use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use super::{Analyzer, AnalyzerOutput, Invocation};
use crate::error::RunError;

/// Runs the analyzer as a child process with a wall-clock and output budget.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessAnalyzer;

enum CaptureError {
    Io(std::io::Error),
    TooLarge,
}

/// Read until EOF, failing once the shared byte budget is exceeded.
async fn read_capped<R: AsyncRead + Unpin>(
    mut reader: R,
    used: &AtomicU64,
    limit: u64,
) -> Result<Vec<u8>, CaptureError> {
    let mut captured = Vec::new();
    let mut chunk = [0u8; 8 * 1024];
    loop {
        let n = reader.read(&mut chunk).await.map_err(CaptureError::Io)?;
        if n == 0 {
            return Ok(captured);
        }
        let total = used.fetch_add(n as u64, Ordering::Relaxed) + n as u64;
        if total > limit {
            return Err(CaptureError::TooLarge);
        }
        captured.extend_from_slice(&chunk[..n]);
    }
}

async fn kill(child: &mut Child, program: &str) {
    if let Err(e) = child.kill().await {
        warn!(program, error = %e, "Failed to kill analyzer");
    }
}

#[async_trait]
impl Analyzer for ProcessAnalyzer {
    async fn run(&self, invocation: &Invocation) -> Result<AnalyzerOutput, RunError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            kill(&mut child, &invocation.program).await;
            return Err(RunError::Io(std::io::Error::other(
                "analyzer output pipes were not captured",
            )));
        };

        let used = AtomicU64::new(0);
        let limit = invocation.max_output_bytes;
        let finished = tokio::time::timeout(invocation.timeout, async {
            let (out, err) = tokio::try_join!(
                read_capped(stdout, &used, limit),
                read_capped(stderr, &used, limit)
            )?;
            let status = child.wait().await.map_err(CaptureError::Io)?;
            Ok::<_, CaptureError>((status, out, err))
        })
        .await;

        match finished {
            Ok(Ok((status, out, err))) => {
                debug!(
                    program = %invocation.program,
                    exit_code = ?status.code(),
                    bytes = used.load(Ordering::Relaxed),
                    "Analyzer exited"
                );
                Ok(AnalyzerOutput {
                    exit_code: status.code(),
                    stdout: String::from_utf8_lossy(&out).into_owned(),
                    stderr: String::from_utf8_lossy(&err).into_owned(),
                })
            }
            Ok(Err(CaptureError::TooLarge)) => {
                kill(&mut child, &invocation.program).await;
                Err(RunError::OutputTooLarge { limit })
            }
            Ok(Err(CaptureError::Io(e))) => {
                kill(&mut child, &invocation.program).await;
                Err(RunError::Io(e))
            }
            Err(_) => {
                kill(&mut child, &invocation.program).await;
                Err(RunError::TimedOut {
                    limit: invocation.timeout,
                })
            }
        }
    }
}
