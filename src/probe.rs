use crate::error::ProbeError;
use crate::types::ReplyStatus;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;

/// A reachability check against one host.
///
/// Implementations may block for their own timeout; the dispatcher imposes none.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, host: &str) -> Result<ReplyStatus, ProbeError>;
}

/// Sends a single ICMP echo request through the platform `ping` utility.
///
/// Shelling out avoids needing raw-socket privileges. The child is killed if it
/// outlives the reply timeout by more than [`SystemPing::GRACE`].
#[derive(Clone, Debug)]
pub struct SystemPing {
    pub timeout: Duration,
}

impl SystemPing {
    pub const GRACE: Duration = Duration::from_secs(2);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(&self, host: &str) -> Command {
        let mut cmd = Command::new("ping");
        if cfg!(windows) {
            cmd.args(["-n", "1", "-w"]).arg(self.timeout.as_millis().to_string());
        } else if cfg!(target_os = "macos") {
            cmd.args(["-c", "1", "-W"]).arg(self.timeout.as_millis().to_string());
        } else {
            // iputils takes whole seconds here; round up so sub-second values still wait.
            let secs = self.timeout.as_millis().div_ceil(1000).max(1);
            cmd.args(["-n", "-c", "1", "-W"]).arg(secs.to_string());
        }
        cmd.arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new(Duration::from_secs(4))
    }
}

#[async_trait]
impl Probe for SystemPing {
    async fn probe(&self, host: &str) -> Result<ReplyStatus, ProbeError> {
        let host = host.trim();
        if host.is_empty() || host.starts_with('-') {
            return Err(ProbeError::new(format!("invalid host name '{host}'")));
        }

        let child = self
            .command(host)
            .spawn()
            .map_err(|e| ProbeError::with_cause("could not start ping utility", e))?;

        let output = match time::timeout(self.timeout + Self::GRACE, child.wait_with_output()).await {
            Ok(Ok(out)) => out,
            Ok(Err(e)) => return Err(ProbeError::with_cause("ping utility failed", e)),
            Err(_) => return Ok(ReplyStatus::Failed("TimedOut".into())),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        classify(output.status.code(), &stdout, &stderr)
    }
}

/// Map a `ping` exit code and its output onto a reply status.
///
/// Exit 0 normally means a reply arrived, but some platforms also exit 0 on an
/// ICMP error reply, so the output is inspected for named failures first.
pub fn classify(code: Option<i32>, stdout: &str, stderr: &str) -> Result<ReplyStatus, ProbeError> {
    let text = stdout.to_ascii_lowercase();
    let named = if text.contains("unreachable") {
        Some("DestinationHostUnreachable")
    } else if text.contains("time to live exceeded") || text.contains("ttl expired") {
        Some("TtlExpired")
    } else {
        None
    };

    match (code, named) {
        (Some(0) | Some(1), Some(name)) => Ok(ReplyStatus::Failed(name.to_string())),
        (Some(0), None) => Ok(ReplyStatus::Success),
        (Some(1), None) if text.contains("timed out") => Ok(ReplyStatus::Failed("TimedOut".into())),
        (Some(1), None) => Ok(ReplyStatus::NoReply),
        (code, _) => {
            let detail = first_line(stderr)
                .or_else(|| first_line(stdout))
                .unwrap_or("no output");
            Err(ProbeError::with_cause(
                match code {
                    Some(c) => format!("ping exited with status {c}"),
                    None => "ping terminated by signal".to_string(),
                },
                detail,
            ))
        }
    }
}

fn first_line(s: &str) -> Option<&str> {
    s.lines().map(str::trim).find(|l| !l.is_empty())
}
