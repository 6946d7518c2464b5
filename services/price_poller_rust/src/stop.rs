//! Stop command sources
//!
//! The poller stops on a `STOP` line on stdin, on end of stdin, on Ctrl+C
//! and (unix) on SIGTERM. Stdin is read on a plain OS thread: a blocking
//! read parked in the tokio blocking pool would hold the runtime open after
//! the poller has drained.

use std::fmt;
use std::io::{self, BufRead};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const STOP_COMMAND: &str = "STOP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Command,
    EndOfInput,
    InputError(String),
    Interrupt,
    Terminate,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Command => write!(f, "STOP command"),
            StopReason::EndOfInput => write!(f, "end of input"),
            StopReason::InputError(e) => write!(f, "input error: {}", e),
            StopReason::Interrupt => write!(f, "Ctrl+C"),
            StopReason::Terminate => write!(f, "SIGTERM"),
        }
    }
}

pub type CommandLines = mpsc::UnboundedReceiver<io::Result<String>>;

/// Forward stdin lines from a detached thread. The channel closes at EOF.
pub fn spawn_stdin_reader() -> io::Result<CommandLines> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || forward_lines(io::stdin().lock(), tx))?;
    Ok(rx)
}

/// Forward raw lines until EOF or a read error. Bytes that are not UTF-8 are
/// replaced rather than rejected, so such a line is just another non-`STOP`
/// line.
pub fn forward_lines<R: BufRead>(
    mut reader: R,
    tx: mpsc::UnboundedSender<io::Result<String>>,
) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

/// Wait for a `STOP` line; other lines are ignored. Only EOF or a failed
/// read ends the wait without a command.
pub async fn wait_for_stop_command(mut lines: CommandLines) -> StopReason {
    while let Some(line) = lines.recv().await {
        match line {
            Ok(line) if line.trim() == STOP_COMMAND => return StopReason::Command,
            Ok(line) => debug!("Ignoring input line {:?}", line),
            Err(e) => {
                warn!("Failed to read stop command input: {}", e);
                return StopReason::InputError(e.to_string());
            }
        }
    }
    StopReason::EndOfInput
}

/// Wait for Ctrl+C or SIGTERM. A handler that cannot be installed only
/// disables that source.
pub async fn wait_for_os_signal() -> StopReason {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => StopReason::Interrupt,
            Err(e) => {
                warn!("Ctrl+C handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                StopReason::Terminate
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<StopReason>();

    tokio::select! {
        reason = ctrl_c => reason,
        reason = terminate => reason,
    }
}

/// Whichever stop source fires first
pub async fn wait_for_stop(lines: CommandLines) -> StopReason {
    tokio::select! {
        reason = wait_for_stop_command(lines) => reason,
        reason = wait_for_os_signal() => reason,
    }
}
