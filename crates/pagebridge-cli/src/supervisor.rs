//! Emulator process supervision.
//!
//! The supervisor spawns the functions emulator, forwards its output to
//! the log sink, and waits for the readiness signal announcing the bound
//! address. Readiness travels over a loopback TCP channel: the supervisor
//! binds an ephemeral listener before spawning and passes its address to
//! the child in the `PAGEBRIDGE_IPC` environment variable; the emulator
//! connects and writes a single JSON line `{"ip": ..., "port": ...}`.
//! The first message wins; anything after it is ignored.
//!
//! Startup either reaches `Ready` (address known) or `Failed` (timeout or
//! malformed signal). Failures are fatal to the whole bootstrap; there are
//! no retries.

use std::net::SocketAddr;
use std::process::Stdio;
use std::time::Duration;

use pagebridge_core::{to_cli_args, BridgeOptions};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::error::EmulatorError;

/// Environment variable carrying the readiness channel address.
pub const IPC_ENV_VAR: &str = "PAGEBRIDGE_IPC";

/// How long the emulator may take to report its address.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// The one-time message announcing the emulator's bound address.
#[derive(Debug, Deserialize)]
struct ReadinessSignal {
    ip: String,
    port: u16,
}

/// Supervisor configuration.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Emulator binary to spawn
    pub emulator: String,
    /// Static assets directory passed to the emulator
    pub static_dir: String,
    /// Startup timeout (10 s by default; shorter in tests)
    pub startup_timeout: Duration,
}

/// Spawns and supervises the emulator process. Exactly one emulator runs
/// per dev-server session; no other component touches the child directly.
#[derive(Debug)]
pub struct Supervisor {
    config: SupervisorConfig,
}

impl Supervisor {
    /// Create a supervisor with the given configuration.
    pub fn new(config: SupervisorConfig) -> Self {
        Self { config }
    }

    /// Spawn the emulator and wait for it to become ready.
    ///
    /// # Errors
    ///
    /// Fails when the binary cannot be spawned, the readiness signal is
    /// malformed, or nothing arrives within the startup timeout. In every
    /// failure case the spawned process is terminated.
    pub async fn start(&self, options: &BridgeOptions) -> Result<EmulatorHandle, EmulatorError> {
        self.spawn(options).await?.ready().await
    }

    /// Spawn the emulator without waiting for readiness. Split out so
    /// tests can drive the readiness channel themselves.
    pub async fn spawn(&self, options: &BridgeOptions) -> Result<PendingEmulator, EmulatorError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(EmulatorError::Ipc)?;
        let ipc_addr = listener.local_addr().map_err(EmulatorError::Ipc)?;

        let mut args = vec![
            "pages".to_string(),
            "dev".to_string(),
            self.config.static_dir.clone(),
            "--port=0".to_string(),
        ];
        args.extend(to_cli_args(&options.option_mapping()));

        tracing::debug!("spawning emulator: {} {}", self.config.emulator, args.join(" "));

        let mut child = Command::new(&self.config.emulator)
            .args(&args)
            .env(IPC_ENV_VAR, ipc_addr.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| EmulatorError::Spawn {
                command: self.config.emulator.clone(),
                error,
            })?;

        forward_output(&mut child);

        Ok(PendingEmulator {
            child,
            listener,
            startup_timeout: self.config.startup_timeout,
        })
    }
}

/// A spawned emulator that has not reported its address yet.
#[derive(Debug)]
pub struct PendingEmulator {
    child: Child,
    listener: TcpListener,
    startup_timeout: Duration,
}

impl PendingEmulator {
    /// Address of the readiness channel the child was told to connect to.
    pub fn ipc_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// OS process id of the child, while it is still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the readiness signal, bounded by the startup timeout.
    ///
    /// The timeout future owns the timer, so it is cancelled together
    /// with the wait on success; a stale timer can never fire after the
    /// emulator is ready.
    pub async fn ready(mut self) -> Result<EmulatorHandle, EmulatorError> {
        let signal = match timeout(self.startup_timeout, read_first_message(&self.listener)).await
        {
            Ok(Ok(signal)) => signal,
            Ok(Err(err)) => {
                terminate(&mut self.child).await;
                return Err(err);
            }
            Err(_elapsed) => {
                terminate(&mut self.child).await;
                return Err(EmulatorError::StartupTimeout);
            }
        };

        Ok(EmulatorHandle {
            child: Some(self.child),
            address: format!("http://{}:{}", signal.ip, signal.port),
        })
    }
}

/// A ready emulator. Owns the OS process: dropping the handle kills the
/// child, and [`EmulatorHandle::shutdown`] does so explicitly and
/// idempotently.
#[derive(Debug)]
pub struct EmulatorHandle {
    child: Option<Child>,
    address: String,
}

impl EmulatorHandle {
    /// The emulator's bound address, e.g. `http://127.0.0.1:45833`.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Terminate the emulator and reap it. Safe to call more than once;
    /// only the first call does anything.
    pub async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            terminate(&mut child).await;
        }
    }
}

async fn terminate(child: &mut Child) {
    if child.start_kill().is_ok() {
        let _ = child.wait().await;
    }
}

/// Accept the first connection on the readiness channel and parse its
/// first line. Later lines and later connections are ignored because the
/// stream is dropped once this returns.
async fn read_first_message(listener: &TcpListener) -> Result<ReadinessSignal, EmulatorError> {
    let (stream, _) = listener.accept().await.map_err(EmulatorError::Ipc)?;
    let mut lines = BufReader::new(stream).lines();
    let line = lines
        .next_line()
        .await
        .map_err(EmulatorError::Ipc)?
        .ok_or_else(|| {
            EmulatorError::MalformedReadiness("channel closed before a message arrived".to_string())
        })?;
    serde_json::from_str(&line).map_err(|e| EmulatorError::MalformedReadiness(e.to_string()))
}

/// Forward the child's stdout and stderr to the log sink verbatim,
/// line by line.
fn forward_output(child: &mut Child) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::info!(target: "emulator", "{line}");
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!(target: "emulator", "{line}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    // `sleep` stands in for the emulator binary: the spawn succeeds and
    // nothing depends on the child understanding its arguments, because
    // the tests drive the readiness channel themselves.
    fn test_supervisor(timeout: Duration) -> Supervisor {
        Supervisor::new(SupervisorConfig {
            emulator: "sleep".to_string(),
            static_dir: "static".to_string(),
            startup_timeout: timeout,
        })
    }

    #[tokio::test]
    async fn resolves_address_from_first_readiness_message() {
        let supervisor = test_supervisor(Duration::from_secs(5));
        let pending = supervisor.spawn(&BridgeOptions::default()).await.unwrap();
        let ipc_addr = pending.ipc_addr().unwrap();

        let driver = tokio::spawn(async move {
            let mut stream = TcpStream::connect(ipc_addr).await.unwrap();
            stream
                .write_all(b"{\"ip\":\"127.0.0.1\",\"port\":8791}\n")
                .await
                .unwrap();
            // A second message must be ignored.
            stream
                .write_all(b"{\"ip\":\"10.0.0.1\",\"port\":1}\n")
                .await
                .unwrap();
        });

        let mut handle = pending.ready().await.unwrap();
        assert_eq!(handle.address(), "http://127.0.0.1:8791");
        driver.await.unwrap();
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn times_out_when_no_message_arrives() {
        let supervisor = test_supervisor(Duration::from_millis(100));
        let pending = supervisor.spawn(&BridgeOptions::default()).await.unwrap();

        let err = pending.ready().await.unwrap_err();
        assert!(matches!(err, EmulatorError::StartupTimeout));
    }

    // `yes` keeps running regardless of its arguments, standing in for an
    // emulator that starts but never reports readiness.
    #[tokio::test]
    async fn timeout_terminates_the_spawned_process() {
        let supervisor = Supervisor::new(SupervisorConfig {
            emulator: "yes".to_string(),
            static_dir: "static".to_string(),
            startup_timeout: Duration::from_millis(100),
        });
        let pending = supervisor.spawn(&BridgeOptions::default()).await.unwrap();
        let pid = pending.id().expect("child should be running");
        assert!(process_alive(pid));

        let err = pending.ready().await.unwrap_err();
        assert!(matches!(err, EmulatorError::StartupTimeout));
        assert!(!process_alive(pid));
    }

    fn process_alive(pid: u32) -> bool {
        std::process::Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stderr(std::process::Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn malformed_readiness_message_is_fatal() {
        let supervisor = test_supervisor(Duration::from_secs(5));
        let pending = supervisor.spawn(&BridgeOptions::default()).await.unwrap();
        let ipc_addr = pending.ipc_addr().unwrap();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(ipc_addr).await.unwrap();
            stream.write_all(b"starting up...\n").await.unwrap();
        });

        let err = pending.ready().await.unwrap_err();
        assert!(matches!(err, EmulatorError::MalformedReadiness(_)));
    }

    #[tokio::test]
    async fn spawn_failure_names_the_binary() {
        let supervisor = Supervisor::new(SupervisorConfig {
            emulator: "pagebridge-test-no-such-binary".to_string(),
            static_dir: "static".to_string(),
            startup_timeout: Duration::from_secs(1),
        });

        let err = supervisor
            .spawn(&BridgeOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EmulatorError::Spawn { .. }));
        assert!(err.to_string().contains("pagebridge-test-no-such-binary"));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let supervisor = test_supervisor(Duration::from_secs(5));
        let pending = supervisor.spawn(&BridgeOptions::default()).await.unwrap();
        let ipc_addr = pending.ipc_addr().unwrap();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(ipc_addr).await.unwrap();
            stream
                .write_all(b"{\"ip\":\"127.0.0.1\",\"port\":8791}\n")
                .await
                .unwrap();
        });

        let mut handle = pending.ready().await.unwrap();
        handle.shutdown().await;
        handle.shutdown().await;
    }
}
