//! Per-connection session lifecycle: Connecting -> Active -> Disconnected.
//!
//! Each accepted connection gets one session task that owns the socket and a
//! handle to the shared registry. The task reads one command line at a time,
//! dispatches it, writes one response, and on any exit path releases the
//! host it bound at connect time. All blocking is on the session's own
//! socket; sessions never wait on each other's I/O.

use crate::registry::HostRegistry;
use crate::shell;
use log::{debug, info, warn};
use shared::{parse_command, Command, HELP_TEXT};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::RwLock;

/// Response for file commands issued while no host is bound (the pool was
/// exhausted when the session connected).
pub const NOT_CONNECTED: &str =
    "Not connected to any host: no address is bound to this session.";

/// State for one client connection.
///
/// `addr` is absent until a host is bound and holds the address value itself
/// afterwards, so disconnect releases exactly the address this session owns.
pub struct Session {
    id: u32,
    addr: Option<Ipv4Addr>,
    registry: Arc<RwLock<HostRegistry>>,
}

impl Session {
    /// Creates a session in the Connecting state; no host is bound yet.
    pub fn new(id: u32, registry: Arc<RwLock<HostRegistry>>) -> Self {
        Self {
            id,
            addr: None,
            registry,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Address of the bound host, if the connect attempt succeeded.
    pub fn host_addr(&self) -> Option<Ipv4Addr> {
        self.addr
    }

    /// Drives the session over the given connection until disconnect.
    ///
    /// Transport failures end this session only; they are logged and never
    /// propagate to other sessions or the accept loop.
    pub async fn run(mut self, stream: TcpStream) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();

        let greeting = format!(
            "Welcome Player {}!\nType 'help' for available commands.",
            self.id
        );
        let connected = self.connect().await;
        if let Err(e) = send_response(&mut write_half, &greeting).await {
            warn!("Session {}: write failed during greeting: {}", self.id, e);
            self.disconnect().await;
            return;
        }
        if let Err(e) = send_response(&mut write_half, &connected).await {
            warn!("Session {}: write failed during connect: {}", self.id, e);
            self.disconnect().await;
            return;
        }

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("Session {}: connection closed by peer", self.id);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Session {}: read error: {}", self.id, e);
                    break;
                }
            }

            let input = line.trim();
            if input.is_empty() {
                // A blank line is a disconnect trigger, same as EOF.
                debug!("Session {}: blank line, disconnecting", self.id);
                break;
            }

            let (response, disconnect) = self.dispatch(input).await;
            if let Err(e) = send_response(&mut write_half, &response).await {
                warn!("Session {}: write error: {}", self.id, e);
                break;
            }
            if disconnect {
                break;
            }
        }

        self.disconnect().await;
    }

    /// Connecting -> Active: binds a host if the pool still has capacity.
    ///
    /// On exhaustion the session stays Active without a host; file commands
    /// then answer with [`NOT_CONNECTED`] instead of failing hard.
    async fn connect(&mut self) -> String {
        let result = {
            let mut registry = self.registry.write().await;
            registry.create_host()
        };

        match result {
            Ok(addr) => {
                self.addr = Some(addr);
                info!("Session {}: bound host {}", self.id, addr);
                format!("Player {} connected to IP {}", self.id, addr)
            }
            Err(err) => {
                warn!("Session {}: no host bound: {}", self.id, err);
                format!("{}. File commands are disabled.", err)
            }
        }
    }

    /// Maps one input line to its response text and a disconnect flag.
    async fn dispatch(&self, input: &str) -> (String, bool) {
        match parse_command(input) {
            Ok(Command::Exit) => (self.render_exit(), true),
            Ok(Command::Ps) => (self.render_ps().await, false),
            Ok(Command::Help) => (HELP_TEXT.to_string(), false),
            Ok(cmd) => (self.execute_file_command(&cmd).await, false),
            Err(err) => (err.to_string(), false),
        }
    }

    fn render_exit(&self) -> String {
        match self.addr {
            Some(addr) => format!("Player {} disconnected from {}.", self.id, addr),
            None => format!("Player {} disconnected.", self.id),
        }
    }

    async fn render_ps(&self) -> String {
        let addrs = {
            let registry = self.registry.read().await;
            registry.list_addresses()
        };

        if addrs.is_empty() {
            "No active hosts.".to_string()
        } else {
            addrs
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    /// Runs a file verb against the bound host, holding the registry lock
    /// only for the duration of the mutation.
    async fn execute_file_command(&self, cmd: &Command) -> String {
        let Some(addr) = self.addr else {
            return NOT_CONNECTED.to_string();
        };

        let mut registry = self.registry.write().await;
        match registry.host_mut(addr) {
            Some(host) => shell::execute(cmd, host),
            None => {
                // The session believes it owns an address the registry does
                // not know about; treat it like an unbound session.
                warn!("Session {}: host {} missing from registry", self.id, addr);
                NOT_CONNECTED.to_string()
            }
        }
    }

    /// Active -> Disconnected: releases the bound host.
    ///
    /// Idempotent: overlapping failure paths (a read error racing an `exit`)
    /// may both invoke cleanup, and only the first finds an address to take.
    async fn disconnect(&mut self) {
        let Some(addr) = self.addr.take() else {
            return;
        };

        let result = {
            let mut registry = self.registry.write().await;
            registry.destroy_host(addr)
        };

        match result {
            Ok(()) => info!("Session {}: released host {}", self.id, addr),
            // Already gone; benign when cleanup runs twice.
            Err(err) => debug!("Session {}: cleanup no-op: {}", self.id, err),
        }
    }
}

/// Writes one response followed by the line terminator.
async fn send_response(writer: &mut OwnedWriteHalf, text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
