//! Integration tests for the virtual network server
//!
//! These tests validate whole-session behavior over real TCP connections:
//! handshake, command dispatch, capacity handling, and address reuse.

use server::network::SessionServer;
use server::pool::Ipv4Network;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts a server allocating from `cidr` on an ephemeral port.
async fn spawn_server(cidr: &str) -> SocketAddr {
    let network: Ipv4Network = cidr.parse().expect("Bad test CIDR");
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    let server = SessionServer::new(network);
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    addr
}

/// Minimal line-oriented client for driving a session from a test.
struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("Failed to connect");
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    /// Reads one response line, without its terminator.
    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        let n = timeout(RESPONSE_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("Timed out waiting for server response")
            .expect("Read failed");
        assert!(n > 0, "Server closed the connection unexpectedly");
        line.trim_end_matches('\n').to_string()
    }

    /// Asserts that the server has closed this connection.
    async fn expect_eof(&mut self) {
        let mut line = String::new();
        let n = timeout(RESPONSE_TIMEOUT, self.reader.read_line(&mut line))
            .await
            .expect("Timed out waiting for connection close")
            .expect("Read failed");
        assert_eq!(n, 0, "Expected EOF, got: {:?}", line);
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Sends one command and reads a single-line response.
    async fn command(&mut self, line: &str) -> String {
        self.send(line).await;
        self.read_line().await
    }

    /// Consumes the two-line welcome banner and returns the connect outcome.
    async fn handshake(&mut self) -> String {
        let welcome = self.read_line().await;
        assert!(
            welcome.starts_with("Welcome Player"),
            "Unexpected banner line: {:?}",
            welcome
        );
        let hint = self.read_line().await;
        assert!(hint.contains("help"), "Unexpected banner line: {:?}", hint);
        self.read_line().await
    }
}

/// Connects repeatedly until a session obtains a host address.
///
/// Host release happens after the previous session's exit confirmation is
/// written, so a freshly freed address may take a moment to come back.
async fn connect_until_bound(addr: SocketAddr) -> String {
    for _ in 0..50 {
        let mut client = TestClient::connect(addr).await;
        let outcome = client.handshake().await;
        if outcome.contains("connected to IP") {
            return outcome;
        }
        sleep(Duration::from_millis(50)).await;
    }
    panic!("No session could obtain a host address");
}

/// SESSION LIFECYCLE TESTS
mod session_tests {
    use super::*;

    /// Drives the full capacity scenario on a single-address pool: one bound
    /// session, one hostless session, file round-trip, exit, address reuse.
    #[tokio::test]
    async fn single_address_pool_scenario() {
        let addr = spawn_server("10.1.2.7/32").await;

        let mut player1 = TestClient::connect(addr).await;
        let outcome = player1.handshake().await;
        assert_eq!(outcome, "Player 1 connected to IP 10.1.2.7");

        let mut player2 = TestClient::connect(addr).await;
        let outcome = player2.handshake().await;
        assert!(
            outcome.contains("no host available"),
            "Expected capacity message, got: {:?}",
            outcome
        );

        // The hostless session stays interactive.
        let response = player2.command("create f hello").await;
        assert!(
            response.contains("Not connected"),
            "Expected not-connected response, got: {:?}",
            response
        );
        let response = player2.command("ps").await;
        assert_eq!(response, "10.1.2.7");

        // The bound session gets a working filesystem.
        let response = player1.command("create f hello").await;
        assert_eq!(response, "File 'f' created with content: hello");
        let response = player1.command("list").await;
        assert_eq!(response, "f: hello");

        // Exit releases the address for a later session.
        let response = player1.command("exit").await;
        assert_eq!(response, "Player 1 disconnected from 10.1.2.7.");
        player1.expect_eof().await;

        let outcome = connect_until_bound(addr).await;
        assert!(
            outcome.ends_with("connected to IP 10.1.2.7"),
            "Freed address was not reused: {:?}",
            outcome
        );
    }

    #[tokio::test]
    async fn sessions_get_monotonic_ids_and_distinct_addresses() {
        let addr = spawn_server("192.168.1.0/24").await;

        // Handshakes are awaited in turn so host binding stays ordered.
        let mut player1 = TestClient::connect(addr).await;
        assert_eq!(
            player1.handshake().await,
            "Player 1 connected to IP 192.168.1.1"
        );
        let mut player2 = TestClient::connect(addr).await;
        assert_eq!(
            player2.handshake().await,
            "Player 2 connected to IP 192.168.1.2"
        );

        let first = player1.command("ps").await;
        let second = player1.read_line().await;
        assert_eq!((first.as_str(), second.as_str()), ("192.168.1.1", "192.168.1.2"));
    }

    #[tokio::test]
    async fn blank_line_disconnects_the_session() {
        let addr = spawn_server("10.3.3.9/32").await;

        let mut player = TestClient::connect(addr).await;
        let outcome = player.handshake().await;
        assert!(outcome.contains("connected to IP 10.3.3.9"));

        player.send("").await;
        player.expect_eof().await;

        // The released address goes back to the pool.
        let outcome = connect_until_bound(addr).await;
        assert!(outcome.contains("connected to IP 10.3.3.9"));
    }

    #[tokio::test]
    async fn dropping_the_connection_releases_the_host() {
        let addr = spawn_server("10.9.0.4/32").await;

        {
            let mut player = TestClient::connect(addr).await;
            let outcome = player.handshake().await;
            assert!(outcome.contains("connected to IP 10.9.0.4"));
        } // Socket dropped without an exit command.

        let outcome = connect_until_bound(addr).await;
        assert!(outcome.contains("connected to IP 10.9.0.4"));
    }

    #[tokio::test]
    async fn files_are_private_to_each_session() {
        let addr = spawn_server("192.168.1.0/24").await;

        let mut player1 = TestClient::connect(addr).await;
        player1.handshake().await;
        let mut player2 = TestClient::connect(addr).await;
        player2.handshake().await;

        let response = player1.command("create secret.txt mine").await;
        assert!(response.starts_with("File 'secret.txt' created"));

        let response = player2.command("list").await;
        assert_eq!(response, "No files available.");
    }
}

/// PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    #[tokio::test]
    async fn help_renders_the_command_reference() {
        let addr = spawn_server("10.0.0.0/30").await;
        let mut player = TestClient::connect(addr).await;
        player.handshake().await;

        let header = player.command("help").await;
        assert_eq!(header, "Available commands:");
        for verb in ["create", "delete", "list", "ps", "help", "exit"] {
            let line = player.read_line().await;
            assert!(line.contains(verb), "Missing '{}' in: {:?}", verb, line);
        }
    }

    #[tokio::test]
    async fn unknown_command_echoes_the_input() {
        let addr = spawn_server("10.0.0.0/30").await;
        let mut player = TestClient::connect(addr).await;
        player.handshake().await;

        let response = player.command("frobnicate now").await;
        assert!(response.contains("Unknown command 'frobnicate now'"));
        assert!(response.contains("help"));

        // The session survives and keeps answering.
        let response = player.command("list").await;
        assert_eq!(response, "No files available.");
    }

    #[tokio::test]
    async fn malformed_commands_report_usage() {
        let addr = spawn_server("10.0.0.0/30").await;
        let mut player = TestClient::connect(addr).await;
        player.handshake().await;

        let response = player.command("create onlyname").await;
        assert_eq!(response, "Usage: create <filename> <content>");

        let response = player.command("delete").await;
        assert_eq!(response, "Usage: delete <filename>");
    }

    #[tokio::test]
    async fn list_keyword_is_case_insensitive() {
        let addr = spawn_server("10.0.0.0/30").await;
        let mut player = TestClient::connect(addr).await;
        player.handshake().await;

        player.command("create a.txt one").await;

        assert_eq!(player.command("list").await, "a.txt: one");
        assert_eq!(player.command("LIST").await, "a.txt: one");
    }

    #[tokio::test]
    async fn create_content_keeps_whitespace_and_overwrites() {
        let addr = spawn_server("10.0.0.0/30").await;
        let mut player = TestClient::connect(addr).await;
        player.handshake().await;

        let response = player.command("create a.txt hello virtual world").await;
        assert_eq!(response, "File 'a.txt' created with content: hello virtual world");

        player.command("create a.txt replaced").await;
        assert_eq!(player.command("list").await, "a.txt: replaced");
    }

    #[tokio::test]
    async fn delete_missing_file_is_reported_not_fatal() {
        let addr = spawn_server("10.0.0.0/30").await;
        let mut player = TestClient::connect(addr).await;
        player.handshake().await;

        let response = player.command("delete ghost.txt").await;
        assert_eq!(response, "File 'ghost.txt' not found.");

        // Still connected afterwards.
        let response = player.command("ps").await;
        assert_eq!(response, "10.0.0.1");
    }
}
