//! # Virtual Network Server Library
//!
//! This library implements a tiny virtual network reachable over a
//! line-oriented TCP protocol. Each connecting player is assigned an address
//! from a bounded pool and a private in-memory host whose files are
//! manipulated through a small command shell.
//!
//! ## Core Responsibilities
//!
//! ### Address Allocation
//! Addresses are opaque tokens drawn from a fixed CIDR block in a
//! deterministic order. The pool is finite: when it runs dry, new sessions
//! stay connected but receive a distinct "no host available" response to
//! file commands instead of a crash.
//!
//! ### Session Management
//! Handles the complete lifecycle of player connections including:
//! - Host binding at connect time and the welcome handshake
//! - Line-by-line command dispatch and response rendering
//! - Disconnection handling and idempotent host cleanup
//!
//! ### Command Execution
//! Each session's commands run against its own host's filesystem through a
//! stateless shell, so two players never see each other's files while `ps`
//! still shows every allocated address.
//!
//! ## Architecture Design
//!
//! ### Task-per-Session
//! The accept loop spawns one tokio task per connection. Session tasks run
//! fully independently and block only on their own socket I/O.
//!
//! ### Shared Registry
//! The host registry (and transitively its address pool) is the only shared
//! mutable state. It lives behind an `Arc<RwLock<...>>`, which serializes
//! create/destroy/list operations so no two sessions can allocate the same
//! address and a reader never observes a half-completed destroy.
//!
//! ## Module Organization
//!
//! ### Pool Module (`pool`)
//! CIDR parsing, host enumeration, and the finite address allocator.
//!
//! ### Host Module (`host`)
//! The per-player host pairing an address with an in-memory filesystem.
//!
//! ### Registry Module (`registry`)
//! Creates and destroys hosts, keeping the host map and the address pool in
//! lockstep at all times.
//!
//! ### Shell Module (`shell`)
//! Stateless interpreter turning file commands into filesystem mutations
//! and response text.
//!
//! ### Session Module (`session`)
//! Per-connection state machine: Connecting -> Active -> Disconnected, with
//! cleanup on every exit path.
//!
//! ### Network Module (`network`)
//! The TCP accept loop and session id assignment.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::SessionServer;
//! use server::pool::Ipv4Network;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let network: Ipv4Network = "192.168.1.0/24".parse()?;
//!     let server = SessionServer::new(network);
//!
//!     // Accepts connections and spawns one session task per player until
//!     // the process is stopped.
//!     server.run("127.0.0.1:8888").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod host;
pub mod network;
pub mod pool;
pub mod registry;
pub mod session;
pub mod shell;
