//! Interactive terminal client for the virtual network server.
//!
//! Connects over TCP, forwards stdin lines as commands, and prints every
//! response the server sends. Exits on `exit`, stdin EOF, or server close.

use clap::Parser;
use log::info;
use shared::Command;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8888")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Connecting to {}", args.server);
    let stream = TcpStream::connect(&args.server).await?;
    let (read_half, mut write_half) = stream.into_split();

    // Print everything the server sends until it closes the connection.
    let reader_handle = tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => print!("{}", line),
                Err(e) => {
                    eprintln!("Connection error: {}", e);
                    break;
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut input = String::new();
    loop {
        input.clear();
        if stdin.read_line(&mut input).await? == 0 {
            break;
        }
        write_half.write_all(input.as_bytes()).await?;
        write_half.flush().await?;

        // The server closes the connection after confirming an exit; stop
        // reading stdin and wait for that confirmation to print.
        if shared::parse_command(&input) == Ok(Command::Exit) {
            break;
        }
    }

    reader_handle.await?;
    info!("Disconnected");

    Ok(())
}
