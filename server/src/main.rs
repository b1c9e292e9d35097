use clap::Parser;
use server::network::SessionServer;
use server::pool::Ipv4Network;

/// Main-method of the application.
/// Parses command-line arguments, then runs the session server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8888")]
        port: u16,
        /// Virtual network to allocate player addresses from (CIDR notation)
        #[clap(short, long, default_value = "192.168.1.0/24")]
        network: String,
    }

    // Parse command line arguments
    let args = Args::parse();

    let network: Ipv4Network = args.network.parse()?;
    let address = format!("{}:{}", args.host, args.port);
    let server = SessionServer::new(network);

    // Spawn the accept loop
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(&address).await {
            eprintln!("Failed to run server: {}", e);
        }
    });

    // Handle shutdown gracefully
    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                eprintln!("Server task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
