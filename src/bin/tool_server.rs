use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "landscape-tool-server",
    version,
    about = "Serves the landscape tools as JSON-RPC over stdio"
)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    landscape_agent::serve_tools(args.config.as_deref()).await
}
