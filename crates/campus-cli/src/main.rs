use clap::Parser;

use campus_cli::CliArgs;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = CliArgs::parse();
    if let Err(err) = campus_cli::run(cli).await {
        eprintln!("campus-cli failed: {}", err);
        std::process::exit(1);
    }
}
