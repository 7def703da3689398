use investor_sync_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    match run_cli().await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("CLI error: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
