//! Innkeep gateway binary.

#[tokio::main]
async fn main() {
    if let Err(error) = gateway::run_from_env().await {
        eprintln!("innkeep-gateway failed: {error}");
        std::process::exit(1);
    }
}
