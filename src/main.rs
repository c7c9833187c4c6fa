#[tokio::main]
async fn main() {
    if let Err(e) = food_token_backend::run().await {
        eprintln!("Server failed: {}", e);
        std::process::exit(1);
    }
}
