#[tokio::main]
async fn main() {
    if let Err(e) = taskboard_backend::run().await {
        eprintln!("taskboard-backend: {}", e);
        std::process::exit(1);
    }
}
