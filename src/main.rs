//! Wedding Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = wedding_backend::run().await {
        eprintln!("fatal: {}", e);
        std::process::exit(1);
    }
}
