//! Print a bcrypt hash for a password, using the server's truncation rule
//! and `BCRYPT_COST`.

use std::env;

use wedding_backend::auth::{hash_password, MAX_PASSWORD_BYTES};
use wedding_backend::config::Settings;

fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD>");
        std::process::exit(1);
    });

    dotenvy::dotenv().ok();
    let cost = match Settings::from_env() {
        Ok(settings) => settings.bcrypt_cost,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if password.len() > MAX_PASSWORD_BYTES {
        eprintln!(
            "Note: only the first {} bytes of the password are significant",
            MAX_PASSWORD_BYTES
        );
    }

    match hash_password(&password, cost) {
        Ok(hashed) => {
            println!("\nCost     : {}", cost);
            println!("Hash     : {}\n", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
