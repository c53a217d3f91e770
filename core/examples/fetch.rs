//! GET a URL and print what came back.
//!
//! ```sh
//! RUST_LOG=curlish_core=debug cargo run -p curlish-core --example fetch -- http://127.0.0.1:3000/echo
//! ```

use curlish_core::Client;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:3000/echo".to_string());

    let mut client = Client::open(&url)?;
    client.set_timeout(2)?;

    let resp = client.get(&[])?;

    println!("{}", resp.text());
    println!("Status: {}", resp.status());
    println!("Time: {}", resp.response_time());
    println!("Error No: {}", resp.error_code());
    println!("Error message: {}", resp.error_message());
    Ok(())
}
