//! Progressive service search against Supabase
//!
//! Requires the `rpc` feature and `SUPABASE_URL` / `SUPABASE_ANON_KEY`:
//!
//! ```sh
//! cargo run -p streetbot --features rpc --example service_search -- "I'm at kipling station"
//! ```

use streetbot::{ServiceLocator, SupabaseRpcClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    streetbot::init_logging(tracing::Level::INFO)?;

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "I need help near yonge and dundas".to_string());

    let locator = ServiceLocator::from_env()?;
    let client = SupabaseRpcClient::from_env()?;

    match locator.respond(&client, &message).await {
        Some(reply) => println!("{reply}"),
        None => println!("Where are you? Try an intersection or a TTC station."),
    }

    Ok(())
}
