use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::time::Duration;

use crate::config::Config;

/// Connects to MongoDB and returns the configured database.
/// The driver connects lazily, so this fails only on a malformed URI.
pub async fn get_database(config: &Config) -> Result<Database, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.mongodb_uri).await?;
    options.app_name = Some("persons-graphql".to_string());
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(2);
    options.max_idle_time = Some(Duration::from_secs(30));

    let client = Client::with_options(options)?;
    Ok(client.database(&config.mongodb_database))
}
