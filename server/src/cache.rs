//! Shared key-value cache connection.
//!
//! Both gates and the session store talk to one Redis instance through
//! get / set-with-ttl / delete; no transactional guarantees are assumed.

use anyhow::Result;
use tracing::info;

/// Create Redis client.
pub async fn create_redis_client(redis_url: &str) -> Result<fred::clients::Client> {
    use fred::prelude::*;

    let config = Config::from_url(redis_url)?;
    let client = Client::new(config, None, None, None);
    client.connect();
    client.wait_for_connect().await?;

    info!("Connected to Redis");
    Ok(client)
}
