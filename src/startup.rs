use crate::config::Config;
use crate::error::Error;
use crate::store::{RedisStoreActor, RedisStoreHandle};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,redis=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Spawn the Redis store actor
pub fn start_store(config: &Config) -> miette::Result<(RedisStoreHandle, JoinHandle<()>)> {
    let (mut redis_actor, redis_handle) = RedisStoreActor::new(config)?;

    let task = tokio::spawn(async move {
        redis_actor.run().await;
    });
    info!("Event store at {} (key {})", config.redis_url, config.events_key);

    Ok((redis_handle, task))
}
