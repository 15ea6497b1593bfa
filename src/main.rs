//! athena-relay - submit, poll and decode analytic queries.

mod cli;

use athena_relay::config::{Config, ObjectStoreConfig};
use athena_relay::error::{RelayError, Result};
use athena_relay::logging;
use athena_relay::query::QueryClient;
use athena_relay::service::{
    ExecutionService, Fixture, HttpObjectStore, MockExecutionService, MockObjectStore, ObjectStore,
};
use cli::Cli;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    dotenvy::dotenv().ok();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config);
    config.apply_env_defaults();

    let (service, store) = build_collaborators(&cli, &config)?;
    let client = QueryClient::builder()
        .execution_service(service)
        .object_store(store)
        .retry_policy(config.polling.retry_policy())
        .build()?;

    let request = config.query.to_request(&cli.sql)?;
    let options = config.fetch.to_options(cli.next_token.as_deref());
    let page = client
        .run(&request, config.polling.interval(), &options)
        .await?;

    info!("Fetched {} records", page.records.len());
    let output = serde_json::to_string_pretty(&page)
        .map_err(|e| RelayError::decode(format!("Failed to serialize results: {e}")))?;
    println!("{output}");

    Ok(())
}

/// Builds the execution service and object store for this run.
///
/// The execution service comes from a fixture. Raw result objects are read
/// through the configured gateway when there is one, else from the fixture.
fn build_collaborators(
    cli: &Cli,
    config: &Config,
) -> Result<(Arc<dyn ExecutionService>, Arc<dyn ObjectStore>)> {
    let fixture_path = cli.fixture.as_deref().ok_or_else(|| {
        RelayError::config("No execution service configured. Use --fixture to run against a fixture")
    })?;

    info!("Loading fixture from: {}", fixture_path.display());
    let (service, fixture_store): (MockExecutionService, MockObjectStore) =
        Fixture::load(fixture_path)?.into_collaborators()?;

    let store: Arc<dyn ObjectStore> = match http_store(&config.object_store)? {
        Some(store) => Arc::new(store),
        None => Arc::new(fixture_store),
    };

    Ok((Arc::new(service), store))
}

fn http_store(config: &ObjectStoreConfig) -> Result<Option<HttpObjectStore>> {
    let Some(endpoint) = config.endpoint.as_deref() else {
        return Ok(None);
    };

    info!("Reading result objects from: {}", endpoint);
    let mut store = HttpObjectStore::new(endpoint, config.timeout_secs)?;
    if let Some(token) = &config.bearer_token {
        store = store.with_bearer_token(token.clone());
    }
    Ok(Some(store))
}
