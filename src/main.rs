use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use test_execution_engine::cli::Args;
use test_execution_engine::config::EngineConfig;
use test_execution_engine::db;
use test_execution_engine::error::{AppError, AppResult, ErrorKind};
use test_execution_engine::executor::{dispatch::ExecuteRequest, Executor};
use test_execution_engine::external::{
    AlertWebhook, AuthClaims, HttpAlertWebhook, HttpWarehouse, NoopAlertWebhook, Warehouse,
};
use test_execution_engine::storage::{PostgresStorage, Storage};

async fn run() -> AppResult<()> {
    let args = Args::parse();
    let config = EngineConfig::from_env().map_err(|err| AppError::configuration(err.to_string()))?;
    let pool = db::connect_lazy(&config.database_url).map_err(|err| AppError::configuration(err.to_string()))?;

    let http = reqwest::Client::new();
    let storage: Arc<dyn Storage> = Arc::new(PostgresStorage::new(pool));
    let warehouse: Arc<dyn Warehouse> = Arc::new(HttpWarehouse::new(
        config.warehouse_api_base_url.clone(),
        http.clone(),
        Duration::from_secs(30),
    ));
    let webhook: Arc<dyn AlertWebhook> = match &config.alert_webhook_base_url {
        Some(url) => Arc::new(HttpAlertWebhook::new(url.clone(), http, Duration::from_secs(10))),
        None => Arc::new(NoopAlertWebhook),
    };

    let executor = Executor::new(storage, warehouse, webhook, &config);

    let request = ExecuteRequest {
        test_suite_id: args.test_suite_id,
        test_kind: args.test_type.into(),
        target_org_id: args.target_org_id,
    };
    let auth = AuthClaims {
        caller_org_id: args.caller_org_id,
        is_system_internal: args.system_internal,
    };

    let envelope = executor.execute(request, auth).await?;
    let json = serde_json::to_string_pretty(&envelope).map_err(|err| AppError::internal(err.to_string()))?;
    println!("{json}");
    Ok(())
}

/// `sysexits.h`-style codes so a caller shell script can branch on failure
/// class instead of parsing stderr.
fn exit_code_for(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::Configuration => ExitCode::from(78),
        ErrorKind::Unauthorized => ExitCode::from(77),
        ErrorKind::DataShape => ExitCode::from(65),
        ErrorKind::Downstream => ExitCode::from(69),
        ErrorKind::Internal => ExitCode::from(70),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(kind = ?err.kind, message = %err.message, "test execution failed");
            eprintln!("{err}");
            exit_code_for(err.kind)
        }
    }
}
