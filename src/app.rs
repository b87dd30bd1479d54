use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::application::{ContactExportUseCase, ContactImportUseCase};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::crm_client::{CrmApi, WebhookCrmClient};
use crate::infrastructure::formats::{default_exporters, default_importers};
use crate::interfaces::http::{start_server, HttpState};

pub async fn run() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    let crm: Arc<dyn CrmApi> = Arc::new(WebhookCrmClient::new(&config.webhook_url)?);
    let state = build_state(crm, &config);

    tracing::info!(
        exporters = ?state.exporters.keys(),
        importers = ?state.importers.keys(),
        "Contact bridge starting"
    );

    start_server(state, &config)?.await?;
    Ok(())
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Wires the default format registries and both use cases around `crm`.
pub fn build_state(crm: Arc<dyn CrmApi>, config: &AppConfig) -> HttpState {
    let exporters = Arc::new(default_exporters());
    let importers = Arc::new(default_importers());

    HttpState {
        export_use_case: ContactExportUseCase::new(
            crm.clone(),
            exporters.clone(),
            config.batch_chunk_size,
        ),
        import_use_case: ContactImportUseCase::new(crm, importers.clone(), config.batch_chunk_size),
        exporters,
        importers,
    }
}
