use std::process::ExitCode;
use std::sync::Arc;

use wifiguard_core::wifi::Outcome;
use wifiguard_mock::run;
use wifiguard_mock::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = Arc::new(Settings::new().expect("Failed to load settings."));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let app_name = env!("CARGO_PKG_NAME").replace('-', "_");
            let level = settings.logger.level.as_str();

            format!("{app_name}={level},wifiguard_core={level}").into()
        }))
        .init();

    match run(&settings).await {
        Outcome::Success => {
            tracing::info!("Connected to {:?}", settings.target.name());
            ExitCode::SUCCESS
        }
        Outcome::Failure(reason) => {
            tracing::error!("WiFi check failed: {}", reason);
            ExitCode::FAILURE
        }
    }
}
