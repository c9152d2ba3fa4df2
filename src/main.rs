use anyhow::Context;
use quotes_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    quotes_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = settings.environment.as_str(),
        upstream = %settings.upstream.base_url,
        "quotes-app starting"
    );

    quotes_app::run(settings).await
}
