use anyhow::{Result, anyhow};
use tracing::error;

use host_alias_webhook::{WebhookServer, cli, config::Config, log_version, tracing::setup_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;
    log_version();

    // Starting from rustls 0.22, each application must set its default crypto provider.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("cannot install the rustls crypto provider"))?;

    let server = WebhookServer::new_from_config(config)
        .await
        .inspect_err(|e| error!(error = e.to_string().as_str(), "cannot start the server"))?;

    server
        .run()
        .await
        .inspect_err(|e| error!(error = e.to_string().as_str(), "server failure"))
}
