use anyhow::{Result, anyhow};
use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Load the PEM encoded certificate chain and private key used by the HTTPS server.
///
/// A rustls crypto provider must have been installed beforehand.
pub(crate) async fn create_tls_config(tls_config: &TlsConfig) -> Result<RustlsConfig> {
    RustlsConfig::from_pem_file(&tls_config.cert_file, &tls_config.key_file)
        .await
        .map_err(|e| {
            anyhow!(
                "cannot load TLS certificate {} and key {}: {}",
                tls_config.cert_file,
                tls_config.key_file,
                e
            )
        })
}
