use axum::Router;
use host_alias_webhook::{WebhookServer, config::Config};
use std::net::SocketAddr;

pub(crate) fn default_test_config() -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 9001)),
        tls_config: None,
        log_level: "info".to_owned(),
        log_fmt: "json".to_owned(),
        log_no_color: false,
    }
}

pub(crate) async fn app(config: Config) -> Router {
    let server = WebhookServer::new_from_config(config).await.unwrap();

    server.router()
}
