use raceline::{RacelineServer, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // LOG_FORMAT=json for machine-readable logs in deployment.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    info!(
        ws = %config.ws_addr(),
        http = %config.http_addr(),
        "starting raceline server"
    );

    let result = async {
        RacelineServer::builder()
            .bind(config.ws_addr())
            .http_bind(config.http_addr())
            .build()
            .await?
            .run()
            .await
    }
    .await;

    if let Err(err) = result {
        error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}
