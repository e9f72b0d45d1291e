use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let appid = std::env::var("ONTRAPORT_APPID").unwrap_or_else(|_| mock_server::DEFAULT_APPID.to_string());
    let key = std::env::var("ONTRAPORT_KEY").unwrap_or_else(|_| mock_server::DEFAULT_KEY.to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %appid, "mock Ontraport API listening");
    mock_server::run_with(listener, mock_server::new_db(&appid, &key)).await
}
