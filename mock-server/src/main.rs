use mock_server::{Application, Store};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    let store = Store::default().with_app(Application {
        id: "000000000000000000000001".to_string(),
        client_app_id: "demo-abcde".to_string(),
        name: "demo".to_string(),
        location: "US-VA".to_string(),
        deployment_model: "GLOBAL".to_string(),
        domain_id: "000000000000000000000002".to_string(),
        group_id: "demo-group".to_string(),
        product: "standard".to_string(),
    });

    tracing::info!(%addr, prefix = mock_server::API_PREFIX, "listening");
    mock_server::run_with(listener, store).await
}
