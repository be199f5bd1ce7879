use merkle_log::service::server::router;
use merkle_log::{LogClient, LogService};

/// Serve `service` on an ephemeral local port and return its base URL
pub async fn spawn_server(service: LogService) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, router(service))
            .await
            .expect("Test server failed");
    });

    format!("http://{}", addr)
}

/// Start a server seeded with `log` and return a client for it
#[allow(dead_code)]
pub async fn seeded_client(log: &str) -> (LogService, LogClient) {
    let service = LogService::from_text(log);
    let url = spawn_server(service.clone()).await;
    (service, LogClient::new(url))
}
