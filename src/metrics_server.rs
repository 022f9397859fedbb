use crate::error::AppError;
use crate::metrics;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info};

/// Serve `/metrics` and `/health` on the given port until the task is dropped.
pub async fn start_metrics_server(port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Metrics server listening");

    loop {
        match listener.accept().await {
            Ok((socket, _)) => {
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket).await {
                        error!(error = %e, "Metrics connection failed");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}

async fn handle_connection(mut socket: TcpStream) -> Result<(), AppError> {
    let mut buffer = [0; 1024];
    let read = socket.read(&mut buffer).await?;
    let request = String::from_utf8_lossy(&buffer[..read]);

    let response = response_for(&request);
    socket.write_all(response.as_bytes()).await?;
    Ok(())
}

fn response_for(request: &str) -> String {
    if request.starts_with("GET /metrics") {
        match metrics::gather_metrics() {
            Ok(body) => format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\n\r\n{}",
                body.len(),
                body
            ),
            Err(e) => {
                error!(error = %e, "Failed to gather metrics");
                "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\n\r\n".to_string()
            }
        }
    } else if request.starts_with("GET /health") {
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK".to_string()
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nNot Found".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert!(response_for("GET /health HTTP/1.1\r\n").ends_with("OK"));
        assert!(response_for("GET /metrics HTTP/1.1\r\n").starts_with("HTTP/1.1 200 OK"));
        assert!(response_for("POST /other HTTP/1.1\r\n").starts_with("HTTP/1.1 404"));
    }
}
