//! Callback notifier - delivers job results to the caller's URL

use docpreview_core::JobResult;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Invalid callback method: {0}")]
    InvalidMethod(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The receiver answered outside 2xx; body is kept verbatim
    #[error("Error sending callback: {status} {body}")]
    Status { status: u16, body: String },
}

#[derive(Clone)]
pub struct CallbackNotifier {
    http_client: Client,
}

impl CallbackNotifier {
    pub fn new(timeout: Duration) -> Result<Self, CallbackError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docpreview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client })
    }

    /// Send `result` as JSON to `url` with `method`.
    ///
    /// An empty method means POST.
    #[tracing::instrument(skip_all, fields(callback.url = %url, callback.method = %method))]
    pub async fn notify(
        &self,
        url: &str,
        method: &str,
        result: &JobResult,
    ) -> Result<(), CallbackError> {
        let start = std::time::Instant::now();

        let method = match method.trim() {
            "" => Method::POST,
            m => Method::from_bytes(m.as_bytes())
                .map_err(|_| CallbackError::InvalidMethod(m.to_string()))?,
        };

        let response = self
            .http_client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .json(result)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(CallbackError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            status_code = status.as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Callback delivered"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpreview_core::PreviewMetadata;
    use mockito::Matcher;

    fn result() -> JobResult {
        JobResult::completed(PreviewMetadata::pdf(
            "b0214b0ba0fa51ebf8bd66ba20a82ee9".to_string(),
            24,
            842,
            595,
        ))
    }

    fn notifier() -> CallbackNotifier {
        CallbackNotifier::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_callback_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::JsonString(
                r#"{"status":"completed","thumbnails":{"preview":{"content_hash":"b0214b0ba0fa51ebf8bd66ba20a82ee9","content_type":"application/pdf","content_size":24,"width":842,"height":595}}}"#
                    .to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        notifier()
            .notify(&format!("{}/hook", server.url()), "POST", &result())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_callback_non_2xx_embeds_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(400)
            .with_body("Oh")
            .create_async()
            .await;

        let err = notifier()
            .notify(&format!("{}/hook", server.url()), "POST", &result())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error sending callback: 400 Oh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_callback_honors_method() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/jobs/42")
            .with_status(204)
            .create_async()
            .await;

        notifier()
            .notify(&format!("{}/jobs/42", server.url()), "PATCH", &result())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_callback_empty_method_defaults_to_post() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(201)
            .create_async()
            .await;

        notifier()
            .notify(&format!("{}/hook", server.url()), "", &result())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_callback_connection_refused_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = notifier()
            .notify(&format!("http://{}/hook", addr), "POST", &result())
            .await
            .unwrap_err();
        assert!(matches!(err, CallbackError::Transport(_)));
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let _ = socket.read(&mut buf).await;
            // Promise 100 bytes, send 7, hang up
            let _ = socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\n\r\npartial")
                .await;
            let _ = socket.shutdown().await;
        });

        let err = notifier()
            .notify(&format!("http://{}/hook", addr), "POST", &result())
            .await
            .unwrap_err();
        assert!(matches!(err, CallbackError::Transport(_)));
    }

    #[tokio::test]
    async fn test_invalid_method_rejected() {
        let err = notifier()
            .notify("http://127.0.0.1:9/hook", "NOT A METHOD", &result())
            .await
            .unwrap_err();
        assert!(matches!(err, CallbackError::InvalidMethod(_)));
    }
}
