//! Panic logging. Lives in its own test binary since the panic hook is
//! process wide.
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use bh::api;
use bh::api::AppState;
use bh::store::BalanceQuery;
use bh::store::BalanceStorage;
use bh::store::StoreError;
use bh::types::BalanceRecord;

/// Collects everything written by the subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

struct PanickingStore;

#[async_trait]
impl BalanceStorage for PanickingStore {
    async fn balance_updates(&self, _: &BalanceQuery) -> Result<Vec<BalanceRecord>, StoreError> {
        panic!("secret internal state")
    }
}

#[tokio::test]
async fn test_panic_is_logged_with_backtrace_and_request() {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);
    api::install_panic_hook();

    let state = AppState::new(Arc::new(PanickingStore), None, tracing::Span::none());
    let request = Request::builder()
        .uri("/balances/tz1alice?limit=3")
        .body(Body::empty())
        .unwrap();
    let response = api::router(state, false).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!String::from_utf8_lossy(&body).contains("secret"));

    let logs = logs.contents();
    assert!(logs.contains("secret internal state"), "{logs}");
    assert!(logs.contains("backtrace:"), "{logs}");
    assert!(logs.contains("method=GET"), "{logs}");
    assert!(logs.contains("path=/balances/tz1alice"), "{logs}");
}
