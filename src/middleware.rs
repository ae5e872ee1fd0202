use crate::{
    backtrace::BacktraceResolver,
    config::LoggerConfig,
    console::{Args, Console, HeaderSink},
    error::{AppError, LogError},
    metrics,
    payload::{Row, HEADER_NAME},
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Headers staged for a response that the handler is still producing
#[derive(Debug, Default)]
pub struct PendingHeaders {
    headers: HeaderMap,
    sent: bool,
}

impl PendingHeaders {
    /// Mark the headers as transmitted and hand back the staged payload header
    fn take_for_send(&mut self) -> Option<HeaderValue> {
        self.sent = true;
        self.headers.remove(HEADER_NAME)
    }
}

impl HeaderSink for PendingHeaders {
    fn headers_sent(&self) -> bool {
        self.sent
    }

    fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }
}

/// Request-scoped console, available to handlers as an extractor
///
/// Clones share the same payload. Once the middleware has written the
/// response headers every call fails with [`LogError::HeadersAlreadySent`].
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    inner: Arc<Mutex<Console<PendingHeaders>>>,
}

impl ConsoleHandle {
    pub fn new(resolver: BacktraceResolver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Console::with_resolver(
                PendingHeaders::default(),
                resolver,
            ))),
        }
    }

    #[track_caller]
    pub fn log(&self, args: Args) -> Result<(), LogError> {
        self.inner.lock().log(args)
    }

    #[track_caller]
    pub fn info(&self, args: Args) -> Result<(), LogError> {
        self.inner.lock().info(args)
    }

    #[track_caller]
    pub fn warn(&self, args: Args) -> Result<(), LogError> {
        self.inner.lock().warn(args)
    }

    #[track_caller]
    pub fn error(&self, args: Args) -> Result<(), LogError> {
        self.inner.lock().error(args)
    }

    #[track_caller]
    pub fn group(&self, args: Args) -> Result<(), LogError> {
        self.inner.lock().group(args)
    }

    #[track_caller]
    pub fn group_collapsed(&self, args: Args) -> Result<(), LogError> {
        self.inner.lock().group_collapsed(args)
    }

    pub fn group_end(&self) -> Result<(), LogError> {
        self.inner.lock().group_end()
    }

    pub fn headers_sent(&self) -> bool {
        self.inner.lock().sink().headers_sent()
    }

    /// Snapshot of the committed rows
    pub fn rows(&self) -> Vec<Row> {
        self.inner.lock().rows().to_vec()
    }

    /// Close the console and return the header value to send, if any row was
    /// committed
    pub fn flush(&self) -> Option<HeaderValue> {
        self.inner.lock().sink_mut().take_for_send()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ConsoleHandle
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ConsoleHandle>()
            .cloned()
            .ok_or(AppError::MissingConsole)
    }
}

/// Chrome logger middleware
/// Attaches a fresh console to each request and writes its payload header onto the response
pub async fn chrome_logger_middleware(
    State(config): State<LoggerConfig>,
    mut req: Request,
    next: Next,
) -> Response {
    let console = ConsoleHandle::new(BacktraceResolver::new(config.backtraces));
    req.extensions_mut().insert(console.clone());

    let mut response = next.run(req).await;

    if let Some(value) = console.flush() {
        debug!(header_bytes = value.len(), "Attaching chromelogger header");
        metrics::record_header_bytes(value.len());
        response
            .headers_mut()
            .insert(HeaderName::from_static(HEADER_NAME), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Payload, RowType};
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn app(router: Router) -> Router {
        router.layer(middleware::from_fn_with_state(
            LoggerConfig::default(),
            chrome_logger_middleware,
        ))
    }

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn decode_response(response: &Response) -> Payload {
        let header = response.headers().get(HEADER_NAME).unwrap();
        Payload::decode(header.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_handle_rejects_after_flush() {
        let console = ConsoleHandle::new(BacktraceResolver::default());
        console.log(vec![json!("first")]).unwrap();

        let value = console.flush();
        assert!(value.is_some());
        assert!(console.headers_sent());

        assert!(matches!(
            console.log(vec![json!("late")]),
            Err(LogError::HeadersAlreadySent)
        ));
        assert!(matches!(
            console.group_end(),
            Err(LogError::HeadersAlreadySent)
        ));
        assert_eq!(console.rows().len(), 1);
    }

    #[test]
    fn test_flush_without_rows() {
        let console = ConsoleHandle::new(BacktraceResolver::default());
        assert!(console.flush().is_none());
        assert!(console.headers_sent());
    }

    #[test]
    fn test_clones_share_payload() {
        let console = ConsoleHandle::new(BacktraceResolver::disabled());
        let other = console.clone();
        console.info(vec![json!(1)]).unwrap();
        other.warn(vec![json!(2)]).unwrap();

        let kinds: Vec<RowType> = console.rows().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![RowType::Info, RowType::Warn]);
    }

    #[test]
    fn test_handle_backtrace_points_at_caller() {
        let console = ConsoleHandle::new(BacktraceResolver::default());
        let line = line!() + 1;
        console.error(vec![json!("boom")]).unwrap();
        assert!(console.rows()[0]
            .backtrace
            .starts_with(&format!("{}:{}:", file!(), line)));
    }

    #[tokio::test]
    async fn test_middleware_attaches_header() {
        let router = Router::new().route(
            "/",
            get(|console: ConsoleHandle| async move {
                console.log(vec![json!("hello")]).unwrap();
                console.group(vec![json!("block")]).unwrap();
                console.group_end().unwrap();
                "ok"
            }),
        );

        let response = app(router).oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let payload = decode_response(&response);
        assert_eq!(payload.rows.len(), 3);
        assert_eq!(payload.rows[0].args, vec![json!("hello")]);
        assert_eq!(payload.rows[2].kind, RowType::GroupEnd);
    }

    #[tokio::test]
    async fn test_middleware_without_logging_adds_no_header() {
        let router = Router::new().route("/", get(|| async { "quiet" }));
        let response = app(router).oneshot(get_request("/")).await.unwrap();
        assert!(response.headers().get(HEADER_NAME).is_none());
    }

    #[tokio::test]
    async fn test_middleware_runs_next_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route(
            "/",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "ok"
                }
            }),
        );

        app(router).oneshot(get_request("/")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_request_gets_its_own_console() {
        let router = app(Router::new().route(
            "/",
            get(|console: ConsoleHandle| async move {
                console.log(vec![json!("once")]).unwrap();
                "ok"
            }),
        ));

        let first = router.clone().oneshot(get_request("/")).await.unwrap();
        let second = router.oneshot(get_request("/")).await.unwrap();
        assert_eq!(decode_response(&first).rows.len(), 1);
        assert_eq!(decode_response(&second).rows.len(), 1);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware_is_500() {
        let router = Router::new().route(
            "/",
            get(|_console: ConsoleHandle| async { "unreachable" }),
        );

        let response = router.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
