//! The seam between a server and application code.

use std::future::Future;

use async_trait::async_trait;
use micro_message::Response;

use crate::{ServerError, ServerRequest};

/// Turns a [`ServerRequest`] into a [`Response`].
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: ServerRequest) -> Result<Response, ServerError>;
}

/// A [`RequestHandler`] backed by an async function, see [`handler_fn`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> RequestHandler for HandlerFn<F>
where
    F: Fn(ServerRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ServerError>> + Send + 'static,
{
    async fn handle(&self, request: ServerRequest) -> Result<Response, ServerError> {
        (self.f)(request).await
    }
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Box<H> {
    async fn handle(&self, request: ServerRequest) -> Result<Response, ServerError> {
        (**self).handle(request).await
    }
}

/// Wraps an async function as a [`RequestHandler`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ServerRequest) -> Fut,
    Fut: Future<Output = Result<Response, ServerError>>,
{
    HandlerFn { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsedBody;
    use micro_message::{HttpMessage, Stream};
    use tracing::info;

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    async fn echo(request: ServerRequest) -> Result<Response, ServerError> {
        let name = match request.parsed_body()? {
            Some(ParsedBody::Json(value)) => value["name"].as_str().unwrap_or("nobody").to_owned(),
            _ => request.query("name").unwrap_or("nobody").to_owned(),
        };
        info!(%name, "greeting");

        let response = Response::builder()
            .status(&200)
            .header("Content-Type", mime::TEXT_PLAIN_UTF_8.as_ref())
            .body(format!("hello {name}"))
            .build()?;
        Ok(response)
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn fn_is_handler() {
        let handler = handler_fn(echo);
        assert_is_handler(&handler);

        let boxed: Box<dyn RequestHandler> = Box::new(handler_fn(echo));
        assert_is_handler(&boxed);
    }

    #[tokio::test]
    async fn handle_query() {
        init_tracing();
        let handler = handler_fn(echo);
        let request = ServerRequest::from_server_params([("REQUEST_URI", "/greet?name=ferris")]).unwrap();

        let response = handler.handle(request).await.unwrap();
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.header_line("content-type"), "text/plain; charset=utf-8");
        assert_eq!(response.body().to_string(), "hello ferris");
    }

    #[tokio::test]
    async fn handle_json() {
        init_tracing();
        let handler: Box<dyn RequestHandler> = Box::new(handler_fn(echo));
        let params = [("REQUEST_METHOD", "POST"), ("CONTENT_TYPE", "application/json")];
        let request = ServerRequest::from_server_params(params)
            .unwrap()
            .with_body(Stream::from(r#"{"name":"crab"}"#));

        let response = handler.handle(request).await.unwrap();
        assert_eq!(response.body().to_string(), "hello crab");
    }

    #[tokio::test]
    async fn errors_propagate() {
        init_tracing();
        let handler = handler_fn(echo);
        let request = ServerRequest::from_server_params([("CONTENT_TYPE", "application/json")])
            .unwrap()
            .with_body(Stream::from("{"));

        assert!(matches!(handler.handle(request).await, Err(ServerError::InvalidBody { .. })));
    }
}
