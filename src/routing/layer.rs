//! Tower middleware running the routing interceptor.
//!
//! Wraps the host's default service. For each request the interceptor runs
//! once; a routed request is served by the route's handler, anything else
//! goes to the wrapped service unchanged.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service, ServiceExt};

use crate::routing::context::{RequestContext, RequestHead};
use crate::routing::handler::HttpHandler;
use crate::routing::module::{PipelineContext, RequestInterceptor, Resolution, UrlRoutingModule};

/// Layer applying [`UrlRoutingService`].
#[derive(Debug, Clone)]
pub struct UrlRoutingLayer {
    module: Arc<UrlRoutingModule>,
}

impl UrlRoutingLayer {
    pub fn new(module: UrlRoutingModule) -> Self {
        Self {
            module: Arc::new(module),
        }
    }

    pub fn module(&self) -> &UrlRoutingModule {
        &self.module
    }
}

impl<S> Layer<S> for UrlRoutingLayer {
    type Service = UrlRoutingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        UrlRoutingService {
            inner,
            module: Arc::clone(&self.module),
        }
    }
}

/// Substitutes the matched route's handler for the wrapped service.
#[derive(Debug, Clone)]
pub struct UrlRoutingService<S> {
    inner: S,
    module: Arc<UrlRoutingModule>,
}

/// Adapts an in-flight request to [`PipelineContext`].
struct HttpContext<'a> {
    request: &'a mut Request<Body>,
    handler: Option<HttpHandler>,
}

impl PipelineContext for HttpContext<'_> {
    fn request(&self) -> RequestHead<'_> {
        RequestHead::from_request(self.request)
    }

    fn set_request_context(&mut self, context: RequestContext) {
        self.request.extensions_mut().insert(context);
    }

    fn remap_handler(&mut self, handler: HttpHandler) {
        self.handler = Some(handler);
    }
}

impl<S> Service<Request<Body>> for UrlRoutingService<S>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let mut context = HttpContext {
            request: &mut request,
            handler: None,
        };
        let outcome = self.module.post_resolve_request_cache(Some(&mut context));
        let handler = context.handler.take();

        match (outcome, handler) {
            (Ok(Resolution::Routed), Some(handler)) => {
                return Box::pin(handler.oneshot(request));
            }
            (Ok(_), _) => {}
            (Err(err), _) => {
                tracing::error!(
                    method = %request.method(),
                    path = %request.uri().path(),
                    error = %err,
                    "URL routing failed"
                );
                return Box::pin(async move { Ok(err.into_response()) });
            }
        }

        // The ready service handles this call; a fresh clone takes its place.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::RouteHandler;
    use crate::routing::route::Route;
    use crate::routing::table::RouteTable;
    use axum::http::StatusCode;
    use tower::service_fn;

    fn text(body: &'static str) -> HttpHandler {
        HttpHandler::new(service_fn(move |_req: Request<Body>| async move {
            Ok::<_, Infallible>(body.into_response())
        }))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn service(table: RouteTable) -> UrlRoutingService<HttpHandler> {
        UrlRoutingLayer::new(UrlRoutingModule::new(table)).layer(text("default"))
    }

    #[tokio::test]
    async fn test_routed_request_uses_route_handler() {
        let mut table = RouteTable::new();
        table.add(Route::new("/hello", RouteHandler::service(text("routed"))).unwrap());

        let response = service(table)
            .oneshot(Request::get("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "routed");
    }

    #[tokio::test]
    async fn test_unmatched_request_uses_default() {
        let response = service(RouteTable::new())
            .oneshot(Request::get("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_string(response).await, "default");
    }

    #[tokio::test]
    async fn test_configuration_error_is_500() {
        let mut table = RouteTable::new();
        table.add(Route::unhandled("/broken").unwrap());

        let response = service(table)
            .oneshot(Request::get("/broken").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("no handler factory"));
    }
}
