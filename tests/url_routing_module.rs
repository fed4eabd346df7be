//! Behaviour of the routing interceptor hook.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Uri};
use tower::ServiceExt;

use url_routing::routing::{
    ConfigurationError, HttpHandler, PipelineContext, RequestContext, RequestHead,
    RequestInterceptor, Resolution, Route, RouteHandler, RouteTable, RoutingError,
    SharedRouteTable, UrlRoutingModule,
};

mod common;

/// Records what the interceptor does to the pipeline.
struct MockPipeline {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    context: Option<RequestContext>,
    handler: Option<HttpHandler>,
    remaps: usize,
}

impl MockPipeline {
    fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            uri: path.parse().unwrap(),
            headers: HeaderMap::new(),
            context: None,
            handler: None,
            remaps: 0,
        }
    }

    async fn respond(self) -> String {
        let handler = self.handler.expect("no handler installed");
        let response = handler
            .oneshot(Request::get(self.uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        common::body_string(response).await
    }
}

impl PipelineContext for MockPipeline {
    fn request(&self) -> RequestHead<'_> {
        RequestHead::new(&self.method, &self.uri, &self.headers)
    }

    fn set_request_context(&mut self, context: RequestContext) {
        self.context = Some(context);
    }

    fn remap_handler(&mut self, handler: HttpHandler) {
        self.handler = Some(handler);
        self.remaps += 1;
    }
}

fn counting(calls: &Arc<AtomicUsize>, body: &'static str) -> RouteHandler {
    let calls = Arc::clone(calls);
    RouteHandler::from_fn(move |_ctx| {
        calls.fetch_add(1, Ordering::SeqCst);
        Some(common::text_handler(body))
    })
}

fn module(routes: Vec<Route>) -> UrlRoutingModule {
    let mut table = RouteTable::new();
    for route in routes {
        table.add(route);
    }
    UrlRoutingModule::new(table)
}

#[tokio::test]
async fn test_routes_in_insertion_order() {
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    let module = module(vec![
        Route::new("/users/{id}", counting(&a, "A")).unwrap(),
        Route::new("/users/new", counting(&b, "B")).unwrap(),
    ]);

    let mut pipeline = MockPipeline::get("/users/42");
    let resolution = module.post_resolve_request_cache(Some(&mut pipeline)).unwrap();
    assert_eq!(resolution, Resolution::Routed);
    assert_eq!(pipeline.remaps, 1);

    let context = pipeline.context.as_ref().expect("request context attached");
    assert_eq!(context.route_data().value("id"), Some("42"));
    assert_eq!(context.route_data().values().len(), 1);
    assert_eq!(context.uri().path(), "/users/42");
    assert_eq!(pipeline.respond().await, "A");

    // Both routes match; the earlier one wins.
    let mut pipeline = MockPipeline::get("/users/new");
    module.post_resolve_request_cache(Some(&mut pipeline)).unwrap();
    assert_eq!(pipeline.respond().await, "A");

    assert_eq!(a.load(Ordering::SeqCst), 2);
    assert_eq!(b.load(Ordering::SeqCst), 0);
}

#[test]
fn test_no_match_is_noop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let module = module(vec![Route::new("/users/{id}", counting(&calls, "A")).unwrap()]);

    let mut pipeline = MockPipeline::get("/archive");
    let resolution = module.post_resolve_request_cache(Some(&mut pipeline)).unwrap();

    assert_eq!(resolution, Resolution::NoMatch);
    assert!(pipeline.context.is_none());
    assert!(pipeline.handler.is_none());
    assert_eq!(pipeline.remaps, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_stop_routing_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut table = RouteTable::new();
    table.ignore("/static/{*file}").unwrap();
    table.add(Route::new("/{*any}", counting(&calls, "catch-all")).unwrap());
    let module = UrlRoutingModule::new(table);

    let mut pipeline = MockPipeline::get("/static/css/site.css");
    let resolution = module.post_resolve_request_cache(Some(&mut pipeline)).unwrap();

    assert_eq!(resolution, Resolution::Suppressed);
    assert!(pipeline.context.is_none());
    assert_eq!(pipeline.remaps, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Anything else still reaches the catch-all.
    let mut pipeline = MockPipeline::get("/about");
    let resolution = module.post_resolve_request_cache(Some(&mut pipeline)).unwrap();
    assert_eq!(resolution, Resolution::Routed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_context_is_invalid_argument() {
    let calls = Arc::new(AtomicUsize::new(0));
    let module = module(vec![Route::new("/{*any}", counting(&calls, "A")).unwrap()]);

    let err = module
        .post_resolve_request_cache::<MockPipeline>(None)
        .unwrap_err();
    assert_eq!(err, RoutingError::InvalidArgument { name: "context" });
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_route_without_handler_is_configuration_error() {
    let module = module(vec![Route::unhandled("/broken").unwrap().with_name("broken")]);

    let mut pipeline = MockPipeline::get("/broken");
    let err = module
        .post_resolve_request_cache(Some(&mut pipeline))
        .unwrap_err();

    assert_eq!(
        err,
        RoutingError::Configuration(ConfigurationError::MissingRouteHandler {
            route: "broken".into()
        })
    );
    assert!(pipeline.context.is_none());
    assert_eq!(pipeline.remaps, 0);
}

#[test]
fn test_factory_without_handler_is_configuration_error() {
    let module = module(vec![Route::new("/empty", RouteHandler::from_fn(|_| None)).unwrap()]);

    let mut pipeline = MockPipeline::get("/empty");
    let err = module
        .post_resolve_request_cache(Some(&mut pipeline))
        .unwrap_err();

    assert_eq!(
        err,
        RoutingError::Configuration(ConfigurationError::MissingHttpHandler {
            route: "/empty".into()
        })
    );
    assert!(pipeline.context.is_none());
    assert_eq!(pipeline.remaps, 0);
}

#[test]
fn test_factory_sees_route_data() {
    let seen = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&seen);
    let handler = RouteHandler::from_fn(move |ctx| {
        *sink.lock().unwrap() = Some((
            ctx.route_data().value("page").map(str::to_string),
            ctx.route_data().data_token("area").map(str::to_string),
        ));
        Some(common::text_handler("ok"))
    });
    let module = module(vec![Route::new("/docs/{page}", handler)
        .unwrap()
        .with_default("page", "index")
        .with_data_token("area", "docs")]);

    let mut pipeline = MockPipeline::get("/docs");
    module.post_resolve_request_cache(Some(&mut pipeline)).unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, Some((Some("index".to_string()), Some("docs".to_string()))));
}

#[test]
fn test_dyn_pipeline_context() {
    let calls = Arc::new(AtomicUsize::new(0));
    let module = module(vec![Route::new("/x", counting(&calls, "x")).unwrap()]);

    let mut pipeline = MockPipeline::get("/x");
    let context: &mut dyn PipelineContext = &mut pipeline;
    let resolution = module.post_resolve_request_cache(Some(context)).unwrap();

    assert_eq!(resolution, Resolution::Routed);
    assert_eq!(pipeline.remaps, 1);
}

#[test]
#[allow(deprecated)]
fn test_legacy_hook_does_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let module = module(vec![Route::new("/{*any}", counting(&calls, "A")).unwrap()]);

    let mut pipeline = MockPipeline::get("/anything");
    module.post_map_request_handler(Some(&mut pipeline));

    assert!(pipeline.context.is_none());
    assert_eq!(pipeline.remaps, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_replaced_table_applies_to_next_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let shared = SharedRouteTable::new(RouteTable::new());
    let module = UrlRoutingModule::new(shared.clone());

    let mut pipeline = MockPipeline::get("/new");
    assert_eq!(
        module.post_resolve_request_cache(Some(&mut pipeline)).unwrap(),
        Resolution::NoMatch
    );

    let mut table = RouteTable::new();
    table.add(Route::new("/new", counting(&calls, "new")).unwrap());
    shared.replace(table);

    let mut pipeline = MockPipeline::get("/new");
    assert_eq!(
        module.post_resolve_request_cache(Some(&mut pipeline)).unwrap(),
        Resolution::Routed
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
