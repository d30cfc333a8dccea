//! End-to-end dispatch tests.
//!
//! Each test builds a small application from modules and controllers and
//! drives real `http::Request`s through [`App::dispatch`], checking status,
//! headers and body of the finished response.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use waypoint::prelude::*;
use waypoint::core::{Request, Response};

/// Counts how many times something ran.
#[derive(Default)]
struct Calls(AtomicUsize);

impl Calls {
    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

struct Users {
    calls: Arc<Calls>,
}

impl Injectable for Users {
    fn inject(container: &Container) -> Result<Self, InjectionError> {
        Ok(Self {
            calls: container.resolve_required::<Calls>()?,
        })
    }
}

fn users_controller() -> Controller<Users> {
    Controller::new("/users")
        .display_name("Users")
        .route(
            RouteDef::get("/profile", |users: Arc<Users>, _args: Arguments| async move {
                users.calls.bump();
                json!({ "route": "profile" })
            }),
        )
        .route(
            RouteDef::get("/:id", |users: Arc<Users>, args: Arguments| async move {
                users.calls.bump();
                json!({ "route": "by-id", "id": args.value(0).cloned() })
            })
            .args([ParamSource::param("id")].into_iter().collect()),
        )
        .route(
            RouteDef::get("/:slug", |_users: Arc<Users>, _args: Arguments| async { json!({ "route": "by-slug" }) }),
        )
        .route(
            RouteDef::post("/", |users: Arc<Users>, args: Arguments| async move {
                users.calls.bump();
                args.value(0).cloned().unwrap_or_default()
            })
            .hook(Hook::new().body(Schema::object([("name", Schema::string().min_length(3).required())])))
            .args([ParamSource::Body].into_iter().collect()),
        )
}

fn app_with(module: Module, config: AppConfig) -> (App, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let module = module.provide(Arc::clone(&calls));
    let app = App::with_container(module, config, Arc::new(Container::new())).unwrap();
    (app, calls)
}

fn get(uri: &str) -> Request {
    HttpRequest::get(uri).body(Full::new(Bytes::new())).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request {
    HttpRequest::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Routing
// =============================================================================

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (app, _) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());

    let response = app.dispatch(get("/posts/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(json_body(response).await, json!({ "error": "/posts/1 not found!" }));
}

#[tokio::test]
async fn test_unregistered_method_is_not_allowed() {
    let (app, calls) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());

    let request = HttpRequest::delete("/users/profile").body(Full::new(Bytes::new())).unwrap();
    let response = app.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[http::header::ALLOW], "GET");
    assert_eq!(json_body(response).await, json!({ "error": "DELETE" }));
    assert_eq!(calls.get(), 0);
}

#[tokio::test]
async fn test_literal_pattern_beats_parametric() {
    let (app, _) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());

    let response = app.dispatch(get("/users/profile")).await;
    assert_eq!(json_body(response).await, json!({ "route": "profile" }));
}

#[tokio::test]
async fn test_first_registered_pattern_wins_ties() {
    let (app, _) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());

    // `/users/:id` and `/users/:slug` both match; `:id` was registered first.
    let response = app.dispatch(get("/users/42")).await;
    assert_eq!(json_body(response).await, json!({ "route": "by-id", "id": "42" }));
}

#[tokio::test]
async fn test_nested_module_prefixes() {
    let module = Module::new("root")
        .prefix("/api/")
        .import(Module::new("v1").prefix("v1").controller(users_controller()));
    let (app, _) = app_with(module, AppConfig::default());

    let response = app.dispatch(get("/api/v1/users/profile")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.dispatch(get("/users/profile")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Arguments and validation
// =============================================================================

#[tokio::test]
async fn test_body_schema_rejects_short_name() {
    let (app, calls) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());

    let response = app.dispatch(post_json("/users", &json!({ "name": "ab" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    let issues = body["error"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["path"], json!(["name"]));
    assert_eq!(calls.get(), 0);
}

#[tokio::test]
async fn test_json_round_trip() {
    let (app, calls) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());
    let payload = json!({ "name": "Ada Lovelace" });

    let response = app.dispatch(post_json("/users", &payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(json_body(response).await, payload);
    assert_eq!(calls.get(), 1);
}

struct Uploads;

impl Injectable for Uploads {
    fn inject(_: &Container) -> Result<Self, InjectionError> {
        Ok(Uploads)
    }
}

#[tokio::test]
async fn test_multipart_form_is_purified_and_validated() {
    let controller = Controller::<Uploads>::new("/uploads").route(
        RouteDef::post("/", |_u: Arc<Uploads>, args: Arguments| async move {
            args.value(0).cloned().unwrap_or_default()
        })
        .hook(Hook::new().form_data(Schema::object([
            ("title", Schema::string().required()),
            ("count", Schema::number().required()),
            ("public", Schema::boolean().required()),
        ])))
        .args([ParamSource::Body].into_iter().collect()),
    );
    let (app, _) = app_with(Module::new("root").controller(controller), AppConfig::default());

    let boundary = "waypoint-boundary";
    let body = [("title", "Report"), ("count", "3"), ("public", "true")]
        .iter()
        .map(|(name, value)| {
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
        })
        .collect::<String>()
        + &format!("--{boundary}--\r\n");

    let request = HttpRequest::post("/uploads")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Full::new(Bytes::from(body)))
        .unwrap();

    let response = app.dispatch(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "title": "Report", "count": 3, "public": true })
    );
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_throttle_rejects_then_recovers() {
    let config = AppConfig::builder()
        .middleware(Throttle::builder().limit(2).window(Duration::from_millis(100)).build())
        .build();
    let (app, _) = app_with(Module::new("root").controller(users_controller()), config);

    let from_client = || {
        HttpRequest::get("/users/profile")
            .header("x-forwarded-for", "10.0.0.1")
            .body(Full::new(Bytes::new()))
            .unwrap()
    };

    assert_eq!(app.dispatch(from_client()).await.status(), StatusCode::OK);
    assert_eq!(app.dispatch(from_client()).await.status(), StatusCode::OK);

    let response = app.dispatch(from_client()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await, json!({ "error": "Too Many Requests" }));

    // Another client has its own bucket.
    let other = HttpRequest::get("/users/profile")
        .header("x-forwarded-for", "10.0.0.2")
        .body(Full::new(Bytes::new()))
        .unwrap();
    assert_eq!(app.dispatch(other).await.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(app.dispatch(from_client()).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cors_headers_on_success_and_error() {
    let config = AppConfig::builder()
        .middleware(Cors::builder().allow_origin("https://app.example.com").build())
        .middleware(FnMiddleware::new("deny-admin", |req: IncomingRequest, _init| async move {
            if req.path().ends_with("/admin") {
                return Err(WaypointError::domain(StatusCode::FORBIDDEN, "Forbidden"));
            }
            Ok(None)
        }))
        .build();
    let module = Module::new("root")
        .controller(users_controller())
        .raw_route(Method::GET, "/users/admin", |_r: IncomingRequest| async { "never" });
    let (app, _) = app_with(module, config);

    let with_origin = |uri: &str| {
        HttpRequest::get(uri)
            .header("origin", "https://app.example.com")
            .body(Full::new(Bytes::new()))
            .unwrap()
    };

    let response = app.dispatch(with_origin("/users/profile")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "https://app.example.com");

    let response = app.dispatch(with_origin("/users/admin")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["access-control-allow-origin"], "https://app.example.com");

    let foreign = HttpRequest::get("/users/profile")
        .header("origin", "https://evil.example.com")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app.dispatch(foreign).await;
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_config_file_builds_global_middleware() {
    let file = ConfigLoader::new()
        .with_string(
            r#"
            [throttle]
            enabled = true
            limit = 1

            [response.headers]
            x-powered-by = "waypoint"
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();
    let config = AppConfig::from_config(&file).unwrap();
    let (app, _) = app_with(Module::new("root").controller(users_controller()), config);

    let response = app.dispatch(get("/users/profile")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-powered-by"], "waypoint");

    let response = app.dispatch(get("/users/profile")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-powered-by"], "waypoint");
}

#[tokio::test]
async fn test_configured_status_is_the_success_fallback() {
    let file = ConfigLoader::new()
        .with_string(
            r#"
            [response]
            status = 202
            "#,
            "toml",
        )
        .unwrap()
        .load()
        .unwrap();
    let config = AppConfig::from_config(&file).unwrap();
    let controller = Controller::<Users>::new("/jobs").route(
        RouteDef::post("/", |_u: Arc<Users>, _a: Arguments| async { json!({ "queued": true }) })
            .status(StatusCode::CREATED),
    );
    let module = Module::new("root")
        .controller(users_controller())
        .controller(controller)
        .raw_route(Method::GET, "/ping", |_r: IncomingRequest| async { json!({ "pong": true }) });
    let (app, _) = app_with(module, config);

    let response = app.dispatch(get("/ping")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(response).await, json!({ "pong": true }));

    let response = app.dispatch(get("/users/profile")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // An explicit route status still wins.
    let response = app.dispatch(post_json("/jobs", &json!({}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_throttle_bucket() {
    let config = AppConfig::builder()
        .middleware(Throttle::builder().limit(5).window(Duration::from_secs(60)).build())
        .build();
    let (app, calls) = app_with(Module::new("root").controller(users_controller()), config);

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                let request = HttpRequest::get("/users/profile")
                    .header("x-forwarded-for", "10.0.0.9")
                    .body(Full::new(Bytes::new()))
                    .unwrap();
                app.dispatch(request).await.status()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }

    let allowed = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let rejected = statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count();
    assert_eq!(allowed, 5);
    assert_eq!(rejected, 15);
    assert_eq!(calls.get(), 5);
}

// =============================================================================
// Hooks and the request registry
// =============================================================================

#[tokio::test]
async fn test_before_hook_short_circuits_handler() {
    let hook = Hook::new().before(|scope: HookScope| async move {
        if scope.request.header("authorization").is_some() {
            return Ok(HookOutcome::Continue);
        }
        let mut response = Response::new(Full::new(Bytes::from_static(b"login first")));
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        Ok::<_, WaypointError>(HookOutcome::Respond(response))
    });
    let controller = Controller::<Users>::new("/secure").route(
        RouteDef::get("/", |users: Arc<Users>, _a: Arguments| async move {
            users.calls.bump();
            "secret"
        })
        .hook(hook),
    );
    let (app, calls) = app_with(Module::new("root").controller(controller), AppConfig::default());

    let response = app.dispatch(get("/secure")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"login first");
    assert_eq!(calls.get(), 0);

    let authorized = HttpRequest::get("/secure")
        .header("authorization", "Bearer token")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = app.dispatch(authorized).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("secret"));
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_before_hook_fragment_reaches_response() {
    let checked = || {
        Hook::new().before(|_scope: HookScope| async {
            Ok::<_, WaypointError>(
                ResponseInit::new()
                    .status(StatusCode::ACCEPTED)
                    .header("x-checked", HeaderValue::from_static("yes")),
            )
        })
    };
    let controller = Controller::<Users>::new("/tasks")
        .route(RouteDef::get("/", |_u: Arc<Users>, _a: Arguments| async { json!([]) }).hook(checked()))
        .route(
            RouteDef::post("/", |_u: Arc<Users>, _a: Arguments| async { json!({ "id": 1 }) })
                .status(StatusCode::CREATED)
                .hook(checked()),
        );
    let (app, _) = app_with(Module::new("root").controller(controller), AppConfig::default());

    let response = app.dispatch(get("/tasks")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-checked"], "yes");
    assert_eq!(json_body(response).await, json!([]));

    let response = app.dispatch(post_json("/tasks", &json!({}))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-checked"], "yes");
}

#[tokio::test]
async fn test_after_hook_response_replaces_result() {
    let hook = Hook::new().after(|scope: HookScope| async move {
        let original = scope.result.unwrap_or_default();
        let body = json!({ "wrapped": original }).to_string();
        let mut response = Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = StatusCode::PARTIAL_CONTENT;
        Ok::<_, WaypointError>(HookOutcome::Respond(response))
    });
    let controller = Controller::<Users>::new("/report").route(
        RouteDef::get("/", |users: Arc<Users>, _a: Arguments| async move {
            users.calls.bump();
            json!({ "rows": 2 })
        })
        .hook(hook),
    );
    let (app, calls) = app_with(Module::new("root").controller(controller), AppConfig::default());

    let response = app.dispatch(get("/report")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(json_body(response).await, json!({ "wrapped": { "rows": 2 } }));
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_handler_response_passes_through_untouched() {
    let config = AppConfig::builder()
        .response_init(ResponseInit::new().header("x-default", HeaderValue::from_static("d")))
        .build();
    let controller = Controller::<Users>::new("/old").route(RouteDef::get("/", |_u: Arc<Users>, _a: Arguments| async {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::FOUND;
        response.headers_mut().insert(LOCATION, HeaderValue::from_static("/new"));
        response
    }));
    let (app, _) = app_with(Module::new("root").controller(controller), config);

    let response = app.dispatch(get("/old")).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/new");
    assert!(response.headers().get("x-default").is_none());
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

struct Profile {
    tenant: Option<Arc<String>>,
}

impl Injectable for Profile {
    fn inject(container: &Container) -> Result<Self, InjectionError> {
        Ok(Self {
            tenant: container.resolve_named::<String>("tenant"),
        })
    }
}

#[tokio::test]
async fn test_registry_hydrates_once() {
    let loads = Arc::new(Calls::default());
    let counter = Arc::clone(&loads);
    let entry = RequestRegistryEntry::new("tenant", move |req: IncomingRequest| {
        let counter = Arc::clone(&counter);
        async move {
            counter.bump();
            Ok::<_, WaypointError>(req.header("x-tenant").unwrap_or("none").to_string())
        }
    });

    let controller = Controller::<Profile>::new("/me").route(RouteDef::get("/", |p: Arc<Profile>, _a: Arguments| async move {
        json!({ "tenant": p.tenant.as_deref() })
    }));
    let (app, _) = app_with(
        Module::new("root").import(Module::new("account").request_registry(entry).controller(controller)),
        AppConfig::default(),
    );

    let first = HttpRequest::get("/me")
        .header("x-tenant", "acme")
        .body(Full::new(Bytes::new()))
        .unwrap();
    assert_eq!(json_body(app.dispatch(first).await).await, json!({ "tenant": "acme" }));

    let second = HttpRequest::get("/me")
        .header("x-tenant", "globex")
        .body(Full::new(Bytes::new()))
        .unwrap();
    assert_eq!(json_body(app.dispatch(second).await).await, json!({ "tenant": "acme" }));
    assert_eq!(loads.get(), 1);
}

#[tokio::test]
async fn test_method_handlers_share_one_app() {
    let (app, calls) = app_with(Module::new("root").controller(users_controller()), AppConfig::default());
    let handlers = app.handlers();

    let response = handlers.get.call(get("/users/profile")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = handlers.post.call(post_json("/users", &json!({ "name": "Grace" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.get(), 2);
}
