use std::sync::Arc;

use routier::http::{Method, Request, Response};
use routier::pipeline::{
    AuthorizationGate, ComponentRegistry, PipelineFactory, PolicyCheckMiddleware,
    AUTHORIZE_MIDDLEWARE_ID,
};
use routier::route::{Registrar, RouteGroupContext};
use routier::{RouteCollection, RouterKernel};

fn kernel_from(registrar: &mut Registrar) -> RouterKernel {
    kernel_with_registry(registrar, ComponentRegistry::new())
}

fn kernel_with_registry(registrar: &mut Registrar, registry: ComponentRegistry) -> RouterKernel {
    let mut table = RouteCollection::new();
    for route in registrar.flush().expect("route declarations build") {
        table.add_route(route).expect("route registers");
    }
    let factory = PipelineFactory::new(Arc::new(registry), Vec::new());
    RouterKernel::new(table, factory)
}

fn echo_params() -> impl Fn(Request) -> Response + Send + Sync + 'static {
    |req: Request| Response::ok_json(serde_json::json!(req.attributes))
}

#[test]
fn resolves_and_injects_params() {
    let mut r = Registrar::new();
    r.get("/users/{id}")
        .unwrap()
        .constraint("id", "[0-9]+")
        .action(echo_params());
    let kernel = kernel_from(&mut r);

    let res = kernel.resolve(Request::new(Method::Get, "/users/42"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "42");
}

#[test]
fn constraint_failure_yields_404() {
    let mut r = Registrar::new();
    r.get("/users/{id}")
        .unwrap()
        .constraint("id", "[0-9]+")
        .action(echo_params());
    let kernel = kernel_from(&mut r);

    let res = kernel.resolve(Request::new(Method::Get, "/users/abc"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body["method"], "GET");
}

#[test]
fn method_mismatch_yields_405_with_allow_header() {
    let mut r = Registrar::new();
    r.get("/widgets/{id}").unwrap().action(echo_params());
    let kernel = kernel_from(&mut r);

    let res = kernel.resolve(Request::new(Method::Post, "/widgets/42"));
    assert_eq!(res.status, 405);
    assert_eq!(res.headers["Allow"], "GET");
    assert_eq!(res.body["allow"], serde_json::json!(["GET"]));
}

#[test]
fn head_falls_back_to_get() {
    let mut r = Registrar::new();
    r.get("/report").unwrap().action(|_req| {
        Response::ok_json(serde_json::json!({"report": "full"}))
    });
    let kernel = kernel_from(&mut r);

    let res = kernel.resolve(Request::new(Method::Head, "/report"));
    assert_eq!(res.status, 200);
}

#[test]
fn fallback_handler_replaces_error_responses() {
    let mut r = Registrar::new();
    r.get("/known").unwrap().action(echo_params());
    let kernel = kernel_from(&mut r)
        .with_fallback(|req| Response::ok_json(serde_json::json!({"fallback": req.path})));

    let res = kernel.resolve(Request::new(Method::Get, "/unknown"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body["fallback"], "/unknown");
}

#[test]
fn trailing_slash_resolves_to_same_route() {
    let mut r = Registrar::new();
    r.get("/users").unwrap().action(echo_params());
    let kernel = kernel_from(&mut r);

    assert_eq!(kernel.resolve(Request::new(Method::Get, "/users")).status, 200);
    assert_eq!(kernel.resolve(Request::new(Method::Get, "/users/")).status, 200);
}

#[test]
fn exact_registration_beats_pattern_regardless_of_order() {
    let mut r = Registrar::new();
    r.get("/users/{id}").unwrap().action(|_req| {
        Response::ok_json(serde_json::json!("pattern"))
    });
    r.get("/users/me").unwrap().action(|_req| {
        Response::ok_json(serde_json::json!("exact"))
    });
    let kernel = kernel_from(&mut r);

    let res = kernel.resolve(Request::new(Method::Get, "/users/me"));
    assert_eq!(res.body, serde_json::json!("exact"));
}

#[test]
fn group_composition_end_to_end() {
    struct Mark;
    impl routier::Middleware for Mark {
        fn handle(
            &self,
            mut request: Request,
            next: &routier::Handler,
        ) -> Response {
            request.set_attribute("marked", serde_json::json!(true));
            next(request)
        }
    }
    let mut registry = ComponentRegistry::new();
    registry.register_middleware("mark", Arc::new(Mark));

    let mut r = Registrar::new();
    r.group(
        RouteGroupContext::new().prefix("/api/v1").middleware(["mark"]).name("api"),
        |r| {
            r.get("/ping").unwrap().name("ping").action(echo_params());
        },
    );
    let kernel = kernel_with_registry(&mut r, registry);

    let route = kernel.get_by_name("api.ping").expect("named route");
    assert_eq!(route.path(), "/api/v1/ping");
    assert_eq!(route.middleware(), ["mark"]);

    let res = kernel.resolve(Request::new(Method::Get, "/api/v1/ping"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body["marked"], true);
}

#[test]
fn authorization_policy_gates_the_route() {
    struct AdminOnly;
    impl AuthorizationGate for AdminOnly {
        fn authorize(&self, policy: &str, request: &Request) -> bool {
            policy == "admin" && request.header("x-role") == Some("admin")
        }
    }

    let mut registry = ComponentRegistry::new();
    registry.register_middleware(
        AUTHORIZE_MIDDLEWARE_ID,
        Arc::new(PolicyCheckMiddleware::new(Arc::new(AdminOnly))),
    );

    let mut r = Registrar::new();
    r.get("/admin").unwrap().authorize("admin").action(echo_params());
    let kernel = kernel_with_registry(&mut r, registry);

    let denied = kernel.resolve(Request::new(Method::Get, "/admin"));
    assert_eq!(denied.status, 403);

    let mut req = Request::new(Method::Get, "/admin");
    req.headers.insert("x-role".into(), "admin".into());
    let granted = kernel.resolve(req);
    assert_eq!(granted.status, 200);
}

#[test]
fn replace_table_swaps_routes_atomically() {
    let mut r = Registrar::new();
    r.get("/v1").unwrap().action(echo_params());
    let kernel = kernel_from(&mut r);
    assert_eq!(kernel.resolve(Request::new(Method::Get, "/v1")).status, 200);

    let mut r2 = Registrar::new();
    r2.get("/v2").unwrap().action(echo_params());
    let mut table = RouteCollection::new();
    for route in r2.flush().unwrap() {
        table.add_route(route).unwrap();
    }
    kernel.replace_table(table);

    assert_eq!(kernel.resolve(Request::new(Method::Get, "/v1")).status, 404);
    assert_eq!(kernel.resolve(Request::new(Method::Get, "/v2")).status, 200);
}

#[test]
fn any_routes_answer_every_method() {
    let mut r = Registrar::new();
    r.any("/health").unwrap().action(echo_params());
    let kernel = kernel_from(&mut r);

    for method in [Method::Get, Method::Post, Method::Delete] {
        assert_eq!(kernel.resolve(Request::new(method, "/health")).status, 200);
    }
}
