use std::path::Path;
use std::sync::Arc;

use routier::cache::{validate_signature_file, write_cache};
use routier::fs::{Filesystem, StdFilesystem};
use routier::http::Method;
use routier::loader::{bootstrap, CacheLoader, RouteLoader, SourceLoader};
use routier::route::Registrar;
use routier::RouteCollection;

fn sample_table() -> RouteCollection {
    let mut r = Registrar::new();
    r.get("/users/{id}")
        .unwrap()
        .name("users.show")
        .constraint("id", "[0-9]+")
        .middleware(["throttle"])
        .default_value("format", serde_json::json!("json"))
        .controller("UserController", "show");
    r.post("/users").unwrap().name("users.store").handler("users.store");
    r.get("/dash")
        .unwrap()
        .with_domain("{tenant}.example.com")
        .handler("dash")
        .authorize("tenant-member");

    let mut table = RouteCollection::new();
    for route in r.flush().unwrap() {
        table.add_route(route).unwrap();
    }
    table
}

#[test]
fn cache_round_trip_reproduces_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("routes.json");
    let fs = StdFilesystem;

    let original = sample_table();
    write_cache(&fs, &artifact, &original).unwrap();

    let loader = CacheLoader::new(Arc::new(StdFilesystem), &artifact);
    assert!(loader.is_available());
    let mut restored = RouteCollection::new();
    loader.load_into(&mut restored).unwrap();

    let original_routes = original.all_routes();
    let restored_routes = restored.all_routes();
    assert_eq!(original_routes.len(), restored_routes.len());
    for (a, b) in original_routes.iter().zip(&restored_routes) {
        assert_eq!(a.method(), b.method());
        assert_eq!(a.path(), b.path());
        assert_eq!(a.action(), b.action());
        assert_eq!(a.middleware(), b.middleware());
        assert_eq!(a.name(), b.name());
        assert_eq!(a.constraints(), b.constraints());
        assert_eq!(a.defaults(), b.defaults());
        assert_eq!(a.domain(), b.domain());
        assert_eq!(a.attributes(), b.attributes());
        assert_eq!(a.authorization(), b.authorization());
        assert_eq!(a.metadata(), b.metadata());
    }
}

#[test]
fn single_byte_tamper_invalidates_signature() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("routes.json");
    let fs = StdFilesystem;

    write_cache(&fs, &artifact, &sample_table()).unwrap();
    assert!(validate_signature_file(&fs, &artifact));

    let mut bytes = std::fs::read(&artifact).unwrap();
    bytes[0] ^= 0x01;
    std::fs::write(&artifact, &bytes).unwrap();

    assert!(!validate_signature_file(&fs, &artifact));
    let loader = CacheLoader::new(Arc::new(StdFilesystem), &artifact);
    assert!(!loader.is_available());
}

#[test]
fn missing_artifact_is_unavailable_not_an_error() {
    let fs = StdFilesystem;
    assert!(!validate_signature_file(&fs, Path::new("/nonexistent/routes.json")));
    let loader = CacheLoader::new(
        Arc::new(StdFilesystem),
        Path::new("/nonexistent/routes.json"),
    );
    assert!(!loader.is_available());
}

#[test]
fn bootstrap_prefers_valid_cache_over_source() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("routes.json");
    let source = dir.path().join("routes.rs");
    std::fs::write(&source, "// declarations").unwrap();
    let fs: Arc<dyn Filesystem> = Arc::new(StdFilesystem);

    write_cache(&StdFilesystem, &artifact, &sample_table()).unwrap();

    let loaders: Vec<Box<dyn RouteLoader>> = vec![
        Box::new(CacheLoader::new(Arc::clone(&fs), &artifact)),
        Box::new(SourceLoader::new(
            Arc::clone(&fs),
            &source,
            Arc::new(|r: &mut Registrar| {
                r.get("/from-source").unwrap().handler("h");
            }),
        )),
    ];
    let table = bootstrap(&loaders).unwrap();
    // Cache wins: the source-only route is absent.
    assert!(table.get_by_name("users.show").is_some());
    assert!(table.find_exact_route(Method::Get, "/from-source").is_none());
}

#[test]
fn bootstrap_falls_back_to_source_on_tampered_cache() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("routes.json");
    let source = dir.path().join("routes.rs");
    std::fs::write(&source, "// declarations").unwrap();
    let fs: Arc<dyn Filesystem> = Arc::new(StdFilesystem);

    write_cache(&StdFilesystem, &artifact, &sample_table()).unwrap();
    let mut bytes = std::fs::read(&artifact).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&artifact, &bytes).unwrap();

    let loaders: Vec<Box<dyn RouteLoader>> = vec![
        Box::new(CacheLoader::new(Arc::clone(&fs), &artifact)),
        Box::new(SourceLoader::new(
            Arc::clone(&fs),
            &source,
            Arc::new(|r: &mut Registrar| {
                r.get("/from-source").unwrap().handler("h");
            }),
        )),
    ];
    let table = bootstrap(&loaders).unwrap();
    assert!(table.find_exact_route(Method::Get, "/from-source").is_some());
}

#[test]
fn source_loader_runs_in_an_isolated_scope() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("routes.rs");
    std::fs::write(&source, "// declarations").unwrap();
    let fs: Arc<dyn Filesystem> = Arc::new(StdFilesystem);

    let loader = SourceLoader::new(
        fs,
        &source,
        Arc::new(|r: &mut Registrar| {
            r.get("/once").unwrap().handler("h");
        }),
    );

    // Two loads produce the same table; nothing leaks between scopes.
    let mut first = RouteCollection::new();
    loader.load_into(&mut first).unwrap();
    let mut second = RouteCollection::new();
    loader.load_into(&mut second).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[test]
fn closure_actions_fail_cache_write() {
    let mut r = Registrar::new();
    r.get("/dynamic").unwrap().action(|_req| {
        routier::Response::ok_json(serde_json::Value::Null)
    });
    let mut table = RouteCollection::new();
    for route in r.flush().unwrap() {
        table.add_route(route).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let err = write_cache(&StdFilesystem, &dir.path().join("routes.json"), &table).unwrap_err();
    assert!(matches!(err, routier::RouterError::CacheIntegrityFailure(_)));
}
