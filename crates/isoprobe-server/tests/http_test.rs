//! HTTP behaviour of the assembled router, served on a loopback port.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use isoprobe_common::config::{CorsConfig, ProbeConfig, WorkloadLimits};
use isoprobe_core::cgroup::CgroupInspector;
use isoprobe_core::namespace::NamespaceInspector;
use isoprobe_server::{AppState, build_router};
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    state: AppState,
    base: String,
    client: reqwest::Client,
}

impl Fixture {
    fn request(&self, method: Method, uri: &str) -> reqwest::RequestBuilder {
        self.client.request(method, format!("{}{uri}", self.base))
    }
}

fn limits() -> WorkloadLimits {
    WorkloadLimits {
        max_iterations: 100,
        max_memory_mb: 2,
        max_disk_operations: 20,
        request_timeout_ms: 10_000,
        max_concurrent: 1,
    }
}

fn fake_proc(root: &Path) {
    let ns = root.join(std::process::id().to_string()).join("ns");
    fs::create_dir_all(&ns).expect("ns dir");
    for kind in ["pid", "net", "mnt", "uts", "ipc", "cgroup"] {
        fs::write(ns.join(kind), b"").expect("ns entry");
    }
}

fn fake_cgroup(dir: &Path) -> (PathBuf, PathBuf) {
    let membership = dir.join("cgroup");
    fs::write(&membership, "0::/docker/abc123\n").expect("membership");
    let root = dir.join("sys-fs-cgroup");
    fs::create_dir_all(&root).expect("cgroup root");
    fs::write(root.join("memory.max"), "536870912\n").expect("memory.max");
    fs::write(root.join("pids.max"), "max\n").expect("pids.max");
    (membership, root)
}

async fn fixture_with(cors: CorsConfig) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let proc_root = dir.path().join("proc");
    fake_proc(&proc_root);
    let (membership, cgroup_root) = fake_cgroup(dir.path());
    let scratch = dir.path().join("scratch");
    fs::create_dir_all(&scratch).expect("scratch");
    let rootfs = dir.path().join("rootfs");
    fs::create_dir_all(&rootfs).expect("rootfs");

    let config = ProbeConfig {
        limits: limits(),
        scratch_dir: scratch,
        cors,
        ..ProbeConfig::default()
    };
    let state = AppState::with_inspectors(
        config,
        NamespaceInspector::new(proc_root),
        CgroupInspector::new(membership, cgroup_root),
        rootfs,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = build_router(state.clone()).into_make_service_with_connect_info::<SocketAddr>();
    let _server = tokio::spawn(async move { axum::serve(listener, app).await });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client");
    Fixture {
        dir,
        state,
        base: format!("http://{addr}"),
        client,
    }
}

async fn fixture() -> Fixture {
    fixture_with(CorsConfig::default()).await
}

async fn send(request: reqwest::RequestBuilder) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = request.send().await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await.expect("body").to_vec();
    (status, headers, body)
}

async fn get(f: &Fixture, uri: &str) -> (StatusCode, HeaderMap, Vec<u8>) {
    send(f.request(Method::GET, uri)).await
}

async fn get_json(f: &Fixture, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(f, uri).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn root_lists_endpoints() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Container Security Test Application");
    assert!(json["endpoints"]["stress"]["sub_endpoints"].is_array());
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn health_reports_memory_and_security_headers() {
    let f = fixture().await;
    let (status, headers, body) = get(&f, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["memory"]["rss_mb"].is_number());

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("referrer-policy"));
    assert!(headers.contains_key("permissions-policy"));
}

#[tokio::test]
async fn liveness_and_readiness_always_pass() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "alive");

    let (status, json) = get_json(&f, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn startup_probe_is_unavailable_during_grace_period() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/health/startup").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "starting");
}

#[tokio::test]
async fn namespace_info_reads_proc_tree() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/info/namespace").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], true);
    assert!(json["description"].is_string());
    assert_eq!(json["pid"], std::process::id());
    assert_eq!(json["namespaces"]["net"]["exists"], true);
    assert!(json["namespaces"]["net"]["inode"].is_u64());
    assert_eq!(json["namespaces"]["user"]["exists"], false);
}

#[tokio::test]
async fn missing_proc_is_reported_as_unavailable_not_failure() {
    let f = fixture().await;
    fs::remove_dir_all(f.dir.path().join("proc")).expect("remove proc");
    let (status, json) = get_json(&f, "/info/namespace").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], false);
    assert!(json["reason"].is_string());
}

#[tokio::test]
async fn cgroup_info_reads_membership_and_limits() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/info/cgroup").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], true);
    assert_eq!(json["cgroups"][0]["id"], "0");
    assert_eq!(json["cgroups"][0]["path"], "/docker/abc123");
    assert_eq!(json["limits"]["memory"], "536870912");
    assert_eq!(json["limits"]["pids"], "max");
    assert!(json["limits"]["cpu"].is_null());
}

#[tokio::test]
async fn system_info_describes_host_and_process() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["platform"], std::env::consts::OS);
    assert_eq!(json["process"]["pid"], std::process::id());
    assert!(json["cpus"]["count"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn security_info_checks_root_writability() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/info/security").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hardening"]["read_only_filesystem"], false);
    let warnings = json["hardening"]["warnings"].as_array().unwrap();
    assert!(warnings.iter().any(|w| w["severity"] == "MEDIUM"));
    assert!(json["user"]["uid"].is_u64());
}

#[tokio::test]
async fn info_all_combines_every_section() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/info/all").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["system"]["hostname"].is_string());
    assert_eq!(json["namespace"]["available"], true);
    assert_eq!(json["cgroup"]["available"], true);
    assert_eq!(json["security"]["read_only_filesystem"], false);
}

#[tokio::test]
async fn writability_check_leaves_root_clean() {
    let f = fixture().await;
    let (status, _) = get_json(&f, "/info/security").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(&f, "/info/all").await;
    assert_eq!(status, StatusCode::OK);

    let leftovers = fs::read_dir(f.dir.path().join("rootfs"))
        .expect("rootfs")
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn cpu_stress_uses_requested_iterations() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/stress/cpu?iterations=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");
    assert_eq!(json["test"], "CPU computation");
    assert_eq!(json["iterations"], 5);
    assert!(json["duration_ms"].as_u64().is_some());
}

#[tokio::test]
async fn cpu_stress_clamps_and_ignores_garbage() {
    let f = fixture().await;
    let (_, json) = get_json(&f, "/stress/cpu?iterations=999999999").await;
    assert_eq!(json["iterations"], 100);
    let (_, json) = get_json(&f, "/stress/cpu?iterations=-4").await;
    assert_eq!(json["iterations"], 1);
    let (_, json) = get_json(&f, "/stress/cpu?iterations=abc").await;
    assert_eq!(json["iterations"], 100);
}

#[tokio::test]
async fn memory_stress_clamps_to_configured_max() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/stress/memory?size=999999999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["allocated_mb"], 2);
    assert!(json["memory_usage"]["rss_mb"].is_number());
}

#[tokio::test]
async fn disk_stress_runs_at_least_once_and_cleans_up() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/stress/disk?operations=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["operations"], 1);
    assert_eq!(json["write_operations"], 1);
    assert_eq!(json["read_operations"], 1);
    let leftovers = fs::read_dir(f.dir.path().join("scratch")).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn disk_stress_failure_is_a_structured_error() {
    let f = fixture().await;
    fs::remove_dir_all(f.dir.path().join("scratch")).expect("remove scratch");
    let (status, json) = get_json(&f, "/stress/disk?operations=3").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert_eq!(json["test"], "Disk I/O");
    assert_eq!(json["operations"], 3);
    assert_eq!(json["write_operations"], 0);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn combined_stress_reports_both_parts() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/stress/combined?iterations=10&size=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cpu"]["iterations"], 10);
    assert_eq!(json["memory"]["allocated_mb"], 1);
}

#[tokio::test]
async fn unknown_route_is_json_404_and_counted_as_error() {
    let f = fixture().await;
    let (status, json) = get_json(&f, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "Not Found");
    assert_eq!(json["message"], "Endpoint GET /nope not found");
    assert_eq!(f.state.metrics.requests_total(), 1);
    assert_eq!(f.state.metrics.errors_total(), 1);
}

#[tokio::test]
async fn metrics_export_counts_requests_and_errors() {
    let f = fixture().await;
    let _ = get(&f, "/nope").await;
    let _ = get(&f, "/stress/cpu?iterations=2").await;
    let (status, headers, body) = get(&f, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_TYPE],
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("# TYPE container_test_http_requests_total counter\n"));
    assert!(text.contains("container_test_http_requests_total 3\n"));
    assert!(text.contains("container_test_http_errors_total 1\n"));
    assert!(text.contains("container_test_stress_cpu_runs_total 1\n"));
    assert!(text.find("uptime_seconds").unwrap() < text.find("http_requests_total").unwrap());
}

#[tokio::test]
async fn legacy_paths_redirect_with_query() {
    let f = fixture().await;
    let (status, headers, _) = get(&f, "/compute?iterations=5").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/stress/cpu?iterations=5");

    let (status, headers, _) = get(&f, "/namespace").await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/info/namespace");

    let (_, headers, _) = get(&f, "/memory?size=1").await;
    assert_eq!(headers[header::LOCATION], "/stress/memory?size=1");
}

#[tokio::test]
async fn cors_headers_absent_when_disabled() {
    let f = fixture().await;
    let request = f
        .request(Method::GET, "/health/live")
        .header(header::ORIGIN, "https://a.example");
    let (_, headers, _) = send(request).await;
    assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn cors_preflight_is_answered_directly() {
    let f = fixture_with(CorsConfig {
        enabled: true,
        allowed_origins: vec!["https://a.example".to_string()],
    })
    .await;
    let request = f
        .request(Method::OPTIONS, "/stress/cpu")
        .header(header::ORIGIN, "https://a.example");
    let (status, headers, _) = send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.example");
    assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    assert_eq!(headers[header::VARY], "Origin");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(f.state.metrics.requests_total(), 0);
}

#[tokio::test]
async fn cors_rejects_unlisted_origin() {
    let f = fixture_with(CorsConfig {
        enabled: true,
        allowed_origins: vec!["https://a.example".to_string()],
    })
    .await;
    let request = f
        .request(Method::GET, "/health/live")
        .header(header::ORIGIN, "https://evil.example");
    let (status, headers, _) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(!headers.contains_key(header::VARY));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
}

#[tokio::test]
async fn cors_echoed_origin_varies_by_origin() {
    let f = fixture_with(CorsConfig {
        enabled: true,
        allowed_origins: vec!["*".to_string()],
    })
    .await;
    let request = f
        .request(Method::GET, "/health/live")
        .header(header::ORIGIN, "https://b.example");
    let (status, headers, _) = send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://b.example");
    assert_eq!(headers[header::VARY], "Origin");

    let (_, headers, _) = get(&f, "/health/live").await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(!headers.contains_key(header::VARY));
}
