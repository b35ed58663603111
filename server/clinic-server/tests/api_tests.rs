use std::sync::{Arc, Mutex};

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_server::report::{ReportError, ReportRenderer, VisitReport};
use clinic_server::repositories::Repositories;
use clinic_server::{create_app, with_middleware, ClinicServer, ServerConfig};

const BOUNDARY: &str = "clinic-test-boundary";

/// Keeps the last assembled report instead of drawing a PDF
#[derive(Default)]
struct RecordingRenderer {
    last: Mutex<Option<VisitReport>>,
}

impl RecordingRenderer {
    fn last(&self) -> VisitReport {
        self.last.lock().unwrap().clone().expect("no report rendered")
    }
}

impl ReportRenderer for RecordingRenderer {
    fn render(&self, report: &VisitReport) -> Result<Vec<u8>, ReportError> {
        *self.last.lock().unwrap() = Some(report.clone());
        Ok(b"%PDF-test".to_vec())
    }
}

/// Test configuration: in-memory storage and scratch directories
struct TestConfig {
    app: Router,
    renderer: Arc<RecordingRenderer>,
    _uploads: tempfile::TempDir,
    _frontend: tempfile::TempDir,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response is not JSON")
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl TestConfig {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(customize: impl FnOnce(&mut ServerConfig)) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let frontend = tempfile::tempdir().unwrap();
        std::fs::write(frontend.path().join("index.html"), "<html>clinic</html>").unwrap();

        let mut config = ServerConfig {
            uploads_dir: uploads.path().to_path_buf(),
            frontend_dir: frontend.path().to_path_buf(),
            bcrypt_cost: 4,
            pg_dump_path: "true".into(),
            pg_restore_path: "true".into(),
            ..ServerConfig::default()
        };
        customize(&mut config);
        let renderer = Arc::new(RecordingRenderer::default());
        let server = ClinicServer::new(config, &Repositories::in_memory(), renderer.clone());

        Self {
            app: create_app(server),
            renderer,
            _uploads: uploads,
            _frontend: frontend,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, headers, body }
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn upload(&self, uri: &str, token: &str, file_name: &str, content: &[u8]) -> TestResponse {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Register a doctor named after `username` and return the bearer token
    async fn register(&self, username: &str) -> String {
        let response = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": format!("{username}@clinic.hr"),
                    "username": username,
                    "password": "s3cret-pass",
                    "first_name": "Ana",
                    "last_name": "Kovač",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()["token"].as_str().unwrap().to_string()
    }

    async fn create_patient(&self, token: &str, first_name: &str) -> String {
        let response = self
            .call(
                "POST",
                "/api/patients/create",
                Some(token),
                Some(json!({ "first_name": first_name, "last_name": "Kovač", "date_of_birth": "1990-04-12" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()["uuid"].as_str().unwrap().to_string()
    }

    async fn create_anamnesis(&self, token: &str, patient: &str, body: Value) -> String {
        let response = self
            .call("POST", &format!("/api/patients/{patient}/anamneses"), Some(token), Some(body))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()["uuid"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let config = TestConfig::new();
    let response = config.call("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_protected_route_requires_bearer() {
    let config = TestConfig::new();
    let response = config.call("GET", "/api/patients", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.json()["error"], "unauthorized");

    let response = config.call("GET", "/api/patients", Some("not-a-token"), None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_logout_cycle() {
    let config = TestConfig::new();
    let token = config.register("ana").await;

    let me = config.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["username"], "ana");

    let login = config
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "identifier": "ANA@clinic.hr", "password": "s3cret-pass" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let second = login.json()["token"].as_str().unwrap().to_string();
    assert_ne!(second, token);

    // body-less logout revokes the bearer token
    let logout = config.call("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    let me = config.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    let me = config.call("GET", "/api/auth/me", Some(&second), None).await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_conflict_and_bad_login() {
    let config = TestConfig::new();
    config.register("ana").await;

    let duplicate = config
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "email": "other@clinic.hr",
                "username": "ANA",
                "password": "x",
                "first_name": "A",
                "last_name": "B",
            })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.json()["error"], "conflict");

    let unknown = config
        .call("POST", "/api/auth/login", None, Some(json!({ "username": "nobody", "password": "x" })))
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let wrong = config
        .call("POST", "/api/auth/login", None, Some(json!({ "username": "ana", "password": "nope" })))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_invalid_request() {
    let config = TestConfig::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = config.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "invalid_request");
}

#[tokio::test]
async fn test_other_doctors_patient_is_rejected() {
    let config = TestConfig::new();
    let doctor_a = config.register("ana").await;
    let doctor_b = config.register("ivo").await;
    let patient = config.create_patient(&doctor_a, "Ana").await;
    let uri = format!("/api/patients/{patient}");

    let own = config.call("GET", &uri, Some(&doctor_a), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json()["first_name"], "Ana");

    let foreign = config.call("GET", &uri, Some(&doctor_b), None).await;
    assert_eq!(foreign.status, StatusCode::BAD_REQUEST);
    assert_eq!(foreign.json()["error"], "invalid_request");

    let notes = config
        .call("GET", &format!("{uri}/anamneses"), Some(&doctor_b), None)
        .await;
    assert_eq!(notes.status, StatusCode::BAD_REQUEST);

    let listed = config.call("GET", "/api/patients", Some(&doctor_b), None).await;
    assert_eq!(listed.json()["patients"], json!([]));
}

#[tokio::test]
async fn test_patient_listing_is_paged_newest_first() {
    let config = TestConfig::new();
    let token = config.register("ana").await;
    for name in ["P1", "P2", "P3", "P4", "P5"] {
        config.create_patient(&token, name).await;
    }

    let page = config
        .call("GET", "/api/patients?page_size=2&current_page=2", Some(&token), None)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    let names: Vec<String> = page.json()["patients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["first_name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["P3", "P2"]);

    // malformed paging falls back to defaults
    let all = config
        .call("GET", "/api/patients?page_size=abc&current_page=-1", Some(&token), None)
        .await;
    assert_eq!(all.json()["patients"].as_array().unwrap().len(), 5);

    let search = config.call("GET", "/api/patients?query=p4", Some(&token), None).await;
    assert_eq!(search.json()["patients"][0]["first_name"], "P4");
}

#[tokio::test]
async fn test_patient_update_and_delete() {
    let config = TestConfig::new();
    let token = config.register("ana").await;
    let patient = config.create_patient(&token, "Ana").await;
    let uri = format!("/api/patients/{patient}");

    let updated = config
        .call("PATCH", &uri, Some(&token), Some(json!({ "phone": "091 555" })))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["phone"], "091 555");
    assert_eq!(updated.json()["first_name"], "Ana");
    assert!(!updated.json()["updated_at"].is_null());

    let deleted = config.call("DELETE", &uri, Some(&token), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = config.call("GET", &uri, Some(&token), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pdf_prints_included_visits_in_order() {
    let config = TestConfig::new();
    let token = config.register("ana").await;
    let patient = config.create_patient(&token, "Ana").await;

    let first = config
        .create_anamnesis(&token, &patient, json!({ "diagnosis": "lumbago" }))
        .await;
    let second = config
        .create_anamnesis(
            &token,
            &patient,
            json!({ "diagnosis": "cervikalgija", "include_visit_uuids": [first] }),
        )
        .await;
    let pdf_uri = format!("/api/patients/{patient}/anamneses/{second}/pdf");

    let response = config.call("POST", &pdf_uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"anamnesis.pdf\""
    );
    assert!(response.body.starts_with(b"%PDF"));

    let report = config.renderer.last();
    assert_eq!(report.visits.len(), 2);
    assert!(report.visits[0].heading.starts_with("1. posjet - "));
    assert!(report.visits[0].fields.contains(&("Dijagnoza", "lumbago".to_string())));
    assert!(report.visits[1].fields.contains(&("Dijagnoza", "cervikalgija".to_string())));
    assert_eq!(report.signature.as_deref(), Some("Ana Kovač"));
    assert_eq!(report.patient.date_of_birth.as_deref(), Some("12.04.1990."));

    let alone = config
        .call("POST", &format!("{pdf_uri}?only_current=true"), Some(&token), None)
        .await;
    assert_eq!(alone.status, StatusCode::OK);
    assert_eq!(config.renderer.last().visits.len(), 1);

    // an unreadable body falls back to the stored include list
    let request = Request::builder()
        .method("POST")
        .uri(&pdf_uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{oops"))
        .unwrap();
    assert_eq!(config.send(request).await.status, StatusCode::OK);
    assert_eq!(config.renderer.last().visits.len(), 2);
}

#[tokio::test]
async fn test_anamnesis_list_filters_by_diagnosis() {
    let config = TestConfig::new();
    let token = config.register("ana").await;
    let patient = config.create_patient(&token, "Ana").await;
    config
        .create_anamnesis(&token, &patient, json!({ "diagnosis": "Lumbago" }))
        .await;
    config
        .create_anamnesis(&token, &patient, json!({ "diagnosis": "Cervikalgija" }))
        .await;

    let uri = format!("/api/patients/{patient}/anamneses?query=lumb");
    let response = config.call("GET", &uri, Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK);
    let notes = response.json()["anamneses"].as_array().unwrap().clone();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["diagnosis"], "Lumbago");
}

#[tokio::test]
async fn test_profile_upsert_round_trip() {
    let config = TestConfig::new();
    let token = config.register("ana").await;

    let missing = config.call("GET", "/api/doctor/profile", Some(&token), None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let body = json!({ "practice_name": "Physio Centar", "address": "Ilica 1", "phone": "01 234" });
    let saved = config
        .call("PUT", "/api/doctor/profile", Some(&token), Some(body.clone()))
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    let profile = saved.json()["profile"].clone();
    assert_eq!(profile["practice_name"], "Physio Centar");

    let again = config
        .call("POST", "/api/doctor/profile", Some(&token), Some(body))
        .await;
    assert_eq!(again.json()["profile"]["uuid"], profile["uuid"]);

    let invalid = config
        .call("PATCH", "/api/doctor/profile", Some(&token), Some(json!({ "practice_name": "X" })))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_branding_upload_and_static_serving() {
    let config = TestConfig::new();
    let token = config.register("ana").await;

    let rejected = config.upload("/api/files/upload", &token, "logo.gif", b"GIF89a").await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.json()["error"], "invalid_request");

    let stored = config.upload("/api/files/upload", &token, "Logo.PNG", b"png-bytes").await;
    assert_eq!(stored.status, StatusCode::CREATED);
    let url = stored.json()["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/static/branding/"));
    assert!(url.ends_with(".png"));

    let served = config.call("GET", &url, None, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(&served.body[..], b"png-bytes");
}

#[cfg(unix)]
#[tokio::test]
async fn test_restore_reports_uploaded_file_name() {
    let config = TestConfig::new();
    let token = config.register("ana").await;

    let response = config
        .upload("/api/backup/restore", &token, "nightly.dump", b"PGDMP")
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(
        response.json(),
        json!({ "message": "restore completed", "file": "nightly.dump" })
    );
}

#[tokio::test]
async fn test_unknown_api_route_and_spa_fallback() {
    let config = TestConfig::new();

    let api = config.call("GET", "/api/nope", None, None).await;
    assert_eq!(api.status, StatusCode::NOT_FOUND);
    assert_eq!(api.json()["error"], "not_found");

    let page = config.call("GET", "/patients/123", None, None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text().contains("clinic"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let config = TestConfig::new();
    let response = config.call("GET", "/api/openapi.json", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["paths"]["/api/auth/login"].is_object());
}

#[allow(clippy::panic)]
async fn exploding_handler() -> StatusCode {
    panic!("visit note exploded")
}

#[tokio::test]
async fn test_handler_panic_becomes_json_500() {
    let app = with_middleware(Router::new().route("/boom", get(exploding_handler)));
    let response = app
        .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "internal_error");
    assert!(!json["message"].as_str().unwrap().contains("exploded"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_backup_download_streams_and_removes_dump() {
    use std::os::unix::fs::PermissionsExt;

    let bin = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    // stand-in pg_dump: `-Fc -f <file> <dsn>`
    let pg_dump = bin.path().join("pg_dump");
    std::fs::write(&pg_dump, "#!/bin/sh\nprintf PGDMP > \"$3\"\n").unwrap();
    std::fs::set_permissions(&pg_dump, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config = TestConfig::with_config(|c| {
        c.pg_dump_path = pg_dump.clone();
        c.backup_dir = Some(work.path().to_path_buf());
    });
    let token = config.register("ana").await;

    let unauthenticated = config.call("GET", "/api/backup", None, None).await;
    assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);

    let response = config.call("GET", "/api/backup", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.text());
    assert_eq!(response.headers[header::CONTENT_TYPE], "application/octet-stream");
    let disposition = response.headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"physio_"), "{disposition}");
    assert!(disposition.ends_with(".dump\""), "{disposition}");
    assert_eq!(&response.body[..], b"PGDMP");
    assert_eq!(std::fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_backup_failure_is_internal_error() {
    let work = tempfile::tempdir().unwrap();
    let config = TestConfig::with_config(|c| {
        c.pg_dump_path = "/nonexistent/pg_dump".into();
        c.backup_dir = Some(work.path().to_path_buf());
    });
    let token = config.register("ana").await;

    let response = config.call("GET", "/api/backup", Some(&token), None).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json()["error"], "internal_error");
}

#[tokio::test]
async fn test_doctor_directory_hides_credentials() {
    let config = TestConfig::new();
    let token = config.register("ana").await;

    let created = config
        .call(
            "POST",
            "/api/doctors",
            Some(&token),
            Some(json!({ "email": "iva@clinic.hr", "username": "iva", "first_name": "Iva", "last_name": "Horvat" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.text());
    let iva = created.json()["uuid"].as_str().unwrap().to_string();

    let listed = config.call("GET", "/api/doctors", Some(&token), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let usernames: Vec<_> = listed.json()["doctors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(usernames, ["iva", "ana"]);
    assert!(!listed.text().contains("password"));

    let searched = config.call("GET", "/api/doctors?query=horv", Some(&token), None).await;
    assert_eq!(searched.json()["doctors"].as_array().unwrap().len(), 1);

    let fetched = config.call("GET", &format!("/api/doctors/{iva}"), Some(&token), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json()["email"], "iva@clinic.hr");
    assert!(!fetched.text().contains("password"));

    let missing = config
        .call("GET", &format!("/api/doctors/{}", uuid::Uuid::new_v4()), Some(&token), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.json()["error"], "not_found");
}
