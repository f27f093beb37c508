use std::time::Duration;

use jobdash_client::{Backend, ClientSettings, HttpBackend, RouteStyle};
use jobdash_core::{ErrorKind, GeneratedArtifact, Profile, SourceDocument};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{any, body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    backend_with(server, ClientSettings::default())
}

fn backend_with(server: &MockServer, settings: ClientSettings) -> HttpBackend {
    HttpBackend::new(ClientSettings {
        base_url: server.uri(),
        ..settings
    })
    .expect("valid settings")
}

async fn refuse_all_requests(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn lists_profiles_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "u2", "name": "Grace", "created_at": "2024-03-01" },
            { "id": "u1", "name": "Ada" }
        ])))
        .mount(&server)
        .await;

    let profiles = backend(&server).list_profiles().await.expect("profiles");
    assert_eq!(
        profiles,
        vec![
            Profile {
                id: "u2".to_string(),
                display_name: "Grace".to_string(),
                created_at: Some("2024-03-01".to_string()),
            },
            Profile {
                id: "u1".to_string(),
                display_name: "Ada".to_string(),
                created_at: None,
            },
        ]
    );
}

#[tokio::test]
async fn create_profile_posts_name_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({ "name": "Ada" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "u9", "name": "Ada" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let profile = backend(&server).create_profile("  Ada ").await.expect("created");
    assert_eq!(profile.id, "u9");
}

#[tokio::test]
async fn profile_scoped_calls_without_profile_never_reach_the_network() {
    let server = MockServer::start().await;
    refuse_all_requests(&server).await;
    let backend = backend(&server);

    let errors = vec![
        backend.list_source_documents("").await.unwrap_err(),
        backend.get_profile(" ").await.unwrap_err(),
        backend
            .upload_source_document("", b"x".to_vec(), "cv.pdf")
            .await
            .unwrap_err(),
        backend.remove_source_document("", 1).await.unwrap_err(),
        backend.download_source_document("", 1).await.unwrap_err(),
        backend.source_document_content("", 1).await.unwrap_err(),
        backend.search_job_postings("", Some("rust")).await.unwrap_err(),
        backend.generate_artifact("", "rust").await.unwrap_err(),
        backend.generate_artifact("u1", "   ").await.unwrap_err(),
        backend.analyze_fit("").await.unwrap_err(),
        backend.create_profile("").await.unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.kind, ErrorKind::PreconditionFailed, "{err}");
    }
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/resume-sources"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"cv.pdf\""))
        .and(body_string_contains("%PDF-1.7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "filename": "uploads/u1/cv.pdf",
            "resume_source_id": 42,
            "original_file_name": "cv.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let document = backend(&server)
        .upload_source_document("u1", b"%PDF-1.7".to_vec(), "cv.pdf")
        .await
        .expect("uploaded");
    assert_eq!(
        document,
        SourceDocument {
            id: 42,
            owner_profile_id: "u1".to_string(),
            stored_name: "uploads/u1/cv.pdf".to_string(),
            original_name: "cv.pdf".to_string(),
        }
    );
}

#[tokio::test]
async fn remove_reports_missing_document_as_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/users/u1/resume-sources/7"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Resume source not found" })),
        )
        .mount(&server)
        .await;

    let err = backend(&server)
        .remove_source_document("u1", 7)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "Resume source not found");
}

#[tokio::test]
async fn download_uses_declared_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/u1/resume-sources/3/download"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Disposition", "attachment; filename=\"ada_cv.pdf\"")
                .set_body_raw(b"%PDF".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/u1/resume-sources/4/download"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let named = backend.download_source_document("u1", 3).await.expect("download");
    assert_eq!(named.file_name, "ada_cv.pdf");
    assert_eq!(named.bytes, b"%PDF".to_vec());

    let unnamed = backend.download_source_document("u1", 4).await.expect("download");
    assert_eq!(unnamed.file_name, "document-4");
}

#[tokio::test]
async fn generate_uses_query_parameter_route_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/resumes"))
        .and(query_param("job_target", "rust developer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "resume_path": "out/u1/cv.pdf" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let artifact = backend(&server)
        .generate_artifact("u1", " rust developer ")
        .await
        .expect("artifact");
    assert_eq!(
        artifact,
        GeneratedArtifact {
            download_path: "out/u1/cv.pdf".to_string()
        }
    );
}

#[tokio::test]
async fn path_segment_routes_embed_the_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/rust/resumes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "resume_path": "out/u1/cv.pdf" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/job-postings/rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_with(
        &server,
        ClientSettings {
            route_style: RouteStyle::PathSegment,
            ..ClientSettings::default()
        },
    );
    backend.generate_artifact("u1", "rust").await.expect("artifact");
    backend
        .search_job_postings("u1", Some("rust"))
        .await
        .expect("search");
}

#[tokio::test]
async fn empty_download_path_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/resumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "resume_path": "" })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .generate_artifact("u1", "rust")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServerError(200));
}

#[tokio::test]
async fn search_without_keyword_omits_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/job-postings"))
        .and(query_param("keyword", "data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/job-postings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server);
    backend
        .search_job_postings("u1", Some("data"))
        .await
        .expect("keyword search");
    backend
        .search_job_postings("u1", Some("  "))
        .await
        .expect("blank keyword search");
}

#[tokio::test]
async fn postings_are_listed_with_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/job-postings"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Rust Engineer", "company": "Ferrous", "url": "https://jobs.example/1" }
        ])))
        .mount(&server)
        .await;

    let postings = backend(&server).list_job_postings(3).await.expect("postings");
    assert_eq!(postings.len(), 1);
    assert_eq!(postings[0].company.as_deref(), Some("Ferrous"));
    assert_eq!(
        postings[0].source_url.as_deref(),
        Some("https://jobs.example/1")
    );
}

#[tokio::test]
async fn analyze_fit_unwraps_analysis_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/analyze-job"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "analysis_result": { "score": 0.7, "missing": ["kubernetes"] }
        })))
        .mount(&server)
        .await;

    let analysis = backend(&server).analyze_fit("u1").await.expect("analysis");
    assert_eq!(analysis, json!({ "score": 0.7, "missing": ["kubernetes"] }));
}

#[tokio::test]
async fn status_codes_map_to_error_kinds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/bad"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "detail": "invalid user id" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/boom"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let err = backend.get_profile("bad").await.unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::BadRequest {
            details: "invalid user id".to_string()
        }
    );

    let err = backend.get_profile("boom").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServerError(503));
    assert_eq!(err.message, "maintenance");

    let err = backend.get_profile("garbled").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServerError(200));
}

#[tokio::test]
async fn slow_server_is_network_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let backend = backend_with(
        &server,
        ClientSettings {
            request_timeout: Duration::from_millis(50),
            ..ClientSettings::default()
        },
    );
    let err = backend.list_profiles().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NetworkUnavailable);
}

#[tokio::test]
async fn bearer_token_is_attached_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_with(
        &server,
        ClientSettings {
            auth_token: Some("s3cret".to_string()),
            ..ClientSettings::default()
        },
    );
    assert!(backend.list_profiles().await.expect("profiles").is_empty());
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = HttpBackend::new(ClientSettings {
        base_url: "not a url".to_string(),
        ..ClientSettings::default()
    })
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::BadRequest { .. }));
}
