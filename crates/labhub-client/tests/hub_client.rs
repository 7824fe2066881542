use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use labhub_client::{
    HttpGateway, LabOrderWorkflow, OrderTransmitter, RequisitionFetcher, RequisitionStatus,
    ResultsRetriever, RetryPolicy, TokenProvider,
};
use labhub_config::{HubSettings, SiteOptions};
use labhub_core::{AbnRequirement, BillingType, HubError, HubMode, LabOrder, OrderMetadata};
use labhub_storage::InMemoryStorage;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const TOKEN_PATH: &str = "/hub-authorization-server/oauth2/token";
const DOCUMENT_PATH: &str = "/hub-resource-server/oauth2/order/document";
const HL7: &[u8] = b"MSH|^~\\&|EMR|CLINIC|LAB|HUB|20260301||ORM^O01|1|T|2.3\r";

fn settings(server: &MockServer) -> HubSettings {
    HubSettings {
        client_id: Some("clinic".into()),
        client_secret: Some("s3cret".into()),
        testing_url: server.uri(),
        timeout_secs: 5,
        ..Default::default()
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=clinic"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "expires_in": 3600})),
        )
        .mount(server)
        .await;
}

fn gateway(server: &MockServer) -> Arc<HttpGateway> {
    Arc::new(HttpGateway::new(&settings(server), HubMode::Test).unwrap())
}

fn order(billing: &str, abn: &str) -> LabOrder {
    LabOrder::new(
        HL7,
        OrderMetadata {
            order_id: 4021,
            patient_id: 77,
            billing_type: BillingType::from_code(billing),
            abn: AbnRequirement::from_flag(abn),
        },
    )
}

/// Matches order-document requests whose `documentTypes` equal `expected` exactly.
fn document_types(
    expected: &'static [&'static str],
) -> impl Fn(&Request) -> bool + Send + Sync + 'static {
    move |req: &Request| {
        serde_json::from_slice::<Value>(&req.body)
            .ok()
            .and_then(|v| v.get("documentTypes").cloned())
            == Some(json!(expected))
    }
}

fn package(document_type: &str, data: &str) -> Value {
    json!({
        "orderSupportDocuments": [{
            "documentType": document_type,
            "documentData": data,
            "responseMessage": "Success",
            "requestStatus": "SUCCESS"
        }]
    })
}

#[tokio::test]
async fn token_is_fetched_with_client_credentials() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let provider = TokenProvider::new(&settings(&server), HubMode::Test).unwrap();
    let token = provider.get_token().await.unwrap();
    assert_eq!(token.access_token, "tok-1");
    assert_eq!(token.expires_in, Some(3600));
}

#[tokio::test]
async fn token_rejection_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_client"}"#))
        .mount(&server)
        .await;

    let provider = TokenProvider::new(&settings(&server), HubMode::Test).unwrap();
    match provider.get_token().await.unwrap_err() {
        HubError::Http { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, br#"{"error":"invalid_client"}"#);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn token_response_without_access_token_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"token_type":"bearer"}"#))
        .mount(&server)
        .await;

    let provider = TokenProvider::new(&settings(&server), HubMode::Test).unwrap();
    let err = provider.get_token().await.unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let server = MockServer::start().await;
    let mut s = settings(&server);
    s.client_secret = None;

    let err = HttpGateway::new(&s, HubMode::Test).unwrap_err();
    assert!(matches!(err, HubError::Config { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn gateway_sends_bearer_token_and_returns_body() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/hub-resource-server/oauth2/ping"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let body = gateway(&server)
        .get("/hub-resource-server/oauth2/ping")
        .await
        .unwrap();
    assert_eq!(body, r#"{"ok":true}"#);
}

#[tokio::test]
async fn gateway_surfaces_exact_error_body() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let raw = "<html>\n  upstream timeout \u{2013} try again\n</html>";
    Mock::given(method("POST"))
        .and(path("/hub-resource-server/oauth2/thing"))
        .respond_with(ResponseTemplate::new(502).set_body_string(raw))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .post("/hub-resource-server/oauth2/thing", &json!({}))
        .await
        .unwrap_err();
    match err {
        HubError::Http { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, raw.as_bytes());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn gateway_keeps_non_utf8_error_body_bytes() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let raw: &[u8] = b"err \xff\xfe latin1 \xe9";
    Mock::given(method("GET"))
        .and(path("/hub-resource-server/oauth2/ping"))
        .respond_with(ResponseTemplate::new(500).set_body_bytes(raw.to_vec()))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .get("/hub-resource-server/oauth2/ping")
        .await
        .unwrap_err();
    assert_eq!(err.body_text().unwrap(), "err \u{fffd}\u{fffd} latin1 \u{fffd}");
    match err {
        HubError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, raw);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn non_200_success_codes_are_still_errors() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/hub-resource-server/oauth2/accepted"))
        .respond_with(ResponseTemplate::new(202).set_body_string("queued"))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .get("/hub-resource-server/oauth2/accepted")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(202));
}

#[tokio::test]
async fn unreachable_hub_is_transport_error() {
    let s = HubSettings {
        client_id: Some("clinic".into()),
        client_secret: Some("s3cret".into()),
        testing_url: "http://127.0.0.1:1".into(),
        timeout_secs: 2,
        ..Default::default()
    };
    let gateway = HttpGateway::new(&s, HubMode::Test).unwrap();
    let err = gateway.get("/anything").await.unwrap_err();
    assert!(matches!(err, HubError::Transport { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn transmitter_posts_base64_order_with_all_document_types() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .and(body_json(json!({
            "orderHl7": BASE64.encode(HL7),
            "documentTypes": ["ABN", "REQ", "AOE"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"accepted"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let response = OrderTransmitter::new(gateway(&server))
        .transmit(HL7)
        .await
        .unwrap();
    assert_eq!(response, r#"{"status":"accepted"}"#);
}

#[tokio::test]
async fn results_retriever_requests_hl7() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/hub-resource-server/oauth2/result/getResults"))
        .and(body_json(json!({"resultServiceType": "HL7"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results":[]}"#))
        .mount(&server)
        .await;

    let body = ResultsRetriever::new(gateway(&server))
        .retrieve_hl7()
        .await
        .unwrap();
    assert_eq!(body, r#"{"results":[]}"#);
}

#[tokio::test]
async fn requisition_is_decoded_and_saved() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let pdf = b"%PDF-1.7\n\xE2\xE3\xCF\xD3\n1 0 obj\n".to_vec();
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .and(document_types(&["ABN", "REQ", "AOE"]))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(package("ABN,REQ", &BASE64.encode(BASE64.encode(&pdf)))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(InMemoryStorage::new());
    storage.add_order_code(4021, "12345").await;
    labhub_storage::CatalogStore::insert_question(
        storage.as_ref(),
        &labhub_core::ProcedureQuestion {
            lab_id: 1,
            procedure_code: "12345".into(),
            question_code: "FAST".into(),
            text: "Fasting?".into(),
            tips: String::new(),
            field_type: labhub_core::FieldType::Select,
            active: true,
        },
    )
    .await
    .unwrap();

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("labs");
    let fetcher = RequisitionFetcher::new(gateway(&server), storage, &dir);

    let requisition = fetcher.fetch(&order("T", "required")).await.unwrap();
    assert!(requisition.file_name.starts_with("abn-requisition-4021-"));
    assert!(requisition.file_name.ends_with(".pdf"));
    assert_eq!(requisition.pdf, pdf);
    assert_eq!(std::fs::read(dir.join(&requisition.file_name)).unwrap(), pdf);
}

#[tokio::test]
async fn requisition_without_documents_is_parse_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"orderSupportDocuments":[]}"#))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = RequisitionFetcher::new(gateway(&server), Arc::new(InMemoryStorage::new()), tmp.path());
    let err = fetcher.fetch(&order("P", "")).await.unwrap_err();
    match err {
        HubError::Parse { body, .. } => assert_eq!(body, r#"{"orderSupportDocuments":[]}"#),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn corrupt_requisition_payload_is_http_error_with_body() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    let response = package("REQ", "JVBER!!!not-base64");
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(response.clone()))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = RequisitionFetcher::new(gateway(&server), Arc::new(InMemoryStorage::new()), tmp.path());
    match fetcher.fetch(&order("P", "")).await.unwrap_err() {
        HubError::Http { status, body } => {
            assert_eq!(status, 200);
            assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), response);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

fn workflow(server: &MockServer, dir: &std::path::Path, site: SiteOptions) -> LabOrderWorkflow {
    let gateway = gateway(server);
    LabOrderWorkflow::new(
        OrderTransmitter::new(gateway.clone()),
        RequisitionFetcher::new(gateway, Arc::new(InMemoryStorage::new()), dir),
        RetryPolicy::immediate(3),
        site,
    )
}

async fn mount_transmission(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .and(document_types(&["ABN", "REQ", "AOE"]))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"accepted"}"#))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn workflow_skips_requisition_when_disabled() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_transmission(&server).await;

    let tmp = tempfile::tempdir().unwrap();
    let site = SiteOptions {
        download_requisition: false,
        ..Default::default()
    };
    let outcome = workflow(&server, tmp.path(), site)
        .submit(&order("P", ""))
        .await
        .unwrap();
    assert_eq!(outcome.response, r#"{"status":"accepted"}"#);
    assert!(matches!(outcome.requisition, RequisitionStatus::Skipped));
}

#[tokio::test]
async fn workflow_reports_requisition_failure_without_failing() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_transmission(&server).await;
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .and(document_types(&["REQ"]))
        .respond_with(ResponseTemplate::new(503).set_body_string("documents not ready"))
        .expect(3)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let outcome = workflow(&server, tmp.path(), SiteOptions::default())
        .submit(&order("P", ""))
        .await
        .unwrap();

    assert_eq!(outcome.response, r#"{"status":"accepted"}"#);
    match outcome.requisition {
        RequisitionStatus::Failed {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error.status(), Some(503));
        }
        other => panic!("unexpected requisition status: {other:?}"),
    }
}

#[tokio::test]
async fn workflow_saves_requisition_after_retry() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_transmission(&server).await;
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .and(document_types(&["REQ"]))
        .respond_with(ResponseTemplate::new(500).set_body_string("busy"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .and(document_types(&["REQ"]))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(package("REQ", &BASE64.encode(BASE64.encode(b"%PDF-1.4")))),
        )
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let outcome = workflow(&server, tmp.path(), SiteOptions::default())
        .submit(&order("P", ""))
        .await
        .unwrap();

    match outcome.requisition {
        RequisitionStatus::Saved { file } => {
            assert!(file.starts_with("requisition-4021-"));
            assert_eq!(std::fs::read(tmp.path().join(file)).unwrap(), b"%PDF-1.4");
        }
        other => panic!("unexpected requisition status: {other:?}"),
    }
}

#[tokio::test]
async fn workflow_propagates_transmission_failure() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(DOCUMENT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad hl7"))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let err = workflow(&server, tmp.path(), SiteOptions::default())
        .submit(&order("P", ""))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}
