use super::*;
use crate::config::{EmbeddingModel, HostConfig, IntegrationOptions};
use crate::integration::{catalog, descriptor, IntegrationName};
use crate::resolver::resolve;
use mockito::{Matcher, Server};
use serde_json::json;

fn processed(id: IntegrationName, host: &mut HostConfig) -> ProcessedIntegration {
    host.enabled_integrations = vec![IntegrationOptions::new(id)];
    resolve(catalog(), host).integrations.remove(0)
}

fn guru() -> ProcessedIntegration {
    processed(IntegrationName::Guru, &mut HostConfig::default())
}

fn creds(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_validation_reports_first_missing_field() {
    let guru = descriptor(IntegrationName::Guru).unwrap();

    let err = validate_credentials(guru, &creds(&[])).unwrap_err();
    assert_eq!(err.field, "username");
    assert_eq!(err.to_string(), "Please enter your Guru username");

    let err = validate_credentials(guru, &creds(&[("username", "alice"), ("access_token", "   ")]))
        .unwrap_err();
    assert_eq!(err.to_string(), "Please enter your access token.");
}

#[test]
fn test_validation_trims_and_drops_unknown_fields() {
    let guru = descriptor(IntegrationName::Guru).unwrap();
    let accepted = validate_credentials(
        guru,
        &creds(&[
            ("username", " alice "),
            ("access_token", "tok123"),
            ("extra", "x"),
        ]),
    )
    .unwrap();
    assert_eq!(
        accepted,
        creds(&[("access_token", "tok123"), ("username", "alice")])
    );
}

#[test]
fn test_payload_contents() {
    let mut host = HostConfig::default();
    host.chunk_size = Some(900);
    host.embedding_model = EmbeddingModel::CohereMultilingualV3;
    host.max_items_per_chunk = Some(3);
    host.tags.insert("team".into(), json!("support"));
    let guru = processed(IntegrationName::Guru, &mut host);

    let body = connect_payload(&guru, &creds(&[("username", "alice")]), Some("REQ"));
    assert_eq!(body["username"], "alice");
    assert_eq!(body["chunk_size"], 900);
    assert_eq!(body["chunk_overlap"], 20);
    assert_eq!(body["embedding_model"], "COHERE_MULTILINGUAL_V3");
    assert_eq!(body["max_items_per_chunk"], 3);
    assert_eq!(body["tags"], json!({"team": "support"}));
    assert_eq!(body["request_id"], "REQ");
    assert_eq!(body["sync_files_on_connection"], true);

    let bare = connect_payload(&guru, &BTreeMap::new(), None);
    assert!(bare.get("request_id").is_none());
    assert!(bare.get("file_sync_config").is_none());
}

#[tokio::test]
async fn test_execute_connected() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/integrations/guru")
        .match_header("authorization", "Token tok")
        .match_body(Matcher::PartialJson(json!({
            "username": "alice",
            "access_token": "tok123",
            "chunk_size": 1500
        })))
        .with_status(200)
        .with_body(r#"{"data_source_id": 7}"#)
        .expect(1)
        .create_async()
        .await;

    let session = Session::new(server.url(), None, "test");
    session.set_access_token(Some("tok".into()));
    let outcome = execute(
        &session,
        &guru(),
        &creds(&[("username", "alice"), ("access_token", "tok123")]),
        None,
    )
    .await;

    assert_eq!(
        outcome,
        ConnectOutcome::Connected {
            status: 200,
            data: json!({"data_source_id": 7})
        }
    );
    assert_eq!(
        outcome.banner("Guru").message,
        "Guru sync initiated, you will be redirected shortly!"
    );
    assert!(outcome.host_error(&guru()).is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_execute_rejected_keeps_detail_and_status() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/integrations/guru")
        .with_status(400)
        .with_body(r#"{"detail": "invalid token"}"#)
        .create_async()
        .await;

    let session = Session::new(server.url(), None, "test");
    let outcome = execute(&session, &guru(), &creds(&[("username", "a")]), None).await;

    assert_eq!(
        outcome,
        ConnectOutcome::Rejected {
            status: 400,
            message: "invalid token".to_string()
        }
    );
    let event = outcome.host_error(&guru()).unwrap();
    assert_eq!(event.status, 400);
    assert_eq!(event.data, json!([{"message": "invalid token"}]));
}

#[tokio::test]
async fn test_execute_rejected_without_detail_uses_generic_message() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/integrations/guru")
        .with_status(503)
        .with_body("{}")
        .create_async()
        .await;

    let session = Session::new(server.url(), None, "test");
    let outcome = execute(&session, &guru(), &BTreeMap::new(), None).await;
    assert_eq!(
        outcome,
        ConnectOutcome::Rejected {
            status: 503,
            message: "Error connecting your Guru account. Please try again.".to_string()
        }
    );
}

#[tokio::test]
async fn test_execute_unreadable_body_is_unreachable() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/integrations/guru")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let session = Session::new(server.url(), None, "test");
    let outcome = execute(&session, &guru(), &BTreeMap::new(), None).await;
    assert!(matches!(outcome, ConnectOutcome::Unreachable { .. }));
    assert_eq!(outcome.host_error(&guru()).unwrap().status, 400);
}

#[tokio::test]
async fn test_execute_transport_failure_is_unreachable() {
    let session = Session::new("http://127.0.0.1:9", None, "test");
    let outcome = execute(&session, &guru(), &BTreeMap::new(), None).await;

    assert_eq!(
        outcome,
        ConnectOutcome::Unreachable {
            message: "Error connecting your Guru account. Please try again.".to_string()
        }
    );
    let event = outcome.host_error(&guru()).unwrap();
    assert_eq!(event.status, 400);
    assert_eq!(
        event.message(),
        Some("Error connecting your Guru account. Please try again.")
    );
}

#[tokio::test]
async fn test_execute_sends_request_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/integrations/guru")
        .match_body(Matcher::PartialJson(json!({"request_id": "ABCDEFGHJKLMNPQRSTUV"})))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let session = Session::new(server.url(), None, "test");
    let outcome = execute(&session, &guru(), &BTreeMap::new(), Some("ABCDEFGHJKLMNPQRSTUV")).await;
    assert!(outcome.is_connected());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_oauth_url_requested_with_service() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/integrations/oauth_url")
        .match_body(Matcher::PartialJson(json!({"service": "NOTION"})))
        .with_status(200)
        .with_body(r#"{"oauth_url": "https://notion.example/consent"}"#)
        .expect(1)
        .create_async()
        .await;

    let notion = processed(IntegrationName::Notion, &mut HostConfig::default());
    let session = Session::new(server.url(), None, "test");
    let outcome = request_oauth_url(&session, &notion, None).await;

    match outcome {
        ConnectOutcome::Connected { data, .. } => {
            assert_eq!(data["oauth_url"], "https://notion.example/consent")
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_oauth_response_without_url_is_unreachable() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/integrations/oauth_url")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let notion = processed(IntegrationName::Notion, &mut HostConfig::default());
    let session = Session::new(server.url(), None, "test");
    let outcome = request_oauth_url(&session, &notion, None).await;
    assert!(matches!(outcome, ConnectOutcome::Unreachable { .. }));
}
