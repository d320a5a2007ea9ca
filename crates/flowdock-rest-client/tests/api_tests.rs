//! Integration tests for the Flowdock REST endpoints.
//!
//! Each test starts a wiremock server standing in for the REST host and checks
//! the request the client sends as well as how the response is decoded.

use flowdock_api_contract::{
    ApiContractError, Content, Flow, FlowCreateOptions, FlowsListOptions, InboxCreateOptions,
    MessageCreateOptions, MessagesListOptions, OrganizationUpdateOptions, TagMode,
    UserUpdateOptions,
};
use flowdock_rest_client::{AuthConfig, RestClient, RestClientError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RestClient {
    RestClient::from_urls(
        &server.uri(),
        &server.uri(),
        AuthConfig::with_bearer("test-token"),
    )
    .unwrap()
}

fn json_body(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "application/json")
}

#[tokio::test]
async fn test_flows_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(json_body(r#"[{"id":"1"}, {"id":"2"}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let flows = client_for(&server)
        .flows()
        .list(&FlowsListOptions::default())
        .await
        .unwrap();

    let ids: Vec<_> = flows.iter().map(|f| f.id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_flows_list_all_with_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/all"))
        .and(query_param("user", "true"))
        .respond_with(json_body(r#"[{"id":"1"}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let options = FlowsListOptions {
        all: true,
        users: true,
    };
    let flows = client_for(&server).flows().list(&options).await.unwrap();
    assert_eq!(flows.len(), 1);
}

#[tokio::test]
async fn test_flows_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/orgname/flowname"))
        .respond_with(json_body(r#"{"id":"1"}"#))
        .mount(&server)
        .await;

    let flow = client_for(&server)
        .flows()
        .get("orgname", "flowname")
        .await
        .unwrap();

    assert_eq!(
        flow,
        Flow {
            id: Some("1".into()),
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_flows_get_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/find"))
        .and(query_param("id", "orgname:flowname"))
        .respond_with(json_body(r#"{"id":"1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let flow = client_for(&server)
        .flows()
        .get_by_id("orgname:flowname")
        .await
        .unwrap();
    assert_eq!(flow.id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_flows_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flows/org"))
        .and(body_json(json!({"name": "flow"})))
        .respond_with(json_body(r#"{"id":"org:flow"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let options = FlowCreateOptions {
        name: "flow".into(),
    };
    let flow = client_for(&server)
        .flows()
        .create("org", Some(&options))
        .await
        .unwrap();
    assert_eq!(flow.id.as_deref(), Some("org:flow"));
}

#[tokio::test]
async fn test_flows_create_without_options_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(json_body("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).flows().create("org", None).await;
    assert!(matches!(
        result,
        Err(RestClientError::Config(ApiContractError::MissingOptions(_)))
    ));
}

#[tokio::test]
async fn test_flows_update_sends_partial_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/flows/org/flow"))
        .and(body_json(json!({"open": false})))
        .respond_with(json_body(r#"{"id":"org:flow","open":false}"#))
        .expect(1)
        .mount(&server)
        .await;

    let change = Flow {
        open: Some(false),
        ..Default::default()
    };
    let flow = client_for(&server)
        .flows()
        .update("org", "flow", &change)
        .await
        .unwrap();
    assert_eq!(flow.open, Some(false));
}

#[tokio::test]
async fn test_status_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/org/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw(r#"{"message":"not found"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .flows()
        .get("org", "missing")
        .await
        .unwrap_err();

    match &err {
        RestClientError::Api {
            method, url, status, ..
        } => {
            assert_eq!(*method, reqwest::Method::GET);
            assert_eq!(url.path(), "/flows/org/missing");
            assert_eq!(status.as_u16(), 404);
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert_eq!(err.body_text().as_deref(), Some(r#"{"message":"not found"}"#));
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_malformed_response_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows"))
        .respond_with(json_body(r#"{"not":"a list"}"#))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .flows()
        .list(&FlowsListOptions::default())
        .await;
    assert!(matches!(result, Err(RestClientError::Decode(_))));
}

#[tokio::test]
async fn test_messages_list_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/org/flow/messages"))
        .and(query_param("tags", "deployment,production"))
        .and(query_param("tag_mode", "and"))
        .and(query_param("event", "mail"))
        .and(query_param("limit", "2"))
        .respond_with(json_body(
            r#"[
                {"id":1,"event":"message","content":"one","sent":1385546251160},
                {"id":2,"event":"message","content":"two"}
            ]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let options = MessagesListOptions {
        event: Some("mail".into()),
        limit: Some(2),
        tags: vec!["deployment".into(), "production".into()],
        tag_mode: Some(TagMode::And),
        ..Default::default()
    };
    let messages = client_for(&server)
        .messages()
        .list("org", "flow", &options)
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[0].content().unwrap(),
        Content::PlainText("one".into())
    );
    assert_eq!(messages[0].sent.unwrap().timestamp_millis(), 1385546251000);
}

#[tokio::test]
async fn test_messages_list_respects_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/org/flow/messages"))
        .respond_with(json_body(r#"[{"id":1},{"id":2},{"id":3}]"#))
        .mount(&server)
        .await;

    let options = MessagesListOptions {
        limit: Some(2),
        ..Default::default()
    };
    let messages = client_for(&server)
        .messages()
        .list("org", "flow", &options)
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, Some(2));
}

async fn comment_texts(client: &RestClient) -> Result<Vec<String>, RestClientError> {
    let messages = client
        .messages()
        .list("org", "flow", &MessagesListOptions::default())
        .await?;
    let mut texts = Vec::new();
    for message in &messages {
        texts.push(message.content()?.to_string());
    }
    Ok(texts)
}

#[tokio::test]
async fn test_content_error_converts_into_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/org/flow/messages"))
        .respond_with(json_body(
            r#"[
                {"id":1,"event":"comment","content":{"title":"t","text":"fine"}},
                {"id":2,"event":"comment","content":"not an object"}
            ]"#,
        ))
        .mount(&server)
        .await;

    let err = comment_texts(&client_for(&server)).await.unwrap_err();
    match err {
        RestClientError::Content(e) => assert_eq!(e.event, "comment"),
        other => panic!("expected content error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_messages_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_json(json!({
            "flow": "org:flow",
            "event": "message",
            "content": "Howdy-Doo @Jackie #awesome",
            "tags": ["todo", "#feedback", "@all"]
        })))
        .respond_with(json_body(
            r##"{"id":3816534,"event":"message","flow":"org:flow","content":"Howdy-Doo @Jackie #awesome","tags":["todo","#feedback","@all"],"user":"18"}"##,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let options = MessageCreateOptions {
        flow: "org:flow".into(),
        event: "message".into(),
        content: Some("Howdy-Doo @Jackie #awesome".into()),
        tags: vec!["todo".into(), "#feedback".into(), "@all".into()],
        ..Default::default()
    };
    let message = client_for(&server)
        .messages()
        .create(Some(&options))
        .await
        .unwrap();

    assert_eq!(message.id, Some(3816534));
    assert_eq!(message.user, Some(18));
    assert!(message.has_tag("#feedback"));
}

#[tokio::test]
async fn test_messages_create_comment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/comments"))
        .respond_with(json_body(
            r#"{"id":4,"event":"comment","message":3,"content":{"title":"Thread","text":"Commenting yo!"}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let options = MessageCreateOptions {
        flow: "org:flow".into(),
        event: "comment".into(),
        message: Some(3),
        content: Some("Commenting yo!".into()),
        ..Default::default()
    };
    let comment = client_for(&server)
        .messages()
        .create_comment(Some(&options))
        .await
        .unwrap();

    assert_eq!(comment.message, Some(3));
    assert_eq!(comment.content().unwrap().to_string(), "Commenting yo!");
}

#[tokio::test]
async fn test_comment_without_parent_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(json_body("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let options = MessageCreateOptions {
        flow: "org:flow".into(),
        event: "comment".into(),
        ..Default::default()
    };
    let result = client_for(&server)
        .messages()
        .create_comment(Some(&options))
        .await;
    assert!(matches!(result, Err(RestClientError::Config(_))));
}

#[tokio::test]
async fn test_users() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(json_body(r#"[{"id":1,"nick":"ann"},{"id":2,"nick":"bob"}]"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flows/org/flow/users"))
        .respond_with(json_body(r#"[{"id":1}]"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/2"))
        .respond_with(json_body(r#"{"id":2,"nick":"bob","last_activity":1385546251160}"#))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/2"))
        .and(body_json(json!({"nick": "bobby"})))
        .respond_with(json_body(r#"{"id":2,"nick":"bobby"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let users = client.users();

    assert_eq!(users.all().await.unwrap().len(), 2);
    assert_eq!(users.list("org", "flow").await.unwrap().len(), 1);

    let bob = users.get(2).await.unwrap();
    assert_eq!(bob.nick.as_deref(), Some("bob"));
    assert!(bob.last_activity.is_some());

    let options = UserUpdateOptions {
        nick: Some("bobby".into()),
        ..Default::default()
    };
    let updated = users.update(2, Some(&options)).await.unwrap();
    assert_eq!(updated.nick.as_deref(), Some("bobby"));
}

#[tokio::test]
async fn test_user_update_rejects_bad_email() {
    let server = MockServer::start().await;
    let options = UserUpdateOptions {
        email: Some("nope".into()),
        ..Default::default()
    };
    let result = client_for(&server).users().update(1, Some(&options)).await;
    assert!(matches!(
        result,
        Err(RestClientError::Config(ApiContractError::Validation(_)))
    ));
}

#[tokio::test]
async fn test_organizations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(json_body(r#"[{"id":1,"parameterized_name":"acme"}]"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/organizations/acme"))
        .respond_with(json_body(r#"{"id":1,"name":"Acme"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/organizations/find"))
        .and(query_param("id", "1"))
        .respond_with(json_body(r#"{"id":1,"name":"Acme"}"#))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/organizations/1"))
        .and(body_json(json!({"name": "Acme Inc"})))
        .respond_with(json_body(r#"{"id":1,"name":"Acme Inc"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let orgs = client.organizations();

    assert_eq!(orgs.all().await.unwrap()[0].id, Some(1));
    assert_eq!(
        orgs.get_by_name("acme").await.unwrap().name.as_deref(),
        Some("Acme")
    );
    assert_eq!(orgs.get_by_id(1).await.unwrap().id, Some(1));

    let options = OrganizationUpdateOptions {
        name: Some("Acme Inc".into()),
    };
    let org = orgs.update(1, Some(&options)).await.unwrap();
    assert_eq!(org.name.as_deref(), Some("Acme Inc"));
}

#[tokio::test]
async fn test_inbox_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/team_inbox/flow-token"))
        .and(body_json(json!({
            "source": "CI",
            "from_address": "build+ok@flowdock.com",
            "subject": "Build #1 passed",
            "content": "All green",
            "tags": ["ci"],
            "link": "http://wil.io"
        })))
        .respond_with(json_body(r#"{"id":9,"event":"mail"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let options = InboxCreateOptions {
        source: Some("CI".into()),
        from_address: Some("build+ok@flowdock.com".into()),
        subject: Some("Build #1 passed".into()),
        content: Some("All green".into()),
        tags: vec!["ci".into()],
        link: Some("http://wil.io".into()),
        ..Default::default()
    };
    let message = client_for(&server)
        .inbox()
        .create("flow-token", Some(&options))
        .await
        .unwrap();
    assert_eq!(message.event.as_deref(), Some("mail"));
}

#[tokio::test]
async fn test_personal_token_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("authorization", "Basic YWJjMTIzOg=="))
        .respond_with(json_body("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RestClient::from_urls(
        &server.uri(),
        &server.uri(),
        AuthConfig::with_personal_token("abc123"),
    )
    .unwrap();
    assert!(client.users().all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_client_api_maps_errors() {
    use flowdock_client_api::{ClientApi, ClientApiError};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flows/org/flow"))
        .respond_with(json_body(r#"{"id":"org:flow"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let flow = ClientApi::get_flow(&client, "org", "flow").await.unwrap();
    assert_eq!(flow.id.as_deref(), Some("org:flow"));

    match ClientApi::list_users(&client).await {
        Err(ClientApiError::Server(message)) => assert!(message.contains("boom")),
        other => panic!("expected server error, got {other:?}"),
    }

    let bad = MessagesListOptions {
        limit: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        ClientApi::list_messages(&client, "org", "flow", &bad).await,
        Err(ClientApiError::Unexpected(_))
    ));
}
