//! Default reqwest transport against a local mock server

use openapi_bridge::config::Credentials;
use openapi_bridge::registry::schema::build_input_schema;
use openapi_bridge::registry::types::{
    ApiDocument, HttpMethod, Operation, Parameter, ParameterLocation, RequestBody, SchemaObject,
};
use openapi_bridge::routing::{
    DispatchEnvironment, DispatcherOptions, HttpRequest, HttpTransport, InvocationContext, ReqwestTransport,
    RequestDispatcher,
};
use reqwest::header::HeaderMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer, operation: Operation, transport: ReqwestTransport, credentials: Credentials) -> RequestDispatcher {
    let schema = build_input_schema(&operation.parameters, operation.request_body.as_ref());
    let env = DispatchEnvironment {
        document: Arc::new(ApiDocument::default()),
        base_urls: Arc::new(vec![format!("{}/api", server.uri())]),
        credentials: Arc::new(credentials),
        transport: Arc::new(transport),
        options: DispatcherOptions::default(),
    };
    RequestDispatcher::new(operation.operation_id.clone(), Arc::new(operation), Arc::new(schema), env).unwrap()
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_get_with_query_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pets"))
        .and(query_param("status", "sold"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"[{"id":1}]"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let operation = Operation::new("listPets", HttpMethod::Get, "/pets")
        .with_parameter(Parameter::new("status", ParameterLocation::Query, SchemaObject::of_type("string")));
    let d = dispatcher(
        &server,
        operation,
        ReqwestTransport::new().unwrap(),
        Credentials::new().with_bearer_token("tok"),
    );

    let result = d.dispatch(&args(json!({"status": "sold"})), &InvocationContext::new()).await.unwrap();

    assert!(!result.is_error);
    assert!(result.text_content().ends_with("Status: 200\nResponse:\n[{\"id\":1}]"));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pets"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "Rex"})))
        .respond_with(ResponseTemplate::new(201).insert_header("content-type", "application/json").set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let operation = Operation::new("createPet", HttpMethod::Post, "/pets").with_request_body(RequestBody::json(
        SchemaObject::of_type("object").with_property("name", SchemaObject::of_type("string")),
        true,
    ));
    let d = dispatcher(&server, operation, ReqwestTransport::new().unwrap(), Credentials::new());

    let result = d
        .dispatch(
            &args(json!({"requestBody": {"name": "Rex"}, "__confirmed": true})),
            &InvocationContext::new(),
        )
        .await
        .unwrap();
    assert!(result.text_content().contains("Status: 201"));
}

#[tokio::test]
async fn test_upstream_error_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pets/7"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("content-type", "text/plain")
                .set_body_string("maintenance"),
        )
        .mount(&server)
        .await;

    let operation = Operation::new("getPet", HttpMethod::Get, "/pets/{petId}")
        .with_parameter(Parameter::new("petId", ParameterLocation::Path, SchemaObject::of_type("integer")).required());
    let d = dispatcher(&server, operation, ReqwestTransport::new().unwrap(), Credentials::new());

    let result = d.dispatch(&args(json!({"petId": 7})), &InvocationContext::new()).await.unwrap();

    assert!(result.is_error);
    let text = result.text_content();
    assert!(text.contains("Error: Service Unavailable (HTTP 503)"));
    assert!(text.contains("Details: maintenance"));
    assert!(text.contains("SERVER ERROR (503)"));
}

#[tokio::test]
async fn test_default_timeout_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_timeout(Duration::from_millis(50)).unwrap();
    let request = HttpRequest {
        method: HttpMethod::Get,
        url: url::Url::parse(&format!("{}/slow", server.uri())).unwrap(),
        headers: HeaderMap::new(),
        body: None,
        timeout: None,
    };

    let err = transport.send(request).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("Timeout"));
}

#[tokio::test]
async fn test_context_timeout_overrides_transport_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let operation = Operation::new("slow", HttpMethod::Get, "/slow");
    let d = dispatcher(&server, operation, ReqwestTransport::new().unwrap(), Credentials::new());
    let context = InvocationContext::new().with_timeout(Duration::from_millis(50));

    let err = d.dispatch(&Map::new(), &context).await.unwrap_err();
    assert!(err.is_transport());
}
