use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use eventlens::config::Config;
use eventlens::extractor::EventDate;
use eventlens::fetcher::{FetchError, FetchedPage, PageSource, SiteAdapterWarning};
use eventlens::llm::{LlmError, OpenRouterClient};
use eventlens::pipeline::{Pipeline, PipelineError, Stage};
use serde_json::{Value, json};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, body_string_contains, method, path},
};

const EVENT_PAGE: &str = include_str!("../src/extractor/tests/fixtures/facebook_event.html");

const ISOLATED: &str = "Le trio Les Doigts de Django joue au Café des Arts, \
    12 rue de la République à Lyon. Un hommage au jazz manouche de Django Reinhardt, \
    entrée libre et petite restauration sur place.";

/// Serves a fixed page without a browser.
struct StaticSource {
    html: &'static str,
    warnings: Vec<SiteAdapterWarning>,
}

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        Ok(FetchedPage {
            url: url.clone(),
            html: self.html.to_string(),
            adapter: Some("facebook-event"),
            warnings: self.warnings.clone(),
            fetched_at: Utc::now(),
        })
    }
}

struct FailingSource;

#[async_trait]
impl PageSource for FailingSource {
    async fn fetch(&self, _url: &Url) -> Result<FetchedPage, FetchError> {
        Err(FetchError::Timeout)
    }
}

fn chat_body(content: &str) -> Value {
    json!({
        "id": "gen-1",
        "object": "chat.completion",
        "choices": [{
            "finish_reason": "stop",
            "message": { "role": "assistant", "content": content }
        }]
    })
}

fn setup(server: &MockServer) -> (OpenRouterClient, Config) {
    let config = Config::new("https://www.facebook.com/events/385966024501401", "sk-or-test")
        .unwrap()
        .with_api_base_url(format!("{}/api/v1", server.uri()));
    let client = OpenRouterClient::from_config(&config).unwrap();
    (client, config)
}

async fn mount_isolation(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_string_contains("Soirée Jazz Manouche au Café des Arts"))
        .respond_with(response)
        .with_priority(2)
        .mount(server)
        .await;
}

async fn mount_extraction(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_partial_json(json!({
            "temperature": 0.0,
            "response_format": { "type": "json_object" }
        })))
        .and(body_string_contains("Les Doigts de Django joue au Café des Arts"))
        .respond_with(response)
        .with_priority(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_run_extracts_event_details() {
    let server = MockServer::start().await;
    mount_isolation(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(ISOLATED)),
    )
    .await;
    let extracted = json!({
        "title": "Soirée Jazz Manouche au Café des Arts",
        "description": "Le trio Les Doigts de Django rend hommage à Django Reinhardt.",
        "date": null,
        "place": "Café des Arts",
        "address": "12 rue de la République, 69001 Lyon, France"
    });
    mount_extraction(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(&extracted.to_string())),
    )
    .await;

    let (client, config) = setup(&server);
    let source = StaticSource {
        html: EVENT_PAGE,
        warnings: vec![],
    };
    let output = Pipeline::new(source, client, config).run().await.unwrap();

    let details = output.details;
    assert_eq!(
        details.title.as_deref(),
        Some("Soirée Jazz Manouche au Café des Arts")
    );
    assert_eq!(details.place.as_deref(), Some("Café des Arts"));
    assert_eq!(
        details.address.as_deref(),
        Some("12 rue de la République, 69001 Lyon, France")
    );
    assert!(details.description.is_some());
    assert_eq!(details.date, None);
    assert_eq!(output.start_date, None);

    assert_eq!(output.isolated, ISOLATED);
    assert!(output.markdown.contains("Soirée Jazz Manouche au Café des Arts"));
    for fragment in ["<script", "<style", "<iframe", "style=\""] {
        assert!(!output.markdown.contains(fragment));
    }
    assert!(output.warnings.is_empty());

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_carries_adapter_warnings() {
    let server = MockServer::start().await;
    mount_isolation(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(ISOLATED)),
    )
    .await;
    mount_extraction(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(
            r#"{"title": "Concert", "date": "2024-06-14", "address": "  "}"#,
        )),
    )
    .await;

    let (client, config) = setup(&server);
    let source = StaticSource {
        html: EVENT_PAGE,
        warnings: vec![SiteAdapterWarning {
            adapter: "facebook-event",
            step: "expand description",
            reason: "no element labelled 'En voir plus'".to_string(),
        }],
    };
    let output = Pipeline::new(source, client, config).run().await.unwrap();

    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.details.title.as_deref(), Some("Concert"));
    assert_eq!(output.details.address, None);
    assert_eq!(
        output.start_date,
        Some(EventDate::Day(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()))
    );
}

#[tokio::test]
async fn test_unparseable_date_is_kept_verbatim() {
    let server = MockServer::start().await;
    mount_isolation(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(ISOLATED)),
    )
    .await;
    mount_extraction(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(r#"{"date": "samedi 14 juin"}"#)),
    )
    .await;

    let (client, config) = setup(&server);
    let source = StaticSource {
        html: EVENT_PAGE,
        warnings: vec![],
    };
    let output = Pipeline::new(source, client, config).run().await.unwrap();

    assert_eq!(output.details.date.as_deref(), Some("samedi 14 juin"));
    assert_eq!(output.start_date, None);
    assert!(!output.details.is_empty());
}

#[tokio::test]
async fn test_fetch_failure_stops_before_gateway() {
    let server = MockServer::start().await;
    let (client, config) = setup(&server);

    let err = Pipeline::new(FailingSource, client, config)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Fetch);
    assert!(matches!(err, PipelineError::Fetch(FetchError::Timeout)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_isolation_gateway_error() {
    let server = MockServer::start().await;
    mount_isolation(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "No auth credentials found" }
        })),
    )
    .await;

    let (client, config) = setup(&server);
    let source = StaticSource {
        html: EVENT_PAGE,
        warnings: vec![],
    };
    let err = Pipeline::new(source, client, config)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Isolate);
    match err {
        PipelineError::Isolate(LlmError::Gateway { code, .. }) => assert_eq!(code, 401),
        other => panic!("Expected isolation gateway error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_extraction_schema_mismatch() {
    let server = MockServer::start().await;
    mount_isolation(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(ISOLATED)),
    )
    .await;
    mount_extraction(
        &server,
        ResponseTemplate::new(200).set_body_json(chat_body(r#"{"title": ["not", "a", "string"]}"#)),
    )
    .await;

    let (client, config) = setup(&server);
    let source = StaticSource {
        html: EVENT_PAGE,
        warnings: vec![],
    };
    let err = Pipeline::new(source, client, config)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Stage::Extract);
    assert!(matches!(
        err,
        PipelineError::Extract(LlmError::MalformedContent(_))
    ));
}
