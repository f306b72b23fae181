/// Integration tests for the Lacework HTTP client
///
/// A mockito server stands in for the Lacework API.
///
/// Test coverage:
/// - Token exchange headers and body
/// - Bearer and Account-Name headers on API calls
/// - Following paging.urls.nextPage
/// - Report query parameters
/// - Credential rejection surfacing as an authentication failure

use std::sync::Arc;

use lacework_adapter::adapters::lacework::{LaceworkClient, LaceworkClientConfig};
use lacework_adapter::domain::errors::AdapterError;
use lacework_adapter::domain::models::{
    ReportQuery, SearchEndpoint, SearchRequest, TimeFilter,
};
use lacework_adapter::domain::ports::{ApiError, LaceworkApi};
use lacework_adapter::services::{SearchRunner, VendorContext};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

fn client_config(server: &ServerGuard, subaccount: Option<&str>) -> LaceworkClientConfig {
    LaceworkClientConfig {
        account: "acme".to_string(),
        subaccount: subaccount.map(str::to_string),
        api_key: "ACME_KEY_ID".to_string(),
        api_secret: "_secret_value".to_string(),
        base_url: Some(server.url()),
        timeout_secs: 5,
    }
}

async fn mock_token(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
    server
        .mock("POST", "/api/v2/access/tokens")
        .match_header("x-lw-uaks", "_secret_value")
        .match_body(Matcher::PartialJson(json!({
            "keyId": "ACME_KEY_ID",
            "expiryTime": 3600
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"token": "tok-123", "expiresAt": "2099-01-01T00:00:00.000Z"}).to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

fn window() -> TimeFilter {
    TimeFilter {
        start_time: "2024-01-14T00:00:00Z".into(),
        end_time: "2024-01-15T00:00:00Z".into(),
    }
}

#[tokio::test]
async fn test_connect_exchanges_key_for_token() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let profile = server
        .mock("GET", "/api/v2/UserProfile")
        .match_header("authorization", "Bearer tok-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [{"username": "analyst"}]}).to_string())
        .create_async()
        .await;

    let client = LaceworkClient::connect(client_config(&server, None))
        .await
        .expect("connect failed");
    let body = client.user_profile().await.expect("profile failed");

    assert_eq!(body["data"][0]["username"], "analyst");
    token.assert_async().await;
    profile.assert_async().await;
}

#[tokio::test]
async fn test_token_is_reused_between_calls() {
    let mut server = Server::new_async().await;
    let token = mock_token(&mut server, 1).await;
    let _profile = server
        .mock("GET", "/api/v2/UserProfile")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": []}).to_string())
        .expect(2)
        .create_async()
        .await;

    let client = LaceworkClient::connect(client_config(&server, None))
        .await
        .unwrap();
    client.user_profile().await.unwrap();
    client.user_profile().await.unwrap();

    token.assert_async().await;
}

#[tokio::test]
async fn test_subaccount_header() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let details = server
        .mock("GET", "/api/v2/Alerts/31")
        .match_header("account-name", "prod")
        .match_query(Matcher::UrlEncoded("scope".into(), "Details".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": {"alertId": 31, "entityMap": {}}}).to_string())
        .create_async()
        .await;

    let client = LaceworkClient::connect(client_config(&server, Some("prod")))
        .await
        .unwrap();
    let data = client.alert_details("31", "Details").await.unwrap();

    assert_eq!(data["alertId"], 31);
    details.assert_async().await;
}

#[tokio::test]
async fn test_alerts_follow_next_page() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let next_url = format!("{}/api/v2/Alerts/page/2", server.url());

    let first = server
        .mock("GET", "/api/v2/Alerts")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("startTime".into(), "2024-01-14T00:00:00Z".into()),
            Matcher::UrlEncoded("endTime".into(), "2024-01-15T00:00:00Z".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "paging": {"rows": 1, "totalRows": 2, "urls": {"nextPage": next_url}},
                "data": [{"alertId": 1, "severity": "High"}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/v2/Alerts/page/2")
        .match_header("authorization", "Bearer tok-123")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "paging": {"rows": 1, "totalRows": 2, "urls": {"nextPage": null}},
                "data": [{"alertId": 2, "severity": "Low"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client: Arc<dyn LaceworkApi> = Arc::new(
        LaceworkClient::connect(client_config(&server, None))
            .await
            .unwrap(),
    );
    let page = client.alerts(&window()).await.unwrap();
    assert_eq!(page.next_page.as_deref(), Some(next_url.as_str()));

    let context = VendorContext::new("Unable to retrieve Lacework alerts", "https://docs");
    let outcome = SearchRunner::new(client)
        .drain(page, usize::MAX, &context)
        .await
        .unwrap();

    assert_eq!(outcome.pages, 2);
    let ids: Vec<_> = outcome.rows.iter().map(|r| r["alertId"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_search_posts_request_body() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let search = server
        .mock("POST", "/api/v2/Entities/Machines/search")
        .match_body(Matcher::PartialJson(json!({
            "timeFilter": {"startTime": "2024-01-14T00:00:00Z"},
            "filters": [{"field": "hostname", "expression": "eq", "value": "web-1"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [{"mid": 7, "hostname": "web-1"}]}).to_string())
        .create_async()
        .await;

    let client = LaceworkClient::connect(client_config(&server, None))
        .await
        .unwrap();
    let request = SearchRequest::new(window()).with_filters(vec![
        lacework_adapter::domain::models::FilterClause::eq("hostname", "web-1"),
    ]);
    let page = client
        .search(SearchEndpoint::Machines, &request)
        .await
        .unwrap();

    assert_eq!(page.data[0]["mid"], 7);
    assert!(page.next_page.is_none());
    search.assert_async().await;
}

#[tokio::test]
async fn test_report_query_parameters() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let report = server
        .mock("GET", "/api/v2/Reports")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("type".into(), "COMPLIANCE".into()),
            Matcher::UrlEncoded("latest".into(), "true".into()),
            Matcher::UrlEncoded("reportType".into(), "AWS_CIS_S3".into()),
            Matcher::UrlEncoded("primaryQueryId".into(), "123456789012".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [{"reportType": "AWS_CIS_S3"}]}).to_string())
        .create_async()
        .await;

    let client = LaceworkClient::connect(client_config(&server, None))
        .await
        .unwrap();
    let query = ReportQuery::default_template(String::from("AWS_CIS_S3"))
        .with_primary(Some("123456789012".to_string()));
    let body = client.report(&query).await.unwrap();

    assert_eq!(body["data"][0]["reportType"], "AWS_CIS_S3");
    report.assert_async().await;
}

#[tokio::test]
async fn test_rejected_credentials_fail_connect() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/api/v2/access/tokens")
        .with_status(401)
        .with_body(r#"{"message": "Invalid Access Key"}"#)
        .create_async()
        .await;

    let err = LaceworkClient::connect(client_config(&server, None))
        .await
        .unwrap_err();

    match err {
        AdapterError::AuthenticationFailure(message) => {
            assert!(message.contains("Invalid Access Key"));
            assert!(!message.contains("_secret_value"));
        }
        other => panic!("expected AuthenticationFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_classified() {
    let mut server = Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _validate = server
        .mock("POST", "/api/v2/Queries/validate")
        .match_body(Matcher::Json(json!({"queryText": "bad query"})))
        .with_status(400)
        .with_body("query does not compile")
        .create_async()
        .await;

    let client = LaceworkClient::connect(client_config(&server, None))
        .await
        .unwrap();
    let err = client.validate_query("bad query").await.unwrap_err();

    assert!(matches!(err, ApiError::BadRequest(ref body) if body.contains("does not compile")));
}
