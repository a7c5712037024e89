//! Integration tests for the Google clients using wiremock HTTP mocks.

use gbp_google::{
    BusinessProfileClient, GoogleCredentials, GoogleEndpoints, GoogleError, OAuthClient,
    OAuthSettings,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> BusinessProfileClient {
    BusinessProfileClient::with_endpoints(30, GoogleEndpoints::uniform(base_url))
        .expect("client construction should not fail")
        .with_retry_policy(0, 0)
}

fn credentials() -> GoogleCredentials {
    GoogleCredentials {
        access_token: "ya29.token".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expires_at: None,
        scope: None,
    }
}

fn oauth_client(base_url: &str) -> OAuthClient {
    OAuthClient::with_endpoints(
        OAuthSettings {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
        },
        30,
        &format!("{base_url}/o/oauth2/auth"),
        &format!("{base_url}/token"),
    )
    .expect("client construction should not fail")
}

async fn mount_account_and_location(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v4/accounts"))
        .and(header("authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [
                { "name": "accounts/1", "accountName": "Acme Holdings" },
                { "name": "accounts/2" }
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/accounts/1/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [{ "name": "accounts/1/locations/2" }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/accounts/1/locations/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "accounts/1/locations/2",
            "title": "Acme Cafe",
            "type": "Restaurant",
            "phoneNumber": "+1 555 0100",
            "photos": ["a", "b"]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_business_data_uses_first_account_and_location() {
    let server = MockServer::start().await;
    mount_account_and_location(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts/1/locations/2:reportInsights"))
        .and(body_partial_json(json!({ "dimensions": ["METRIC_TYPE"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "insights": [
                { "metric": "VIEWS", "value": "4500" },
                { "metric": "ACTIONS_PHONE", "value": 12 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = test_client(&server.uri())
        .fetch_business_data(&credentials())
        .await
        .expect("fetch should succeed")
        .expect("account has a location");

    assert_eq!(data.account_name, "accounts/1");
    assert_eq!(data.location_name, "accounts/1/locations/2");
    assert_eq!(data.profile.title.as_deref(), Some("Acme Cafe"));
    assert_eq!(data.profile.category.as_deref(), Some("Restaurant"));
    assert_eq!(data.profile.photo_count(), 2);
    assert_eq!(data.insights.len(), 2);
    assert_eq!(data.insights[0].metric, "VIEWS");
}

#[tokio::test]
async fn no_accounts_yields_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let data = test_client(&server.uri())
        .fetch_business_data(&credentials())
        .await
        .expect("empty account list is not an error");
    assert!(data.is_none());
}

#[tokio::test]
async fn no_locations_yields_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": [{ "name": "accounts/1" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/accounts/1/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "locations": [] })))
        .mount(&server)
        .await;

    let data = test_client(&server.uri())
        .fetch_business_data(&credentials())
        .await
        .expect("empty location list is not an error");
    assert!(data.is_none());
}

#[tokio::test]
async fn failing_insights_degrade_to_empty_metrics() {
    let server = MockServer::start().await;
    mount_account_and_location(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts/1/locations/2:reportInsights"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let data = test_client(&server.uri())
        .fetch_business_data(&credentials())
        .await
        .expect("insights failure must not fail the fetch")
        .expect("account has a location");

    assert_eq!(data.profile.title.as_deref(), Some("Acme Cafe"));
    assert!(data.insights.is_empty());
}

#[tokio::test]
async fn unauthorized_accounts_request_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/accounts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("UNAUTHENTICATED"))
        .expect(1)
        .mount(&server)
        .await;

    let client = BusinessProfileClient::with_endpoints(30, GoogleEndpoints::uniform(&server.uri()))
        .unwrap()
        .with_retry_policy(3, 0);
    let err = client
        .fetch_business_data(&credentials())
        .await
        .expect_err("401 should fail");
    assert!(
        matches!(err, GoogleError::Api { status: 401, .. }),
        "expected Api 401, got: {err:?}"
    );
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/accounts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v4/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accounts": [] })))
        .mount(&server)
        .await;

    let client = BusinessProfileClient::with_endpoints(30, GoogleEndpoints::uniform(&server.uri()))
        .unwrap()
        .with_retry_policy(2, 0);
    let accounts = client
        .list_accounts("ya29.token")
        .await
        .expect("second attempt succeeds");
    assert!(accounts.is_empty());
}

#[tokio::test]
async fn exchange_code_posts_authorization_code_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0Abc"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.fresh",
            "expires_in": 3599,
            "refresh_token": "1//issued",
            "scope": "https://www.googleapis.com/auth/business.manage",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let creds = oauth_client(&server.uri())
        .exchange_code("  4/0Abc \n")
        .await
        .expect("exchange should succeed");

    assert_eq!(creds.access_token, "ya29.fresh");
    assert_eq!(creds.refresh_token.as_deref(), Some("1//issued"));
    assert!(creds.expires_at.is_some());
}

#[tokio::test]
async fn rejected_code_is_oauth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code."
        })))
        .mount(&server)
        .await;

    let err = oauth_client(&server.uri())
        .exchange_code("bogus")
        .await
        .expect_err("invalid_grant should fail");
    match err {
        GoogleError::OAuth(message) => {
            assert_eq!(message, "invalid_grant: Malformed auth code.");
        }
        other => panic!("expected OAuth error, got: {other:?}"),
    }
}

#[tokio::test]
async fn refresh_keeps_existing_refresh_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.renewed",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;

    let renewed = oauth_client(&server.uri())
        .refresh(&credentials())
        .await
        .expect("refresh should succeed");

    assert_eq!(renewed.access_token, "ya29.renewed");
    assert_eq!(renewed.refresh_token.as_deref(), Some("1//refresh"));
}

#[tokio::test]
async fn refresh_without_refresh_token_fails_fast() {
    let server = MockServer::start().await;
    let mut creds = credentials();
    creds.refresh_token = None;

    let err = oauth_client(&server.uri())
        .refresh(&creds)
        .await
        .expect_err("nothing to refresh with");
    assert!(matches!(err, GoogleError::MissingRefreshToken));
}
