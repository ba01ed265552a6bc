// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire-level tests for the Cognito and INSNRG clients against local stub servers.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use insnrg_bridge::services::{
    CognitoClient, IdentityError, IdentityProvider, InsnrgClient, ResourceApi, Screen,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Requests seen by a stub server.
#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(HeaderMap, String)>>>,
}

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/", addr)
}

/// Stub that records the request and answers with a fixed status/headers/body.
async fn stub(
    status: StatusCode,
    extra_headers: Vec<(&'static str, &'static str)>,
    body: String,
) -> (String, Recorded) {
    let recorded = Recorded::default();
    let router = Router::new()
        .route(
            "/",
            post(
                move |State(recorded): State<Recorded>, headers: HeaderMap, request: String| {
                    let extra_headers = extra_headers.clone();
                    let body = body.clone();
                    async move {
                        recorded.requests.lock().unwrap().push((headers, request));
                        let mut response = (status, body).into_response();
                        for (name, value) in extra_headers {
                            response
                                .headers_mut()
                                .insert(name, value.parse().unwrap());
                        }
                        response
                    }
                },
            ),
        )
        .with_state(recorded.clone());

    (serve(router).await, recorded)
}

// ─── Cognito ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cognito_refresh_success() {
    let body = json!({
        "AuthenticationResult": {
            "AccessToken": "new-access",
            "IdToken": "new-id",
            "ExpiresIn": 3600,
            "TokenType": "Bearer"
        },
        "ChallengeParameters": {}
    });
    let (url, recorded) = stub(StatusCode::OK, vec![], body.to_string()).await;

    let client = CognitoClient::with_endpoint("app-client", &url, TIMEOUT).unwrap();
    let result = client.refresh("refresh-123").await.unwrap();

    assert_eq!(result.access_token, "new-access");
    assert_eq!(result.id_token, "new-id");
    assert_eq!(result.expires_in, 3600);
    assert!(result.refresh_token.is_none());

    let requests = recorded.requests.lock().unwrap();
    let (headers, request) = &requests[0];
    assert_eq!(
        headers["x-amz-target"],
        "AWSCognitoIdentityProviderService.InitiateAuth"
    );
    assert_eq!(headers["content-type"], "application/x-amz-json-1.1");
    let request: Value = serde_json::from_str(request).unwrap();
    assert_eq!(
        request,
        json!({
            "ClientId": "app-client",
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": {"REFRESH_TOKEN": "refresh-123"}
        })
    );
}

#[tokio::test]
async fn test_cognito_not_authorized_is_rejection() {
    let body = json!({"__type": "NotAuthorizedException", "message": "Refresh Token has expired"});
    let (url, _) = stub(StatusCode::BAD_REQUEST, vec![], body.to_string()).await;

    let client = CognitoClient::with_endpoint("app-client", &url, TIMEOUT).unwrap();
    let err = client.refresh("stale").await.unwrap_err();

    assert!(err.is_refresh_token_rejected());
    assert_eq!(
        err,
        IdentityError::Provider {
            code: "NotAuthorizedException".to_string(),
            message: "Refresh Token has expired".to_string(),
        }
    );
}

#[tokio::test]
async fn test_cognito_error_type_from_header() {
    let (url, _) = stub(
        StatusCode::BAD_REQUEST,
        vec![("x-amzn-errortype","InvalidRefreshTokenException:http://internal.amazon.com/")],
        String::new(),
    )
    .await;

    let client = CognitoClient::with_endpoint("app-client", &url, TIMEOUT).unwrap();
    let err = client.refresh("stale").await.unwrap_err();
    assert!(err.is_refresh_token_rejected(), "{err:?}");
}

#[tokio::test]
async fn test_cognito_server_error_is_not_rejection() {
    let body = json!({"__type": "com.amazonaws.cognito#InternalErrorException", "message": "oops"});
    let (url, _) = stub(StatusCode::INTERNAL_SERVER_ERROR, vec![], body.to_string()).await;

    let client = CognitoClient::with_endpoint("app-client", &url, TIMEOUT).unwrap();
    let err = client.refresh("r").await.unwrap_err();
    assert!(!err.is_refresh_token_rejected());
    assert!(matches!(err, IdentityError::Provider { ref code, .. } if code == "InternalErrorException"));
}

#[tokio::test]
async fn test_cognito_unreachable_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let client = CognitoClient::with_endpoint("app-client", &url, TIMEOUT).unwrap();
    let err = client.refresh("r").await.unwrap_err();
    assert!(matches!(err, IdentityError::Transport(_)));
}

// ─── INSNRG ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_insnrg_view_sends_selector_and_bearer() {
    let body = json!({"poolChemistry": {"currentPh": 7.4, "currentORP": 650}});
    let (url, recorded) = stub(StatusCode::OK, vec![], body.to_string()).await;

    let client = InsnrgClient::new(&url, TIMEOUT).unwrap();
    let response = client
        .view("id-token", "system-9", Screen::Chemistry)
        .await
        .unwrap();
    assert_eq!(response, body);

    let requests = recorded.requests.lock().unwrap();
    let (headers, request) = &requests[0];
    assert_eq!(headers["authorization"], "Bearer id-token");
    assert_eq!(headers["origin"], "https://www.insnrgapp.com");
    let request: Value = serde_json::from_str(request).unwrap();
    assert_eq!(
        request,
        json!({"systemId": "system-9", "params": "ChemistryScreen", "action": "view"})
    );
}

#[tokio::test]
async fn test_insnrg_non_2xx_is_fetch_error() {
    let (url, _) = stub(StatusCode::UNAUTHORIZED, vec![], "Unauthorized".to_string()).await;

    let client = InsnrgClient::new(&url, TIMEOUT).unwrap();
    let err = client
        .view("id-token", "system-9", Screen::Timers)
        .await
        .unwrap_err();
    assert_eq!(err.resource, Screen::Timers);
    assert!(err.message.contains("401"));
}

#[tokio::test]
async fn test_insnrg_non_json_body_is_null() {
    let (url, _) = stub(StatusCode::OK, vec![], "<html>maintenance</html>".to_string()).await;

    let client = InsnrgClient::new(&url, TIMEOUT).unwrap();
    let response = client
        .view("id-token", "system-9", Screen::Dashboard)
        .await
        .unwrap();
    assert_eq!(response, Value::Null);
}

#[tokio::test]
async fn test_insnrg_json_handler_round_trip() {
    // A stub that answers based on the requested screen.
    let router = Router::new().route(
        "/",
        post(|Json(request): Json<Value>| async move {
            match request["params"].as_str() {
                Some("SetTimerAppliance") => Json(json!({"timers": []})).into_response(),
                _ => StatusCode::BAD_REQUEST.into_response(),
            }
        }),
    );
    let url = serve(router).await;

    let client = InsnrgClient::new(&url, TIMEOUT).unwrap();
    assert_eq!(
        client.view("t", "s", Screen::Timers).await.unwrap(),
        json!({"timers": []})
    );
    assert!(client.view("t", "s", Screen::Dashboard).await.is_err());
}
