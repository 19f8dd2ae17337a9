#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use auth_gateway::{
	_preludet::*,
	auth::Credential,
	error::RefreshFailure,
	ext::SessionEndReason,
	http::StatusCode,
	store::{CredentialStore, MemoryStore},
	transport::ApiRequest,
};

async fn seed(store: &MemoryStore, value: &str) {
	store.save(Credential::new(value)).await.expect("Seeding the credential should succeed.");
}

fn stored(store: &MemoryStore) -> Option<String> {
	store.snapshot().map(|credential| credential.expose().to_owned())
}

#[tokio::test]
async fn unauthorized_response_refreshes_and_replays_once() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5").header("authorization", "Bearer abc");
			then.status(401).json_body(json!({ "message": "expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh").header_missing("authorization");
			then.status(200).json_body(json!({ "accessToken": "xyz" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5").header("authorization", "Bearer xyz");
			then.status(200).json_body(json!({ "success": true, "data": { "id": 5 } }));
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let response = gateway.get("/clients/5").await.expect("Replayed request should succeed.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		response.json::<serde_json::Value>().expect("Replayed body should be JSON."),
		json!({ "success": true, "data": { "id": 5 } })
	);
	assert_eq!(stored(&store).as_deref(), Some("xyz"));
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
	assert_eq!(gateway.refresh_metrics.successes(), 1);
	assert!(observer.is_empty());
}

#[tokio::test]
async fn anonymous_unauthorized_response_still_attempts_refresh() {
	let server = MockServer::start_async().await;
	let anonymous = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header_missing("authorization");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "xyz" }));
		})
		.await;
	let authorized = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer xyz");
			then.status(200).json_body(json!({ "email": "ada@example.com" }));
		})
		.await;
	let (gateway, store, _observer) = build_reqwest_test_gateway(&server.base_url());
	let me: serde_json::Value = gateway
		.dispatch_json(ApiRequest::get("/me"))
		.await
		.expect("Refreshing from the cookie alone should recover the session.");

	anonymous.assert_async().await;
	refresh.assert_async().await;
	authorized.assert_async().await;

	assert_eq!(me["email"], "ada@example.com");
	assert_eq!(stored(&store).as_deref(), Some("xyz"));
}

#[tokio::test]
async fn rejected_refresh_clears_credential_and_notifies_observer() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5").header("authorization", "Bearer abc");
			then.status(401).json_body(json!({ "message": "expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(401);
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let err = gateway.get("/clients/5").await.expect_err("Refresh rejection should end the session.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	let (response, reason) = match err {
		Error::Unauthenticated { response, reason } => (response, reason),
		other => panic!("Expected an unauthenticated error, got {other:?}."),
	};

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(response.text(), r#"{"message":"expired"}"#);
	assert!(matches!(reason, RefreshFailure::Rejected { status: 401 }));
	assert_eq!(stored(&store), None);
	assert_eq!(gateway.refresh_metrics.failures(), 1);

	let events = observer.events();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].reason, SessionEndReason::RefreshFailed);
	assert_eq!(events[0].redirect_to, "/");
}

#[tokio::test]
async fn refresh_without_access_token_ends_session() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5").header("authorization", "Bearer abc");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "" }));
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let err = gateway.get("/clients/5").await.expect_err("An empty token should end the session.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert!(err.is_unauthenticated());
	assert!(matches!(err, Error::Unauthenticated { reason: RefreshFailure::MissingToken, .. }));
	assert_eq!(stored(&store), None);
	assert_eq!(observer.len(), 1);
}

#[tokio::test]
async fn malformed_refresh_body_ends_session() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).body("<html>maintenance</html>");
		})
		.await;

	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let err = gateway.get("/clients/5").await.expect_err("A non-JSON body should end the session.");

	assert!(matches!(err, Error::Unauthenticated { reason: RefreshFailure::Malformed(_), .. }));
	assert_eq!(stored(&store), None);
	assert_eq!(observer.len(), 1);
}

#[tokio::test]
async fn replayed_unauthorized_is_returned_without_second_refresh() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports").header("authorization", "Bearer abc");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "xyz" }));
		})
		.await;
	let replay = server
		.mock_async(|when, then| {
			when.method(GET).path("/reports").header("authorization", "Bearer xyz");
			then.status(401).json_body(json!({ "message": "scope" }));
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let err = gateway.get("/reports").await.expect_err("A replayed 401 should surface as-is.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	replay.assert_calls_async(1).await;

	assert!(matches!(err, Error::Status { status: StatusCode::UNAUTHORIZED, .. }));
	assert!(!err.is_unauthenticated());
	assert_eq!(stored(&store).as_deref(), Some("xyz"));
	assert!(observer.is_empty());
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).header("authorization", "Bearer abc");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200)
				.delay(std::time::Duration::from_millis(50))
				.json_body(json!({ "accessToken": "xyz" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).header("authorization", "Bearer xyz");
			then.status(200).body("ok");
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let (first, second, third) =
		tokio::join!(gateway.get("/clients/1"), gateway.get("/clients/2"), gateway.get("/clients/3"));

	for result in [first, second, third] {
		assert_eq!(result.expect("Every queued request should succeed.").text(), "ok");
	}

	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(3).await;

	assert_eq!(stored(&store).as_deref(), Some("xyz"));
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
	assert!(observer.is_empty());
}

#[tokio::test]
async fn newer_stored_credential_is_reused_instead_of_refreshing() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "unused" }));
		})
		.await;
	let (gateway, store, _observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "rotated-elsewhere").await;

	let reused = gateway
		.refresh_credential(Some(&Credential::new("abc")))
		.await
		.expect("A newer stored credential should be reused.");

	refresh.assert_calls_async(0).await;

	assert_eq!(reused.expose(), "rotated-elsewhere");
	assert_eq!(gateway.refresh_metrics.reuses(), 1);
	assert_eq!(gateway.refresh_metrics.attempts(), 0);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_failed_refresh() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET);
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(401).delay(std::time::Duration::from_millis(200));
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let (first, second, third) =
		tokio::join!(gateway.get("/clients/1"), gateway.get("/clients/2"), gateway.get("/clients/3"));

	for result in [first, second, third] {
		let err = result.expect_err("Every queued request should see the session end.");

		assert!(err.is_unauthenticated());
		assert_eq!(err.http_status(), Some(StatusCode::UNAUTHORIZED));
	}

	stale.assert_calls_async(3).await;
	refresh.assert_calls_async(1).await;

	assert_eq!(stored(&store), None);
	assert_eq!(gateway.refresh_metrics.attempts(), 1);
	assert_eq!(gateway.refresh_metrics.failures(), 1);

	let events = observer.events();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].reason, SessionEndReason::RefreshFailed);
}

#[tokio::test]
async fn unauthorized_after_logout_does_not_revive_session() {
	let server = MockServer::start_async().await;
	let slow = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients").header("authorization", "Bearer abc");
			then.status(401).delay(std::time::Duration::from_millis(200));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "xyz" }));
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let (result, logout) = tokio::join!(gateway.get("/clients"), async {
		tokio::time::sleep(std::time::Duration::from_millis(50)).await;

		gateway.logout().await
	});

	logout.expect("Logout should succeed.");

	let err = result.expect_err("A 401 that lands after logout should not refresh.");

	slow.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert!(matches!(err, Error::Unauthenticated { reason: RefreshFailure::SessionEnded, .. }));
	assert_eq!(stored(&store), None);

	let events = observer.events();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].reason, SessionEndReason::Logout);
}

#[tokio::test]
async fn refresh_completing_after_logout_is_discarded() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/clients").header("authorization", "Bearer abc");
			then.status(401);
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200)
				.delay(std::time::Duration::from_millis(200))
				.json_body(json!({ "accessToken": "xyz" }));
		})
		.await;
	let replay = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients").header("authorization", "Bearer xyz");
			then.status(200);
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let (result, logout) = tokio::join!(gateway.get("/clients"), async {
		tokio::time::sleep(std::time::Duration::from_millis(80)).await;

		gateway.logout().await
	});

	logout.expect("Logout should succeed.");

	let err = result.expect_err("A refresh that outlives the session should be dropped.");

	refresh.assert_calls_async(1).await;
	replay.assert_calls_async(0).await;

	assert!(matches!(err, Error::Unauthenticated { reason: RefreshFailure::SessionEnded, .. }));
	assert_eq!(stored(&store), None);
	assert_eq!(observer.len(), 1);
}

#[tokio::test]
async fn unencodable_refreshed_token_ends_session_instead_of_being_stored() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "x\ny" }));
		})
		.await;
	let (gateway, store, observer) = build_reqwest_test_gateway(&server.base_url());

	seed(&store, "abc").await;

	let err = gateway
		.get("/clients/5")
		.await
		.expect_err("A token that cannot be sent back should end the session.");

	stale.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	assert!(matches!(err, Error::Unauthenticated { reason: RefreshFailure::MissingToken, .. }));
	assert_eq!(stored(&store), None);
	assert_eq!(observer.len(), 1);
}
