//! Demonstrates a full session against a mock backend: log in, let the gateway recover from an
//! expired credential through the refresh cookie, then observe the session ending when the
//! refresh cookie is revoked.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use auth_gateway::{
	config::GatewayConfig,
	ext::{RecordingObserver, SessionObserver},
	gateway::Gateway,
	reqwest::Client,
	store::{CredentialStore, MemoryStore},
	transport::ReqwestTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/login");
			then.status(200)
				.header("set-cookie", "refreshToken=demo-refresh; Path=/; HttpOnly")
				.json_body(json!({ "accessToken": "demo-expired", "user": { "id": 7 } }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5").header("authorization", "Bearer demo-expired");
			then.status(401);
		})
		.await;
	let mut refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(200).json_body(json!({ "accessToken": "demo-fresh" }));
		})
		.await;
	let mut fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5").header("authorization", "Bearer demo-fresh");
			then.status(200).json_body(json!({ "id": 5, "name": "Acme" }));
		})
		.await;
	let config = GatewayConfig::builder(Url::parse(&server.base_url())?)
		.redirect_to("/login")
		.build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new(config.storage_key.clone()));
	let observer = RecordingObserver::default();
	let transport = ReqwestTransport::with_client(Client::builder().cookie_store(true).build()?);
	let gateway = Gateway::with_transport(config, store, transport)
		.with_observer(Arc::new(observer.clone()) as Arc<dyn SessionObserver>);
	let session = gateway.login("ada@example.com", "correct horse").await?;

	println!("Logged in as user {} with credential {}.", session.user["id"], session.credential);

	let client: serde_json::Value = gateway.get("/clients/5").await?.json()?;

	println!("Fetched client {} after a transparent refresh.", client["name"]);
	println!(
		"Refresh attempts: {}, stored credential fingerprint: {:?}.",
		gateway.refresh_metrics.attempts(),
		gateway.credential().await?.map(|credential| credential.fingerprint()),
	);

	login.assert_async().await;
	expired.assert_async().await;
	refresh.assert_async().await;
	fresh.assert_async().await;

	// Revoke the refresh cookie server-side and expire the credential again.
	refresh.delete_async().await;
	fresh.delete_async().await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/users/auth/refresh");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/clients/5");
			then.status(401);
		})
		.await;

	match gateway.get("/clients/5").await {
		Err(err) if err.is_unauthenticated() => {
			for event in observer.events() {
				println!("Session ended ({}); navigate to {}.", event.reason, event.redirect_to);
			}
		},
		other => println!("Unexpected outcome: {other:?}."),
	}

	Ok(())
}
