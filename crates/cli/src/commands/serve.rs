//! HTTP host for the reminder function and share-link redirects.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use estate::{LogNotifier, ReminderJob, ShareLinks};
use estate_protocol::names;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::context::CommandContext;
use crate::error::Result;

#[derive(Clone)]
pub struct ServeState {
	reminders: Arc<ReminderJob>,
	links: Arc<ShareLinks>,
}

impl ServeState {
	pub fn new(reminders: ReminderJob, links: ShareLinks) -> Self {
		Self {
			reminders: Arc::new(reminders),
			links: Arc::new(links),
		}
	}
}

pub fn router(state: ServeState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route(&format!("/functions/v1/{}", names::SEND_APPOINTMENT_REMINDERS), post(send_reminders))
		.route("/s/{code}", get(open_share))
		.with_state(state)
}

pub async fn execute(ctx: &CommandContext, bind: SocketAddr) -> Result<()> {
	let service = ctx.service_client()?;
	let state = ServeState::new(ReminderJob::new(service.clone(), Arc::new(LogNotifier)), ctx.share_links(service)?);

	let listener = tokio::net::TcpListener::bind(bind)
		.await
		.with_context(|| format!("failed to bind {bind}"))?;
	info!(target = "estate.serve", addr = %listener.local_addr()?, "listening");
	let cancel = ctx.cancel().clone();
	axum::serve(listener, router(state))
		.with_graceful_shutdown(async move {
			cancel.cancelled().await;
			info!(target = "estate.serve", "shutting down");
		})
		.await
		.context("function host stopped unexpectedly")?;
	Ok(())
}

async fn health() -> Json<serde_json::Value> {
	Json(json!({ "status": "ok" }))
}

#[derive(Debug, Default, Deserialize)]
struct RunParams {
	#[serde(default, alias = "dryRun")]
	dry_run: bool,
}

fn failure(err: estate::Error) -> Response {
	let status = match err {
		estate::Error::NotFound(_) => StatusCode::NOT_FOUND,
		_ => StatusCode::INTERNAL_SERVER_ERROR,
	};
	if status.is_server_error() {
		warn!(target = "estate.serve", error = %err, "request failed");
	}
	(status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn send_reminders(State(state): State<ServeState>, Query(params): Query<RunParams>) -> Response {
	match state.reminders.run(params.dry_run).await {
		Ok(report) => Json(report).into_response(),
		Err(err) => failure(err),
	}
}

async fn open_share(State(state): State<ServeState>, Path(code): Path<String>) -> Response {
	let link = match state.links.record_click(&code).await {
		Ok(link) => link,
		Err(err) => return failure(err),
	};
	match state.links.listing_url(&link.property_id) {
		Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response(),
		Err(err) => failure(err),
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use estate::HostedClient;
	use url::Url;

	use super::*;

	async fn spawn(app: Router) -> Url {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		Url::parse(&format!("http://{addr}")).unwrap()
	}

	/// Backend with one share link and no appointments.
	async fn stub_backend() -> Url {
		async fn rows(Path(table): Path<String>, Query(query): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
			let known = query.get("code").map(String::as_str) == Some("eq.Ab12Cd34");
			match table.as_str() {
				"shared_links" if known => Json(json!([{ "code": "Ab12Cd34", "property_id": "p-1", "broker_id": "b-1", "click_count": 4 }])),
				_ => Json(json!([])),
			}
		}
		async fn patch(Path(_table): Path<String>, Json(body): Json<serde_json::Value>) -> Json<serde_json::Value> {
			Json(json!([{ "code": "Ab12Cd34", "property_id": "p-1", "broker_id": "b-1", "click_count": body["click_count"] }]))
		}
		spawn(Router::new().route("/rest/v1/{table}", get(rows).patch(patch))).await
	}

	async fn host() -> Url {
		let client = HostedClient::new(stub_backend().await, "anon");
		let state = ServeState::new(
			ReminderJob::new(client.clone(), Arc::new(LogNotifier)),
			ShareLinks::new(client, Url::parse("https://homes.example.com").unwrap()),
		);
		spawn(router(state)).await
	}

	fn http() -> reqwest::Client {
		reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build().unwrap()
	}

	#[tokio::test]
	async fn health_reports_ok() {
		let base = host().await;
		let body: serde_json::Value = http().get(base.join("health").unwrap()).send().await.unwrap().json().await.unwrap();
		assert_eq!(body, json!({ "status": "ok" }));
	}

	#[tokio::test]
	async fn reminder_function_returns_report() {
		let base = host().await;
		let url = base.join("functions/v1/send-appointment-reminders?dryRun=true").unwrap();
		let response = http().post(url).send().await.unwrap();
		assert_eq!(response.status(), 200);
		let body: serde_json::Value = response.json().await.unwrap();
		assert_eq!(body, json!({ "scanned": 0, "sent": 0, "failed": 0, "dryRun": true }));
	}

	#[tokio::test]
	async fn share_code_redirects_to_listing() {
		let base = host().await;

		let response = http().get(base.join("s/Ab12Cd34").unwrap()).send().await.unwrap();
		assert_eq!(response.status(), StatusCode::FOUND.as_u16());
		assert_eq!(response.headers()["location"], "https://homes.example.com/properties/p-1");

		let missing = http().get(base.join("s/nope").unwrap()).send().await.unwrap();
		assert_eq!(missing.status(), 404);
	}
}
