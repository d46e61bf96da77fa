//! In-process stand-in for the hosted backend, served by axum on a random port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use estate::HostedClient;
use parking_lot::Mutex;
use serde_json::{Value, json};
use url::Url;

pub const ANON_KEY: &str = "anon-key";
pub const SERVICE_KEY: &str = "service-key";

#[derive(Default)]
pub struct BackendState {
	/// email -> (password, user json)
	pub accounts: HashMap<String, (String, Value)>,
	pub access_tokens: HashMap<String, Value>,
	pub refresh_tokens: HashMap<String, Value>,
	pub rows: HashMap<String, Vec<Value>>,
	pub issued: u32,
	/// Status codes returned (and consumed) before any refresh succeeds.
	pub refresh_failures: Vec<u16>,
	/// Appointment ids whose PATCH fails.
	pub failing_patches: Vec<String>,
	pub requests: Vec<String>,
	pub function_bodies: Vec<(String, Value, Option<String>)>,
}

pub struct FakeBackend {
	pub url: Url,
	pub state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
	pub async fn start() -> Self {
		let state = Arc::new(Mutex::new(BackendState::default()));
		let app = Router::new()
			.route("/auth/v1/token", post(token))
			.route("/auth/v1/signup", post(signup))
			.route("/auth/v1/user", get(user))
			.route("/auth/v1/logout", post(logout))
			.route("/rest/v1/{table}", get(select).post(insert).patch(update))
			.route("/functions/v1/{name}", post(function))
			.with_state(Arc::clone(&state));
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, app).await.unwrap();
		});
		Self {
			url: Url::parse(&format!("http://{addr}")).unwrap(),
			state,
		}
	}

	pub fn client(&self) -> HostedClient {
		HostedClient::new(self.url.clone(), ANON_KEY)
	}

	pub fn with_account(self, email: &str, password: &str, role: &str) -> Self {
		let user = json!({
			"id": format!("user-{}", email.split('@').next().unwrap()),
			"email": email,
			"user_metadata": { "role": role },
		});
		self.state.lock().accounts.insert(email.to_string(), (password.to_string(), user));
		self
	}

	pub fn seed(&self, table: &str, rows: Vec<Value>) {
		self.state.lock().rows.entry(table.to_string()).or_default().extend(rows);
	}

	pub fn rows(&self, table: &str) -> Vec<Value> {
		self.state.lock().rows.get(table).cloned().unwrap_or_default()
	}
}

type Shared = State<Arc<Mutex<BackendState>>>;

fn error(status: StatusCode, body: Value) -> Response {
	(status, Json(body)).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
	headers
		.get("authorization")?
		.to_str()
		.ok()?
		.strip_prefix("Bearer ")
		.map(str::to_string)
}

fn check_apikey(headers: &HeaderMap) -> Result<(), Response> {
	match headers.get("apikey").and_then(|v| v.to_str().ok()) {
		Some(ANON_KEY) => Ok(()),
		_ => Err(error(StatusCode::UNAUTHORIZED, json!({ "message": "No API key found in request" }))),
	}
}

fn issue(state: &mut BackendState, user: Value) -> Value {
	state.issued += 1;
	let n = state.issued;
	let access = format!("access-{n}");
	let refresh = format!("refresh-{n}");
	state.access_tokens.insert(access.clone(), user.clone());
	state.refresh_tokens.insert(refresh.clone(), user.clone());
	json!({
		"access_token": access,
		"refresh_token": refresh,
		"token_type": "bearer",
		"expires_in": 3600,
		"user": user,
	})
}

async fn token(State(state): Shared, headers: HeaderMap, Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let mut state = state.lock();
	state.requests.push(format!("token:{}", query.get("grant_type").cloned().unwrap_or_default()));
	match query.get("grant_type").map(String::as_str) {
		Some("password") => {
			let email = body["email"].as_str().unwrap_or_default();
			let password = body["password"].as_str().unwrap_or_default();
			match state.accounts.get(email) {
				Some((expected, user)) if expected == password => {
					let user = user.clone();
					Json(issue(&mut state, user)).into_response()
				}
				_ => error(
					StatusCode::BAD_REQUEST,
					json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
				),
			}
		}
		Some("refresh_token") => {
			if !state.refresh_failures.is_empty() {
				let status = state.refresh_failures.remove(0);
				return error(StatusCode::from_u16(status).unwrap(), json!({ "msg": "upstream unavailable" }));
			}
			let token = body["refresh_token"].as_str().unwrap_or_default().to_string();
			match state.refresh_tokens.remove(&token) {
				Some(user) => Json(issue(&mut state, user)).into_response(),
				None => error(
					StatusCode::BAD_REQUEST,
					json!({ "error": "invalid_grant", "error_description": "Invalid Refresh Token: Refresh Token Not Found" }),
				),
			}
		}
		_ => error(StatusCode::BAD_REQUEST, json!({ "msg": "unsupported grant type" })),
	}
}

async fn signup(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let mut state = state.lock();
	let email = body["email"].as_str().unwrap_or_default().to_string();
	if state.accounts.contains_key(&email) {
		return error(StatusCode::UNPROCESSABLE_ENTITY, json!({ "msg": "User already registered" }));
	}
	let user = json!({
		"id": format!("user-{}", email.split('@').next().unwrap_or_default()),
		"email": email,
		"user_metadata": body["data"].clone(),
	});
	let password = body["password"].as_str().unwrap_or_default().to_string();
	state.accounts.insert(email, (password, user.clone()));
	Json(issue(&mut state, user)).into_response()
}

async fn user(State(state): Shared, headers: HeaderMap) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let state = state.lock();
	match bearer(&headers).and_then(|token| state.access_tokens.get(&token).cloned()) {
		Some(user) => Json(user).into_response(),
		None => error(StatusCode::UNAUTHORIZED, json!({ "msg": "invalid JWT" })),
	}
}

async fn logout(State(state): Shared, headers: HeaderMap) -> Response {
	let mut state = state.lock();
	if let Some(token) = bearer(&headers) {
		state.access_tokens.remove(&token);
	}
	StatusCode::NO_CONTENT.into_response()
}

fn matches(row: &Value, filters: &[(String, String)]) -> bool {
	filters.iter().all(|(column, filter)| {
		let value = &row[column.as_str()];
		if filter == "not.is.true" {
			return value != &Value::Bool(true);
		}
		match filter.strip_prefix("eq.") {
			Some(expected) => match value {
				Value::String(s) => s == expected,
				other => other.to_string() == expected,
			},
			None => true,
		}
	})
}

fn filters(query: &[(String, String)]) -> Vec<(String, String)> {
	query
		.iter()
		.filter(|(key, _)| !matches!(key.as_str(), "select" | "order" | "limit"))
		.cloned()
		.collect()
}

async fn select(State(state): Shared, headers: HeaderMap, Path(table): Path<String>, Query(query): Query<Vec<(String, String)>>) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let state = state.lock();
	let limit = query
		.iter()
		.find(|(key, _)| key == "limit")
		.and_then(|(_, v)| v.parse().ok())
		.unwrap_or(usize::MAX);
	let filters = filters(&query);
	let rows: Vec<Value> = state
		.rows
		.get(&table)
		.map(|rows| rows.iter().filter(|row| matches(row, &filters)).take(limit).cloned().collect())
		.unwrap_or_default();
	Json(rows).into_response()
}

async fn insert(State(state): Shared, headers: HeaderMap, Path(table): Path<String>, Json(body): Json<Value>) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let mut state = state.lock();
	let mut rows = match body {
		Value::Array(rows) => rows,
		row => vec![row],
	};
	let existing = state.rows.entry(table).or_default();
	for row in &mut rows {
		if existing.iter().any(|r| r.get("code").is_some() && r["code"] == row["code"]) {
			return error(StatusCode::CONFLICT, json!({ "message": "duplicate key value violates unique constraint" }));
		}
		if row.get("id").is_none() {
			row["id"] = json!(format!("row-{}", existing.len() + 1));
		}
		existing.push(row.clone());
	}
	(StatusCode::CREATED, Json(rows)).into_response()
}

async fn update(State(state): Shared, headers: HeaderMap, Path(table): Path<String>, Query(query): Query<Vec<(String, String)>>, Json(patch): Json<Value>) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let mut state = state.lock();
	let filters = filters(&query);
	if let Some((_, id)) = filters.iter().find(|(key, _)| key == "id") {
		let id = id.trim_start_matches("eq.").to_string();
		if state.failing_patches.contains(&id) {
			return error(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "write failed" }));
		}
	}
	let mut updated = Vec::new();
	for row in state.rows.entry(table).or_default().iter_mut().filter(|row| matches(row, &filters)) {
		if let (Value::Object(row), Value::Object(patch)) = (&mut *row, &patch) {
			for (key, value) in patch {
				row.insert(key.clone(), value.clone());
			}
		}
		updated.push(row.clone());
	}
	Json(updated).into_response()
}

async fn function(State(state): Shared, headers: HeaderMap, Path(name): Path<String>, Json(body): Json<Value>) -> Response {
	if let Err(resp) = check_apikey(&headers) {
		return resp;
	}
	let mut state = state.lock();
	let token = bearer(&headers);
	state.function_bodies.push((name.clone(), body.clone(), token.clone()));
	let signed_in = token.as_ref().is_some_and(|t| state.access_tokens.contains_key(t));
	if !signed_in {
		return error(StatusCode::UNAUTHORIZED, json!({ "error": "User not authenticated" }));
	}
	match name.as_str() {
		"create-checkout" => match body["planId"].as_str() {
			Some(plan) => Json(json!({ "url": format!("https://checkout.example.com/pay/{plan}") })).into_response(),
			None => error(StatusCode::BAD_REQUEST, json!({ "error": "planId is required" })),
		},
		"customer-portal" => Json(json!({ "url": "https://billing.example.com/portal" })).into_response(),
		"check-subscription" => Json(json!({ "subscribed": true, "planId": "pro", "subscriptionEnd": "2026-12-01T00:00:00Z" })).into_response(),
		_ => error(StatusCode::NOT_FOUND, json!({ "error": "function not found" })),
	}
}
