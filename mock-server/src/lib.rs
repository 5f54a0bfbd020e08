use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso_code: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CountryStatus {
    pub id: i64,
    pub country: i64,
    pub country_name: String,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Registration {
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusInput {
    pub country: i64,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug)]
struct User {
    password: String,
    statuses: Vec<CountryStatus>,
}

#[derive(Debug, Default)]
pub struct Store {
    countries: Vec<Country>,
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    next_status_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

const STATUS_CHOICES: [&str; 2] = ["visited", "want_to_visit"];

/// Reference countries every fresh server starts with.
pub fn seed_countries() -> Vec<Country> {
    [
        (1, "France", "FRA"),
        (2, "Japan", "JPN"),
        (3, "Brazil", "BRA"),
        (4, "Kenya", "KEN"),
        (5, "Canada", "CAN"),
        (6, "Australia", "AUS"),
        (7, "Norway", "NOR"),
        (8, "Peru", "PER"),
    ]
    .into_iter()
    .map(|(id, name, iso_code)| Country {
        id,
        name: name.to_string(),
        iso_code: iso_code.to_string(),
    })
    .collect()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        countries: seed_countries(),
        next_status_id: 1,
        ..Store::default()
    }));
    Router::new()
        .route("/api-token-auth/", post(obtain_token))
        .route("/api/register/", post(register))
        .route("/api/countries/", get(list_countries))
        .route(
            "/api/country-statuses/",
            get(list_statuses).post(create_status),
        )
        .route(
            "/api/country-statuses/{id}/",
            put(update_status).delete(delete_status),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn error(status: StatusCode, body: serde_json::Value) -> Response {
    (status, Json(body)).into_response()
}

/// Resolve `Authorization: Token <key>` to a username.
fn authenticate(store: &Store, headers: &HeaderMap) -> Result<String, Response> {
    let unauthorized = |detail: &str| error(StatusCode::UNAUTHORIZED, json!({ "detail": detail }));
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Authentication credentials were not provided."))?;
    let key = value
        .strip_prefix("Token ")
        .ok_or_else(|| unauthorized("Authentication credentials were not provided."))?;
    store
        .tokens
        .get(key.trim())
        .cloned()
        .ok_or_else(|| unauthorized("Invalid token."))
}

async fn obtain_token(State(db): State<Db>, Json(input): Json<Credentials>) -> Response {
    let mut store = db.write().await;
    let valid = store
        .users
        .get(&input.username)
        .is_some_and(|u| u.password == input.password);
    if !valid {
        tracing::info!(username = %input.username, "rejected credentials");
        return error(
            StatusCode::BAD_REQUEST,
            json!({ "non_field_errors": ["Unable to log in with provided credentials."] }),
        );
    }
    let existing = store
        .tokens
        .iter()
        .find(|(_, user)| **user == input.username)
        .map(|(token, _)| token.clone());
    let token = match existing {
        Some(token) => token,
        None => {
            let token = Uuid::new_v4().simple().to_string();
            store.tokens.insert(token.clone(), input.username.clone());
            token
        }
    };
    Json(json!({ "token": token })).into_response()
}

async fn register(State(db): State<Db>, Json(input): Json<Registration>) -> Response {
    let (Some(username), Some(password)) = (input.username, input.password) else {
        return error(
            StatusCode::BAD_REQUEST,
            json!({ "detail": "username and password are required" }),
        );
    };
    if username.is_empty() || password.is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            json!({ "detail": "username and password may not be blank" }),
        );
    }
    let mut store = db.write().await;
    if store.users.contains_key(&username) {
        return error(
            StatusCode::BAD_REQUEST,
            json!({ "username": ["A user with that username already exists."] }),
        );
    }
    store.users.insert(
        username.clone(),
        User {
            password,
            statuses: Vec::new(),
        },
    );
    tracing::info!(%username, "registered user");
    (
        StatusCode::CREATED,
        Json(json!({ "username": username, "email": input.email })),
    )
        .into_response()
}

async fn list_countries(State(db): State<Db>, headers: HeaderMap) -> Response {
    let store = db.read().await;
    if let Err(resp) = authenticate(&store, &headers) {
        return resp;
    }
    Json(store.countries.clone()).into_response()
}

async fn list_statuses(State(db): State<Db>, headers: HeaderMap) -> Response {
    let store = db.read().await;
    let username = match authenticate(&store, &headers) {
        Ok(username) => username,
        Err(resp) => return resp,
    };
    let statuses = store
        .users
        .get(&username)
        .map(|u| u.statuses.clone())
        .unwrap_or_default();
    Json(statuses).into_response()
}

fn validate_status(input: &StatusInput) -> Result<(), Response> {
    if STATUS_CHOICES.contains(&input.status.as_str()) {
        return Ok(());
    }
    Err(error(
        StatusCode::BAD_REQUEST,
        json!({ "status": [format!("\"{}\" is not a valid choice.", input.status)] }),
    ))
}

fn find_country(store: &Store, id: i64) -> Result<Country, Response> {
    store
        .countries
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .ok_or_else(|| {
            error(
                StatusCode::NOT_FOUND,
                json!({ "error": "Country with this ID does not exist" }),
            )
        })
}

async fn create_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<StatusInput>,
) -> Response {
    let mut store = db.write().await;
    let username = match authenticate(&store, &headers) {
        Ok(username) => username,
        Err(resp) => return resp,
    };
    let country = match find_country(&store, input.country) {
        Ok(country) => country,
        Err(resp) => return resp,
    };
    let already_marked = store
        .users
        .get(&username)
        .is_some_and(|u| u.statuses.iter().any(|s| s.country == country.id));
    if already_marked {
        return error(
            StatusCode::BAD_REQUEST,
            json!({ "error": format!("You already marked {}", country.name) }),
        );
    }
    if let Err(resp) = validate_status(&input) {
        return resp;
    }

    let id = store.next_status_id;
    store.next_status_id += 1;
    let record = CountryStatus {
        id,
        country: country.id,
        country_name: country.name,
        status: input.status,
        latitude: input.latitude,
        longitude: input.longitude,
    };
    if let Some(user) = store.users.get_mut(&username) {
        user.statuses.push(record.clone());
    }
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<StatusInput>,
) -> Response {
    let mut store = db.write().await;
    let username = match authenticate(&store, &headers) {
        Ok(username) => username,
        Err(resp) => return resp,
    };
    let country = match find_country(&store, input.country) {
        Ok(country) => country,
        Err(resp) => return resp,
    };
    if let Err(resp) = validate_status(&input) {
        return resp;
    }
    let record = store
        .users
        .get_mut(&username)
        .and_then(|u| u.statuses.iter_mut().find(|s| s.id == id));
    match record {
        Some(record) => {
            record.country = country.id;
            record.country_name = country.name;
            record.status = input.status;
            record.latitude = input.latitude;
            record.longitude = input.longitude;
            Json(record.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
    }
}

async fn delete_status(State(db): State<Db>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    let mut store = db.write().await;
    let username = match authenticate(&store, &headers) {
        Ok(username) => username,
        Err(resp) => return resp,
    };
    let Some(user) = store.users.get_mut(&username) else {
        return error(StatusCode::NOT_FOUND, json!({ "detail": "Not found." }));
    };
    let before = user.statuses.len();
    user.statuses.retain(|s| s.id != id);
    if user.statuses.len() == before {
        return error(StatusCode::NOT_FOUND, json!({ "detail": "Not found." }));
    }
    StatusCode::NO_CONTENT.into_response()
}
