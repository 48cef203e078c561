use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub id: Option<u64>,
    pub name: String,
    pub hometown: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct GraphqlBody {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
}

/// Variables of the `CreateUser` mutation.
#[derive(Deserialize)]
pub struct CreateUserVariables {
    pub name: String,
    pub email: Option<String>,
}

/// What `/echo` saw of the request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

pub type Db = Arc<RwLock<Vec<User>>>;

pub fn seed() -> Vec<User> {
    vec![
        User {
            id: 1,
            name: "Hank".to_string(),
            hometown: Some("Taichung".to_string()),
            email: None,
        },
        User {
            id: 2,
            name: "Amy".to_string(),
            hometown: Some("Unknown".to_string()),
            email: None,
        },
    ]
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/graphql", post(graphql))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

/// json-server style listing: `_sort=field` or `_sort=-field`, then the
/// `_start.._end` slice.
async fn list_users(
    State(db): State<Db>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<User>>, StatusCode> {
    let mut users = db.read().await.clone();

    if let Some(sort) = query.get("_sort") {
        let (field, descending) = match sort.strip_prefix('-') {
            Some(field) => (field, true),
            None => (sort.as_str(), false),
        };
        match field {
            "id" => users.sort_by_key(|u| u.id),
            "name" => users.sort_by(|a, b| a.name.cmp(&b.name)),
            _ => return Err(StatusCode::BAD_REQUEST),
        }
        if descending {
            users.reverse();
        }
    }

    let start = parse_bound(query.get("_start"), 0)?.min(users.len());
    let end = parse_bound(query.get("_end"), users.len())?.clamp(start, users.len());
    debug!(count = end - start, "list users");
    Ok(Json(users[start..end].to_vec()))
}

fn parse_bound(raw: Option<&String>, default: usize) -> Result<usize, StatusCode> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(default),
    }
}

/// One past the highest id in use. Fails once `u64::MAX` is taken.
fn next_id(users: &[User]) -> Result<u64, StatusCode> {
    users
        .iter()
        .map(|u| u.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(StatusCode::CONFLICT)
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<User>, StatusCode> {
    let users = db.read().await;
    users.iter().find(|u| u.id == id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    let mut users = db.write().await;
    let id = match input.id {
        Some(id) if users.iter().any(|u| u.id == id) => return Err(StatusCode::CONFLICT),
        Some(id) => id,
        None => next_id(&users)?,
    };
    let user = User {
        id,
        name: input.name,
        hometown: input.hometown,
        email: input.email,
    };
    users.push(user.clone());
    info!(id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Understands two operations: the `GetUsers` query and the `CreateUser`
/// mutation, which reads `name`/`email` from `variables`.
async fn graphql(
    State(db): State<Db>,
    Json(body): Json<GraphqlBody>,
) -> (StatusCode, Json<Value>) {
    if body.query.contains("CreateUser") {
        let variables = body
            .variables
            .and_then(|v| serde_json::from_value::<CreateUserVariables>(v).ok());
        let Some(variables) = variables else {
            return graphql_error(StatusCode::BAD_REQUEST, "CreateUser requires variables.name");
        };
        let mut users = db.write().await;
        let Ok(id) = next_id(&users) else {
            return graphql_error(StatusCode::CONFLICT, "no user id left");
        };
        let user = User {
            id,
            name: variables.name,
            hometown: None,
            email: variables.email,
        };
        users.push(user.clone());
        info!(id, "user created via graphql");
        return (StatusCode::OK, Json(json!({ "data": { "createUser": user } })));
    }
    if body.query.contains("GetUsers") {
        let users = db.read().await.clone();
        return (StatusCode::OK, Json(json!({ "data": { "users": users } })));
    }
    graphql_error(StatusCode::BAD_REQUEST, "unknown operation")
}

fn graphql_error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "errors": [{ "message": message }] })))
}

async fn echo(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&body).into_owned())
    };
    Json(Echo {
        method: method.to_string(),
        query,
        content_type,
        body,
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(json!({ "status": code }))))
}
