//! In-memory user-record store. Holds a UUID-keyed map for the lifetime of
//! the process; the steward gateway is its only intended caller.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
struct User {
    id: String,
    name: String,
    email: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct UserCreate {
    name: String,
    email: String,
    #[serde(default = "default_role")]
    role: String,
}

fn default_role() -> String {
    "user".to_string()
}

type Db = Arc<RwLock<HashMap<String, User>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let db: Db = Arc::new(RwLock::new(HashMap::new()));

    let app = Router::new()
        .route("/", get(root))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db);

    let bind = std::env::var("USER_SERVICE_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = TcpListener::bind(&bind).await?;
    info!("User service listening on {bind}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// 404 body matching what callers of the store expect.
#[derive(Debug)]
struct UserNotFound;

impl IntoResponse for UserNotFound {
    fn into_response(self) -> Response {
        (StatusCode::NOT_FOUND, Json(json!({ "detail": "User not found" }))).into_response()
    }
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "User Management API" }))
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let users = db.read().await.values().cloned().collect();
    Json(users)
}

async fn get_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, UserNotFound> {
    db.read().await.get(&user_id).cloned().map(Json).ok_or(UserNotFound)
}

async fn create_user(
    State(db): State<Db>,
    Json(payload): Json<UserCreate>,
) -> (StatusCode, Json<User>) {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        email: payload.email,
        role: payload.role,
    };
    db.write().await.insert(user.id.clone(), user.clone());
    info!("Created user {}", user.id);
    (StatusCode::CREATED, Json(user))
}

/// Full replace: every field except `id` is overwritten with the payload.
async fn update_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserCreate>,
) -> Result<Json<User>, UserNotFound> {
    let mut db = db.write().await;
    let user = db.get_mut(&user_id).ok_or(UserNotFound)?;
    *user = User {
        id: user_id,
        name: payload.name,
        email: payload.email,
        role: payload.role,
    };
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, UserNotFound> {
    match db.write().await.remove(&user_id) {
        Some(user) => {
            info!("Deleted user {}", user.id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(UserNotFound),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::Json;
    use serde_json::json;
    use tokio::sync::RwLock;

    use super::{
        create_user, delete_user, get_user, list_users, update_user, Db, UserCreate,
    };

    fn empty_db() -> Db {
        Arc::new(RwLock::new(HashMap::new()))
    }

    fn payload(name: &str, email: &str, role: &str) -> UserCreate {
        serde_json::from_value(json!({ "name": name, "email": email, "role": role })).unwrap()
    }

    #[test]
    fn role_defaults_to_user_when_absent() {
        let parsed: UserCreate =
            serde_json::from_value(json!({ "name": "Alice Smith", "email": "alice@example.com" }))
                .unwrap();
        assert_eq!(parsed.role, "user");
    }

    #[tokio::test]
    async fn create_assigns_a_fresh_id_and_answers_201() {
        let db = empty_db();

        let (status, Json(user)) = create_user(
            State(db.clone()),
            Json(payload("Alice Smith", "alice@example.com", "admin")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(!user.id.is_empty());
        assert_eq!(user.role, "admin");
        assert!(db.read().await.contains_key(&user.id));
    }

    #[tokio::test]
    async fn get_returns_the_stored_record() {
        let db = empty_db();
        let (_, Json(created)) = create_user(
            State(db.clone()),
            Json(payload("Alice Smith", "alice@example.com", "admin")),
        )
        .await;

        let Json(fetched) = get_user(State(db), Path(created.id.clone())).await.unwrap();

        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_answers_404_for_unknown_ids() {
        let err = get_user(State(empty_db()), Path("does-not-exist".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_is_empty_before_any_create() {
        let Json(users) = list_users(State(empty_db())).await;
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn update_replaces_every_field_but_the_id() {
        let db = empty_db();
        let (_, Json(created)) = create_user(
            State(db.clone()),
            Json(payload("Bob Johnson", "bob@example.com", "user")),
        )
        .await;

        let Json(updated) = update_user(
            State(db.clone()),
            Path(created.id.clone()),
            Json(payload("Bob Smith", "bob.smith@example.com", "manager")),
        )
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Bob Smith");
        assert_eq!(updated.email, "bob.smith@example.com");
        assert_eq!(updated.role, "manager");

        let Json(fetched) = get_user(State(db), Path(created.id)).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn update_answers_404_for_unknown_ids() {
        let err = update_user(
            State(empty_db()),
            Path("does-not-exist".to_string()),
            Json(payload("Bob Smith", "bob@example.com", "user")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_answers_204_then_the_record_is_gone() {
        let db = empty_db();
        let (_, Json(created)) = create_user(
            State(db.clone()),
            Json(payload("Alice Smith", "alice@example.com", "admin")),
        )
        .await;

        let status = delete_user(State(db.clone()), Path(created.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert!(get_user(State(db), Path(created.id)).await.is_err());
    }

    #[tokio::test]
    async fn delete_answers_404_for_unknown_ids() {
        let err = delete_user(State(empty_db()), Path("does-not-exist".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
