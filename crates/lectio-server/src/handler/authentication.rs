//! Account registration and login handlers.

use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::State;
use axum::http::StatusCode;
use lectio_postgres::model::NewUser;

use crate::extract::{Json, ValidateJson};
use crate::handler::request::{Login, Register};
use crate::handler::response::{ErrorResponse, LoggedIn, Registered};
use crate::handler::{ErrorKind, Result};
use crate::service::{PasswordHasher, ServiceState, SharedUserStore, TokenService};

/// Tracing target for authentication operations.
const TRACING_TARGET: &str = "lectio_server::handler::authentication";

/// Registers a new account.
#[tracing::instrument(skip_all, fields(username = %request.username))]
async fn register(
    State(users): State<SharedUserStore>,
    State(password_hasher): State<PasswordHasher>,
    ValidateJson(request): ValidateJson<Register>,
) -> Result<(StatusCode, Json<Registered>)> {
    tracing::debug!(target: TRACING_TARGET, "registering account");

    if users.find_by_username(&request.username).await?.is_some() {
        return Err(ErrorKind::Conflict
            .with_message("User with this name already exists")
            .with_resource("user"));
    }

    let new_user = NewUser {
        username: request.username,
        password_hash: password_hasher.hash_password(&request.password)?,
    };
    let user = users.create_user(new_user).await?;

    tracing::info!(target: TRACING_TARGET, user_id = user.id, "account registered");

    Ok((StatusCode::CREATED, Json(Registered::new())))
}

fn register_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Register")
        .description("Creates an account with a unique username.")
        .response::<201, Json<Registered>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<409, Json<ErrorResponse>>()
}

/// Exchanges credentials for an identity token.
#[tracing::instrument(skip_all, fields(username = %request.username))]
async fn login(
    State(users): State<SharedUserStore>,
    State(password_hasher): State<PasswordHasher>,
    State(token_service): State<TokenService>,
    ValidateJson(request): ValidateJson<Login>,
) -> Result<(StatusCode, Json<LoggedIn>)> {
    tracing::debug!(target: TRACING_TARGET, "logging in");

    let Some(user) = users.find_by_username(&request.username).await? else {
        password_hasher.verify_dummy_password(&request.password);
        tracing::debug!(target: TRACING_TARGET, "unknown username");

        return Err(ErrorKind::Unauthorized
            .with_message("Invalid credentials")
            .with_resource("authentication"));
    };

    password_hasher.verify_password(&request.password, &user.password_hash)?;
    let token = token_service.issue(&user.id.to_string())?;

    tracing::info!(target: TRACING_TARGET, user_id = user.id, "login succeeded");

    Ok((StatusCode::OK, Json(LoggedIn { token })))
}

fn login_docs(op: TransformOperation) -> TransformOperation {
    op.summary("Login")
        .description("Verifies the credentials and returns a signed bearer token.")
        .response::<200, Json<LoggedIn>>()
        .response::<400, Json<ErrorResponse>>()
        .response::<401, Json<ErrorResponse>>()
}

/// Returns a [`Router`] with the public authentication routes.
///
/// [`Router`]: axum::routing::Router
pub fn routes() -> ApiRouter<ServiceState> {
    use aide::axum::routing::*;

    ApiRouter::new()
        .api_route("/register", post_with(register, register_docs))
        .api_route("/login", post_with(login, login_docs))
        .with_path_items(|item| item.tag("Authentication"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn register_then_login() -> anyhow::Result<()> {
        let (server, _state, _dir) = create_test_server("HELLO")?;

        let response = server
            .post("/register")
            .json(&json!({"username": "alice", "password": "pw"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "User registered successfully"
        );

        let response = server
            .post("/login")
            .json(&json!({"username": "alice", "password": "pw"}))
            .await;
        response.assert_status_ok();
        let token = response.json::<serde_json::Value>()["token"].clone();
        assert!(token.as_str().is_some_and(|token| !token.is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() -> anyhow::Result<()> {
        let (server, _state, _dir) = create_test_server("HELLO")?;
        let body = json!({"username": "alice", "password": "pw"});

        server.post("/register").json(&body).await.assert_status(StatusCode::CREATED);
        let response = server.post("/register").json(&body).await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            "User with this name already exists"
        );
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_alike() -> anyhow::Result<()> {
        let (server, _state, _dir) = create_test_server("HELLO")?;
        server
            .post("/register")
            .json(&json!({"username": "alice", "password": "pw"}))
            .await
            .assert_status(StatusCode::CREATED);

        let wrong_password = server
            .post("/login")
            .json(&json!({"username": "alice", "password": "nope"}))
            .await;
        let unknown_user = server
            .post("/login")
            .json(&json!({"username": "bob", "password": "pw"}))
            .await;

        wrong_password.assert_status_unauthorized();
        unknown_user.assert_status_unauthorized();
        assert_eq!(
            wrong_password.json::<serde_json::Value>()["message"],
            "Invalid credentials"
        );
        assert_eq!(
            unknown_user.json::<serde_json::Value>()["message"],
            "Invalid credentials"
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_username_is_bad_request() -> anyhow::Result<()> {
        let (server, _state, _dir) = create_test_server("HELLO")?;

        server
            .post("/register")
            .json(&json!({"username": "", "password": "pw"}))
            .await
            .assert_status_bad_request();
        Ok(())
    }
}
