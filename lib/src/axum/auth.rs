use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::{ErrorKind, Result};

use super::{AuthExt, Router};

pub fn router() -> Router {
    Router::new().route("/api/login", post(login))
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    password: String,
}

/// Checks the submitted password. There is no session, the answer is all
/// the client gets.
pub async fn login(
    Extension(auth): AuthExt,
    data: std::result::Result<Json<LoginData>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(data) = data?;
    if auth.verify(&data.password) {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(ErrorKind::InvalidCredentials.into())
    }
}
