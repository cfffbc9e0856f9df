use axum::Json;
use serde_json::{Value, json};

/// 存活探针，不访问链和数据库
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
