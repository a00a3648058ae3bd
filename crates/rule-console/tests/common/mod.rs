//! 规则引擎测试桩
//!
//! 在 127.0.0.1 的随机端口上启动一个进程内 axum 服务，按约定的端点和错误格式应答，
//! 并记录收到的请求体。AST 由桩服务按固定结构拼出，不做任何解析。

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// 桩服务收到的请求
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: &'static str,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct StubState {
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubState {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn record(&self, path: &'static str, body: &Value) {
        self.requests.lock().push(RecordedRequest {
            path,
            body: body.clone(),
        });
    }
}

pub struct StubRuleEngine {
    pub base_url: String,
    pub state: StubState,
}

/// 启动桩服务，返回其地址和请求记录
pub async fn spawn_stub_rule_engine() -> StubRuleEngine {
    let state = StubState::default();
    let app = Router::new()
        .route("/create_rule", post(create_rule))
        .route("/combine_rules", post(combine_rules))
        .route("/evaluate_rule", post(evaluate_rule))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("绑定测试端口失败");
    let addr = listener.local_addr().expect("获取测试端口失败");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("桩服务运行失败");
    });

    StubRuleEngine {
        base_url: format!("http://{addr}"),
        state,
    }
}

/// 单条规则的 AST
pub fn operand_ast(rule: &str) -> Value {
    json!({ "node_type": "operand", "left": null, "right": null, "value": rule })
}

/// 多条规则合并后的 AST
pub fn combined_ast(rules: &[&str]) -> Value {
    json!({ "node_type": "operator", "value": "AND", "rules": rules })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn create_rule(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.record("/create_rule", &body);

    let Some(rule) = body.get("rule_string").and_then(Value::as_str) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'rule_string' in request");
    };

    match rule {
        "invalid" => error_response(StatusCode::BAD_REQUEST, "Invalid rule"),
        "garbled error" => (StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").into_response(),
        "garbled success" => (StatusCode::CREATED, "not json").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            (StatusCode::CREATED, Json(operand_ast(rule))).into_response()
        }
        _ => (StatusCode::CREATED, Json(operand_ast(rule))).into_response(),
    }
}

async fn combine_rules(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.record("/combine_rules", &body);

    let rules: Option<Vec<&str>> = body
        .get("rule_strings")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect());

    match rules {
        Some(rules) if !rules.is_empty() => {
            (StatusCode::CREATED, Json(combined_ast(&rules))).into_response()
        }
        _ => error_response(
            StatusCode::BAD_REQUEST,
            "Missing or invalid 'rule_strings' in request",
        ),
    }
}

async fn evaluate_rule(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
    state.record("/evaluate_rule", &body);

    let has_ast = body.get("ast").is_some_and(|ast| !ast.is_null());
    let user_data = body.get("user_data").and_then(Value::as_object);

    match user_data {
        Some(user_data) if has_ast && !user_data.is_empty() => {
            (StatusCode::OK, Json(json!({ "result": true }))).into_response()
        }
        _ => error_response(
            StatusCode::BAD_REQUEST,
            "Missing 'ast' or 'user_data' in request",
        ),
    }
}
