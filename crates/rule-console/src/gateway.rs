//! 规则引擎 HTTP 客户端封装
//!
//! 通过 RuleEngineGateway trait 抽象一次网络调用，便于测试时注入 mock 实现。
//! 网关只负责把传输层失败和服务端错误统一成 `GatewayError`，
//! 不读写会话状态，也不做自动重试。

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use rule_shared::config::RuleEngineConfig;
use rule_shared::observability::metrics::{
    STATUS_OK, STATUS_SERVICE_ERROR, STATUS_TRANSPORT_ERROR, record_rule_engine_request,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::models::{Endpoint, RuleRequest};

/// 单次调用的结果：成功载荷或失败，二者必居其一
pub type OperationOutcome = Result<Value, GatewayError>;

/// 规则引擎调用接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleEngineGateway: Send + Sync {
    /// 向请求对应的端点发送一次请求并等待响应
    async fn send(&self, request: RuleRequest) -> OperationOutcome;
}

/// 服务端错误响应体
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// 基于 reqwest 的规则引擎客户端
///
/// 超时由 reqwest 在传输层执行，网关本身不再叠加超时。
#[derive(Clone)]
pub struct HttpRuleEngineGateway {
    client: Client,
    base_url: String,
}

impl HttpRuleEngineGateway {
    pub fn new(config: &RuleEngineConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| GatewayError::Transport(format!("创建 HTTP 客户端失败: {e}")))?;

        info!(base_url = config.base_url(), "规则引擎客户端已初始化");

        Ok(Self::with_client(client, config.base_url()))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn dispatch(&self, endpoint: Endpoint, request: &RuleRequest) -> OperationOutcome {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| GatewayError::Transport(format!("响应体解析失败: {e}")));
        }

        let status = status.as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        match serde_json::from_slice::<ServiceErrorBody>(&body) {
            Ok(error_body) => Err(GatewayError::Service {
                status,
                message: error_body.error,
            }),
            Err(e) => {
                warn!(status, error = %e, "错误响应体不是约定格式");
                Err(GatewayError::UnreadableErrorBody { status })
            }
        }
    }
}

#[async_trait]
impl RuleEngineGateway for HttpRuleEngineGateway {
    async fn send(&self, request: RuleRequest) -> OperationOutcome {
        let endpoint = request.endpoint();
        let start = Instant::now();

        debug!(%endpoint, "调用规则引擎");

        let outcome = self.dispatch(endpoint, &request).await;
        let elapsed = start.elapsed();

        let status = match &outcome {
            Ok(_) => STATUS_OK,
            Err(GatewayError::Transport(_)) => STATUS_TRANSPORT_ERROR,
            Err(_) => STATUS_SERVICE_ERROR,
        };
        record_rule_engine_request(endpoint.name(), status, elapsed.as_secs_f64());

        match &outcome {
            Ok(_) => debug!(%endpoint, elapsed_ms = elapsed.as_millis() as u64, "规则引擎调用成功"),
            Err(e) => warn!(%endpoint, error = %e, "规则引擎调用失败"),
        }

        outcome
    }
}
