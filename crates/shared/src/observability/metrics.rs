//! 指标记录
//!
//! 基于 metrics crate 的宏记录规则引擎调用情况。
//! 进程未安装 recorder 时这些调用都是空操作。

/// 规则引擎请求结果状态
pub const STATUS_OK: &str = "ok";
pub const STATUS_SERVICE_ERROR: &str = "service_error";
pub const STATUS_TRANSPORT_ERROR: &str = "transport_error";

/// 注册指标描述，出现在导出端的 HELP 注释中
pub fn describe_metrics() {
    metrics::describe_counter!(
        "rule_engine_requests_total",
        "Total number of requests sent to the rule engine service"
    );
    metrics::describe_histogram!(
        "rule_engine_request_duration_seconds",
        "Rule engine request latency in seconds"
    );
    metrics::describe_counter!(
        "rule_console_rejections_total",
        "Operations rejected locally before reaching the rule engine"
    );
}

/// 记录一次规则引擎请求
#[inline]
pub fn record_rule_engine_request(endpoint: &str, status: &str, duration_secs: f64) {
    metrics::counter!(
        "rule_engine_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "rule_engine_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// 记录一次本地校验拒绝（未发起网络请求）
#[inline]
pub fn record_local_rejection(operation: &str, code: &str) {
    metrics::counter!(
        "rule_console_rejections_total",
        "operation" => operation.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}
