//! 规则控制台错误类型
//!
//! 错误的 Display 文本就是展示给用户的消息，所有失败路径都汇聚到同一个展示通道。
//! 分为三类：本地输入校验错误、传输层错误、服务端报告的错误。
//! 三类错误都不会终止会话，用户重新提交即可重试。

use thiserror::Error;

/// 规则引擎调用失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// 网络不可达、超时，或成功响应的响应体不是 JSON
    #[error("请求失败: {0}")]
    Transport(String),

    /// 服务端以非 2xx 状态拒绝请求，message 原样透传 `{ "error": ... }`
    #[error("错误: {message}")]
    Service { status: u16, message: String },

    /// 非 2xx 响应的响应体不是约定的 `{ "error": ... }` 结构
    #[error("错误: 无法解析规则引擎返回的错误信息 (HTTP {status})")]
    UnreadableErrorBody { status: u16 },
}

/// 控制台操作错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("请输入规则字符串。")]
    MissingRuleString,

    #[error("请至少输入一条需要合并的规则字符串。")]
    EmptyCombineInput,

    #[error("请输入有效的规则字符串（每行一条）。")]
    NoValidRuleLines,

    #[error("请输入 JSON 格式的用户数据。")]
    MissingUserData,

    #[error("无效的 JSON: {0}")]
    InvalidUserData(String),

    #[error("没有可用的 AST，请先创建或合并规则。")]
    NoRuleAvailable,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ConsoleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRuleString => "MISSING_RULE_STRING",
            Self::EmptyCombineInput => "EMPTY_COMBINE_INPUT",
            Self::NoValidRuleLines => "NO_VALID_RULE_LINES",
            Self::MissingUserData => "MISSING_USER_DATA",
            Self::InvalidUserData(_) => "INVALID_USER_DATA",
            Self::NoRuleAvailable => "NO_RULE_AVAILABLE",
            Self::Gateway(GatewayError::Transport(_)) => "TRANSPORT_ERROR",
            Self::Gateway(GatewayError::Service { .. }) => "SERVICE_ERROR",
            Self::Gateway(GatewayError::UnreadableErrorBody { .. }) => "UNREADABLE_ERROR_BODY",
        }
    }

    /// 是否在本地校验阶段被拒绝（未发起网络请求）
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Gateway(_))
    }
}
