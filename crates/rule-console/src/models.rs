//! 请求与数据模型
//!
//! AST 与用户数据对客户端都是不透明的 JSON 值：客户端只保存、转发和序列化，
//! 从不检查其内部结构。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 规则引擎生成的抽象语法树
///
/// 收到后视为不可变值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ast(Value);

impl Ast {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// 服务端返回 `null` 时不算有效的规则
    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// 格式化为多行 JSON，用于展示
    pub fn to_pretty_string(&self) -> String {
        pretty_json(&self.0)
    }
}

impl From<Value> for Ast {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// 用户数据记录
///
/// 客户端不做任何 schema 校验，只要是合法 JSON 即可，有效性由服务端判断。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserData(Value);

impl UserData {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl FromStr for UserData {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(Self)
    }
}

impl From<Value> for UserData {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// 规则引擎端点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Create,
    Combine,
    Evaluate,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Create => "/create_rule",
            Self::Combine => "/combine_rules",
            Self::Evaluate => "/evaluate_rule",
        }
    }

    /// 指标与日志使用的名称
    pub fn name(&self) -> &'static str {
        &self.path()[1..]
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 发往规则引擎的请求
///
/// 每个变体对应一个端点，序列化后即为请求体：
/// - `Create`  -> `{ "rule_string": ... }`
/// - `Combine` -> `{ "rule_strings": [...] }`（顺序即输入顺序）
/// - `Evaluate` -> `{ "ast": ..., "user_data": ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleRequest {
    Create { rule_string: String },
    Combine { rule_strings: Vec<String> },
    Evaluate { ast: Ast, user_data: UserData },
}

impl RuleRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Create { .. } => Endpoint::Create,
            Self::Combine { .. } => Endpoint::Combine,
            Self::Evaluate { .. } => Endpoint::Evaluate,
        }
    }
}

/// 多行 JSON 格式化，序列化失败时退回单行
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
