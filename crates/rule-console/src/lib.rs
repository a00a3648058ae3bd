//! 资格规则控制台
//!
//! 与远端规则引擎服务交互的客户端：创建规则、合并多条规则、
//! 用用户数据评估当前生效的规则。规则解析、合并与评估算法都在服务端，
//! 本 crate 只负责会话内的 AST 状态管理和请求编排。
//!
//! # 主要模块
//!
//! - `gateway`: 规则引擎 HTTP 调用，统一错误转换
//! - `session`: 会话内最近一次创建/合并得到的 AST
//! - `orchestrator`: create / combine / evaluate 三个操作
//! - `presenter`: 结果展示
//! - `cli`: 命令行入口与交互式会话

pub mod cli;
pub mod error;
pub mod gateway;
pub mod models;
pub mod orchestrator;
pub mod presenter;
pub mod session;

pub use error::{ConsoleError, GatewayError};
pub use gateway::{HttpRuleEngineGateway, OperationOutcome, RuleEngineGateway};
pub use models::{Ast, Endpoint, RuleRequest, UserData};
pub use orchestrator::RuleOrchestrator;
pub use presenter::{ConsolePresenter, MemoryPresenter, ResultPresenter};
pub use session::{RuleSession, RuleSessionState, SessionPhase};
