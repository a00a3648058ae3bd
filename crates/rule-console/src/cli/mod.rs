//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `session` - 交互式会话（默认），从标准输入逐行读取命令
//! - `create` - 创建单条规则并输出 AST
//! - `combine` - 合并多条规则并输出合并后的 AST
//! - `evaluate` - 创建/合并规则后立即评估用户数据
//!
//! # 使用示例
//!
//! ```bash
//! # 交互式会话
//! rule-console --base-url http://127.0.0.1:5000
//!
//! # 单次操作
//! rule-console create "age > 30 AND department = 'Sales'"
//! rule-console combine "age > 30" "income > 50000"
//! rule-console evaluate -r "age > 30" -r "income > 50000" -d '{"age": 35, "income": 60000}'
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::{CommandRunner, SessionCommand};
