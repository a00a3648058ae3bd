//! 共享库
//!
//! 包含规则控制台共用的配置加载、日志初始化与指标记录等基础设施代码。

pub mod config;
pub mod observability;
