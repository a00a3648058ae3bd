//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// 资格规则控制台
///
/// 在一次会话中创建、合并规则，并用用户数据评估。
/// 使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "rule-console")]
#[command(version, about = "资格规则控制台")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，覆盖配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// 规则引擎服务地址，覆盖配置文件
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// 子命令枚举
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// 交互式会话（默认）
    ///
    /// 从标准输入逐行读取命令，会话状态在整个进程生命周期内保留。
    /// 输入 `help` 查看会话内可用的命令。
    Session,

    /// 创建单条规则
    Create {
        /// 规则字符串
        rule: String,
    },

    /// 合并多条规则
    ///
    /// 规则按给出的顺序发送给规则引擎。
    Combine {
        /// 规则字符串
        rules: Vec<String>,

        /// 从文件读取规则（每行一条），忽略位置参数
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 创建或合并规则后评估用户数据
    ///
    /// 一条 `--rule` 时走创建，多条时走合并。
    Evaluate {
        /// 规则字符串，可重复
        #[arg(short, long = "rule")]
        rules: Vec<String>,

        /// JSON 格式的用户数据
        #[arg(short, long)]
        data: String,
    },
}

// ============================================================================
// 单元测试
// ============================================================================
