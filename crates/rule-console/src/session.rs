//! 会话状态
//!
//! 保存当前会话中最近一次创建得到的 AST 和最近一次合并得到的 AST。
//! 会话开始时为空，成功的操作整体覆盖对应槽位，会话结束（进程退出）时丢弃，
//! 不做任何持久化。
//!
//! 同一会话中可以并发发起多个操作。每个操作在收到响应后只写一次自己的槽位，
//! 同类操作并发时以最后返回的响应为准（last-write-wins），不取消在途请求。

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::Ast;

/// 会话阶段，由两个槽位推导
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    HasCreated,
    HasCombined,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "空闲（尚无可评估的规则）",
            Self::HasCreated => "已创建规则",
            Self::HasCombined => "已合并规则",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSessionState {
    last_created_ast: Option<Ast>,
    combined_ast: Option<Ast>,
}

impl RuleSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_created_ast(&self) -> Option<&Ast> {
        self.last_created_ast.as_ref()
    }

    pub fn combined_ast(&self) -> Option<&Ast> {
        self.combined_ast.as_ref()
    }

    /// 评估使用的 AST：合并结果优先于单条创建结果，`null` 视为不存在
    pub fn active_ast(&self) -> Option<&Ast> {
        usable(&self.combined_ast).or_else(|| usable(&self.last_created_ast))
    }

    pub fn phase(&self) -> SessionPhase {
        if usable(&self.combined_ast).is_some() {
            SessionPhase::HasCombined
        } else if usable(&self.last_created_ast).is_some() {
            SessionPhase::HasCreated
        } else {
            SessionPhase::Idle
        }
    }

    pub fn record_created(&mut self, ast: Ast) {
        self.last_created_ast = Some(ast);
    }

    pub fn record_combined(&mut self, ast: Ast) {
        self.combined_ast = Some(ast);
    }
}

fn usable(slot: &Option<Ast>) -> Option<&Ast> {
    slot.as_ref().filter(|ast| !ast.is_null())
}

/// 会话状态的共享句柄
///
/// clone 后指向同一份状态。锁只在读写槽位的瞬间持有，从不跨越 `.await`。
#[derive(Debug, Clone, Default)]
pub struct RuleSession {
    state: Arc<RwLock<RuleSessionState>>,
}

impl RuleSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前状态的快照
    pub fn snapshot(&self) -> RuleSessionState {
        self.state.read().clone()
    }

    pub fn active_ast(&self) -> Option<Ast> {
        self.state.read().active_ast().cloned()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read().phase()
    }

    pub fn record_created(&self, ast: Ast) {
        self.state.write().record_created(ast);
    }

    pub fn record_combined(&self, ast: Ast) {
        self.state.write().record_combined(ast);
    }
}
