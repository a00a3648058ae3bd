//! 规则编排
//!
//! 对外提供 create / combine / evaluate 三个操作。每个操作的流程相同：
//! 本地校验输入 -> 调用规则引擎 -> 成功时更新会话状态 -> 把结果或错误交给展示器。
//!
//! 本地校验失败时不发起任何网络请求；任何失败都不会修改会话状态。
//! 同一会话内的操作可以并发执行，会话状态的并发语义见 [`crate::session`]。

use std::sync::Arc;

use rule_shared::observability::metrics::record_local_rejection;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::ConsoleError;
use crate::gateway::RuleEngineGateway;
use crate::models::{Ast, RuleRequest, UserData, pretty_json};
use crate::presenter::ResultPresenter;
use crate::session::RuleSession;

/// 规则编排器
///
/// 所有字段都是共享句柄，clone 后与原实例操作同一个会话，
/// 可以交给多个并发任务使用。
#[derive(Clone)]
pub struct RuleOrchestrator {
    gateway: Arc<dyn RuleEngineGateway>,
    presenter: Arc<dyn ResultPresenter>,
    session: RuleSession,
}

impl RuleOrchestrator {
    /// 使用新的空会话创建编排器
    pub fn new(gateway: Arc<dyn RuleEngineGateway>, presenter: Arc<dyn ResultPresenter>) -> Self {
        Self::with_session(gateway, presenter, RuleSession::new())
    }

    pub fn with_session(
        gateway: Arc<dyn RuleEngineGateway>,
        presenter: Arc<dyn ResultPresenter>,
        session: RuleSession,
    ) -> Self {
        Self {
            gateway,
            presenter,
            session,
        }
    }

    pub fn session(&self) -> &RuleSession {
        &self.session
    }

    /// 创建规则：成功后覆盖 `last_created_ast`
    #[instrument(skip(self, input))]
    pub async fn create_rule(&self, input: &str) -> Result<Ast, ConsoleError> {
        let result = self.try_create_rule(input).await;
        self.present("create", &result, |ast| {
            format!("规则 AST:\n{}", ast.to_pretty_string())
        });
        result
    }

    /// 合并多行规则：每行一条，去掉首尾空白并丢弃空行，顺序保持不变
    #[instrument(skip(self, input))]
    pub async fn combine_rules(&self, input: &str) -> Result<Ast, ConsoleError> {
        let result = if input.trim().is_empty() {
            Err(ConsoleError::EmptyCombineInput)
        } else {
            self.try_combine_rules(split_rule_lines(input)).await
        };
        self.present("combine", &result, render_combined);
        result
    }

    /// 合并已拆分好的规则列表，空白项会被丢弃
    #[instrument(skip(self, rules))]
    pub async fn combine_rule_list<I, S>(&self, rules: I) -> Result<Ast, ConsoleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rule_strings = rules
            .into_iter()
            .map(|rule| rule.as_ref().trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect();
        let result = self.try_combine_rules(rule_strings).await;
        self.present("combine", &result, render_combined);
        result
    }

    /// 用用户数据评估当前生效的 AST，不修改会话状态
    #[instrument(skip(self, input))]
    pub async fn evaluate_rule(&self, input: &str) -> Result<Value, ConsoleError> {
        let result = self.try_evaluate_rule(input).await;
        self.present("evaluate", &result, |verdict| {
            format!("评估结果: {}", pretty_json(verdict))
        });
        result
    }

    async fn try_create_rule(&self, input: &str) -> Result<Ast, ConsoleError> {
        let rule_string = input.trim();
        if rule_string.is_empty() {
            return Err(ConsoleError::MissingRuleString);
        }

        let payload = self
            .gateway
            .send(RuleRequest::Create {
                rule_string: rule_string.to_string(),
            })
            .await?;

        let ast = Ast::new(payload);
        self.session.record_created(ast.clone());
        info!("规则 AST 已创建");
        Ok(ast)
    }

    async fn try_combine_rules(&self, rule_strings: Vec<String>) -> Result<Ast, ConsoleError> {
        if rule_strings.is_empty() {
            return Err(ConsoleError::NoValidRuleLines);
        }

        let rule_count = rule_strings.len();
        let payload = self
            .gateway
            .send(RuleRequest::Combine { rule_strings })
            .await?;

        let ast = Ast::new(payload);
        self.session.record_combined(ast.clone());
        info!(rule_count, "规则已合并");
        Ok(ast)
    }

    async fn try_evaluate_rule(&self, input: &str) -> Result<Value, ConsoleError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ConsoleError::MissingUserData);
        }

        let user_data: UserData = text
            .parse()
            .map_err(|e: serde_json::Error| ConsoleError::InvalidUserData(e.to_string()))?;

        // 读取快照后立即释放锁，评估期间其他操作仍可更新会话
        let ast = self
            .session
            .active_ast()
            .ok_or(ConsoleError::NoRuleAvailable)?;

        let verdict = self
            .gateway
            .send(RuleRequest::Evaluate { ast, user_data })
            .await?;

        info!("规则评估完成");
        Ok(verdict)
    }

    fn present<T>(
        &self,
        operation: &str,
        result: &Result<T, ConsoleError>,
        render: impl FnOnce(&T) -> String,
    ) {
        match result {
            Ok(value) => self.presenter.show(&render(value)),
            Err(e) => {
                if e.is_local() {
                    debug!(operation, code = e.code(), "输入校验未通过");
                    record_local_rejection(operation, e.code());
                } else {
                    warn!(operation, code = e.code(), error = %e, "操作失败");
                }
                self.presenter.show(&e.to_string());
            }
        }
    }
}

fn render_combined(ast: &Ast) -> String {
    format!("合并规则 AST:\n{}", ast.to_pretty_string())
}

/// 按行拆分规则文本：去掉每行首尾空白，丢弃空行，保持原有顺序
pub fn split_rule_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
