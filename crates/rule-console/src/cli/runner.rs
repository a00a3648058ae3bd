//! 命令执行器
//!
//! 负责执行各 CLI 子命令以及交互式会话中的命令。
//! 操作结果和错误都已经由编排器交给展示器，这里只决定退出码。
//!
//! 交互式会话中 create / combine / evaluate 作为独立任务在后台执行，
//! 等待规则引擎响应期间会话继续读取并处理后续命令。
//! 同类操作并发时以最后返回的响应为准，`wait` 用于等待在途操作全部完成。

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::orchestrator::RuleOrchestrator;
use crate::presenter::ResultPresenter;
use crate::session::SessionPhase;

/// 交互式会话中结束多行输入块（combine 规则、evaluate 用户数据）的行
pub const BLOCK_TERMINATOR: &str = ".end";

const SESSION_HELP: &str = "\
可用命令:
  create <规则字符串>     创建规则
  combine [规则字符串]    合并规则，之后每行一条，以 .end 结束
  evaluate [JSON]         用用户数据评估当前规则（合并结果优先），
                          不带参数时读取多行 JSON，以 .end 结束
  wait                    等待所有在途操作完成
  state                   查看会话状态
  help                    显示本帮助
  quit | exit             结束会话";

/// 交互式会话中的一行命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Create(String),
    /// 携带与命令同一行的第一条规则（可能为空）
    Combine(String),
    /// 同一行没有 JSON 时改为读取多行块
    Evaluate(String),
    Wait,
    State,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl SessionCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command.to_ascii_lowercase().as_str() {
            "create" => Self::Create(rest.to_string()),
            "combine" => Self::Combine(rest.to_string()),
            "evaluate" | "eval" => Self::Evaluate(rest.to_string()),
            "wait" => Self::Wait,
            "state" => Self::State,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(command.to_string()),
        }
    }
}

/// 命令执行器
///
/// 作为 CLI 与编排器之间的桥梁，简化 main 函数的复杂度。
pub struct CommandRunner {
    orchestrator: RuleOrchestrator,
    presenter: Arc<dyn ResultPresenter>,
}

impl CommandRunner {
    pub fn new(orchestrator: RuleOrchestrator, presenter: Arc<dyn ResultPresenter>) -> Self {
        Self {
            orchestrator,
            presenter,
        }
    }

    /// 执行 create 命令，返回操作是否成功
    pub async fn run_create(&self, rule: &str) -> bool {
        self.orchestrator.create_rule(rule).await.is_ok()
    }

    /// 执行 combine 命令
    ///
    /// 指定文件时按行读取规则，否则使用位置参数。
    pub async fn run_combine(&self, rules: &[String], file: Option<&Path>) -> Result<bool> {
        let result = match file {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("读取规则文件失败: {}", path.display()))?;
                self.orchestrator.combine_rules(&text).await
            }
            None => self.orchestrator.combine_rule_list(rules).await,
        };
        Ok(result.is_ok())
    }

    /// 执行 evaluate 命令
    ///
    /// 一条规则走创建，多条走合并，然后在同一会话中评估。
    /// 未给出规则时直接评估，由编排器报告没有可用的 AST。
    pub async fn run_evaluate(&self, rules: &[String], data: &str) -> bool {
        let prepared = match rules {
            [] => true,
            [rule] => self.orchestrator.create_rule(rule).await.is_ok(),
            _ => self.orchestrator.combine_rule_list(rules).await.is_ok(),
        };
        if !prepared {
            return false;
        }

        self.orchestrator.evaluate_rule(data).await.is_ok()
    }

    /// 执行交互式会话，直到输入结束或收到 quit
    ///
    /// 结束前等待所有在途操作完成，保证它们的结果都已展示。
    pub async fn run_session<R>(&self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        info!("规则控制台会话已开始，输入 help 查看可用命令");

        let mut lines = reader.lines();
        let mut in_flight = JoinSet::new();

        while let Some(line) = lines.next_line().await.context("读取输入失败")? {
            // 回收已完成的任务，避免长会话中句柄堆积
            while let Some(joined) = in_flight.try_join_next() {
                log_join_error(joined);
            }

            let command = SessionCommand::parse(&line);
            debug!(?command, "会话命令");

            // 操作结果由编排器展示，失败不影响会话继续
            match command {
                SessionCommand::Create(rule) => {
                    let orchestrator = self.orchestrator.clone();
                    in_flight.spawn(async move {
                        let _ = orchestrator.create_rule(&rule).await;
                    });
                }
                SessionCommand::Combine(first) => {
                    let block = read_block(&mut lines, first).await?;
                    let orchestrator = self.orchestrator.clone();
                    in_flight.spawn(async move {
                        let _ = orchestrator.combine_rules(&block).await;
                    });
                }
                SessionCommand::Evaluate(data) => {
                    let data = if data.is_empty() {
                        read_block(&mut lines, data).await?
                    } else {
                        data
                    };
                    let orchestrator = self.orchestrator.clone();
                    in_flight.spawn(async move {
                        let _ = orchestrator.evaluate_rule(&data).await;
                    });
                }
                SessionCommand::Wait => drain(&mut in_flight).await,
                SessionCommand::State => self.presenter.show(&self.describe_state()),
                SessionCommand::Help => self.presenter.show(SESSION_HELP),
                SessionCommand::Quit => break,
                SessionCommand::Empty => {}
                SessionCommand::Unknown(command) => self
                    .presenter
                    .show(&format!("未知命令: {command}，输入 help 查看可用命令")),
            }
        }

        drain(&mut in_flight).await;
        info!("规则控制台会话已结束");
        Ok(())
    }

    fn describe_state(&self) -> String {
        let state = self.orchestrator.session().snapshot();
        let active = match state.phase() {
            SessionPhase::HasCombined => "合并规则 AST",
            SessionPhase::HasCreated => "规则 AST",
            SessionPhase::Idle => "无",
        };
        format!("会话状态: {}\n评估将使用: {}", state.phase(), active)
    }
}

/// 读取多行输入块，直到 `.end` 或输入结束
///
/// `first` 为与命令同一行的内容，非空时作为块的第一行。
async fn read_block<R>(lines: &mut Lines<R>, first: String) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut block = first;
    while let Some(next) = lines.next_line().await.context("读取输入失败")? {
        if next.trim() == BLOCK_TERMINATOR {
            break;
        }
        if !block.is_empty() {
            block.push('\n');
        }
        block.push_str(&next);
    }
    Ok(block)
}

/// 等待所有在途操作完成
async fn drain(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.join_next().await {
        log_join_error(joined);
    }
}

fn log_join_error(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "会话操作任务异常结束");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{OperationOutcome, RuleEngineGateway};
    use crate::models::{Ast, RuleRequest};
    use crate::presenter::MemoryPresenter;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::BufReader;

    /// 记录请求并按端点返回固定结果，create 可设置响应延迟
    #[derive(Default)]
    struct StubGateway {
        requests: Mutex<Vec<RuleRequest>>,
        create_delay: Option<Duration>,
    }

    #[async_trait]
    impl RuleEngineGateway for StubGateway {
        async fn send(&self, request: RuleRequest) -> OperationOutcome {
            self.requests.lock().push(request.clone());
            if let (RuleRequest::Create { .. }, Some(delay)) = (&request, self.create_delay) {
                tokio::time::sleep(delay).await;
            }
            match request {
                RuleRequest::Create { rule_string } => Ok(json!({ "created": rule_string })),
                RuleRequest::Combine { rule_strings } => Ok(json!({ "combined": rule_strings })),
                RuleRequest::Evaluate { .. } => Ok(json!({ "result": true })),
            }
        }
    }

    fn make_runner() -> (CommandRunner, Arc<StubGateway>, Arc<MemoryPresenter>) {
        runner_with(StubGateway::default())
    }

    fn runner_with(gateway: StubGateway) -> (CommandRunner, Arc<StubGateway>, Arc<MemoryPresenter>) {
        let gateway = Arc::new(gateway);
        let presenter = Arc::new(MemoryPresenter::new());
        let orchestrator = RuleOrchestrator::new(gateway.clone(), presenter.clone());
        (
            CommandRunner::new(orchestrator, presenter.clone()),
            gateway,
            presenter,
        )
    }

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(
            SessionCommand::parse("create   age > 30 "),
            SessionCommand::Create("age > 30".to_string())
        );
        assert_eq!(
            SessionCommand::parse("COMBINE"),
            SessionCommand::Combine(String::new())
        );
        assert_eq!(
            SessionCommand::parse("eval {\"age\": 1}"),
            SessionCommand::Evaluate("{\"age\": 1}".to_string())
        );
        assert_eq!(
            SessionCommand::parse("evaluate"),
            SessionCommand::Evaluate(String::new())
        );
        assert_eq!(SessionCommand::parse("wait"), SessionCommand::Wait);
        assert_eq!(SessionCommand::parse("state"), SessionCommand::State);
        assert_eq!(SessionCommand::parse("?"), SessionCommand::Help);
        assert_eq!(SessionCommand::parse("exit"), SessionCommand::Quit);
        assert_eq!(SessionCommand::parse("   "), SessionCommand::Empty);
        assert_eq!(
            SessionCommand::parse("delete all"),
            SessionCommand::Unknown("delete".to_string())
        );
    }

    #[tokio::test]
    async fn test_session_script() {
        let (runner, gateway, presenter) = make_runner();

        let script = "\
create age > 30
wait
combine income > 50000

  age > 30
.end
wait
evaluate {\"age\": 35, \"income\": 60000}
wait
state
";
        runner
            .run_session(BufReader::new(script.as_bytes()))
            .await
            .unwrap();

        let requests = gateway.requests.lock().clone();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[1],
            RuleRequest::Combine {
                rule_strings: vec!["income > 50000".to_string(), "age > 30".to_string()]
            }
        );
        assert!(matches!(
            &requests[2],
            RuleRequest::Evaluate { ast, .. }
                if *ast == Ast::new(json!({ "combined": ["income > 50000", "age > 30"] }))
        ));

        let history = presenter.history();
        assert!(history[2].starts_with("评估结果: "));
        assert_eq!(
            presenter.latest().unwrap(),
            "会话状态: 已合并规则\n评估将使用: 合并规则 AST"
        );
    }

    #[tokio::test]
    async fn test_session_continues_after_errors() {
        let (runner, gateway, presenter) = make_runner();

        let script =
            "evaluate {\"age\": 35}\nwait\nbogus\ncreate\nwait\ncreate age > 30\nquit\ncreate ignored\n";
        runner
            .run_session(BufReader::new(script.as_bytes()))
            .await
            .unwrap();

        let history = presenter.history();
        assert_eq!(history[0], "没有可用的 AST，请先创建或合并规则。");
        assert!(history[1].starts_with("未知命令: bogus"));
        assert_eq!(history[2], "请输入规则字符串。");
        assert!(history[3].starts_with("规则 AST:\n"));
        assert_eq!(history.len(), 4);

        // quit 之前发出的请求会等到完成，之后的命令不再执行
        assert_eq!(gateway.requests.lock().len(), 1);
        assert_eq!(runner.orchestrator.session().phase(), SessionPhase::HasCreated);
    }

    #[tokio::test]
    async fn test_combine_block_until_eof() {
        let (runner, gateway, _) = make_runner();

        runner
            .run_session(BufReader::new("combine a > 1\nb > 2".as_bytes()))
            .await
            .unwrap();

        assert_eq!(
            gateway.requests.lock().clone(),
            vec![RuleRequest::Combine {
                rule_strings: vec!["a > 1".to_string(), "b > 2".to_string()]
            }]
        );
    }

    #[tokio::test]
    async fn test_evaluate_block_until_terminator() {
        let (runner, gateway, presenter) = make_runner();

        let script = "create age > 30\nwait\nevaluate\n{\n  \"age\": 35\n}\n.end\nstate\n";
        runner
            .run_session(BufReader::new(script.as_bytes()))
            .await
            .unwrap();

        let requests = gateway.requests.lock().clone();
        assert_eq!(requests.len(), 2);
        assert!(matches!(
            &requests[1],
            RuleRequest::Evaluate { user_data, .. } if *user_data.as_value() == json!({ "age": 35 })
        ));
        assert!(presenter.history().iter().any(|m| m.starts_with("评估结果: ")));
    }

    #[tokio::test]
    async fn test_session_stays_responsive_while_request_in_flight() {
        let (runner, _, presenter) = runner_with(StubGateway {
            create_delay: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        let runner = Arc::new(runner);

        let session = tokio::spawn({
            let runner = runner.clone();
            async move {
                runner
                    .run_session(BufReader::new("create age > 30\nhelp\n".as_bytes()))
                    .await
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        let history = presenter.history();
        assert_eq!(history.len(), 1);
        assert!(history[0].starts_with("可用命令"));

        // 输入结束后会话等待在途的 create 完成
        session.await.unwrap().unwrap();
        let history = presenter.history();
        assert_eq!(history.len(), 2);
        assert!(history[1].starts_with("规则 AST:\n"));
        assert_eq!(runner.orchestrator.session().phase(), SessionPhase::HasCreated);
    }

    #[tokio::test]
    async fn test_run_evaluate_chooses_create_or_combine() {
        let (runner, gateway, _) = make_runner();
        assert!(runner.run_evaluate(&["age > 30".to_string()], "{}").await);
        assert!(matches!(
            gateway.requests.lock()[0],
            RuleRequest::Create { .. }
        ));

        let (runner, gateway, _) = make_runner();
        let rules = vec!["age > 30".to_string(), "income > 50000".to_string()];
        assert!(runner.run_evaluate(&rules, "{}").await);
        assert!(matches!(
            gateway.requests.lock()[0],
            RuleRequest::Combine { .. }
        ));

        let (runner, gateway, presenter) = make_runner();
        assert!(!runner.run_evaluate(&[], "{}").await);
        assert!(gateway.requests.lock().is_empty());
        assert_eq!(
            presenter.latest().unwrap(),
            "没有可用的 AST，请先创建或合并规则。"
        );
    }

    #[tokio::test]
    async fn test_run_combine_missing_file() {
        let (runner, _, _) = make_runner();
        let result = runner
            .run_combine(&[], Some(Path::new("/nonexistent/rules.txt")))
            .await;
        assert!(result.is_err());
    }
}
