//! 资格规则控制台
//!
//! 连接规则引擎服务，在一次会话内创建、合并并评估规则。

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rule_console::cli::{Cli, CommandRunner, Commands};
use rule_console::{ConsolePresenter, HttpRuleEngineGateway, RuleOrchestrator};
use rule_shared::config::AppConfig;
use rule_shared::observability::{self, metrics};
use tokio::io::BufReader;
use tracing::info;

const SERVICE_NAME: &str = "rule-console";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("加载配置失败，使用默认配置: {}", e);
        AppConfig::default()
    });
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.rule_engine.base_url = base_url.clone();
    }

    observability::init(&config.observability)?;
    metrics::describe_metrics();

    info!(
        environment = %config.environment,
        rule_engine = config.rule_engine.base_url(),
        "Starting rule-console..."
    );

    let gateway =
        HttpRuleEngineGateway::new(&config.rule_engine).context("创建规则引擎客户端失败")?;
    let presenter = Arc::new(ConsolePresenter);
    let orchestrator = RuleOrchestrator::new(Arc::new(gateway), presenter.clone());
    let runner = CommandRunner::new(orchestrator, presenter);

    let succeeded = match cli.command.unwrap_or(Commands::Session) {
        Commands::Session => {
            let stdin = BufReader::new(tokio::io::stdin());
            runner.run_session(stdin).await?;
            true
        }
        Commands::Create { rule } => runner.run_create(&rule).await,
        Commands::Combine { rules, file } => runner.run_combine(&rules, file.as_deref()).await?,
        Commands::Evaluate { rules, data } => runner.run_evaluate(&rules, &data).await,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
