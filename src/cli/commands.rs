//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{Config, ConfigLoader, TomlConfigLoader, DEFAULT_CONFIG_TEMPLATE};
use crate::error::Result;
use crate::health::{
    Dispatcher, HttpProbe, LineReporter, LogReporter, PipelineSettings, Probe,
};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tracing::{error, info};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 根据子命令选择处理器
pub fn command_for(args: &Args) -> Box<dyn Command> {
    match args.command {
        Commands::Run { .. } => Box::new(RunCommand),
        Commands::Check { .. } => Box::new(CheckCommand),
        Commands::Init { .. } => Box::new(InitCommand),
        Commands::Validate { .. } => Box::new(ValidateCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    }
}

/// 加载配置文件
async fn load_config(path: &Path) -> Result<Config> {
    TomlConfigLoader::new(true).load_from_file(path).await
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 初始化命令
pub struct InitCommand;

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Init { config_path, force } = &args.command {
            self.create_config_file(config_path, *force).await
        } else {
            Ok(())
        }
    }
}

impl InitCommand {
    /// 创建配置文件
    ///
    /// # 返回
    /// * `Result<()>` - 文件已存在且未指定 `force` 时不做任何修改
    pub async fn create_config_file(&self, config_path: &Path, force: bool) -> Result<()> {
        if config_path.exists() && !force {
            eprintln!("配置文件已存在: {}", config_path.display());
            eprintln!("使用 --force 参数覆盖现有文件");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        tokio::fs::write(config_path, DEFAULT_CONFIG_TEMPLATE).await?;

        println!("配置文件已创建: {}", config_path.display());
        println!("请编辑配置文件以添加需要轮询的资源");

        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate { config_path } = &args.command {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, args.is_verbose())
                .await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let config = load_config(config_path).await?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            println!("  轮询间隔: {}秒", config.global.poll_interval_seconds);
            println!("  错误退避: {}秒", config.global.error_backoff_seconds);
            println!("  报告间隔: {}秒", config.global.status_interval_seconds);
            println!("  工作者数: {}", config.global.pollers);
            println!("  请求超时: {}秒", config.global.request_timeout_seconds);
            println!("  日志级别: {}", config.global.log_level);

            println!("资源:");
            for (i, resource) in config.resources.iter().enumerate() {
                println!("  {}. {}", i + 1, resource.url);
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个资源", config.resources.len());
        }

        Ok(())
    }
}

/// 单次探测结果
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    /// 资源URL
    pub url: String,
    /// 是否成功
    pub ok: bool,
    /// 状态文本或失败描述
    pub status: String,
    /// 耗时（毫秒）
    pub elapsed_ms: u64,
}

/// 检测命令
pub struct CheckCommand;

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Check { format, timeout } = &args.command {
            let config = load_config(&args.get_config_path()).await?;
            let timeout = timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.global.request_timeout());
            let probe = HttpProbe::new(timeout)?;

            println!("开始探测 {} 个资源...", config.resources.len());
            let outcomes = Self::check_all(&probe, &config.urls()).await;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcomes)?);
                }
                OutputFormat::Text => Self::print_text_results(&outcomes),
            }
        }
        Ok(())
    }
}

impl CheckCommand {
    /// 并发探测所有URL，结果顺序与输入一致
    pub async fn check_all(probe: &dyn Probe, urls: &[String]) -> Vec<CheckOutcome> {
        let futures = urls.iter().map(|url| async move {
            let start = Instant::now();
            let result = probe.probe(url).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match result {
                Ok(status) => CheckOutcome {
                    url: url.clone(),
                    ok: true,
                    status,
                    elapsed_ms,
                },
                Err(failure) => CheckOutcome {
                    url: url.clone(),
                    ok: false,
                    status: failure.to_string(),
                    elapsed_ms,
                },
            }
        });
        futures::future::join_all(futures).await
    }

    /// 打印文本格式结果
    fn print_text_results(outcomes: &[CheckOutcome]) {
        for outcome in outcomes {
            let status_icon = if outcome.ok { "✓" } else { "✗" };
            println!(
                "{} {} - {} - {}ms",
                status_icon, outcome.url, outcome.status, outcome.elapsed_ms
            );
        }
    }
}

/// 运行命令
pub struct RunCommand;

#[async_trait]
impl Command for RunCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Run {
            pollers,
            interval,
            stdout,
        } = &args.command
        {
            let mut config = load_config(&args.get_config_path()).await?;

            // 应用命令行参数覆盖
            if let Some(pollers) = pollers {
                config.global.pollers = *pollers;
            }
            if let Some(interval) = interval {
                config.global.poll_interval_seconds = *interval;
            }
            crate::config::validate_config(&config)
                .map_err(crate::error::ConfigError::ValidationError)?;

            let settings = PipelineSettings::from_config(&config);
            let probe: Arc<dyn Probe> = Arc::new(HttpProbe::new(config.global.request_timeout())?);
            let urls = config.urls();

            if *stdout {
                Dispatcher::new(settings, urls, probe, LineReporter::stdout())?
                    .run_until(shutdown_signal())
                    .await;
            } else {
                Dispatcher::new(settings, urls, probe, LogReporter)?
                    .run_until(shutdown_signal())
                    .await;
            }
        }
        Ok(())
    }
}

/// 等待Ctrl+C
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("收到中断信号，正在停止..."),
        Err(err) => {
            error!("监听中断信号失败: {}", err);
            // 无法监听信号时保持运行，由进程终止结束
            std::future::pending::<()>().await;
        }
    }
}
