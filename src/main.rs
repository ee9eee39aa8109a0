//! URL Poller 主程序入口

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use url_poller::cli::{command_for, Args};
use url_poller::config::{ConfigLoader, TomlConfigLoader};
use url_poller::logging::{parse_level, LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_config = LogConfig {
        level: resolve_log_level(&args).await,
        file_path: args.log_file.clone(),
        console: args.log_file.is_none(),
        json_format: args.json_logs,
    };

    let logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("URL Poller v{} 启动", url_poller::VERSION);
    if let Some(path) = &logging_system.config().file_path {
        eprintln!("日志写入文件: {}", path.display());
    }

    if let Err(e) = command_for(&args).execute(&args).await {
        error!("命令执行失败: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 命令行优先，其次是配置文件中的日志级别
async fn resolve_log_level(args: &Args) -> LevelFilter {
    if let Some(level) = args.log_level {
        return level.into();
    }

    TomlConfigLoader::new(true)
        .load_from_file(args.get_config_path())
        .await
        .ok()
        .and_then(|config| parse_level(&config.global.log_level))
        .unwrap_or(LevelFilter::Info)
}
