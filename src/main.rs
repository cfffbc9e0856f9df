use crate::config::Config;
use crate::startup::Application;
use crate::utils::logger::init_logger;
use anyhow::Context;

mod api;
mod config;
mod database;
mod errors;
mod infrastructure;
mod models;
mod repositories;
mod services;
mod startup;
#[cfg(test)]
mod test_support;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在时忽略
    dotenvy::dotenv().ok();

    // 初始化日志（全局只需调用一次）
    init_logger();
    log_info!("Starting application initialization...");

    // 1. 加载配置
    let config = Config::load().context("Failed to load application configuration")?;

    // 2. 构建应用实例 (连接池、RPC、签名账户)
    let application = Application::build(config)
        .await
        .context("Application building failed (DB/RPC/signer initialization)")?;

    log_info!("Application build complete. Starting services.");

    // 3. 运行 HTTP 服务和索引器，直到 Ctrl+C
    application
        .run()
        .await
        .context("Application core service failed during runtime")?;

    Ok(())
}
