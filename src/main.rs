use std::process::ExitCode;

use proxy_visit::{logger, App, Config};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::init(false);
            error!("❌ 配置错误: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 初始化日志
    logger::init(config.verbose_logging);

    // 初始化并运行应用
    let app = match App::initialize(config) {
        Ok(app) => app,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    // 单次访问失败不影响退出码
    match app.run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ 致命错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
