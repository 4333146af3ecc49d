use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::BrowserError;

/// 浏览器窗口大小
pub const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// 启动浏览器
///
/// 返回浏览器实例和后台事件循环的句柄。`config.proxy_url` 只在这里生效，
/// 作为整个浏览器的默认出口；每次访问仍会在自己的上下文里指定代理。
pub async fn launch_browser(config: &Config) -> Result<(Browser, JoinHandle<()>), BrowserError> {
    info!("🚀 启动浏览器 (无头模式: {})...", config.headless);

    let mut builder = BrowserConfig::builder().window_size(WINDOW_SIZE.0, WINDOW_SIZE.1);
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(path) = &config.chrome_executable {
        debug!("浏览器路径: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }

    let mut args = vec![
        "--no-sandbox".to_string(),            // 禁用沙盒，防止权限问题导致的崩溃
        "--disable-dev-shm-usage".to_string(), // 防止共享内存不足
        "--disable-gpu".to_string(),
    ];
    if let Some(proxy_url) = &config.proxy_url {
        info!("🌐 使用浏览器级代理: {}", proxy_url);
        args.push(format!("--proxy-server={}", proxy_url));
    }
    builder = builder.args(args);

    let browser_config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        BrowserError::LaunchFailed(e)
    })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        BrowserError::LaunchFailed(e.to_string())
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, handle))
}
