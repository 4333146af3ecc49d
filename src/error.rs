use thiserror::Error;

/// 应用程序错误类型
///
/// 只有 `Config` 与 `Pool` 会中断运行；单次访问失败不会出现在这里，
/// 它们在执行器边界就被折叠成 [`crate::workflow::VisitOutcome::Failed`]。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 代理池错误
    #[error("代理池错误: {0}")]
    Pool(#[from] PoolError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端错误: {0}")]
    Http(#[from] reqwest::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 目标 URL 为空或不是 http(s) 开头
    #[error("无效的目标 URL '{url}'，请以 http:// 或 https:// 开头")]
    InvalidTargetUrl { url: String },
    /// 访问次数不是正整数
    #[error("无效的访问次数 {count}，必须在 1 到 {max} 之间")]
    InvalidSessionCount { count: u64, max: u64 },
    /// 并发上限为 0
    #[error("并发上限必须大于 0")]
    InvalidConcurrency,
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取或解析失败
    #[error("配置文件 {path} 解析失败: {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 代理池错误
#[derive(Debug, Error)]
pub enum PoolError {
    /// 所有候选代理都未通过验证
    #[error("没有可用的代理: {candidates} 个候选代理全部验证失败")]
    Exhausted { candidates: usize },
}

/// 单个代理源的拉取失败，只记录日志，不会中断初始化
#[derive(Debug, Error)]
pub enum SourceError {
    /// 请求失败（网络错误或超时）
    #[error("请求代理源失败 ({url}): {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 代理源返回非 2xx 状态码
    #[error("代理源返回错误状态 ({url}): {status}")]
    BadStatus {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 创建浏览器上下文或页面失败
    #[error("创建浏览器上下文失败 (代理: {proxy}): {reason}")]
    ContextCreationFailed { proxy: String, reason: String },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 操作超时
    #[error("{operation} 超时 ({timeout_ms} ms)")]
    Timeout { operation: String, timeout_ms: u64 },
    /// 页面内的 CDP 命令失败（设置 UA、执行脚本等）
    #[error("浏览器命令失败: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

// ========== 便捷构造函数 ==========

impl ConfigError {
    /// 创建环境变量解析错误
    pub fn env_parse_failed(
        var_name: impl Into<String>,
        value: impl Into<String>,
        expected_type: impl Into<String>,
    ) -> Self {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.into(),
            value: value.into(),
            expected_type: expected_type.into(),
        }
    }

    /// 创建配置文件解析错误
    pub fn file_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConfigError::FileParseFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl BrowserError {
    /// 创建浏览器上下文错误
    pub fn context_failed(proxy: impl Into<String>, reason: impl ToString) -> Self {
        BrowserError::ContextCreationFailed {
            proxy: proxy.into(),
            reason: reason.to_string(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_converts_into_app_error() {
        let err: AppError = PoolError::Exhausted { candidates: 3 }.into();
        assert!(matches!(err, AppError::Pool(PoolError::Exhausted { candidates: 3 })));
        assert!(err.to_string().contains("3 个候选代理"));
    }

    #[test]
    fn test_config_error_message_names_variable() {
        let err = ConfigError::env_parse_failed("TOTAL_SESSIONS", "abc", "u64");
        let msg = err.to_string();
        assert!(msg.contains("TOTAL_SESSIONS"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_cdp_error_is_not_reported_as_launch_failure() {
        let err: BrowserError = chromiumoxide::error::CdpError::Timeout.into();
        assert!(matches!(err, BrowserError::Cdp(_)));
        assert!(err.to_string().starts_with("浏览器命令失败"));
    }
}
