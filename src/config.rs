use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认代理源列表（纯文本，每行一个 `host:port`）
pub const DEFAULT_PROXY_SOURCES: &[&str] = &[
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=all",
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt",
    "https://raw.githubusercontent.com/monosans/proxy-list/main/proxies/http.txt",
    "https://raw.githubusercontent.com/jetkai/proxy-list/main/online-proxies/txt/proxies-http.txt",
    "https://raw.githubusercontent.com/clarketm/proxy-list/master/proxy-list-raw.txt",
];

/// 未指定 `VISIT_CONFIG_FILE` 时尝试读取的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "visit.toml";

/// 程序配置
///
/// 加载顺序：默认值 → TOML 配置文件 → 环境变量（后者覆盖前者）
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 目标 URL
    pub target_url: String,
    /// 请求的访问次数
    pub total_sessions: u64,
    /// 并发上限（实际并发数还受可用代理数量限制）
    pub max_concurrency: usize,
    /// 代理源列表
    pub proxy_sources: Vec<String>,
    /// 代理验证使用的探测地址
    pub validation_target: String,
    /// 单个代理验证超时（毫秒）
    pub validation_timeout_ms: u64,
    /// 单个代理源拉取超时（毫秒）
    pub source_fetch_timeout_ms: u64,
    /// 页面导航超时（毫秒）
    pub navigation_timeout_ms: u64,
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 浏览器级代理覆盖，只在启动浏览器时使用
    pub proxy_url: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: String::new(),
            total_sessions: 0,
            max_concurrency: 30,
            proxy_sources: DEFAULT_PROXY_SOURCES.iter().map(|s| s.to_string()).collect(),
            validation_target: "http://httpbin.org/ip".to_string(),
            validation_timeout_ms: 8_000,
            source_fetch_timeout_ms: 10_000,
            navigation_timeout_ms: 40_000,
            headless: true,
            chrome_executable: None,
            proxy_url: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按默认值、配置文件、环境变量的顺序加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("VISIT_CONFIG_FILE") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// 从 TOML 文件加载，缺失的字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::file_parse_failed(&display, e))?;
        toml::from_str(&content).map_err(|e| ConfigError::file_parse_failed(&display, e))
    }

    /// 用 `lookup` 提供的键值覆盖当前配置
    ///
    /// 存在但无法解析的值会返回错误，而不是悄悄回退到默认值。
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TARGET_URL") {
            self.target_url = v.trim().to_string();
        }
        if let Some(v) = parse_var(&lookup, "TOTAL_SESSIONS", "正整数")? {
            self.total_sessions = v;
        }
        if let Some(v) = parse_var(&lookup, "MAX_CONCURRENCY", "正整数")? {
            self.max_concurrency = v;
        }
        if let Some(v) = lookup("PROXY_SOURCES") {
            self.proxy_sources = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("VALIDATION_TARGET") {
            self.validation_target = v;
        }
        if let Some(v) = parse_var(&lookup, "VALIDATION_TIMEOUT_MS", "毫秒数")? {
            self.validation_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "SOURCE_FETCH_TIMEOUT_MS", "毫秒数")? {
            self.source_fetch_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "NAVIGATION_TIMEOUT_MS", "毫秒数")? {
            self.navigation_timeout_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "HEADLESS", "布尔值")? {
            self.headless = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = lookup("PROXY_URL").filter(|v| !v.trim().is_empty()) {
            self.proxy_url = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "VERBOSE_LOGGING", "布尔值")? {
            self.verbose_logging = v;
        }
        Ok(())
    }

    /// 校验并生成本次运行的访问配置
    pub fn visit_config(&self) -> Result<VisitConfig, ConfigError> {
        VisitConfig::new(self.target_url.clone(), self.total_sessions)
    }

    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    pub fn source_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.source_fetch_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, expected: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse_failed(key, raw, expected)),
    }
}

/// 经过校验的运行输入
///
/// 构造成功即保证：URL 非空且以 `http` 开头，访问次数在 `1..=u32::MAX` 之间。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitConfig {
    target_url: String,
    total_sessions: u64,
}

impl VisitConfig {
    /// 访问次数上限（结果计数器把两个计数打包进一个 64 位原子量）
    pub const MAX_SESSIONS: u64 = u32::MAX as u64;

    pub fn new(target_url: impl Into<String>, total_sessions: u64) -> Result<Self, ConfigError> {
        let target_url = target_url.into();
        if target_url.is_empty() || !target_url.starts_with("http") {
            return Err(ConfigError::InvalidTargetUrl { url: target_url });
        }
        if total_sessions == 0 || total_sessions > Self::MAX_SESSIONS {
            return Err(ConfigError::InvalidSessionCount {
                count: total_sessions,
                max: Self::MAX_SESSIONS,
            });
        }
        Ok(Self {
            target_url,
            total_sessions,
        })
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn total_sessions(&self) -> u64 {
        self.total_sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_visit_config_rejects_bad_url() {
        assert!(matches!(
            VisitConfig::new("", 5),
            Err(ConfigError::InvalidTargetUrl { .. })
        ));
        assert!(matches!(
            VisitConfig::new("ftp://example.com", 5),
            Err(ConfigError::InvalidTargetUrl { .. })
        ));
    }

    #[test]
    fn test_visit_config_rejects_zero_sessions() {
        assert!(matches!(
            VisitConfig::new("https://example.com", 0),
            Err(ConfigError::InvalidSessionCount { count: 0, .. })
        ));
        assert!(VisitConfig::new("https://example.com", VisitConfig::MAX_SESSIONS + 1).is_err());
    }

    #[test]
    fn test_visit_config_accepts_valid_input() {
        let config = VisitConfig::new("http://example.com", 50).unwrap();
        assert_eq!(config.target_url(), "http://example.com");
        assert_eq!(config.total_sessions(), 50);
    }

    #[test]
    fn test_overrides_apply_on_top_of_defaults() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup_from(&[
                ("TARGET_URL", " https://example.com "),
                ("TOTAL_SESSIONS", "12"),
                ("MAX_CONCURRENCY", "4"),
                ("PROXY_SOURCES", "http://a/list, ,http://b/list"),
                ("HEADLESS", "false"),
            ]))
            .unwrap();

        assert_eq!(config.target_url, "https://example.com");
        assert_eq!(config.total_sessions, 12);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.proxy_sources, vec!["http://a/list", "http://b/list"]);
        assert!(!config.headless);
        assert_eq!(config.validation_timeout(), Duration::from_millis(8_000));
    }

    #[test]
    fn test_unparsable_override_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(lookup_from(&[("TOTAL_SESSIONS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "TOTAL_SESSIONS"));
    }

    #[test]
    fn test_from_file_keeps_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "target_url = \"https://example.com\"\ntotal_sessions = 7\nproxy_sources = [\"http://only/list\"]"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.total_sessions, 7);
        assert_eq!(config.proxy_sources, vec!["http://only/list"]);
        assert_eq!(config.max_concurrency, 30);
        assert_eq!(config.visit_config().unwrap().total_sessions(), 7);
    }
}
