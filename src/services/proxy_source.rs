//! 代理源拉取 - 业务能力层
//!
//! 只负责"从若干代理源拿到候选地址"，不做去重和验证

use std::time::Duration;

use futures::future::join_all;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::models::ProxyCandidate;

/// 代理源拉取器
///
/// 所有代理源并发请求，单个代理源失败或超时只贡献 0 个候选，不影响其他代理源。
pub struct ProxySourceFetcher {
    client: reqwest::Client,
}

impl ProxySourceFetcher {
    /// 创建拉取器，`timeout` 作用于每一个代理源请求
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// 并发拉取所有代理源，等待全部结束后合并结果
    ///
    /// 返回的列表可能包含重复地址。
    pub async fn fetch_all(&self, sources: &[String]) -> Vec<ProxyCandidate> {
        let results = join_all(sources.iter().map(|url| self.fetch_one(url))).await;

        let mut candidates = Vec::new();
        for (url, result) in sources.iter().zip(results) {
            match result {
                Ok(found) => {
                    debug!("代理源 {} 返回 {} 个候选", url, found.len());
                    candidates.extend(found);
                }
                Err(e) => info!("⚠️ 跳过代理源: {}", e),
            }
        }
        candidates
    }

    /// 拉取单个代理源
    pub async fn fetch_one(&self, url: &str) -> Result<Vec<ProxyCandidate>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::RequestFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::BadStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| SourceError::RequestFailed {
                url: url.to_string(),
                source,
            })?;

        Ok(parse_candidate_list(&body))
    }
}

/// 解析代理源返回的内容
///
/// 支持两种格式：
/// - 纯文本，每行一个 `host:port`（`\n` 或 `\r\n` 分隔）
/// - JSON 数组，元素为 `"host:port"` 字符串或 `{ "ip"/"host": ..., "port": ... }` 对象
///
/// 无法识别的行会被忽略。
pub fn parse_candidate_list(body: &str) -> Vec<ProxyCandidate> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('[') {
        if let Ok(JsonValue::Array(items)) = serde_json::from_str::<JsonValue>(trimmed) {
            return items.iter().filter_map(candidate_from_json).collect();
        }
    }

    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.parse().ok())
        .collect()
}

fn candidate_from_json(item: &JsonValue) -> Option<ProxyCandidate> {
    match item {
        JsonValue::String(s) => s.parse().ok(),
        JsonValue::Object(map) => {
            let host = map
                .get("ip")
                .or_else(|| map.get("host"))
                .and_then(|v| v.as_str())?;
            let port = match map.get("port")? {
                JsonValue::Number(n) => n.as_u64()?,
                JsonValue::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            format!("{}:{}", host, port).parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[ProxyCandidate]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_parse_plain_text_with_crlf() {
        let body = "1.1.1.1:80\r\n\r\n  2.2.2.2:8080  \nnot-a-proxy\n3.3.3.3:3128";
        assert_eq!(
            addrs(&parse_candidate_list(body)),
            vec!["1.1.1.1:80", "2.2.2.2:8080", "3.3.3.3:3128"]
        );
    }

    #[test]
    fn test_parse_json_list() {
        let body = r#"["1.1.1.1:80", {"ip": "2.2.2.2", "port": 8080}, {"host": "proxy.local", "port": "3128"}, 42]"#;
        assert_eq!(
            addrs(&parse_candidate_list(body)),
            vec!["1.1.1.1:80", "2.2.2.2:8080", "proxy.local:3128"]
        );
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(parse_candidate_list("").is_empty());
        assert!(parse_candidate_list("\n\r\n").is_empty());
    }
}
