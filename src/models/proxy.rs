//! 代理候选地址

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

/// 代理候选（`host:port`）
///
/// 只代表一个地址，本身不保证可用，必须先通过验证才能进入代理池。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyCandidate {
    host: String,
    port: u16,
}

/// 无法解析的候选地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCandidate(pub String);

impl fmt::Display for InvalidCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "无效的代理地址: '{}'", self.0)
    }
}

impl std::error::Error for InvalidCandidate {}

fn candidate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9.\-]*[A-Za-z0-9])?):(\d{1,5})$")
            .expect("代理地址正则无效")
    })
}

impl ProxyCandidate {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// 供 HTTP 客户端和浏览器使用的代理 URL
    pub fn proxy_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl FromStr for ProxyCandidate {
    type Err = InvalidCandidate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = candidate_pattern()
            .captures(trimmed)
            .ok_or_else(|| InvalidCandidate(trimmed.to_string()))?;

        let port: u16 = caps[2]
            .parse()
            .map_err(|_| InvalidCandidate(trimmed.to_string()))?;
        if port == 0 {
            return Err(InvalidCandidate(trimmed.to_string()));
        }

        Ok(Self::new(&caps[1], port))
    }
}

impl fmt::Display for ProxyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        let candidate: ProxyCandidate = " 10.0.0.1:8080 ".parse().unwrap();
        assert_eq!(candidate.host(), "10.0.0.1");
        assert_eq!(candidate.port(), 8080);
        assert_eq!(candidate.to_string(), "10.0.0.1:8080");
        assert_eq!(candidate.proxy_url(), "http://10.0.0.1:8080");
    }

    #[test]
    fn test_parse_hostname() {
        let candidate: ProxyCandidate = "proxy.example.com:3128".parse().unwrap();
        assert_eq!(candidate.host(), "proxy.example.com");
    }

    #[test]
    fn test_reject_malformed() {
        for raw in ["", "1.2.3.4", "1.2.3.4:", ":80", "1.2.3.4:0", "1.2.3.4:70000", "a b:80"] {
            assert!(raw.parse::<ProxyCandidate>().is_err(), "应拒绝 {:?}", raw);
        }
    }
}
