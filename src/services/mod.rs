pub mod proxy_pool;
pub mod proxy_source;
pub mod proxy_validator;

pub use proxy_pool::ProxyPool;
pub use proxy_source::{parse_candidate_list, ProxySourceFetcher};
pub use proxy_validator::{HttpProbeValidator, ProxyValidator};
