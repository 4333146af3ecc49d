pub mod proxy;
pub mod report;

pub use proxy::{InvalidCandidate, ProxyCandidate};
pub use report::{percentage, ProgressSnapshot, Rate, SummaryReport};
