pub mod visit_ctx;
pub mod visit_executor;

pub use visit_ctx::VisitCtx;
pub use visit_executor::{BrowserVisitExecutor, VisitExecutor, VisitOutcome};
