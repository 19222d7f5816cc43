use crate::domain::model::EvalRequest;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remote arithmetic engine. Implementations return the numeric result or a
/// `CalcError` describing why there is none.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvalRequest) -> Result<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponsePolicy {
    /// Every response is committed whenever it arrives.
    #[default]
    ApplyAll,
    /// Responses overtaken by a newer request or a clear are dropped.
    DiscardStale,
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint(&self) -> &str;
    fn timeout(&self) -> Option<Duration>;
    fn history_capacity(&self) -> usize;
    fn response_policy(&self) -> ResponsePolicy;
}
