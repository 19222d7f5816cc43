pub mod entry;
pub mod history;
pub mod keymap;
pub mod number;
pub mod session;

pub use crate::domain::model::{EvalRequest, EvalResponse, OperatorKind};
pub use crate::domain::ports::{ConfigProvider, Evaluator, ResponsePolicy};
pub use crate::utils::error::Result;
