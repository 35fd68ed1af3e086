use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("sample store is empty")]
    EmptyStore,

    #[error("out-of-order append: timestamp {next} arrived after {prev}")]
    OutOfOrderAppend { prev: i64, next: i64 },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
