use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("balance does not reach zero within {horizon_months} months")]
    NoPayoffWithinHorizon { horizon_months: u32 },

    #[error("projection does not converge: {0}")]
    NonConvergent(String),
}

impl ProjectionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ProjectionError::InvalidInput(msg.into())
    }
}
