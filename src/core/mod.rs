mod error;
mod freedom;
mod mortgage;
mod types;

pub use error::ProjectionError;
pub use freedom::{MAX_PROJECTION_YEARS, project_freedom, real_rate};
pub use mortgage::{MAX_TERM_MONTHS, SETTLED_BALANCE, level_payment, project_mortgage};
pub use types::{
    ExtraPaymentFrequency, FreedomInputs, FreedomResult, MortgageInputs, MortgageResult,
};
