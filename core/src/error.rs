use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("A strategy must be selected")]
    StrategyRequired,

    #[error("Strategy '{strategy_id}' not found")]
    StrategyNotFound { strategy_id: String },

    #[error("At least 2 active accounts are required to generate tasks, found {found}")]
    NotEnoughAccounts { found: usize },

    #[error("Invalid strategy: {reason}")]
    InvalidStrategy { reason: String },

    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Account '{account_id}' not found")]
    AccountNotFound { account_id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl PlanError {
    /// True for failures caused by the request itself. Retrying the
    /// same request will fail the same way.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::StrategyRequired
                | Self::StrategyNotFound { .. }
                | Self::NotEnoughAccounts { .. }
                | Self::InvalidStrategy { .. }
                | Self::TaskNotFound { .. }
                | Self::AccountNotFound { .. }
        )
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
