use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("invalid weekday '{0}': use 0-6 (0 = Sunday) or a day name")]
    InvalidWeekday(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("no Azure DevOps organization configured; add [azure] to ~/.workstate/config.toml")]
    MissingOrganization,

    #[error("no Azure DevOps token; set azure.token or AZURE_DEVOPS_TOKEN")]
    MissingToken,

    #[error("{failed} of {total} snapshot dates failed")]
    PartialReport { failed: usize, total: usize },
}
