use std::fmt::Display;

/// Error kinds the engine can surface, per the four categories in the error
/// handling design: configuration, data-shape, downstream and programmer
/// error. A caller-facing HTTP wrapper (out of scope for this crate) would
/// map these onto 400/401/500; the CLI entry point maps them onto exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Unauthorized,
    DataShape,
    Downstream,
    Internal,
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn data_shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataShape, message)
    }

    pub fn downstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Downstream, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// Logs the source error at `error!` and returns a generic, caller-safe
/// failure — the catch-all for unexpected programmer errors at the top of
/// the executor.
pub fn internal_error(err: impl Display) -> AppError {
    tracing::error!(error = %err, "internal error");
    AppError::internal("internal error")
}

pub fn map_db_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => {
            tracing::warn!(error = %err, "expected row not found");
            AppError::data_shape("expected row not found")
        }
        _ => {
            tracing::error!(error = %err, "database error");
            AppError::downstream(format!("database error: {err}"))
        }
    }
}
