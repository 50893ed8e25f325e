//! Crate-wide error type.
//!
//! Every stage reports fatal conditions through `AppError` so the pipeline stays
//! embeddable; only `main` turns the error into a process exit code.

/// Unreadable input file or missing required column.
pub const EXIT_INPUT: u8 = 2;
/// Nothing left to fit after alignment and joining.
pub const EXIT_NO_DATA: u8 = 3;
/// Search-interest provider failure (network, status, payload).
pub const EXIT_PROVIDER: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_NO_DATA, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(EXIT_PROVIDER, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_carry_exit_codes() {
        assert_eq!(AppError::input("x").exit_code(), EXIT_INPUT);
        assert_eq!(AppError::no_data("x").exit_code(), EXIT_NO_DATA);
        assert_eq!(AppError::provider("x").exit_code(), EXIT_PROVIDER);
        assert_eq!(AppError::provider("boom").to_string(), "boom");
    }
}
