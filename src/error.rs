//! Error types.
//!
//! - `AppError`: shell-level failure carrying a process exit code
//!   (2 = invalid input/config, 3 = no data, 4 = external service)
//! - `LoadError`: indicator fetch/reshape faults
//! - `GenerationError`: narrative generation faults

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

/// Why an indicator load produced no table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The provider call faulted or returned an undecodable body.
    Fetch(String),
    /// The raw data did not fit any recognized shape.
    Reshape(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch(msg) => write!(f, "Indicator fetch failed: {msg}"),
            LoadError::Reshape(msg) => write!(f, "Indicator data could not be reshaped: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::new(4, err.to_string())
    }
}

/// Why a narrative could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No API key configured; no call was attempted.
    MissingCredential,
    /// The provider call faulted (quota, bad prompt, network, empty reply).
    Generation(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::MissingCredential => write!(
                f,
                "Missing GEMINI_API_KEY (or GOOGLE_API_KEY) in environment (.env)."
            ),
            GenerationError::Generation(msg) => write!(f, "Narrative generation failed: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        let code = match err {
            GenerationError::MissingCredential => 2,
            GenerationError::Generation(_) => 4,
        };
        AppError::new(code, err.to_string())
    }
}
