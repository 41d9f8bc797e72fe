use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script failed to compile: {0}")]
    Compile(String),
    #[error("UserLoginProvider is not defined by this tenant's scripts")]
    MissingLoginProvider,
    #[error("UserValidationProvider is not defined by this tenant's scripts")]
    MissingValidationProvider,
    #[error("script run exceeded the {0:?} budget")]
    Timeout(std::time::Duration),
    #[error("script runtime error: {0}")]
    Runtime(String),
    #[error("script returned a malformed provider result: {0}")]
    MalformedResult(String),
}
