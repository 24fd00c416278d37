use std::path::PathBuf;

use thiserror::Error;

pub type MathJaxResult<T> = Result<T, MathJaxError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathJaxError {
    #[error("Unsupported library version \"{found}\", expected \"{expected}\".")]
    VersionMismatch { expected: String, found: String },
    #[error("Metadata file {path} could not be read: {message}")]
    MissingMetadataFile { path: PathBuf, message: String },
    #[error("Dependency record for \"{name}\" is missing or unusable: {message}")]
    MissingDependencyRecord { name: String, message: String },
    #[error("Script engine creation failed: {0}")]
    EngineCreationFailed(String),
    #[error("Registering \"{name}\" raised: {message}")]
    RegistrationException { name: String, message: String },
    #[error("Bundle resource {locator} is missing or unreadable.")]
    MissingBundleResource { locator: String },
    #[error("Evaluating {label} raised: {message}")]
    EvaluationException { label: String, message: String },
    #[error("Module \"{0}\" is not defined.")]
    MissingModule(String),
    #[error("Class \"{0}\" is not defined.")]
    MissingClass(String),
    #[error("Function \"{0}\" is not defined.")]
    MissingFunction(String),
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
    #[error("Conversion returned no value.")]
    ConversionUnknownError,
    #[error("Conversion output has an invalid format: {0}")]
    ConversionInvalidFormat(String),
    #[error("Script raised: {0}")]
    ScriptException(String),
    #[error("Conversion returned no response.")]
    MissingResponse,
    #[error("The MathJax instance was dropped before the work ran.")]
    InstanceDeallocated,
}

impl MathJaxError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::VersionMismatch { .. } => "MJ_VERSION_MISMATCH",
            Self::MissingMetadataFile { .. } => "MJ_METADATA_FILE_MISSING",
            Self::MissingDependencyRecord { .. } => "MJ_DEPENDENCY_RECORD_MISSING",
            Self::EngineCreationFailed(_) => "MJ_ENGINE_CREATION_FAILED",
            Self::RegistrationException { .. } => "MJ_REGISTRATION_EXCEPTION",
            Self::MissingBundleResource { .. } => "MJ_BUNDLE_RESOURCE_MISSING",
            Self::EvaluationException { .. } => "MJ_EVALUATION_EXCEPTION",
            Self::MissingModule(_) => "MJ_MODULE_MISSING",
            Self::MissingClass(_) => "MJ_CLASS_MISSING",
            Self::MissingFunction(_) => "MJ_FUNCTION_MISSING",
            Self::ConversionFailed(_) => "MJ_CONVERSION_FAILED",
            Self::ConversionUnknownError => "MJ_CONVERSION_UNKNOWN",
            Self::ConversionInvalidFormat(_) => "MJ_CONVERSION_INVALID_FORMAT",
            Self::ScriptException(_) => "MJ_SCRIPT_EXCEPTION",
            Self::MissingResponse => "MJ_RESPONSE_MISSING",
            Self::InstanceDeallocated => "MJ_INSTANCE_DEALLOCATED",
        }
    }

    /// Construction-time failures; an instance is never returned after one of these.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatch { .. }
                | Self::MissingMetadataFile { .. }
                | Self::MissingDependencyRecord { .. }
                | Self::EngineCreationFailed(_)
                | Self::RegistrationException { .. }
        )
    }
}
