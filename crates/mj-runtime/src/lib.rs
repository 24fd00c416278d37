mod bridge;
mod bundles;
mod dispatch;
mod engine;
mod validate;

pub use bundles::{BundleLocator, BundleRegistry, DirectoryBundleLocator, StaticBundleLocator};
pub use dispatch::FunctionDispatcher;
pub use engine::{EngineHandle, EngineLimits, HOST_VERSION_CONSTANT};
pub use validate::{call_batch, validate_batch, validate_one};
