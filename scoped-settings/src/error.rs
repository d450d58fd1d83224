use scoped_settings_core::ConfigError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Error returned by [`StoreBuilder::build`](crate::StoreBuilder::build)
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum BuildError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Tracing(#[from] TryInitError),
}
