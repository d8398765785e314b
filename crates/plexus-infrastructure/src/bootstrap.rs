//! Backend bootstrap
//!
//! Builds a [`Backend`] from layered configuration in one call: load and
//! validate [`AppConfig`], install the tracing subscriber, then hand the
//! factories and backend options to `create_specialized_backend`.
//!
//! ```ignore
//! let backend = BackendBootstrap::new()
//!     .with_service(db_factory)
//!     .build()?;
//! backend.add(catalog_module)?;
//! backend.start().await?;
//! ```

use crate::config::{AppConfig, ConfigLoader};
use crate::logging::init_logging;
use plexus_domain::error::Result;
use plexus_domain::ports::FactorySource;
use plexus_runtime::{Backend, CreateBackendOptions, create_specialized_backend};
use tracing::{info, warn};

/// One-call backend construction from configuration
#[derive(Debug, Default)]
pub struct BackendBootstrap {
    loader: ConfigLoader,
    config: Option<AppConfig>,
    services: Vec<FactorySource>,
    skip_logging: bool,
}

impl BackendBootstrap {
    /// Bootstrap with the default configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom configuration loader
    pub fn with_config_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Use an already-loaded configuration instead of the loader
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a service factory
    pub fn with_service(mut self, source: impl Into<FactorySource>) -> Self {
        self.services.push(source.into());
        self
    }

    /// Register several service factories
    pub fn with_services<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FactorySource>,
    {
        self.services.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Leave the global tracing subscriber untouched
    pub fn without_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    /// Load configuration, initialize logging and create the backend
    pub fn build(self) -> Result<Backend> {
        let config = match self.config {
            Some(config) => {
                crate::config::loader::validate_app_config(&config)?;
                config
            }
            None => self.loader.load()?,
        };

        if !self.skip_logging {
            if let Err(error) = init_logging(&config.logging) {
                warn!(error = %error, "Keeping the existing tracing subscriber");
            }
        }

        let services = self.services.len();
        let backend = create_specialized_backend(
            CreateBackendOptions::new(self.services).with_options(config.backend),
        )?;
        info!(
            services,
            strategy = %backend.options().init_strategy,
            "Backend bootstrapped"
        );
        Ok(backend)
    }
}
