use std::sync::Arc;

use crate::{
    config::Config,
    core::{
        dispatch::{DispatchLoop, IntervalPacer, Pacer},
        host::RunspaceHost,
        logging::Logging,
        state::StateCell,
    },
    error::RuntimeError,
    providers::{Provider, ProviderRegistry},
    queues::MessageQueues,
    settings::Settings,
};

/// Builder for constructing a [`Logging`] runtime with optional parts.
pub struct LoggingBuilder {
    cfg: Config,
    providers: Vec<(Arc<dyn Provider>, bool)>,
    settings: Option<Arc<Settings>>,
    pacer: Option<Arc<dyn Pacer>>,
}

impl LoggingBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            providers: Vec::new(),
            settings: None,
            pacer: None,
        }
    }

    /// Registers providers and enables them.
    pub fn with_providers(mut self, providers: Vec<Arc<dyn Provider>>) -> Self {
        self.providers.extend(providers.into_iter().map(|p| (p, true)));
        self
    }

    /// Registers one provider; `enabled = false` leaves it for a later `enable_provider`.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>, enabled: bool) -> Self {
        self.providers.push((provider, enabled));
        self
    }

    /// Uses an existing settings store (shared with the rest of the host).
    ///
    /// Values from `Config::settings` are written into it on build.
    pub fn with_settings(mut self, settings: Arc<Settings>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Replaces the pause between cycles (default: [`IntervalPacer`] from `Config::interval`).
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    /// Builds the runtime. Nothing runs until [`Logging::start`].
    ///
    /// Fails with [`RuntimeError::DuplicateProvider`] if two providers share a name.
    pub fn build(self) -> Result<Arc<Logging>, RuntimeError> {
        let settings = match self.settings {
            Some(s) => {
                for (k, v) in &self.cfg.settings {
                    s.set(k, v.clone());
                }
                s
            }
            None => Arc::new(Settings::from_map(self.cfg.settings.clone())),
        };

        let registry = Arc::new(ProviderRegistry::new(self.cfg.fault_capacity_clamped()));
        for (provider, enabled) in self.providers {
            let name = provider.name().to_string();
            registry.register(provider)?;
            if enabled {
                registry.enable(&name)?;
            }
        }

        let pacer = self
            .pacer
            .unwrap_or_else(|| Arc::new(IntervalPacer::new(self.cfg.interval())));
        let queues = Arc::new(MessageQueues::new());
        let state = StateCell::new();

        let dispatcher = Arc::new(DispatchLoop::new(
            Arc::clone(&registry),
            Arc::clone(&queues),
            Arc::clone(&settings),
            state.clone(),
            pacer,
        ));

        Ok(Arc::new(Logging::new_internal(
            self.cfg,
            registry,
            queues,
            settings,
            state,
            dispatcher,
            Arc::new(RunspaceHost::new()),
        )))
    }
}
