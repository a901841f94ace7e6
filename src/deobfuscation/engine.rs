//! Module driver.
//!
//! The [`Deobfuscator`] is the main entry point. It runs the two independent paths on a
//! module, resource recovery and symbol renaming, and collects what they produce into a
//! [`DeobfuscationResult`].

use std::{fmt, sync::Arc};

use rayon::prelude::*;

use crate::{
    deobfuscation::{
        cleanup::CleanupRequest,
        config::DeobfuscatorConfig,
        events::{EventKind, EventLog},
        renamer::{engine::RenameMap, rename_module},
        resources::{decryptor::DecryptorProvider, pipeline::DecryptedPayload, ResourceResolver},
    },
    metadata::module::Module,
    Error, Result,
};

/// What a deobfuscation run produced for one module.
#[derive(Debug)]
pub struct DeobfuscationResult {
    /// The recovered resource blob, if the module carried one
    pub payload: Option<DecryptedPayload>,
    /// Protector artifacts to remove
    pub cleanup: CleanupRequest,
    /// Final names of renamed declarations
    pub renames: RenameMap,
    /// Everything that happened, including skipped features
    pub events: EventLog,
}

impl DeobfuscationResult {
    /// Returns a one-line summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let payload = match &self.payload {
            Some(payload) => format!(
                "payload '{}' ({} bytes)",
                payload.resource_name,
                payload.data.len(),
            ),
            None => "no payload".to_string(),
        };

        format!(
            "{payload}, {} renamed, {} restored, {} to remove; {}",
            self.renames.len(),
            self.renames.restored().len(),
            self.cleanup.deletion_count(),
            self.events.summary()
        )
    }
}

impl fmt::Display for DeobfuscationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Runs resource recovery and renaming on modules.
///
/// Without a [`DecryptorProvider`] the resource path is skipped, since key derivation
/// cannot be done by structure alone.
///
/// # Example
///
/// ```rust
/// use reactorscope::deobfuscation::{config::DeobfuscatorConfig, engine::Deobfuscator};
/// use reactorscope::metadata::{flags::TypeAttributes, module::Module, typedef::TypeDef};
///
/// let mut module = Module::new("sample.dll");
/// let ty = module.add_type(TypeDef::new("", "\u{200B}", TypeAttributes::PUBLIC));
///
/// let result = Deobfuscator::new(DeobfuscatorConfig::default()).process(&module)?;
/// assert!(result.payload.is_none());
/// assert_eq!(result.renames.new_name(ty), Some("Class0"));
/// # Ok::<(), reactorscope::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Deobfuscator {
    config: DeobfuscatorConfig,
    provider: Option<Arc<dyn DecryptorProvider + Send + Sync>>,
}

impl Deobfuscator {
    /// Creates a deobfuscator without a decryptor provider.
    #[must_use]
    pub fn new(config: DeobfuscatorConfig) -> Self {
        Deobfuscator {
            config,
            provider: None,
        }
    }

    /// Sets the provider that opens matched resource decryptors.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn DecryptorProvider + Send + Sync>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DeobfuscatorConfig {
        &self.config
    }

    /// Deobfuscates one module.
    ///
    /// Recoverable failures of either path are recorded in the result's event log and
    /// only disable that path.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, see [`Error::is_fatal`].
    pub fn process(&self, module: &Module) -> Result<DeobfuscationResult> {
        let events = EventLog::new();
        let mut cleanup = CleanupRequest::new();

        let payload = self.recover_payload(module, &events, &mut cleanup)?;

        let renames = if self.config.renamer.any_enabled() {
            rename_module(module, &self.config.renamer, &events)?
        } else {
            RenameMap::new()
        };

        Ok(DeobfuscationResult {
            payload,
            cleanup,
            renames,
            events,
        })
    }

    /// Deobfuscates several modules in parallel.
    ///
    /// Results are in input order. A fatal error only affects its own module and is
    /// wrapped in [`Error::Module`] naming it.
    pub fn process_batch(&self, modules: &[Module]) -> Vec<Result<DeobfuscationResult>> {
        modules
            .par_iter()
            .map(|module| {
                self.process(module)
                    .map_err(|err| err.in_module(module.name.as_str()))
            })
            .collect()
    }

    fn recover_payload(
        &self,
        module: &Module,
        events: &EventLog,
        cleanup: &mut CleanupRequest,
    ) -> Result<Option<DecryptedPayload>> {
        if !self.config.resources.enabled {
            return Ok(None);
        }
        let Some(provider) = &self.provider else {
            events.info("no decryptor provider, resource recovery skipped");
            return Ok(None);
        };

        match ResourceResolver::new(module, &self.config.resources, events)
            .execute(provider.as_ref(), cleanup)
        {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.is_fatal() => Err(err),
            Err(Error::NotFound(message)) => {
                events.info(message);
                Ok(None)
            }
            Err(err) => {
                events
                    .record(EventKind::Error)
                    .message(format!("resource recovery failed: {err}"));
                Ok(None)
            }
        }
    }
}
