//! Recovery of the protector's encrypted resources.
//!
//! Protected modules carry their original resources in a single encrypted, compressed
//! blob. A protector-injected class hooks assembly resolution and decrypts the blob on
//! first use. Recovery is split in two steps:
//!
//! - [`fingerprint`] - recognizes the injected class and its decryption routine by
//!   structure alone, without running anything
//! - [`pipeline`] - decrypts the blob through a [`decryptor::ResourceDecryptor`],
//!   decompresses it and hands the protector's artifacts to cleanup
//!
//! [`ResourceResolver`] runs both steps on a module.
//!
//! # Example
//!
//! ```rust
//! use reactorscope::deobfuscation::{
//!     cleanup::CleanupRequest, config::ResourceConfig, events::EventLog,
//!     resources::{decryptor::{DecryptorProvider, ResourceDecryptor}, ResourceResolver},
//! };
//! use reactorscope::metadata::{module::Module, resources::EmbeddedResource, token::Token};
//! use reactorscope::{Error, Result};
//!
//! struct Plain;
//!
//! impl ResourceDecryptor for Plain {
//!     fn decrypt(&mut self, encrypted: &[u8]) -> Result<Vec<u8>> {
//!         Ok(encrypted.to_vec())
//!     }
//! }
//!
//! impl DecryptorProvider for Plain {
//!     fn open(&self, _: &Module, _: Token, _: &EmbeddedResource) -> Result<Box<dyn ResourceDecryptor>> {
//!         Ok(Box::new(Plain))
//!     }
//! }
//!
//! let module = Module::new("clean.dll");
//! let config = ResourceConfig::default();
//! let log = EventLog::new();
//! let mut cleanup = CleanupRequest::new();
//!
//! let result = ResourceResolver::new(&module, &config, &log).execute(&Plain, &mut cleanup);
//! assert!(matches!(result, Err(Error::NotFound(_))));
//! ```

pub mod decryptor;
pub mod fingerprint;
pub mod pipeline;

use crate::{
    deobfuscation::{
        cleanup::CleanupRequest,
        config::ResourceConfig,
        events::{EventKind, EventLog},
    },
    metadata::module::Module,
    Error, Result,
};

use self::{
    decryptor::{DecryptorHandle, DecryptorProvider},
    fingerprint::PayloadFingerprintMatcher,
    pipeline::{DecryptedPayload, DecryptionPipeline},
};

/// Finds and decrypts the encrypted resource of a module.
pub struct ResourceResolver<'a> {
    module: &'a Module,
    config: &'a ResourceConfig,
    log: &'a EventLog,
}

impl<'a> ResourceResolver<'a> {
    /// Creates a resolver for `module`.
    #[must_use]
    pub fn new(module: &'a Module, config: &'a ResourceConfig, log: &'a EventLog) -> Self {
        ResourceResolver {
            module,
            config,
            log,
        }
    }

    /// Finds the resource decryptor and opens it.
    ///
    /// Candidates are tried in scan order, the first one the provider can open wins.
    /// Returns `None` if the module does not carry an encrypted resource.
    pub fn find(&self, provider: &dyn DecryptorProvider) -> Option<DecryptorHandle> {
        for candidate in PayloadFingerprintMatcher::new(self.module).candidates() {
            let Some(resource) = self.module.resource(candidate.resource) else {
                continue;
            };

            match provider.open(self.module, candidate.decryptor, resource) {
                Ok(decryptor) => {
                    self.log
                        .record(EventKind::DecryptorIdentified)
                        .token(candidate.decryptor)
                        .message(format!(
                            "{} layout, resolver {}, resource '{}'",
                            candidate.layout, candidate.resolver, resource.name
                        ));

                    return Some(DecryptorHandle::new(
                        decryptor,
                        candidate.decryptor,
                        candidate.decryptor_type,
                        candidate.methods,
                        resource.clone(),
                    ));
                }
                Err(err) => {
                    self.log
                        .record(EventKind::Warning)
                        .token(candidate.decryptor)
                        .message(format!("cannot open decryptor: {err}"));
                }
            }
        }

        None
    }

    /// Finds, decrypts and decompresses the encrypted resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no decryptor is found, otherwise the errors of
    /// [`DecryptionPipeline::run`].
    pub fn execute(
        &self,
        provider: &dyn DecryptorProvider,
        cleanup: &mut CleanupRequest,
    ) -> Result<DecryptedPayload> {
        let Some(handle) = self.find(provider) else {
            return Err(Error::NotFound(format!(
                "no encrypted resource in '{}'",
                self.module.name
            )));
        };

        DecryptionPipeline::new(self.config, self.log).run(handle, cleanup)
    }
}
