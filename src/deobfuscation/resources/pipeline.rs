//! Decryption and decompression of the encrypted resource.

use crate::{
    deobfuscation::{
        cleanup::CleanupRequest,
        config::ResourceConfig,
        events::{EventKind, EventLog},
        resources::decryptor::DecryptorHandle,
    },
    utils::decompress::{decompress_deflate, decompress_quicklz, is_quicklz},
    Error, Result,
};

/// The recovered resource blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedPayload {
    /// Name of the encrypted resource the payload was recovered from
    pub resource_name: String,
    /// Decrypted and decompressed bytes
    pub data: Vec<u8>,
}

/// Decompresses a decrypted blob, QuickLZ first, then raw deflate.
///
/// Neither codec failure escapes: the first one moves on to deflate, the second one
/// turns into [`Error::CorruptPayload`]. An empty result counts as a failure.
///
/// # Errors
///
/// Returns [`Error::CorruptPayload`] if neither codec recovers a non-empty payload.
pub fn decompress(data: &[u8], max_size: usize) -> Result<Vec<u8>> {
    decode(data, max_size, |_| {})
}

/// Same as [`decompress`], calling `on_fallback` when a QuickLZ frame fails to decode.
fn decode(data: &[u8], max_size: usize, mut on_fallback: impl FnMut(&Error)) -> Result<Vec<u8>> {
    let quicklz = match decompress_quicklz(data, max_size) {
        Ok(decompressed) if !decompressed.is_empty() => return Ok(decompressed),
        Err(err) if is_quicklz(data) => {
            let err = Error::from(err);
            on_fallback(&err);
            Some(err)
        }
        _ => None,
    };

    match decompress_deflate(data, max_size) {
        Ok(decompressed) if !decompressed.is_empty() => Ok(decompressed),
        Ok(_) => Err(Error::CorruptPayload(
            "payload decompressed to nothing".to_string(),
        )),
        Err(deflate) => {
            let detail = match quicklz {
                Some(quicklz) => format!("{quicklz}; {deflate}"),
                None => deflate.to_string(),
            };
            Err(Error::CorruptPayload(detail))
        }
    }
}

/// Drives a matched decryptor and records what it leaves behind.
pub struct DecryptionPipeline<'a> {
    config: &'a ResourceConfig,
    log: &'a EventLog,
}

impl<'a> DecryptionPipeline<'a> {
    /// Creates a pipeline using `config` and reporting to `log`.
    #[must_use]
    pub fn new(config: &'a ResourceConfig, log: &'a EventLog) -> Self {
        DecryptionPipeline { config, log }
    }

    /// Decrypts and decompresses the handle's resource.
    ///
    /// The handle is consumed and released when this returns, on success and on
    /// failure. On success the decryptor type, its methods, the decryption routine and
    /// the encrypted resource are added to `cleanup` if artifact removal is enabled.
    ///
    /// # Errors
    ///
    /// Returns the decryptor's error, or [`Error::CorruptPayload`] if the decrypted
    /// bytes cannot be decompressed.
    pub fn run(
        &self,
        mut handle: DecryptorHandle,
        cleanup: &mut CleanupRequest,
    ) -> Result<DecryptedPayload> {
        let encrypted = handle.decrypt()?;
        let data = decode(&encrypted, self.config.max_decompressed_size, |err| {
            self.log
                .record(EventKind::Warning)
                .token(handle.resource.token)
                .message(format!("falling back to deflate: {err}"));
        })?;

        self.log
            .record(EventKind::ResourceDecrypted)
            .token(handle.resource.token)
            .message(format!(
                "{}: {} -> {} bytes",
                handle.resource.name,
                handle.resource.size(),
                data.len()
            ));

        if self.config.remove_artifacts {
            cleanup
                .add_methods(handle.type_methods.iter().copied())
                .add_method(handle.decryptor_method)
                .add_type(handle.decryptor_type)
                .add_resource(handle.resource.token);

            let marked = handle.type_methods.len() + 2;
            self.log
                .record(EventKind::ArtifactMarked)
                .token(handle.decryptor_type)
                .message(format!("{marked} declarations handed to cleanup"));
        }

        Ok(DecryptedPayload {
            resource_name: handle.resource.name.clone(),
            data,
        })
    }
}
