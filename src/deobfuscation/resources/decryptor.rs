//! The decryptor abstraction and its scoped handle.
//!
//! Key derivation and the byte transforms of the protector live behind
//! [`ResourceDecryptor`]. The matcher only decides *which* method and resource are
//! involved, a [`DecryptorProvider`] turns that decision into a decryptor.

use crate::{
    metadata::{module::Module, resources::EmbeddedResource, token::Token},
    Result,
};

/// Reverses the protector's resource encryption.
pub trait ResourceDecryptor {
    /// Decrypts the raw bytes of the encrypted resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be decrypted.
    fn decrypt(&mut self, encrypted: &[u8]) -> Result<Vec<u8>>;

    /// Releases whatever the decryptor acquired when it was opened.
    ///
    /// Called exactly once by [`DecryptorHandle`], on every path.
    fn release(&mut self) {}
}

/// Opens a [`ResourceDecryptor`] for a matched decryptor method.
pub trait DecryptorProvider {
    /// Opens a decryptor for `method`, the recognized decryption routine, and the
    /// encrypted `resource` it references.
    ///
    /// # Errors
    ///
    /// Returns an error if the routine's key material cannot be recovered. The matcher
    /// then moves on to the next candidate.
    fn open(
        &self,
        module: &Module,
        method: Token,
        resource: &EmbeddedResource,
    ) -> Result<Box<dyn ResourceDecryptor>>;
}

/// A matched decryptor together with everything it is responsible for.
pub struct DecryptorHandle {
    decryptor: Box<dyn ResourceDecryptor>,
    /// The recognized decryption routine
    pub decryptor_method: Token,
    /// The type declaring the decryption routine
    pub decryptor_type: Token,
    /// All methods of the type whose fields and resolve callback matched
    pub type_methods: Vec<Token>,
    /// The encrypted resource
    pub resource: EmbeddedResource,
    released: bool,
}

impl DecryptorHandle {
    /// Wraps an opened decryptor.
    #[must_use]
    pub fn new(
        decryptor: Box<dyn ResourceDecryptor>,
        decryptor_method: Token,
        decryptor_type: Token,
        type_methods: Vec<Token>,
        resource: EmbeddedResource,
    ) -> Self {
        DecryptorHandle {
            decryptor,
            decryptor_method,
            decryptor_type,
            type_methods,
            resource,
            released: false,
        }
    }

    /// Decrypts the encrypted resource.
    ///
    /// # Errors
    ///
    /// Returns the decryptor's error.
    pub fn decrypt(&mut self) -> Result<Vec<u8>> {
        self.decryptor.decrypt(&self.resource.data)
    }
}

impl std::fmt::Debug for DecryptorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptorHandle")
            .field("decryptor_method", &self.decryptor_method)
            .field("decryptor_type", &self.decryptor_type)
            .field("resource", &self.resource.name)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Drop for DecryptorHandle {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            self.decryptor.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    struct Counting {
        releases: Rc<Cell<u32>>,
    }

    impl ResourceDecryptor for Counting {
        fn decrypt(&mut self, encrypted: &[u8]) -> Result<Vec<u8>> {
            Ok(encrypted.iter().map(|b| b ^ 0x5A).collect())
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[test]
    fn test_handle_releases_once() -> Result<()> {
        let releases = Rc::new(Cell::new(0));
        let mut handle = DecryptorHandle::new(
            Box::new(Counting {
                releases: releases.clone(),
            }),
            Token::new(0x06000002),
            Token::new(0x02000002),
            vec![Token::new(0x06000001), Token::new(0x06000002)],
            EmbeddedResource::new("payload", vec![0x5A ^ b'o', 0x5A ^ b'k']),
        );

        assert_eq!(handle.decrypt()?, b"ok");
        assert_eq!(releases.get(), 0);

        drop(handle);
        assert_eq!(releases.get(), 1);
        Ok(())
    }
}
