//! Cleanup hand-off for protector artifacts.
//!
//! This module defines [`CleanupRequest`], which lists the declarations a cleanup
//! collaborator should remove once the encrypted resource has been recovered: the
//! decryptor type, its methods and the encrypted resource. Nothing is removed here.

use std::collections::BTreeSet;

use crate::metadata::token::Token;

/// Declarations to remove from a module.
///
/// # Iterator Access
///
/// The accessor methods (`types()`, `methods()`, `resources()`) return iterators that
/// yield tokens in descending RID order. This is the correct order for deletion
/// operations to avoid RID shifting issues.
///
/// # Example
///
/// ```rust
/// use reactorscope::deobfuscation::cleanup::CleanupRequest;
/// use reactorscope::metadata::token::Token;
///
/// let mut request = CleanupRequest::new();
/// request
///     .add_type(Token::new(0x0200_0002))
///     .add_method(Token::new(0x0600_0001))
///     .add_method(Token::new(0x0600_0003));
///
/// let methods: Vec<_> = request.methods().copied().collect();
/// assert_eq!(methods, vec![Token::new(0x0600_0003), Token::new(0x0600_0001)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupRequest {
    /// TypeDef tokens to remove, members included.
    types: BTreeSet<Token>,

    /// MethodDef tokens to remove.
    methods: BTreeSet<Token>,

    /// ManifestResource tokens to remove.
    resources: BTreeSet<Token>,
}

impl CleanupRequest {
    /// Creates an empty cleanup request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type (TypeDef) to be removed.
    pub fn add_type(&mut self, token: Token) -> &mut Self {
        self.types.insert(token);
        self
    }

    /// Returns an iterator over types to remove in descending RID order.
    pub fn types(&self) -> impl Iterator<Item = &Token> + '_ {
        self.types.iter().rev()
    }

    /// Returns the number of types to remove.
    #[must_use]
    pub fn types_len(&self) -> usize {
        self.types.len()
    }

    /// Adds a method (MethodDef) to be removed.
    pub fn add_method(&mut self, token: Token) -> &mut Self {
        self.methods.insert(token);
        self
    }

    /// Adds multiple methods (MethodDef) to be removed.
    pub fn add_methods(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.methods.extend(tokens);
        self
    }

    /// Returns an iterator over methods to remove in descending RID order.
    pub fn methods(&self) -> impl Iterator<Item = &Token> + '_ {
        self.methods.iter().rev()
    }

    /// Returns the number of methods to remove.
    #[must_use]
    pub fn methods_len(&self) -> usize {
        self.methods.len()
    }

    /// Adds an embedded resource (ManifestResource) to be removed.
    pub fn add_resource(&mut self, token: Token) -> &mut Self {
        self.resources.insert(token);
        self
    }

    /// Returns an iterator over resources to remove in descending RID order.
    pub fn resources(&self) -> impl Iterator<Item = &Token> + '_ {
        self.resources.iter().rev()
    }

    /// Returns the number of resources to remove.
    #[must_use]
    pub fn resources_len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if nothing is scheduled for removal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.methods.is_empty() && self.resources.is_empty()
    }

    /// Returns the total number of declarations scheduled for removal.
    #[must_use]
    pub fn deletion_count(&self) -> usize {
        self.types.len() + self.methods.len() + self.resources.len()
    }

    /// Returns true if `token` is scheduled for removal.
    #[must_use]
    pub fn is_deleted(&self, token: Token) -> bool {
        self.types.contains(&token)
            || self.methods.contains(&token)
            || self.resources.contains(&token)
    }

    /// Merges another request into this one.
    pub fn merge(&mut self, other: &CleanupRequest) -> &mut Self {
        self.types.extend(other.types.iter().copied());
        self.methods.extend(other.methods.iter().copied());
        self.resources.extend(other.resources.iter().copied());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_request_default() {
        let request = CleanupRequest::new();
        assert!(request.is_empty());
        assert_eq!(request.deletion_count(), 0);
    }

    #[test]
    fn test_descending_order() {
        let mut request = CleanupRequest::new();
        request
            .add_type(Token::new(0x02000002))
            .add_type(Token::new(0x02000005))
            .add_resource(Token::new(0x28000001));

        let types: Vec<_> = request.types().copied().collect();
        assert_eq!(types, vec![Token::new(0x02000005), Token::new(0x02000002)]);
        assert_eq!(request.types_len(), 2);
        assert_eq!(request.resources_len(), 1);
    }

    #[test]
    fn test_duplicates_and_merge() {
        let mut a = CleanupRequest::new();
        a.add_methods([Token::new(0x06000001), Token::new(0x06000001)]);
        assert_eq!(a.methods_len(), 1);

        let mut b = CleanupRequest::new();
        b.add_method(Token::new(0x06000002))
            .add_resource(Token::new(0x28000001));

        a.merge(&b);
        assert_eq!(a.deletion_count(), 3);
        assert!(a.is_deleted(Token::new(0x28000001)));
        assert!(!a.is_deleted(Token::new(0x02000001)));
    }
}
