//! Configuration for the deobfuscator.
//!
//! This module provides configuration types for controlling the two passes run on a
//! module: encrypted resource recovery and symbol renaming.

/// Default ceiling for a decompressed resource payload (256 MiB).
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 256 * 1024 * 1024;

/// Configuration for symbol renaming.
///
/// Every switch defaults to `true`. Names that do not look obfuscated are never
/// renamed, regardless of these settings.
#[derive(Debug, Clone)]
pub struct RenamerConfig {
    /// Rename obfuscated type names.
    pub rename_types: bool,

    /// Rename obfuscated method names, virtual method groups included.
    pub rename_methods: bool,

    /// Rename obfuscated field names.
    pub rename_fields: bool,

    /// Rename obfuscated property names and their accessors.
    pub rename_properties: bool,

    /// Rename obfuscated event names and their accessors.
    pub rename_events: bool,

    /// Recreate properties whose metadata was stripped from an override.
    pub restore_properties: bool,

    /// Recreate events whose metadata was stripped from an override.
    pub restore_events: bool,
}

impl Default for RenamerConfig {
    fn default() -> Self {
        Self {
            rename_types: true,
            rename_methods: true,
            rename_fields: true,
            rename_properties: true,
            rename_events: true,
            restore_properties: true,
            restore_events: true,
        }
    }
}

impl RenamerConfig {
    /// Creates a new renamer configuration with all options enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with renaming and restoration disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            rename_types: false,
            rename_methods: false,
            rename_fields: false,
            rename_properties: false,
            rename_events: false,
            restore_properties: false,
            restore_events: false,
        }
    }

    /// Returns true if any renaming or restoration is enabled.
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.rename_types
            || self.rename_methods
            || self.rename_fields
            || self.rename_properties
            || self.rename_events
            || self.restore_properties
            || self.restore_events
    }

    /// Enables or disables type renaming.
    #[must_use]
    pub fn with_types(mut self, enable: bool) -> Self {
        self.rename_types = enable;
        self
    }

    /// Enables or disables method renaming.
    #[must_use]
    pub fn with_methods(mut self, enable: bool) -> Self {
        self.rename_methods = enable;
        self
    }

    /// Enables or disables field renaming.
    #[must_use]
    pub fn with_fields(mut self, enable: bool) -> Self {
        self.rename_fields = enable;
        self
    }

    /// Enables or disables property renaming.
    #[must_use]
    pub fn with_properties(mut self, enable: bool) -> Self {
        self.rename_properties = enable;
        self
    }

    /// Enables or disables event renaming.
    #[must_use]
    pub fn with_events(mut self, enable: bool) -> Self {
        self.rename_events = enable;
        self
    }

    /// Enables or disables property and event restoration.
    ///
    /// # Arguments
    ///
    /// * `properties` - Whether stripped properties are recreated.
    /// * `events` - Whether stripped events are recreated.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_restoration(mut self, properties: bool, events: bool) -> Self {
        self.restore_properties = properties;
        self.restore_events = events;
        self
    }
}

/// Configuration for encrypted resource recovery.
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Search for the resource decryptor and recover the payload.
    pub enabled: bool,

    /// Largest decompressed payload accepted from either codec.
    pub max_decompressed_size: usize,

    /// Hand the decryptor type, its methods and the encrypted resource to cleanup.
    pub remove_artifacts: bool,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_decompressed_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
            remove_artifacts: true,
        }
    }
}

impl ResourceConfig {
    /// Creates a new resource configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with resource recovery disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            remove_artifacts: false,
            ..Self::default()
        }
    }

    /// Sets the decompressed size ceiling.
    ///
    /// # Arguments
    ///
    /// * `max` - Largest accepted payload in bytes.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_max_decompressed_size(mut self, max: usize) -> Self {
        self.max_decompressed_size = max;
        self
    }

    /// Enables or disables artifact removal after a successful decryption.
    #[must_use]
    pub fn with_remove_artifacts(mut self, enable: bool) -> Self {
        self.remove_artifacts = enable;
        self
    }
}

/// Configuration for the deobfuscator.
#[derive(Debug, Clone, Default)]
pub struct DeobfuscatorConfig {
    /// Symbol renaming configuration.
    pub renamer: RenamerConfig,

    /// Encrypted resource recovery configuration.
    pub resources: ResourceConfig,
}

impl DeobfuscatorConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with both passes disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            renamer: RenamerConfig::disabled(),
            resources: ResourceConfig::disabled(),
        }
    }

    /// Sets the renamer configuration.
    #[must_use]
    pub fn with_renamer(mut self, renamer: RenamerConfig) -> Self {
        self.renamer = renamer;
        self
    }

    /// Sets the resource configuration.
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceConfig) -> Self {
        self.resources = resources;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DeobfuscatorConfig::new();
        assert!(config.renamer.any_enabled());
        assert!(config.resources.enabled);
        assert_eq!(
            config.resources.max_decompressed_size,
            DEFAULT_MAX_DECOMPRESSED_SIZE
        );
    }

    #[test]
    fn test_disabled_config() {
        let config = DeobfuscatorConfig::disabled();
        assert!(!config.renamer.any_enabled());
        assert!(!config.resources.enabled);
        assert!(!config.resources.remove_artifacts);
    }

    #[test]
    fn test_builder() {
        let config = DeobfuscatorConfig::new()
            .with_renamer(RenamerConfig::new().with_fields(false).with_restoration(false, true))
            .with_resources(ResourceConfig::new().with_max_decompressed_size(1024));

        assert!(!config.renamer.rename_fields);
        assert!(!config.renamer.restore_properties);
        assert!(config.renamer.restore_events);
        assert_eq!(config.resources.max_decompressed_size, 1024);
    }
}
