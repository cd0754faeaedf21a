//! Named effect sequences, loaded once at bring-up.
//!
//! The registry is filled from parsed device configuration and never
//! mutated afterwards, so lookups from the client surface need no
//! locking.

use heapless::{String, Vec};
use log::{debug, warn};

use crate::error::EngineError;
use crate::sequence::{EffectSequence, SequenceKind};

/// One configuration entry offered to [`EffectRegistry::load`].
///
/// Borrows straight from the configuration layer; admitted entries are
/// copied into owned storage.
#[derive(Debug, Clone, Copy)]
pub struct EffectEntry<'a> {
    /// Name clients use to start the sequence.
    pub name: &'a str,
    /// Interpretation of the value list.
    pub kind: SequenceKind,
    /// Flat wait/actuation value list.
    pub values: &'a [u32],
}

/// Read-only set of named effect sequences.
#[derive(Debug)]
pub struct EffectRegistry<const CAPACITY: usize> {
    entries: Vec<EffectSequence, CAPACITY>,
    supports_presets: bool,
}

impl<const CAPACITY: usize> EffectRegistry<CAPACITY> {
    /// Registry for a device without preset support.
    ///
    /// Fixed-duration playback works as usual; every preset start fails
    /// with [`EngineError::NotSupported`].
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
            supports_presets: false,
        }
    }

    /// Build the registry from parsed configuration entries.
    ///
    /// Malformed entries are rejected individually and the load carries
    /// on; only a load that admits nothing fails, with
    /// [`EngineError::NotConfigured`].
    pub fn load(
        entries: &[EffectEntry<'_>],
        supports_presets: bool,
    ) -> Result<Self, EngineError> {
        let mut registry = Self {
            entries: Vec::new(),
            supports_presets,
        };
        for entry in entries {
            if let Err(reason) = registry.admit(entry) {
                warn!("rejecting effect {:?}: {reason}", entry.name);
            }
        }
        if registry.entries.is_empty() {
            return Err(EngineError::NotConfigured);
        }
        debug!(
            "effect registry loaded: {} of {} entries",
            registry.entries.len(),
            entries.len()
        );
        Ok(registry)
    }

    fn admit(&mut self, entry: &EffectEntry<'_>) -> Result<(), &'static str> {
        if entry.name.is_empty() {
            return Err("empty name");
        }
        if entry.values.is_empty() {
            return Err("empty value list");
        }
        if !entry.values.len().is_multiple_of(2) {
            return Err("odd value count");
        }
        if self.lookup(entry.name).is_some() {
            return Err("duplicate name");
        }
        let name = String::try_from(entry.name).map_err(|()| "name too long")?;
        let values =
            Vec::from_slice(entry.values).map_err(|()| "value list too long")?;
        self.entries
            .push(EffectSequence::from_parts(name, entry.kind, values))
            .map_err(|_| "registry full")?;
        Ok(())
    }

    /// Look an admitted sequence up by its exact name.
    pub fn lookup(&self, name: &str) -> Option<&EffectSequence> {
        self.entries.iter().find(|sequence| sequence.name() == name)
    }

    /// Whether preset playback is enabled at all.
    pub const fn supports_presets(&self) -> bool {
        self.supports_presets
    }

    /// Number of admitted sequences.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sequence was admitted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the admitted sequences in admission order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectSequence> {
        self.entries.iter()
    }
}
