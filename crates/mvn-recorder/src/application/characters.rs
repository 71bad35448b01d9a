//! Character directory built from stream metadata.
//!
//! A stream can carry several characters at once, each tagged with a
//! one-byte id in the datagram header.  Metadata frames (kind 12) name a
//! character and scale-info frames (kind 13) describe its skeleton; both
//! arrive rarely (typically once, shortly after the character connects).
//! The directory keeps the latest of each per id so consumers can label
//! pose data long after the metadata frame went by.

use std::collections::BTreeMap;

use tracing::{debug, info};

use mvn_core::{CharacterMetaData, MvnMessage, ScaleInfo};

/// Everything known about one character on the stream.
#[derive(Debug, Clone, Default)]
pub struct CharacterRecord {
    /// Latest metadata frame, if any arrived.
    pub metadata: CharacterMetaData,
    /// Latest scale-info frame, if any arrived.
    pub scale: Option<ScaleInfo>,
}

/// Directory of all characters seen on the stream, keyed by character id.
#[derive(Debug, Default)]
pub struct CharacterDirectory {
    characters: BTreeMap<u8, CharacterRecord>,
}

impl CharacterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded message into the directory.
    ///
    /// Metadata and scale-info messages enrich the character's record;
    /// every kind marks the character as seen.
    pub fn observe(&mut self, character_id: u8, message: &MvnMessage) {
        let is_new = !self.characters.contains_key(&character_id);
        let record = self.characters.entry(character_id).or_default();

        match message {
            MvnMessage::MetaData(meta) => {
                let newly_named = meta.name.is_some() && record.metadata.name != meta.name;
                record.metadata = meta.clone();
                if newly_named {
                    if let Some(name) = &record.metadata.name {
                        info!(character_id, name = %name, "character identified");
                    }
                }
            }
            MvnMessage::ScaleInfo(scale) => {
                record.scale = Some(scale.clone());
                debug!(
                    character_id,
                    segments = scale.segments.len(),
                    points = scale.points.len(),
                    "character scale updated"
                );
            }
            _ => {}
        }

        if is_new {
            debug!(character_id, "character added to directory");
        }
    }

    /// Display name for a character: the metadata `name` tag when known,
    /// otherwise `Character_{id}`.
    pub fn display_name(&self, character_id: u8) -> String {
        self.characters
            .get(&character_id)
            .and_then(|record| record.metadata.name.clone())
            .unwrap_or_else(|| format!("Character_{character_id}"))
    }

    pub fn get(&self, character_id: u8) -> Option<&CharacterRecord> {
        self.characters.get(&character_id)
    }

    /// All character ids seen so far, ascending.
    pub fn ids(&self) -> Vec<u8> {
        self.characters.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
