//! Segment name tables for mapping wire segment ids to skeleton names.
//!
//! Two numbering schemes exist on the wire: the default skeleton order used
//! by almost every message kind, and the Unity order used only by kind 05.
//! Finger segments additionally arrive in a shared id range that is resolved
//! arithmetically against per-hand tables.

pub mod body;
pub mod fingers;
pub mod unity;

pub use fingers::{FINGERS_PER_HAND, LEFT_FINGER_BASE, RIGHT_FINGER_BASE};

use crate::error::MvnError;

/// Number of regular body segments in a full skeleton.
pub const BODY_SEGMENT_COUNT: u32 = 23;

/// Maximum number of prop segments a character can carry.
pub const MAX_PROPS: u32 = 4;

/// Which static name table a message kind resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTable {
    /// Default skeleton order (ids 0–66), used by every kind except Unity.
    Default,
    /// Unity order (ids 0–22), used by the Unity pose stream.
    Unity,
}

/// Coarse classification of a wire segment id by table position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentClass {
    /// Regular body segment (ids 0–22).
    Body,
    /// Prop segment (ids 23–26).
    Prop,
    /// Left-hand finger segment (table ids 27–46).
    LeftFinger,
    /// Right-hand finger segment (table ids 47–66).
    RightFinger,
}

/// Unified resolver over all segment name tables.
pub struct SegmentRegistry;

impl SegmentRegistry {
    /// Resolves a wire segment id to its canonical name.
    ///
    /// Resolution order: exact match in the table for `table`, then the
    /// finger-range fallback (left ids 23–42 and right ids 43–62 index into
    /// the per-hand tables relative to their base). Returns `None` when
    /// neither applies; callers decide whether that is an error or whether
    /// a synthetic name is appropriate (tracker kinematics).
    pub fn resolve(table: SegmentTable, id: u32) -> Option<&'static str> {
        let exact = match table {
            SegmentTable::Default => body::name(id),
            SegmentTable::Unity => unity::name(id),
        };
        exact.or_else(|| finger_fallback(id))
    }

    /// Like [`SegmentRegistry::resolve`] but maps a miss to
    /// [`MvnError::Segment`] naming the offending id.
    pub fn resolve_or_err(
        table: SegmentTable,
        id: u32,
        data_kind: &'static str,
    ) -> Result<&'static str, MvnError> {
        Self::resolve(table, id).ok_or(MvnError::Segment {
            segment_id: id,
            data_kind,
        })
    }

    /// Classifies a default-table id into body / prop / finger ranges.
    ///
    /// Returns `None` for ids outside the 0–66 table.
    pub fn classify(id: u32) -> Option<SegmentClass> {
        match id {
            0..=22 => Some(SegmentClass::Body),
            23..=26 => Some(SegmentClass::Prop),
            27..=46 => Some(SegmentClass::LeftFinger),
            47..=66 => Some(SegmentClass::RightFinger),
            _ => None,
        }
    }
}

/// Resolves an id through the shared finger range, if it falls inside one.
fn finger_fallback(id: u32) -> Option<&'static str> {
    if (LEFT_FINGER_BASE..LEFT_FINGER_BASE + FINGERS_PER_HAND).contains(&id) {
        fingers::left_name(id - LEFT_FINGER_BASE)
    } else if (RIGHT_FINGER_BASE..RIGHT_FINGER_BASE + FINGERS_PER_HAND).contains(&id) {
        fingers::right_name(id - RIGHT_FINGER_BASE)
    } else {
        None
    }
}
