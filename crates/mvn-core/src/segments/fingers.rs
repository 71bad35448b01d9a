//! Anatomical finger segment names, 20 per hand.
//!
//! Finger records on the wire reuse the prop/finger id range: left-hand ids
//! start at [`LEFT_FINGER_BASE`] and right-hand ids at [`RIGHT_FINGER_BASE`],
//! each spanning [`FINGERS_PER_HAND`] consecutive ids. The index passed to
//! the lookup functions here is the id minus the hand base.

/// First wire id of the left-hand finger range.
pub const LEFT_FINGER_BASE: u32 = 23;

/// First wire id of the right-hand finger range.
pub const RIGHT_FINGER_BASE: u32 = 43;

/// Number of finger segments per hand.
pub const FINGERS_PER_HAND: u32 = 20;

/// Looks up a left-hand finger name by per-hand index (0–19).
pub(crate) fn left_name(index: u32) -> Option<&'static str> {
    match index {
        0 => Some("Left Carpus"),
        1 => Some("Left First Metacarpal"),
        2 => Some("Left First Proximal Phalange"),
        3 => Some("Left First Distal Phalange"),
        4 => Some("Left Second Metacarpal"),
        5 => Some("Left Second Proximal Phalange"),
        6 => Some("Left Second Middle Phalange"),
        7 => Some("Left Second Distal Phalange"),
        8 => Some("Left Third Metacarpal"),
        9 => Some("Left Third Proximal Phalange"),
        10 => Some("Left Third Middle Phalange"),
        11 => Some("Left Third Distal Phalange"),
        12 => Some("Left Fourth Metacarpal"),
        13 => Some("Left Fourth Proximal Phalange"),
        14 => Some("Left Fourth Middle Phalange"),
        15 => Some("Left Fourth Distal Phalange"),
        16 => Some("Left Fifth Metacarpal"),
        17 => Some("Left Fifth Proximal Phalange"),
        18 => Some("Left Fifth Middle Phalange"),
        19 => Some("Left Fifth Distal Phalange"),
        _ => None,
    }
}

/// Looks up a right-hand finger name by per-hand index (0–19).
pub(crate) fn right_name(index: u32) -> Option<&'static str> {
    match index {
        0 => Some("Right Carpus"),
        1 => Some("Right First Metacarpal"),
        2 => Some("Right First Proximal Phalange"),
        3 => Some("Right First Distal Phalange"),
        4 => Some("Right Second Metacarpal"),
        5 => Some("Right Second Proximal Phalange"),
        6 => Some("Right Second Middle Phalange"),
        7 => Some("Right Second Distal Phalange"),
        8 => Some("Right Third Metacarpal"),
        9 => Some("Right Third Proximal Phalange"),
        10 => Some("Right Third Middle Phalange"),
        11 => Some("Right Third Distal Phalange"),
        12 => Some("Right Fourth Metacarpal"),
        13 => Some("Right Fourth Proximal Phalange"),
        14 => Some("Right Fourth Middle Phalange"),
        15 => Some("Right Fourth Distal Phalange"),
        16 => Some("Right Fifth Metacarpal"),
        17 => Some("Right Fifth Proximal Phalange"),
        18 => Some("Right Fifth Middle Phalange"),
        19 => Some("Right Fifth Distal Phalange"),
        _ => None,
    }
}
