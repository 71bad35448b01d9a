//! Unity pose stream segment names.
//!
//! The Unity stream (kind 05) numbers the same 23 body segments in a
//! different order: legs first, then spine, then arms, neck and head last.

/// Looks up the Unity-order name for a wire segment id.
///
/// Returns `None` for ids outside 0–22.
pub(crate) fn name(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("Pelvis"),
        1 => Some("Right Upper Leg"),
        2 => Some("Right Lower Leg"),
        3 => Some("Right Foot"),
        4 => Some("Right Toe"),
        5 => Some("Left Upper Leg"),
        6 => Some("Left Lower Leg"),
        7 => Some("Left Foot"),
        8 => Some("Left Toe"),
        9 => Some("L5"),
        10 => Some("L3"),
        11 => Some("T12"),
        12 => Some("T8"),
        13 => Some("Left Shoulder"),
        14 => Some("Left Upper Arm"),
        15 => Some("Left Forearm"),
        16 => Some("Left Hand"),
        17 => Some("Right Shoulder"),
        18 => Some("Right Upper Arm"),
        19 => Some("Right Forearm"),
        20 => Some("Right Hand"),
        21 => Some("Neck"),
        22 => Some("Head"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_order_differs_from_default() {
        // Same skeleton, different numbering: id 1 is a leg here, not L5.
        assert_eq!(name(1), Some("Right Upper Leg"));
        assert_eq!(name(22), Some("Head"));
    }

    #[test]
    fn test_unity_table_ends_at_22() {
        assert!(name(22).is_some());
        assert_eq!(name(23), None);
    }
}
