//! Default skeleton segment names, indexed by wire segment id.
//!
//! Ids 0–22 are the 23 body segments, 23–26 the four props, 27–46 the left
//! hand and 47–66 the right hand finger segments. This is the table used by
//! every message kind except the Unity pose stream.

/// Looks up the default-skeleton name for a wire segment id.
///
/// Returns `None` for ids outside 0–66.
pub(crate) fn name(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("Pelvis"),
        1 => Some("L5"),
        2 => Some("L3"),
        3 => Some("T12"),
        4 => Some("T8"),
        5 => Some("Neck"),
        6 => Some("Head"),
        7 => Some("Right Shoulder"),
        8 => Some("Right Upper Arm"),
        9 => Some("Right Forearm"),
        10 => Some("Right Hand"),
        11 => Some("Left Shoulder"),
        12 => Some("Left Upper Arm"),
        13 => Some("Left Forearm"),
        14 => Some("Left Hand"),
        15 => Some("Right Upper Leg"),
        16 => Some("Right Lower Leg"),
        17 => Some("Right Foot"),
        18 => Some("Right Toe"),
        19 => Some("Left Upper Leg"),
        20 => Some("Left Lower Leg"),
        21 => Some("Left Foot"),
        22 => Some("Left Toe"),
        // Props
        23 => Some("Prop1"),
        24 => Some("Prop2"),
        25 => Some("Prop3"),
        26 => Some("Prop4"),
        // Left hand fingers
        27 => Some("Left Carpus"),
        28 => Some("Left First MC"),
        29 => Some("Left First PP"),
        30 => Some("Left First DP"),
        31 => Some("Left Second MC"),
        32 => Some("Left Second PP"),
        33 => Some("Left Second MP"),
        34 => Some("Left Second DP"),
        35 => Some("Left Third MC"),
        36 => Some("Left Third PP"),
        37 => Some("Left Third MP"),
        38 => Some("Left Third DP"),
        39 => Some("Left Fourth MC"),
        40 => Some("Left Fourth PP"),
        41 => Some("Left Fourth MP"),
        42 => Some("Left Fourth DP"),
        43 => Some("Left Fifth MC"),
        44 => Some("Left Fifth PP"),
        45 => Some("Left Fifth MP"),
        46 => Some("Left Fifth DP"),
        // Right hand fingers
        47 => Some("Right Carpus"),
        48 => Some("Right First MC"),
        49 => Some("Right First PP"),
        50 => Some("Right First DP"),
        51 => Some("Right Second MC"),
        52 => Some("Right Second PP"),
        53 => Some("Right Second MP"),
        54 => Some("Right Second DP"),
        55 => Some("Right Third MC"),
        56 => Some("Right Third PP"),
        57 => Some("Right Third MP"),
        58 => Some("Right Third DP"),
        59 => Some("Right Fourth MC"),
        60 => Some("Right Fourth PP"),
        61 => Some("Right Fourth MP"),
        62 => Some("Right Fourth DP"),
        63 => Some("Right Fifth MC"),
        64 => Some("Right Fifth PP"),
        65 => Some("Right Fifth MP"),
        66 => Some("Right Fifth DP"),
        _ => None,
    }
}
