//! All MVN stream message types and protocol constants.
//!
//! Every datagram starts with a 24-byte big-endian header whose 6-char ASCII
//! id string both identifies the protocol (`MXTP`) and carries the 2-char
//! message-kind code. Payload records are fixed-stride for the pose and
//! kinematics kinds and self-describing for metadata, scale info, and time
//! codes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MvnError;

// ── Protocol constants ────────────────────────────────────────────────────────

/// First four bytes of every valid id string.
pub const PROTOCOL_TAG: &[u8; 4] = b"MXTP";

/// Total size of the datagram header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Conventional UDP port for MVN network streaming.
pub const DEFAULT_PORT: u16 = 9763;

/// Largest datagram the stream can produce; used to size receive buffers.
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Bit 7 of the fragment-control byte: set on the final fragment.
pub const FINAL_FRAGMENT_FLAG: u8 = 0x80;

/// Bits 0–6 of the fragment-control byte: the fragment index.
pub const FRAGMENT_INDEX_MASK: u8 = 0x7F;

/// Builds a fragment-control byte from an index and a final flag.
///
/// Only the low 7 bits of `index` are representable on the wire.
pub fn pack_fragment_control(index: u8, is_final: bool) -> u8 {
    let mut byte = index & FRAGMENT_INDEX_MASK;
    if is_final {
        byte |= FINAL_FRAGMENT_FLAG;
    }
    byte
}

// ── Message kinds ─────────────────────────────────────────────────────────────

/// Message kinds this implementation decodes, keyed by the 2-char code at
/// the end of the header id string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// "01": per-segment position + Euler rotation (Y-Up, right-handed).
    PoseEuler,
    /// "02": per-segment position + quaternion (Z-Up, right-handed).
    PoseQuaternion,
    /// "03": point positions only.
    PosePositions,
    /// "05": per-segment position + quaternion in Unity segment order
    /// (Y-Up, left-handed).
    PoseUnity,
    /// "12": character metadata as `tag: value` lines.
    MetaData,
    /// "13": character scaling information.
    ScaleInfo,
    /// "20": joint angles between point pairs.
    JointAngles,
    /// "21": linear segment kinematics (position, velocity, acceleration).
    LinearKinematics,
    /// "22": angular segment kinematics.
    AngularKinematics,
    /// "23": raw motion tracker kinematics.
    TrackerKinematics,
    /// "24": whole-body center of mass.
    CenterOfMass,
    /// "25": wall-clock time code string.
    TimeCode,
}

impl MessageKind {
    /// Parses a 2-char kind code. Returns `None` for unknown codes and for
    /// the deprecated codes, which are recognized but never decoded.
    pub fn from_code(code: &str) -> Option<MessageKind> {
        match code {
            "01" => Some(MessageKind::PoseEuler),
            "02" => Some(MessageKind::PoseQuaternion),
            "03" => Some(MessageKind::PosePositions),
            "05" => Some(MessageKind::PoseUnity),
            "12" => Some(MessageKind::MetaData),
            "13" => Some(MessageKind::ScaleInfo),
            "20" => Some(MessageKind::JointAngles),
            "21" => Some(MessageKind::LinearKinematics),
            "22" => Some(MessageKind::AngularKinematics),
            "23" => Some(MessageKind::TrackerKinematics),
            "24" => Some(MessageKind::CenterOfMass),
            "25" => Some(MessageKind::TimeCode),
            _ => None,
        }
    }

    /// The wire code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            MessageKind::PoseEuler => "01",
            MessageKind::PoseQuaternion => "02",
            MessageKind::PosePositions => "03",
            MessageKind::PoseUnity => "05",
            MessageKind::MetaData => "12",
            MessageKind::ScaleInfo => "13",
            MessageKind::JointAngles => "20",
            MessageKind::LinearKinematics => "21",
            MessageKind::AngularKinematics => "22",
            MessageKind::TrackerKinematics => "23",
            MessageKind::CenterOfMass => "24",
            MessageKind::TimeCode => "25",
        }
    }

    /// Whether a code belongs to a retired kind that streams may still emit:
    /// "04" (MotionGrid tag data), "10" and "11" (superseded by scale info).
    /// These are dropped without decoding.
    pub fn is_deprecated_code(code: &str) -> bool {
        matches!(code, "04" | "10" | "11")
    }

    /// The coordinate frame the pose kinds are expressed in, for consumers
    /// that convert between engines. `None` for non-pose kinds.
    pub fn coordinate_frame(&self) -> Option<&'static str> {
        match self {
            MessageKind::PoseEuler => Some("Y-Up, right-handed"),
            MessageKind::PoseQuaternion => Some("Z-Up, right-handed"),
            MessageKind::PoseUnity => Some("Y-Up, left-handed"),
            _ => None,
        }
    }

    /// All decodable kinds, in code order.
    pub fn all() -> [MessageKind; 12] {
        [
            MessageKind::PoseEuler,
            MessageKind::PoseQuaternion,
            MessageKind::PosePositions,
            MessageKind::PoseUnity,
            MessageKind::MetaData,
            MessageKind::ScaleInfo,
            MessageKind::JointAngles,
            MessageKind::LinearKinematics,
            MessageKind::AngularKinematics,
            MessageKind::TrackerKinematics,
            MessageKind::CenterOfMass,
            MessageKind::TimeCode,
        ]
    }
}

// ── Datagram header ───────────────────────────────────────────────────────────

/// 24-byte header prepended to every datagram on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MvnHeader {
    /// 6-char ASCII id string, e.g. `MXTP02`. The first four chars are the
    /// protocol tag, the last two the message-kind code.
    pub id_string: String,
    /// Per-stream sample counter; resets when a new recording starts.
    pub sample_counter: u32,
    /// Fragment-control byte: bit 7 is the final-fragment flag, bits 0–6
    /// the fragment index.
    pub fragment_control: u8,
    /// Number of records in the payload for the fixed-stride kinds.
    pub item_count: u8,
    /// Raw time code field.
    pub time_code: u32,
    /// Which character this datagram belongs to.
    pub character_id: u8,
    /// Body segments streamed for this character.
    pub body_segment_count: u8,
    /// Prop segments streamed for this character.
    pub prop_count: u8,
    /// Finger segments streamed for this character.
    pub finger_segment_count: u8,
    /// Declared payload size in bytes.
    pub payload_size: u16,
}

impl MvnHeader {
    /// The 2-char message-kind code at the end of the id string.
    pub fn kind_code(&self) -> &str {
        self.id_string.get(4..6).unwrap_or("")
    }

    /// The decodable kind for this header, if the code maps to one.
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_code(self.kind_code())
    }

    /// Whether this datagram is the last fragment of its message.
    pub fn is_final_fragment(&self) -> bool {
        self.fragment_control & FINAL_FRAGMENT_FLAG != 0
    }

    /// Zero-based index of this fragment within its message.
    pub fn fragment_index(&self) -> u8 {
        self.fragment_control & FRAGMENT_INDEX_MASK
    }
}

// ── Math primitives ───────────────────────────────────────────────────────────

/// 3-component vector; used for positions, velocities, accelerations, and
/// magnetic field readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3 { x, y, z }
    }
}

/// Rotation quaternion, scalar-first (w, x, y, z) as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    /// Real component.
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Quaternion { w, x, y, z }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Quaternion::new(1.0, 0.0, 0.0, 0.0)
    }
}

/// Euler rotation in degrees: x = roll, y = pitch, z = yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerAngles {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        EulerAngles { x, y, z }
    }
}

// ── Payload records ───────────────────────────────────────────────────────────

/// One segment of an Euler pose message (kind 01).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEulerPose {
    pub segment_id: u32,
    pub position: Vector3,
    pub rotation: EulerAngles,
}

/// One segment of a quaternion pose message (kinds 02 and 05).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentQuaternionPose {
    pub segment_id: u32,
    pub position: Vector3,
    pub orientation: Quaternion,
}

/// One point of a point-position message (kind 03).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPosition {
    /// Packed point id; see [`point_id`] for the segment/local split.
    pub point_id: u32,
    pub position: Vector3,
}

/// One joint of a joint-angle message (kind 20).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngle {
    /// Packed point id on the parent segment.
    pub parent_point_id: u32,
    /// Packed point id on the child segment.
    pub child_point_id: u32,
    pub rotation: EulerAngles,
}

/// One segment of a linear kinematics message (kind 21).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSegmentKinematics {
    pub segment_id: u32,
    pub position: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
}

/// One segment of an angular kinematics message (kind 22).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngularSegmentKinematics {
    pub segment_id: u32,
    pub orientation: Quaternion,
    pub angular_velocity: Vector3,
    pub angular_acceleration: Vector3,
}

/// One tracker of a tracker kinematics message (kind 23).
///
/// Tracker ids are raw sensor identifiers, not skeleton segment ids; any
/// 32-bit value is accepted and unknown ids get a synthesized name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerKinematics {
    pub tracker_id: u32,
    pub orientation: Quaternion,
    /// Acceleration with gravity removed.
    pub free_acceleration: Vector3,
    pub magnetic_field: Vector3,
}

/// Whole-body center of mass (kind 24).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterOfMass {
    pub position: Vector3,
}

/// Character metadata (kind 12), streamed as `tag: value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterMetaData {
    /// Display name of the character.
    pub name: Option<String>,
    /// Xsens character identifier.
    pub xmid: Option<String>,
    /// Display color assigned by the streaming host.
    pub color: Option<String>,
    /// Tags this implementation has no dedicated field for.
    pub additional_tags: BTreeMap<String, String>,
}

/// One segment entry of a scale-info message (kind 13).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSegment {
    pub name: String,
    /// Segment origin in the null pose.
    pub origin: Vector3,
}

/// One point entry of a scale-info message (kind 13).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalePoint {
    pub segment_id: u16,
    /// Local point id within the segment.
    pub point_id: u16,
    pub name: String,
    /// Bitmask of [`point_flags`] values.
    pub flags: u32,
    pub position: Vector3,
}

/// Character scaling information (kind 13).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleInfo {
    pub segments: Vec<ScaleSegment>,
    pub points: Vec<ScalePoint>,
}

/// Wall-clock time code (kind 25), always normalized to `HH:MM:SS.mmm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCode {
    time_str: String,
}

impl TimeCode {
    /// Validates and normalizes a time code string.
    ///
    /// Accepts `HH:MM:SS` and `HH:MM:SS.mmm` with hours 0–23 and
    /// minutes/seconds 0–59; the short form gains a `.000` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`MvnError::Parse`] when the string does not match the
    /// pattern or a component is out of range.
    pub fn new(raw: &str) -> Result<TimeCode, MvnError> {
        let trimmed = raw.trim();
        if !is_valid_time_code(trimmed) {
            return Err(MvnError::parse(
                "time code",
                0,
                format!("invalid time code string: {trimmed:?}"),
            ));
        }
        let time_str = if trimmed.contains('.') {
            trimmed.to_string()
        } else {
            format!("{trimmed}.000")
        };
        Ok(TimeCode { time_str })
    }

    /// The normalized `HH:MM:SS.mmm` string.
    pub fn as_str(&self) -> &str {
        &self.time_str
    }

    pub fn hours(&self) -> u32 {
        self.two_digit_field(0)
    }

    pub fn minutes(&self) -> u32 {
        self.two_digit_field(3)
    }

    pub fn seconds(&self) -> u32 {
        self.two_digit_field(6)
    }

    pub fn milliseconds(&self) -> u32 {
        let b = self.time_str.as_bytes();
        (b[9] - b'0') as u32 * 100 + (b[10] - b'0') as u32 * 10 + (b[11] - b'0') as u32
    }

    /// Seconds since midnight including the millisecond fraction.
    pub fn to_total_seconds(&self) -> f64 {
        f64::from(self.hours() * 3600 + self.minutes() * 60 + self.seconds())
            + f64::from(self.milliseconds()) / 1000.0
    }

    fn two_digit_field(&self, at: usize) -> u32 {
        let b = self.time_str.as_bytes();
        (b[at] - b'0') as u32 * 10 + (b[at + 1] - b'0') as u32
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.time_str)
    }
}

/// Checks the `HH:MM:SS` / `HH:MM:SS.mmm` shape and component ranges.
fn is_valid_time_code(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 8 && b.len() != 12 {
        return false;
    }
    let two_digits = |at: usize| b[at].is_ascii_digit() && b[at + 1].is_ascii_digit();
    if !(two_digits(0) && b[2] == b':' && two_digits(3) && b[5] == b':' && two_digits(6)) {
        return false;
    }
    if b.len() == 12 && (b[8] != b'.' || !b[9..12].iter().all(u8::is_ascii_digit)) {
        return false;
    }
    let field = |at: usize| (b[at] - b'0') as u32 * 10 + (b[at + 1] - b'0') as u32;
    field(0) <= 23 && field(3) <= 59 && field(6) <= 59
}

// ── Decoded message sum type ──────────────────────────────────────────────────

/// A fully decoded payload, one variant per message kind.
///
/// Pose and kinematics variants are keyed by resolved segment name. Point
/// positions are keyed by their packed numeric id, which lives in a separate
/// id space (see [`point_id`]) and has no name table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MvnMessage {
    PoseEuler(BTreeMap<String, SegmentEulerPose>),
    PoseQuaternion(BTreeMap<String, SegmentQuaternionPose>),
    PosePositions(BTreeMap<u32, PointPosition>),
    PoseUnity(BTreeMap<String, SegmentQuaternionPose>),
    MetaData(CharacterMetaData),
    ScaleInfo(ScaleInfo),
    JointAngles(Vec<JointAngle>),
    LinearKinematics(BTreeMap<String, LinearSegmentKinematics>),
    AngularKinematics(BTreeMap<String, AngularSegmentKinematics>),
    TrackerKinematics(BTreeMap<String, TrackerKinematics>),
    CenterOfMass(CenterOfMass),
    TimeCode(TimeCode),
}

impl MvnMessage {
    /// The kind this message was decoded from.
    pub fn kind(&self) -> MessageKind {
        match self {
            MvnMessage::PoseEuler(_) => MessageKind::PoseEuler,
            MvnMessage::PoseQuaternion(_) => MessageKind::PoseQuaternion,
            MvnMessage::PosePositions(_) => MessageKind::PosePositions,
            MvnMessage::PoseUnity(_) => MessageKind::PoseUnity,
            MvnMessage::MetaData(_) => MessageKind::MetaData,
            MvnMessage::ScaleInfo(_) => MessageKind::ScaleInfo,
            MvnMessage::JointAngles(_) => MessageKind::JointAngles,
            MvnMessage::LinearKinematics(_) => MessageKind::LinearKinematics,
            MvnMessage::AngularKinematics(_) => MessageKind::AngularKinematics,
            MvnMessage::TrackerKinematics(_) => MessageKind::TrackerKinematics,
            MvnMessage::CenterOfMass(_) => MessageKind::CenterOfMass,
            MvnMessage::TimeCode(_) => MessageKind::TimeCode,
        }
    }
}

// ── Point id helpers ──────────────────────────────────────────────────────────

/// Packed point-id arithmetic.
///
/// Joint-angle endpoints and kind 03 points use a global id space of
/// `256 * segment_id + local_point_id`.
pub mod point_id {
    /// Width of the per-segment local id range.
    pub const POINTS_PER_SEGMENT: u32 = 256;

    /// Packs a segment id and local point id into a global point id.
    pub fn pack(segment_id: u32, local_point_id: u32) -> u32 {
        segment_id * POINTS_PER_SEGMENT + local_point_id
    }

    /// The segment part of a packed point id.
    pub fn segment_of(packed: u32) -> u32 {
        packed / POINTS_PER_SEGMENT
    }

    /// The local part of a packed point id.
    pub fn local_of(packed: u32) -> u32 {
        packed % POINTS_PER_SEGMENT
    }
}

/// Flag bits carried by scale-info points.
pub mod point_flags {
    pub const CONTACT: u32 = 1 << 0;
    pub const FOOT_CONTACT: u32 = 1 << 1;
    pub const REJECTED: u32 = 1 << 2;
    pub const INTERPOLATED: u32 = 1 << 3;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
