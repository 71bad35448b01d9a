//! Binary codec for decoding MVN network stream datagrams.
//!
//! Wire format:
//! ```text
//! [id_string:6][sample_counter:4][fragment_control:1][item_count:1]
//! [time_code:4][character_id:1][segments:1][props:1][fingers:1]
//! [reserved:2][payload_size:2][payload:N]
//! ```
//! Total header size: 24 bytes. All multi-byte integers and floats are
//! big-endian. The payload layout depends on the message-kind code carried
//! in the last two chars of the id string.

use std::collections::BTreeMap;

use tracing::warn;

use crate::error::MvnError;
use crate::protocol::messages::{
    AngularSegmentKinematics, CenterOfMass, CharacterMetaData, EulerAngles, JointAngle,
    LinearSegmentKinematics, MessageKind, MvnHeader, MvnMessage, PointPosition, Quaternion,
    ScaleInfo, ScalePoint, ScaleSegment, SegmentEulerPose, SegmentQuaternionPose, TimeCode,
    TrackerKinematics, Vector3, HEADER_SIZE, PROTOCOL_TAG,
};
use crate::segments::{SegmentRegistry, SegmentTable};

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes the 24-byte header from the beginning of `bytes`.
///
/// Returns the header and the number of bytes consumed so the caller can
/// slice off the payload.
///
/// # Errors
///
/// Returns [`MvnError::Parse`] when the buffer is too short or the id
/// string is not ASCII, and [`MvnError::Protocol`] when the id string does
/// not start with `MXTP`.
///
/// # Examples
///
/// ```rust
/// use mvn_core::protocol::{decode_header, encode_header};
/// use mvn_core::protocol::messages::{MvnHeader, HEADER_SIZE};
///
/// let header = MvnHeader {
///     id_string: "MXTP02".to_string(),
///     sample_counter: 7,
///     fragment_control: 0x80,
///     item_count: 23,
///     time_code: 40,
///     character_id: 0,
///     body_segment_count: 23,
///     prop_count: 0,
///     finger_segment_count: 0,
///     payload_size: 736,
/// };
/// let bytes = encode_header(&header).unwrap();
/// let (decoded, consumed) = decode_header(&bytes).unwrap();
/// assert_eq!(decoded, header);
/// assert_eq!(consumed, HEADER_SIZE);
/// ```
pub fn decode_header(bytes: &[u8]) -> Result<(MvnHeader, usize), MvnError> {
    if bytes.len() < HEADER_SIZE {
        return Err(MvnError::parse(
            "header",
            0,
            format!("need at least {HEADER_SIZE} bytes, got {}", bytes.len()),
        ));
    }

    let id_string = match std::str::from_utf8(&bytes[0..6]) {
        Ok(s) if s.is_ascii() => s.to_string(),
        _ => {
            return Err(MvnError::parse(
                "header",
                0,
                "id string is not ASCII".to_string(),
            ));
        }
    };
    if !id_string.as_bytes().starts_with(PROTOCOL_TAG) {
        return Err(MvnError::protocol(format!(
            "unrecognized protocol identifier {id_string:?}"
        )));
    }

    let header = MvnHeader {
        id_string,
        sample_counter: read_u32(bytes, 6),
        fragment_control: bytes[10],
        item_count: bytes[11],
        time_code: read_u32(bytes, 12),
        character_id: bytes[16],
        body_segment_count: bytes[17],
        prop_count: bytes[18],
        finger_segment_count: bytes[19],
        // bytes[20..22] are reserved – ignored on decode
        payload_size: read_u16(bytes, 22),
    };
    Ok((header, HEADER_SIZE))
}

/// Encodes a header into its 24-byte wire form with zeroed reserved bytes.
///
/// # Errors
///
/// Returns [`MvnError::Protocol`] when the id string is not exactly six
/// ASCII chars.
pub fn encode_header(header: &MvnHeader) -> Result<Vec<u8>, MvnError> {
    let id = header.id_string.as_bytes();
    if id.len() != 6 || !id.is_ascii() {
        return Err(MvnError::protocol(format!(
            "id string must be six ASCII chars, got {:?}",
            header.id_string
        )));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(id);
    buf.extend_from_slice(&header.sample_counter.to_be_bytes());
    buf.push(header.fragment_control);
    buf.push(header.item_count);
    buf.extend_from_slice(&header.time_code.to_be_bytes());
    buf.push(header.character_id);
    buf.push(header.body_segment_count);
    buf.push(header.prop_count);
    buf.push(header.finger_segment_count);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&header.payload_size.to_be_bytes());
    Ok(buf)
}

/// Decodes a reassembled payload according to its message kind.
///
/// `item_count` comes from the header and drives the fixed-stride kinds;
/// trailing bytes beyond the declared records are tolerated.
///
/// # Errors
///
/// Returns [`MvnError::Parse`] for truncated or malformed payloads and
/// [`MvnError::Segment`] for segment ids outside the skeleton.
pub fn decode_payload(
    kind: MessageKind,
    payload: &[u8],
    item_count: u8,
) -> Result<MvnMessage, MvnError> {
    match kind {
        MessageKind::PoseEuler => {
            decode_pose_euler(payload, item_count).map(MvnMessage::PoseEuler)
        }
        MessageKind::PoseQuaternion => {
            decode_quaternion_segments(payload, item_count, SegmentTable::Default, "quaternion pose")
                .map(MvnMessage::PoseQuaternion)
        }
        MessageKind::PosePositions => {
            decode_point_positions(payload, item_count).map(MvnMessage::PosePositions)
        }
        MessageKind::PoseUnity => {
            decode_quaternion_segments(payload, item_count, SegmentTable::Unity, "unity pose")
                .map(MvnMessage::PoseUnity)
        }
        MessageKind::MetaData => decode_meta_data(payload).map(MvnMessage::MetaData),
        MessageKind::ScaleInfo => decode_scale_info(payload).map(MvnMessage::ScaleInfo),
        MessageKind::JointAngles => {
            decode_joint_angles(payload, item_count).map(MvnMessage::JointAngles)
        }
        MessageKind::LinearKinematics => {
            decode_linear_kinematics(payload, item_count).map(MvnMessage::LinearKinematics)
        }
        MessageKind::AngularKinematics => {
            decode_angular_kinematics(payload, item_count).map(MvnMessage::AngularKinematics)
        }
        MessageKind::TrackerKinematics => {
            decode_tracker_kinematics(payload, item_count).map(MvnMessage::TrackerKinematics)
        }
        MessageKind::CenterOfMass => decode_center_of_mass(payload).map(MvnMessage::CenterOfMass),
        MessageKind::TimeCode => decode_time_code(payload).map(MvnMessage::TimeCode),
    }
}

// ── Per-kind decoders ─────────────────────────────────────────────────────────

fn decode_pose_euler(
    p: &[u8],
    item_count: u8,
) -> Result<BTreeMap<String, SegmentEulerPose>, MvnError> {
    // 4 (segment id) + 12 (position) + 12 (rotation) = 28
    const STRIDE: usize = 28;
    let mut segments = BTreeMap::new();
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, "euler pose")?;
        let segment_id = read_u32(p, offset);
        let name = SegmentRegistry::resolve_or_err(SegmentTable::Default, segment_id, "euler pose")?;
        segments.insert(
            name.to_string(),
            SegmentEulerPose {
                segment_id,
                position: read_vector3(p, offset + 4),
                rotation: read_euler(p, offset + 16),
            },
        );
        offset += STRIDE;
    }
    Ok(segments)
}

/// Shared by kinds 02 and 05, which differ only in the segment-name table.
fn decode_quaternion_segments(
    p: &[u8],
    item_count: u8,
    table: SegmentTable,
    data_kind: &'static str,
) -> Result<BTreeMap<String, SegmentQuaternionPose>, MvnError> {
    // 4 (segment id) + 12 (position) + 16 (quaternion) = 32
    const STRIDE: usize = 32;
    let mut segments = BTreeMap::new();
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, data_kind)?;
        let segment_id = read_u32(p, offset);
        let name = SegmentRegistry::resolve_or_err(table, segment_id, data_kind)?;
        segments.insert(
            name.to_string(),
            SegmentQuaternionPose {
                segment_id,
                position: read_vector3(p, offset + 4),
                orientation: read_quaternion(p, offset + 16),
            },
        );
        offset += STRIDE;
    }
    Ok(segments)
}

fn decode_point_positions(
    p: &[u8],
    item_count: u8,
) -> Result<BTreeMap<u32, PointPosition>, MvnError> {
    // 4 (point id) + 12 (position) = 16
    const STRIDE: usize = 16;
    let mut points = BTreeMap::new();
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, "point data")?;
        let point_id = read_u32(p, offset);
        points.insert(
            point_id,
            PointPosition {
                point_id,
                position: read_vector3(p, offset + 4),
            },
        );
        offset += STRIDE;
    }
    Ok(points)
}

fn decode_joint_angles(p: &[u8], item_count: u8) -> Result<Vec<JointAngle>, MvnError> {
    // 4 (parent) + 4 (child) + 12 (rotation) = 20
    const STRIDE: usize = 20;
    let mut joints = Vec::with_capacity(item_count as usize);
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, "joint angles")?;
        joints.push(JointAngle {
            parent_point_id: read_u32(p, offset),
            child_point_id: read_u32(p, offset + 4),
            rotation: read_euler(p, offset + 8),
        });
        offset += STRIDE;
    }
    Ok(joints)
}

fn decode_linear_kinematics(
    p: &[u8],
    item_count: u8,
) -> Result<BTreeMap<String, LinearSegmentKinematics>, MvnError> {
    // 4 (segment id) + 12 (position) + 12 (velocity) + 12 (acceleration) = 40
    const STRIDE: usize = 40;
    let mut segments = BTreeMap::new();
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, "linear kinematics")?;
        let segment_id = read_u32(p, offset);
        let name =
            SegmentRegistry::resolve_or_err(SegmentTable::Default, segment_id, "linear kinematics")?;
        segments.insert(
            name.to_string(),
            LinearSegmentKinematics {
                segment_id,
                position: read_vector3(p, offset + 4),
                velocity: read_vector3(p, offset + 16),
                acceleration: read_vector3(p, offset + 28),
            },
        );
        offset += STRIDE;
    }
    Ok(segments)
}

fn decode_angular_kinematics(
    p: &[u8],
    item_count: u8,
) -> Result<BTreeMap<String, AngularSegmentKinematics>, MvnError> {
    // 4 (segment id) + 16 (quaternion) + 12 (ang. velocity) + 12 (ang. acceleration) = 44
    const STRIDE: usize = 44;
    let mut segments = BTreeMap::new();
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, "angular kinematics")?;
        let segment_id = read_u32(p, offset);
        let name = SegmentRegistry::resolve_or_err(
            SegmentTable::Default,
            segment_id,
            "angular kinematics",
        )?;
        segments.insert(
            name.to_string(),
            AngularSegmentKinematics {
                segment_id,
                orientation: read_quaternion(p, offset + 4),
                angular_velocity: read_vector3(p, offset + 20),
                angular_acceleration: read_vector3(p, offset + 32),
            },
        );
        offset += STRIDE;
    }
    Ok(segments)
}

fn decode_tracker_kinematics(
    p: &[u8],
    item_count: u8,
) -> Result<BTreeMap<String, TrackerKinematics>, MvnError> {
    // 4 (tracker id) + 16 (quaternion) + 12 (free acc.) + 12 (magnetic field) = 44
    const STRIDE: usize = 44;
    let mut trackers = BTreeMap::new();
    let mut offset = 0;
    for _ in 0..item_count {
        require_len(p, offset, STRIDE, "tracker kinematics")?;
        let tracker_id = read_u32(p, offset);
        // Tracker ids are sensor serials, not skeleton ids; synthesize a
        // name when the id falls outside the segment tables.
        let name = match SegmentRegistry::resolve(SegmentTable::Default, tracker_id) {
            Some(known) => known.to_string(),
            None => format!("Tracker_{tracker_id}"),
        };
        trackers.insert(
            name,
            TrackerKinematics {
                tracker_id,
                orientation: read_quaternion(p, offset + 4),
                free_acceleration: read_vector3(p, offset + 20),
                magnetic_field: read_vector3(p, offset + 32),
            },
        );
        offset += STRIDE;
    }
    Ok(trackers)
}

fn decode_center_of_mass(p: &[u8]) -> Result<CenterOfMass, MvnError> {
    require_len(p, 0, 12, "center of mass")?;
    Ok(CenterOfMass {
        position: read_vector3(p, 0),
    })
}

fn decode_meta_data(p: &[u8]) -> Result<CharacterMetaData, MvnError> {
    let mut meta = CharacterMetaData::default();
    let mut offset = 0;
    while offset < p.len() {
        let (line, next) = read_prefixed_string(p, offset, "meta data")?;
        offset = next;
        match line.split_once(':') {
            Some((tag, value)) => {
                let value = value.trim().to_string();
                match tag.trim() {
                    "name" => meta.name = Some(value),
                    "xmid" => meta.xmid = Some(value),
                    "color" => meta.color = Some(value),
                    other => {
                        meta.additional_tags.insert(other.to_string(), value);
                    }
                }
            }
            None => warn!(line = %line, "skipping meta data line without a tag separator"),
        }
    }
    Ok(meta)
}

fn decode_scale_info(p: &[u8]) -> Result<ScaleInfo, MvnError> {
    let mut offset = 0;

    require_len(p, offset, 4, "scale info")?;
    let segment_count = read_u32(p, offset) as usize;
    offset += 4;

    // Counts come off the wire; cap the preallocation.
    let mut segments = Vec::with_capacity(segment_count.min(128));
    for _ in 0..segment_count {
        let (name, next) = read_prefixed_string(p, offset, "scale info")?;
        offset = next;
        require_len(p, offset, 12, "scale info")?;
        segments.push(ScaleSegment {
            name,
            origin: read_vector3(p, offset),
        });
        offset += 12;
    }

    require_len(p, offset, 4, "scale info")?;
    let point_count = read_u32(p, offset) as usize;
    offset += 4;

    let mut points = Vec::with_capacity(point_count.min(128));
    for _ in 0..point_count {
        require_len(p, offset, 4, "scale info")?;
        let segment_id = read_u16(p, offset);
        let point_id = read_u16(p, offset + 2);
        offset += 4;
        let (name, next) = read_prefixed_string(p, offset, "scale info")?;
        offset = next;
        require_len(p, offset, 16, "scale info")?;
        let flags = read_u32(p, offset);
        offset += 4;
        let position = read_vector3(p, offset);
        offset += 12;
        points.push(ScalePoint {
            segment_id,
            point_id,
            name,
            flags,
            position,
        });
    }

    Ok(ScaleInfo { segments, points })
}

/// Streams pad the time-code payload unpredictably, so the clock pattern is
/// scanned for at every offset rather than assumed at zero.
fn decode_time_code(p: &[u8]) -> Result<TimeCode, MvnError> {
    let start = (0..p.len().saturating_sub(7))
        .find(|&i| matches_clock_pattern(&p[i..]))
        .ok_or_else(|| {
            MvnError::parse(
                "time code",
                0,
                "no HH:MM:SS pattern in payload".to_string(),
            )
        })?;

    let tail = &p[start..];
    // Prefer the 12-byte HH:MM:SS.mmm form when it validates.
    if tail.len() >= 12 {
        if let Ok(text) = std::str::from_utf8(&tail[..12]) {
            if let Ok(time_code) = TimeCode::new(text) {
                return Ok(time_code);
            }
        }
    }
    match std::str::from_utf8(&tail[..8]) {
        Ok(text) => TimeCode::new(text),
        Err(_) => Err(MvnError::parse(
            "time code",
            start,
            "time code candidate is not ASCII".to_string(),
        )),
    }
}

fn matches_clock_pattern(b: &[u8]) -> bool {
    b.len() >= 8
        && b[0].is_ascii_digit()
        && b[1].is_ascii_digit()
        && b[2] == b':'
        && b[3].is_ascii_digit()
        && b[4].is_ascii_digit()
        && b[5] == b':'
        && b[6].is_ascii_digit()
        && b[7].is_ascii_digit()
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(
    p: &[u8],
    offset: usize,
    needed: usize,
    data_kind: &'static str,
) -> Result<(), MvnError> {
    let available = p.len().saturating_sub(offset);
    if available < needed {
        return Err(MvnError::parse(
            data_kind,
            offset,
            format!("need {needed} bytes, got {available}"),
        ));
    }
    Ok(())
}

fn read_u16(p: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([p[offset], p[offset + 1]])
}

fn read_u32(p: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([p[offset], p[offset + 1], p[offset + 2], p[offset + 3]])
}

fn read_f32(p: &[u8], offset: usize) -> f32 {
    f32::from_be_bytes([p[offset], p[offset + 1], p[offset + 2], p[offset + 3]])
}

fn read_vector3(p: &[u8], offset: usize) -> Vector3 {
    Vector3::new(
        read_f32(p, offset),
        read_f32(p, offset + 4),
        read_f32(p, offset + 8),
    )
}

fn read_quaternion(p: &[u8], offset: usize) -> Quaternion {
    Quaternion::new(
        read_f32(p, offset),
        read_f32(p, offset + 4),
        read_f32(p, offset + 8),
        read_f32(p, offset + 12),
    )
}

fn read_euler(p: &[u8], offset: usize) -> EulerAngles {
    EulerAngles::new(
        read_f32(p, offset),
        read_f32(p, offset + 4),
        read_f32(p, offset + 8),
    )
}

/// Reads a 4-byte big-endian length prefix and then that many UTF-8 bytes.
/// Returns the string and the offset of the byte after the string.
fn read_prefixed_string(
    p: &[u8],
    offset: usize,
    data_kind: &'static str,
) -> Result<(String, usize), MvnError> {
    require_len(p, offset, 4, data_kind)?;
    let len = read_u32(p, offset) as usize;
    let start = offset + 4;
    require_len(p, start, len, data_kind)?;
    let text = std::str::from_utf8(&p[start..start + len])
        .map_err(|e| MvnError::parse(data_kind, start, format!("invalid UTF-8 in string: {e}")))?
        .to_string();
    Ok((text, start + len))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::point_id;

    fn make_header(kind_code: &str) -> MvnHeader {
        MvnHeader {
            id_string: format!("MXTP{kind_code}"),
            sample_counter: 100,
            fragment_control: 0x80,
            item_count: 1,
            time_code: 40,
            character_id: 0,
            body_segment_count: 23,
            prop_count: 0,
            finger_segment_count: 0,
            payload_size: 28,
        }
    }

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_be_bytes());
    }

    fn push_f32(buf: &mut Vec<u8>, value: f32) {
        buf.extend_from_slice(&value.to_be_bytes());
    }

    fn push_string(buf: &mut Vec<u8>, text: &str) {
        push_u32(buf, text.len() as u32);
        buf.extend_from_slice(text.as_bytes());
    }

    fn push_floats(buf: &mut Vec<u8>, values: &[f32]) {
        for value in values {
            push_f32(buf, *value);
        }
    }

    /// One 32-byte quaternion pose record.
    fn quaternion_record(buf: &mut Vec<u8>, segment_id: u32) {
        push_u32(buf, segment_id);
        push_floats(buf, &[1.0, 2.0, 3.0]); // position
        push_floats(buf, &[1.0, 0.0, 0.0, 0.0]); // orientation
    }

    // ── Header ───────────────────────────────────────────────────────────────

    #[test]
    fn test_header_round_trip() {
        let header = make_header("02");
        let bytes = encode_header(&header).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let (decoded, consumed) = decode_header(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(consumed, HEADER_SIZE);
    }

    #[test]
    fn test_header_field_offsets_on_the_wire() {
        let mut header = make_header("21");
        header.sample_counter = 0x0102_0304;
        header.payload_size = 0xBEEF;
        let bytes = encode_header(&header).unwrap();

        assert_eq!(&bytes[0..6], b"MXTP21");
        assert_eq!(&bytes[6..10], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[20..22], &[0x00, 0x00], "reserved bytes must be zero");
        assert_eq!(&bytes[22..24], &[0xBE, 0xEF]);
    }

    #[test]
    fn test_decode_header_rejects_short_buffer() {
        let result = decode_header(&[0x4D, 0x58]); // only 2 bytes
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "header", .. })));
    }

    #[test]
    fn test_decode_header_rejects_non_ascii_id() {
        let mut bytes = encode_header(&make_header("02")).unwrap();
        bytes[5] = 0xFF;
        let result = decode_header(&bytes);
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "header", .. })));
    }

    #[test]
    fn test_decode_header_rejects_wrong_protocol_tag() {
        let mut bytes = encode_header(&make_header("02")).unwrap();
        bytes[0..4].copy_from_slice(b"XSNS");
        let result = decode_header(&bytes);
        assert!(matches!(result, Err(MvnError::Protocol { .. })));
    }

    #[test]
    fn test_encode_header_rejects_bad_id_string() {
        let mut header = make_header("02");
        header.id_string = "MXTP".to_string();
        assert!(matches!(encode_header(&header), Err(MvnError::Protocol { .. })));
    }

    // ── Euler pose (01) ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_pose_euler_single_segment() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0); // Pelvis
        push_floats(&mut payload, &[1.5, 2.5, 3.5]);
        push_floats(&mut payload, &[10.0, 20.0, 30.0]);

        let segments = decode_pose_euler(&payload, 1).unwrap();
        let pelvis = &segments["Pelvis"];
        assert_eq!(pelvis.segment_id, 0);
        assert_eq!(pelvis.position, Vector3::new(1.5, 2.5, 3.5));
        assert_eq!(pelvis.rotation, EulerAngles::new(10.0, 20.0, 30.0));
    }

    #[test]
    fn test_decode_pose_euler_prop_segment() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 23);
        push_floats(&mut payload, &[0.0; 6]);

        let segments = decode_pose_euler(&payload, 1).unwrap();
        assert!(segments.contains_key("Prop1"), "id 23 resolves as a prop, not a finger");
    }

    #[test]
    fn test_decode_pose_euler_tolerates_trailing_bytes() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0);
        push_floats(&mut payload, &[0.0; 6]);
        payload.extend_from_slice(&[0xAA; 5]);

        let segments = decode_pose_euler(&payload, 1).unwrap();
        assert_eq!(segments.len(), 1);
    }

    // ── Quaternion pose (02) and Unity pose (05) ─────────────────────────────

    #[test]
    fn test_decode_pose_quaternion_multiple_segments() {
        let mut payload = Vec::new();
        quaternion_record(&mut payload, 0);
        quaternion_record(&mut payload, 4); // T8 in the default table

        let segments =
            decode_quaternion_segments(&payload, 2, SegmentTable::Default, "quaternion pose")
                .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments["Pelvis"].orientation, Quaternion::identity());
        assert!(segments.contains_key("T8"));
    }

    #[test]
    fn test_decode_pose_quaternion_unknown_segment_id() {
        let mut payload = Vec::new();
        quaternion_record(&mut payload, 99);

        let result =
            decode_quaternion_segments(&payload, 1, SegmentTable::Default, "quaternion pose");
        assert_eq!(
            result.unwrap_err(),
            MvnError::Segment {
                segment_id: 99,
                data_kind: "quaternion pose",
            }
        );
    }

    #[test]
    fn test_decode_pose_quaternion_truncated_record() {
        let mut payload = Vec::new();
        quaternion_record(&mut payload, 0);
        payload.truncate(40); // second record cut short

        let result =
            decode_quaternion_segments(&payload, 2, SegmentTable::Default, "quaternion pose");
        assert!(matches!(
            result,
            Err(MvnError::Parse { data_kind: "quaternion pose", offset: 32, .. })
        ));
    }

    #[test]
    fn test_decode_pose_unity_uses_unity_table() {
        let mut payload = Vec::new();
        quaternion_record(&mut payload, 1);

        let segments =
            decode_quaternion_segments(&payload, 1, SegmentTable::Unity, "unity pose").unwrap();
        assert!(
            segments.contains_key("Right Upper Leg"),
            "unity id 1 maps differently from the default table"
        );
    }

    #[test]
    fn test_decode_pose_unity_finger_id_falls_back_to_finger_table() {
        let mut payload = Vec::new();
        quaternion_record(&mut payload, 23);

        let segments =
            decode_quaternion_segments(&payload, 1, SegmentTable::Unity, "unity pose").unwrap();
        assert!(segments.contains_key("Left Carpus"));
    }

    // ── Point positions (03) ─────────────────────────────────────────────────

    #[test]
    fn test_decode_point_positions_keyed_by_packed_id() {
        let packed = point_id::pack(4, 2);
        let mut payload = Vec::new();
        push_u32(&mut payload, packed);
        push_floats(&mut payload, &[0.1, 0.2, 0.3]);

        let points = decode_point_positions(&payload, 1).unwrap();
        let point = &points[&packed];
        assert_eq!(point.point_id, packed);
        assert_eq!(point_id::segment_of(point.point_id), 4);
        assert_eq!(point_id::local_of(point.point_id), 2);
    }

    // ── Joint angles (20) ────────────────────────────────────────────────────

    #[test]
    fn test_decode_joint_angles() {
        let mut payload = Vec::new();
        push_u32(&mut payload, point_id::pack(4, 2));
        push_u32(&mut payload, point_id::pack(5, 0));
        push_floats(&mut payload, &[1.0, -2.0, 3.0]);

        let joints = decode_joint_angles(&payload, 1).unwrap();
        assert_eq!(joints.len(), 1);
        assert_eq!(joints[0].parent_point_id, point_id::pack(4, 2));
        assert_eq!(joints[0].child_point_id, point_id::pack(5, 0));
        assert_eq!(joints[0].rotation, EulerAngles::new(1.0, -2.0, 3.0));
    }

    // ── Linear and angular kinematics (21, 22) ───────────────────────────────

    #[test]
    fn test_decode_linear_kinematics() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 7); // Right Shoulder
        push_floats(&mut payload, &[1.0, 2.0, 3.0]);
        push_floats(&mut payload, &[4.0, 5.0, 6.0]);
        push_floats(&mut payload, &[7.0, 8.0, 9.0]);

        let segments = decode_linear_kinematics(&payload, 1).unwrap();
        let shoulder = &segments["Right Shoulder"];
        assert_eq!(shoulder.velocity, Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(shoulder.acceleration, Vector3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn test_decode_linear_kinematics_truncated_second_record() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0);
        push_floats(&mut payload, &[0.0; 9]);

        let result = decode_linear_kinematics(&payload, 2);
        assert!(matches!(
            result,
            Err(MvnError::Parse { data_kind: "linear kinematics", offset: 40, .. })
        ));
    }

    #[test]
    fn test_decode_angular_kinematics() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0);
        push_floats(&mut payload, &[1.0, 0.0, 0.0, 0.0]);
        push_floats(&mut payload, &[0.5, 0.6, 0.7]);
        push_floats(&mut payload, &[-0.1, -0.2, -0.3]);

        let segments = decode_angular_kinematics(&payload, 1).unwrap();
        let pelvis = &segments["Pelvis"];
        assert_eq!(pelvis.orientation, Quaternion::identity());
        assert_eq!(pelvis.angular_velocity, Vector3::new(0.5, 0.6, 0.7));
        assert_eq!(pelvis.angular_acceleration, Vector3::new(-0.1, -0.2, -0.3));
    }

    // ── Tracker kinematics (23) ──────────────────────────────────────────────

    #[test]
    fn test_decode_tracker_kinematics_known_and_unknown_ids() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0);
        push_floats(&mut payload, &[1.0, 0.0, 0.0, 0.0]);
        push_floats(&mut payload, &[0.0; 6]);
        push_u32(&mut payload, 1000);
        push_floats(&mut payload, &[1.0, 0.0, 0.0, 0.0]);
        push_floats(&mut payload, &[0.0; 6]);

        let trackers = decode_tracker_kinematics(&payload, 2).unwrap();
        assert!(trackers.contains_key("Pelvis"));
        assert!(trackers.contains_key("Tracker_1000"));
    }

    // ── Center of mass (24) ──────────────────────────────────────────────────

    #[test]
    fn test_decode_center_of_mass() {
        let mut payload = Vec::new();
        push_floats(&mut payload, &[0.0, 0.1, 0.95]);

        let com = decode_center_of_mass(&payload).unwrap();
        assert_eq!(com.position, Vector3::new(0.0, 0.1, 0.95));
    }

    #[test]
    fn test_decode_center_of_mass_rejects_short_payload() {
        let result = decode_center_of_mass(&[0u8; 11]);
        assert!(matches!(
            result,
            Err(MvnError::Parse { data_kind: "center of mass", .. })
        ));
    }

    // ── Meta data (12) ───────────────────────────────────────────────────────

    #[test]
    fn test_decode_meta_data_known_and_extra_tags() {
        let mut payload = Vec::new();
        push_string(&mut payload, "name: Suit A");
        push_string(&mut payload, "xmid: XM-0042");
        push_string(&mut payload, "rig: atlas"); // no dedicated field

        let meta = decode_meta_data(&payload).unwrap();
        assert_eq!(meta.name.as_deref(), Some("Suit A"));
        assert_eq!(meta.xmid.as_deref(), Some("XM-0042"));
        assert_eq!(meta.color, None);
        assert_eq!(meta.additional_tags["rig"], "atlas");
    }

    #[test]
    fn test_decode_meta_data_skips_line_without_separator() {
        let mut payload = Vec::new();
        push_string(&mut payload, "not a tag line");
        push_string(&mut payload, "color: #00FF00");

        let meta = decode_meta_data(&payload).unwrap();
        assert_eq!(meta.color.as_deref(), Some("#00FF00"));
        assert!(meta.additional_tags.is_empty());
    }

    #[test]
    fn test_decode_meta_data_rejects_overlong_string_prefix() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 100); // declares more bytes than exist
        payload.extend_from_slice(b"short");

        let result = decode_meta_data(&payload);
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "meta data", .. })));
    }

    #[test]
    fn test_decode_meta_data_rejects_invalid_utf8() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 2);
        payload.extend_from_slice(&[0xFF, 0xFE]);

        let result = decode_meta_data(&payload);
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "meta data", .. })));
    }

    // ── Scale info (13) ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_scale_info() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 1); // segment count
        push_string(&mut payload, "Pelvis");
        push_floats(&mut payload, &[0.0, 0.0, 1.0]);
        push_u32(&mut payload, 2); // point count
        for (segment_id, point_id, name) in [(0u16, 1u16, "pHipOrigin"), (4, 2, "pL5SpinalAxis")] {
            payload.extend_from_slice(&segment_id.to_be_bytes());
            payload.extend_from_slice(&point_id.to_be_bytes());
            push_string(&mut payload, name);
            push_u32(&mut payload, crate::protocol::messages::point_flags::CONTACT);
            push_floats(&mut payload, &[0.1, 0.2, 0.3]);
        }

        let info = decode_scale_info(&payload).unwrap();
        assert_eq!(info.segments.len(), 1);
        assert_eq!(info.segments[0].name, "Pelvis");
        assert_eq!(info.segments[0].origin, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(info.points.len(), 2);
        assert_eq!(info.points[1].segment_id, 4);
        assert_eq!(info.points[1].point_id, 2);
        assert_eq!(info.points[1].name, "pL5SpinalAxis");
    }

    #[test]
    fn test_decode_scale_info_empty_counts() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0);
        push_u32(&mut payload, 0);

        let info = decode_scale_info(&payload).unwrap();
        assert!(info.segments.is_empty());
        assert!(info.points.is_empty());
    }

    #[test]
    fn test_decode_scale_info_truncated_point() {
        let mut payload = Vec::new();
        push_u32(&mut payload, 0);
        push_u32(&mut payload, 1);
        payload.extend_from_slice(&0u16.to_be_bytes()); // point entry cut short

        let result = decode_scale_info(&payload);
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "scale info", .. })));
    }

    // ── Time code (25) ───────────────────────────────────────────────────────

    #[test]
    fn test_decode_time_code_full_form_after_padding() {
        let mut payload = vec![0x00, 0x01, 0x02, 0x03];
        payload.extend_from_slice(b"12:34:56.789");

        let time_code = decode_time_code(&payload).unwrap();
        assert_eq!(time_code.as_str(), "12:34:56.789");
    }

    #[test]
    fn test_decode_time_code_short_form_with_null_padding() {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"23:59:59");
        payload.extend_from_slice(&[0x00; 4]);

        let time_code = decode_time_code(&payload).unwrap();
        assert_eq!(time_code.as_str(), "23:59:59.000");
    }

    #[test]
    fn test_decode_time_code_without_pattern() {
        let result = decode_time_code(b"no clock here");
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "time code", .. })));
    }

    #[test]
    fn test_decode_time_code_out_of_range_components() {
        let result = decode_time_code(b"99:88:77");
        assert!(matches!(result, Err(MvnError::Parse { data_kind: "time code", .. })));
    }

    // ── Dispatcher ───────────────────────────────────────────────────────────

    #[test]
    fn test_decode_payload_dispatches_by_kind() {
        let mut com_payload = Vec::new();
        push_floats(&mut com_payload, &[1.0, 2.0, 3.0]);
        let decoded = decode_payload(MessageKind::CenterOfMass, &com_payload, 1).unwrap();
        assert!(matches!(decoded, MvnMessage::CenterOfMass(_)));

        let decoded = decode_payload(MessageKind::TimeCode, b"01:02:03.004", 1).unwrap();
        match decoded {
            MvnMessage::TimeCode(tc) => assert_eq!(tc.as_str(), "01:02:03.004"),
            other => panic!("expected a time code, got {other:?}"),
        }
    }
}
