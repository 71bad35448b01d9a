//! Integration tests for the mvn-core decode pipeline.
//!
//! These tests drive whole datagrams through the public API the way a
//! receiver would: header decode, fragment reassembly, then payload decode
//! into typed messages.

use mvn_core::protocol::{
    decode_header, decode_payload, encode_header,
    messages::{pack_fragment_control, MessageKind, MvnHeader, MvnMessage, Vector3},
    ReassemblyTracker,
};
use mvn_core::MvnError;

/// Builds a complete wire datagram for the given kind code and payload.
fn make_datagram(
    kind_code: &str,
    sample_counter: u32,
    fragment_control: u8,
    item_count: u8,
    payload: &[u8],
) -> Vec<u8> {
    let header = MvnHeader {
        id_string: format!("MXTP{kind_code}"),
        sample_counter,
        fragment_control,
        item_count,
        time_code: 0,
        character_id: 0,
        body_segment_count: 23,
        prop_count: 0,
        finger_segment_count: 0,
        payload_size: payload.len() as u16,
    };
    let mut datagram = encode_header(&header).expect("header must encode");
    datagram.extend_from_slice(payload);
    datagram
}

/// Runs one datagram through header decode, reassembly, and payload decode.
fn decode_datagram(tracker: &mut ReassemblyTracker, datagram: &[u8]) -> Result<Option<MvnMessage>, MvnError> {
    let (header, consumed) = decode_header(datagram)?;
    let Some(complete) = tracker.submit(&header, &datagram[consumed..])? else {
        return Ok(None);
    };
    let kind = header.kind().expect("test datagrams use decodable kinds");
    decode_payload(kind, &complete, header.item_count).map(Some)
}

fn quaternion_record(payload: &mut Vec<u8>, segment_id: u32, position: [f32; 3], orientation: [f32; 4]) {
    payload.extend_from_slice(&segment_id.to_be_bytes());
    for component in position {
        payload.extend_from_slice(&component.to_be_bytes());
    }
    for component in orientation {
        payload.extend_from_slice(&component.to_be_bytes());
    }
}

#[test]
fn test_quaternion_pose_datagram_decodes_exact_values() {
    let mut payload = Vec::new();
    quaternion_record(&mut payload, 0, [1.25, -2.5, 0.125], [0.7071, 0.0, 0.7071, 0.0]);

    let datagram = make_datagram("02", 42, pack_fragment_control(0, true), 1, &payload);
    let mut tracker = ReassemblyTracker::default();

    let message = decode_datagram(&mut tracker, &datagram)
        .expect("datagram must decode")
        .expect("single datagram completes immediately");

    let MvnMessage::PoseQuaternion(segments) = message else {
        panic!("expected a quaternion pose");
    };
    let pelvis = &segments["Pelvis"];
    assert_eq!(pelvis.segment_id, 0);
    assert_eq!(pelvis.position, Vector3::new(1.25, -2.5, 0.125));
    assert_eq!(pelvis.orientation.w, 0.7071);
    assert_eq!(pelvis.orientation.y, 0.7071);
}

#[test]
fn test_euler_pose_resolves_body_prop_and_finger_names() {
    let mut payload = Vec::new();
    for segment_id in [0u32, 23, 27, 47] {
        payload.extend_from_slice(&segment_id.to_be_bytes());
        for _ in 0..6 {
            payload.extend_from_slice(&0.0f32.to_be_bytes());
        }
    }

    let datagram = make_datagram("01", 1, pack_fragment_control(0, true), 4, &payload);
    let mut tracker = ReassemblyTracker::default();

    let message = decode_datagram(&mut tracker, &datagram).unwrap().unwrap();
    let MvnMessage::PoseEuler(segments) = message else {
        panic!("expected an euler pose");
    };
    assert!(segments.contains_key("Pelvis"));
    assert!(segments.contains_key("Prop1"));
    assert!(segments.contains_key("Left Carpus"));
    assert!(segments.contains_key("Right Carpus"));
}

#[test]
fn test_fragmented_message_matches_unfragmented_decode() {
    // A metadata payload large enough to be worth splitting.
    let mut payload = Vec::new();
    for line in ["name: Integration Character", "xmid: XM-1999", "color: #336699"] {
        payload.extend_from_slice(&(line.len() as u32).to_be_bytes());
        payload.extend_from_slice(line.as_bytes());
    }

    let whole = decode_payload(MessageKind::MetaData, &payload, 0).unwrap();

    // Split into three fragments on arbitrary boundaries.
    let cuts = [payload.len() / 3, 2 * payload.len() / 3];
    let parts = [
        &payload[..cuts[0]],
        &payload[cuts[0]..cuts[1]],
        &payload[cuts[1]..],
    ];

    let mut tracker = ReassemblyTracker::default();
    let mut decoded = None;
    for (index, part) in parts.iter().enumerate() {
        let is_final = index == parts.len() - 1;
        let header = MvnHeader {
            id_string: "MXTP12".to_string(),
            sample_counter: 7,
            fragment_control: pack_fragment_control(index as u8, is_final),
            item_count: 0,
            time_code: 0,
            character_id: 0,
            body_segment_count: 23,
            prop_count: 0,
            finger_segment_count: 0,
            payload_size: part.len() as u16,
        };
        if let Some(complete) = tracker.submit(&header, part).unwrap() {
            decoded = Some(decode_payload(MessageKind::MetaData, &complete, 0).unwrap());
        }
    }

    assert_eq!(decoded.expect("final fragment completes the message"), whole);
}

#[test]
fn test_interleaved_characters_reassemble_independently() {
    let mut tracker = ReassemblyTracker::default();

    let mut submit = |character_id: u8, index: u8, is_final: bool, part: &[u8]| {
        let header = MvnHeader {
            id_string: "MXTP12".to_string(),
            sample_counter: 11,
            fragment_control: pack_fragment_control(index, is_final),
            item_count: 0,
            time_code: 0,
            character_id,
            body_segment_count: 23,
            prop_count: 0,
            finger_segment_count: 0,
            payload_size: part.len() as u16,
        };
        tracker.submit(&header, part).unwrap()
    };

    let line = |text: &str| {
        let mut buf = (text.len() as u32).to_be_bytes().to_vec();
        buf.extend_from_slice(text.as_bytes());
        buf
    };
    let line_a = line("name: Character A");
    let line_b = line("name: Character B");

    assert_eq!(submit(0, 0, false, &line_a[..8]), None);
    assert_eq!(submit(1, 0, false, &line_b[..8]), None);

    let complete_b = submit(1, 1, true, &line_b[8..]).expect("character 1 completes");
    let complete_a = submit(0, 1, true, &line_a[8..]).expect("character 0 completes");

    let meta_a = decode_payload(MessageKind::MetaData, &complete_a, 0).unwrap();
    let meta_b = decode_payload(MessageKind::MetaData, &complete_b, 0).unwrap();
    match (meta_a, meta_b) {
        (MvnMessage::MetaData(a), MvnMessage::MetaData(b)) => {
            assert_eq!(a.name.as_deref(), Some("Character A"));
            assert_eq!(b.name.as_deref(), Some("Character B"));
        }
        other => panic!("expected metadata messages, got {other:?}"),
    }
}

#[test]
fn test_malformed_datagram_does_not_poison_the_next_one() {
    let mut tracker = ReassemblyTracker::default();

    let mut bad = make_datagram("24", 1, pack_fragment_control(0, true), 1, &1.0f32.to_be_bytes());
    bad[0..4].copy_from_slice(b"JUNK");
    let err = decode_datagram(&mut tracker, &bad).unwrap_err();
    assert!(matches!(err, MvnError::Protocol { .. }));

    let mut payload = Vec::new();
    for component in [0.0f32, 0.0, 0.9] {
        payload.extend_from_slice(&component.to_be_bytes());
    }
    let good = make_datagram("24", 2, pack_fragment_control(0, true), 1, &payload);
    let message = decode_datagram(&mut tracker, &good).unwrap().unwrap();
    assert_eq!(message.kind(), MessageKind::CenterOfMass);
}

#[test]
fn test_deprecated_kind_header_decodes_without_a_payload_decoder() {
    let datagram = make_datagram("04", 9, pack_fragment_control(0, true), 0, &[]);
    let (header, _) = decode_header(&datagram).unwrap();

    assert_eq!(header.kind(), None);
    assert!(MessageKind::is_deprecated_code(header.kind_code()));
}

#[test]
fn test_time_code_datagram_normalizes_short_form() {
    let datagram = make_datagram("25", 3, pack_fragment_control(0, true), 1, b"09:08:07");
    let mut tracker = ReassemblyTracker::default();

    let message = decode_datagram(&mut tracker, &datagram).unwrap().unwrap();
    let MvnMessage::TimeCode(time_code) = message else {
        panic!("expected a time code");
    };
    assert_eq!(time_code.as_str(), "09:08:07.000");
    assert_eq!(time_code.seconds(), 7);
}
