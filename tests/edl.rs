//! Edit decision list parsing tests.

use std::io::Write;

use shotlens::edl::{DEFAULT_FRAME_RATE, DROP_FRAME_RATE, rate_for_max_frame};
use shotlens::{EdlCutList, EdlError};

const TWO_EVENTS: &str = "\
TITLE: REEL ONE
FCM: NON-DROP FRAME

001  AX       V     C        01:00:00:00 01:00:04:12 01:00:00:00 01:00:04:12
* FROM CLIP NAME: opening.mov
002  AX       V     C        01:00:10:00 01:00:12:00 01:00:04:12 01:00:06:12
* FROM CLIP NAME: street.mov
";

fn approx(actual: &[f64], expected: &[f64]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, b)| (a - b).abs() < 1e-9)
}

// ── Frame rate inference ───────────────────────────────────────────

#[test]
fn rate_tiers_follow_largest_frame_field() {
    assert_eq!(rate_for_max_frame(0), 24.0);
    assert_eq!(rate_for_max_frame(23), 24.0);
    assert_eq!(rate_for_max_frame(24), 25.0);
    assert_eq!(rate_for_max_frame(25), 30.0);
    assert_eq!(rate_for_max_frame(29), 30.0);
    assert_eq!(rate_for_max_frame(30), 50.0);
    assert_eq!(rate_for_max_frame(49), 50.0);
    assert_eq!(rate_for_max_frame(50), 60.0);
    assert_eq!(rate_for_max_frame(59), 60.0);
}

#[test]
fn default_rate_when_frames_stay_small() {
    let list = EdlCutList::parse(TWO_EVENTS.as_bytes()).unwrap();
    assert_eq!(list.frame_rate, DEFAULT_FRAME_RATE);
    assert!(!list.drop_frame);
}

#[test]
fn frame_field_of_26_means_30_fps() {
    let edl = "001  AX  V  C  01:00:00:00 01:00:01:26 01:00:00:00 01:00:01:26\n";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert_eq!(list.frame_rate, 30.0);
    assert!(approx(&list.cuts, &[0.0, 1.0 + 26.0 / 30.0]));
}

#[test]
fn frame_field_of_31_means_50_fps() {
    let edl = "001  AX  V  C  00:00:00:00 00:00:02:31 00:00:00:00 00:00:02:31\n";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert_eq!(list.frame_rate, 50.0);
    assert!(approx(&list.cuts, &[0.0, 2.0 + 31.0 / 50.0]));
}

#[test]
fn frame_field_of_10_keeps_24_fps() {
    let edl = "001  AX  V  C  00:00:00:00 00:00:03:10 00:00:00:00 00:00:03:10\n";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert_eq!(list.frame_rate, 24.0);
    assert!(approx(&list.cuts, &[0.0, 3.0 + 10.0 / 24.0]));
}

#[test]
fn drop_frame_header_selects_29_97() {
    let edl = "\
TITLE: NEWS
FCM: DROP FRAME
001  AX  V  C  00:00:00;00 00:00:01;29 00:00:00;00 00:00:01;29
";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert!(list.drop_frame);
    // A frame field of 29 would suggest 30 fps; 29.97 is kept.
    assert_eq!(list.frame_rate, DROP_FRAME_RATE);
    assert!(approx(&list.cuts, &[0.0, 1.0 + 29.0 / 29.97]));
}

#[test]
fn non_drop_header_is_not_drop_frame() {
    for header in ["FCM: NON-DROP FRAME", "FCM: NON DROP FRAME", "fcm: non-drop frame"] {
        let edl = format!("{header}\n001  AX  V  C  00:00:00:00 00:00:01:00 00:00:00:00 00:00:01:00\n");
        let list = EdlCutList::parse(edl.as_bytes()).unwrap();
        assert!(!list.drop_frame, "{header}");
    }
}

// ── Cut extraction ─────────────────────────────────────────────────

#[test]
fn cuts_are_relative_to_first_record_in() {
    let list = EdlCutList::parse(TWO_EVENTS.as_bytes()).unwrap();
    assert_eq!(list.event_count, 2);
    // 4:12 at 24 fps is 4.5 s; the second event's record-in duplicates it.
    assert!(approx(&list.cuts, &[0.0, 4.5, 6.5]));
}

#[test]
fn cuts_are_sorted_and_strictly_increasing() {
    let edl = "\
003  AX  V  C  00:00:20:00 00:00:22:00 00:00:08:00 00:00:10:00
001  AX  V  C  00:00:00:00 00:00:05:00 00:00:02:00 00:00:07:00
002  AX  V  C  00:00:10:00 00:00:11:00 00:00:07:00 00:00:08:00
";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    // Origin is the first event line's record-in (8 s); earlier times are dropped.
    assert!(approx(&list.cuts, &[0.0, 2.0]));
    assert!(list.cuts.windows(2).all(|pair| pair[1] - pair[0] > 0.001));
}

#[test]
fn shared_boundaries_are_merged() {
    let edl = "\
001  AX  V  C  00:00:00:00 00:00:01:00 00:00:00:00 00:00:01:00
002  AX  V  C  00:00:01:00 00:00:02:00 00:00:01:00 00:00:02:00
";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert_eq!(list.event_count, 2);
    assert!(approx(&list.cuts, &[0.0, 1.0, 2.0]));
}

#[test]
fn dotted_timecodes_are_not_timecodes() {
    let edl = format!("{TWO_EVENTS}M2   AX       050.0                01:00:00.100\n");
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert_eq!(list.frame_rate, DEFAULT_FRAME_RATE);
    assert_eq!(list.event_count, 2);

    let dotted = "001  AX  V  C  00:00:00.00 00:00:01.00 00:00:00.00 00:00:01.00\n";
    assert!(matches!(
        EdlCutList::parse(dotted.as_bytes()),
        Err(EdlError::NoEvents)
    ));
}

#[test]
fn three_digit_frame_fields_are_not_timecodes() {
    let edl = "001  AX  V  C  00:00:00:000 00:00:01:000 00:00:00:000 00:00:01:000\n";
    assert!(matches!(EdlCutList::parse(edl.as_bytes()), Err(EdlError::NoEvents)));
}

#[test]
fn transitions_and_comments_are_handled() {
    let edl = "\
TITLE: DISSOLVES
* a comment line mentioning 00:00:09:00 00:00:09:10 00:00:09:00 00:00:09:10
001  AX  V  C        00:00:00:00 00:00:03:00 00:00:00:00 00:00:03:00
002  AX  V  D  012   00:00:03:00 00:00:06:00 00:00:03:00 00:00:06:00
M2   AX       025.0                00:00:03:00
";
    let list = EdlCutList::parse(edl.as_bytes()).unwrap();
    assert_eq!(list.event_count, 2);
    assert!(approx(&list.cuts, &[0.0, 3.0, 6.0]));
}

#[test]
fn parsing_is_idempotent() {
    let first = EdlCutList::parse(TWO_EVENTS.as_bytes()).unwrap();
    let second = EdlCutList::parse(TWO_EVENTS.as_bytes()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn crlf_and_invalid_utf8_are_tolerated() {
    let mut bytes = b"TITLE: \xff\xfe\r\n".to_vec();
    bytes.extend_from_slice(b"001  AX  V  C  00:00:00:00 00:00:02:00 00:00:00:00 00:00:02:00\r\n");
    let list = EdlCutList::parse(&bytes).unwrap();
    assert!(approx(&list.cuts, &[0.0, 2.0]));
}

// ── Errors ─────────────────────────────────────────────────────────

#[test]
fn text_without_events_is_rejected() {
    let result = EdlCutList::parse(b"TITLE: EMPTY\nFCM: NON-DROP FRAME\n\nnot an edl at all\n");
    assert!(matches!(result, Err(EdlError::NoEvents)));
    assert!(matches!(EdlCutList::parse(b""), Err(EdlError::NoEvents)));
}

#[test]
fn missing_file_is_an_io_error() {
    let result = EdlCutList::from_path("/nonexistent/cut.edl");
    assert!(matches!(result, Err(EdlError::Io(_))));
}

#[test]
fn from_path_reads_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TWO_EVENTS.as_bytes()).unwrap();
    let list = EdlCutList::from_path(file.path()).unwrap();
    assert_eq!(list.event_count, 2);
    assert!(approx(&list.cuts, &[0.0, 4.5, 6.5]));
}
