//! Property-based tests for frames and payloads using proptest.
//!
//! These check the codec laws across randomly generated values rather than a
//! handful of hand-picked ones.

use lighthouse_core::domain::display::FRAME_BYTES;
use lighthouse_core::{DirectoryTree, Entry, Frame, InputEvent, Payload};
use proptest::prelude::*;

/// Directory entries nested up to four levels deep.
fn entry() -> impl Strategy<Value = Entry> {
    Just(Entry::Resource).prop_recursive(4, 64, 4, |inner| {
        prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
            .prop_map(|children| Entry::Directory(children.into_iter().collect()))
    })
}

fn directory_tree() -> impl Strategy<Value = DirectoryTree> {
    prop::collection::btree_map("[a-z0-9_]{1,12}", entry(), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

fn input_event() -> impl Strategy<Value = InputEvent> {
    (
        any::<i64>(),
        proptest::option::of(any::<i64>()),
        proptest::option::of(any::<i64>()),
        any::<bool>(),
    )
        .prop_map(|(source, key, button, is_down)| InputEvent {
            source,
            key,
            button,
            is_down,
        })
}

// Property: any full-size byte buffer is a frame and converts back unchanged
proptest! {
    #[test]
    fn prop_frame_bytes_roundtrip(bytes in prop::collection::vec(any::<u8>(), FRAME_BYTES)) {
        let frame = Frame::from_bytes(&bytes).expect("full-size buffer must be a frame");

        prop_assert_eq!(frame.to_bytes(), bytes);
        prop_assert_eq!(Payload::decode(&Payload::Frame(frame.clone()).encode()), Payload::Frame(frame));
    }
}

// Property: every other length is rejected
proptest! {
    #[test]
    fn prop_wrong_length_is_never_a_frame(
        bytes in prop::collection::vec(any::<u8>(), 0..2 * FRAME_BYTES)
            .prop_filter("full-size buffers are valid", |b| b.len() != FRAME_BYTES)
    ) {
        prop_assert!(Frame::from_bytes(&bytes).is_err());
    }
}

// Property: directory trees survive the payload codec
proptest! {
    #[test]
    fn prop_directory_tree_roundtrip(tree in directory_tree()) {
        let payload = Payload::DirectoryTree(tree);

        prop_assert_eq!(Payload::decode(&payload.encode()), payload);
    }
}

// Property: input events survive the payload codec, with or without optionals
proptest! {
    #[test]
    fn prop_input_event_roundtrip(event in input_event()) {
        let payload = Payload::InputEvent(event);

        prop_assert_eq!(Payload::decode(&payload.encode()), payload);
    }
}
