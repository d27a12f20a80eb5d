//! The polymorphic message payload and its codec.
//!
//! # Why decoding is best-effort (for beginners)
//!
//! The `PAYL` field of an envelope carries no type tag: a frame, an input
//! event and a directory listing are all just MessagePack values.  The
//! receiver therefore *guesses* the shape by trying each known decoder in a
//! fixed priority order and keeping the first one that accepts the value:
//!
//! ```text
//! 1. InputEvent     map with integer `src` and boolean `dwn`
//! 2. Frame          binary blob of exactly 3 × LIGHTHOUSE_SIZE bytes
//! 3. DirectoryTree  map whose values are all nil or nested trees
//! 4. Path           array of strings (LINK / UNLINK source)
//! 5. Empty          anything else, including nil and absent
//! ```
//!
//! Encoding is the exact opposite: it is exhaustive and never fails, because
//! every variant has exactly one wire shape.
//!
//! The asymmetry is what lets a newer server send payload shapes an older
//! client does not recognise without breaking envelope decoding: unknown
//! shapes simply come out as [`Payload::Empty`].

use rmpv::Value;
use tracing::trace;

use crate::domain::directory::{DirectoryTree, Entry};
use crate::domain::display::Frame;
use crate::domain::input::InputEvent;
use crate::protocol::value::{as_string_vec, map_get, string_map, string_vec_value};

/// Wire keys of an [`InputEvent`].
mod input_keys {
    pub const SOURCE: &str = "src";
    pub const KEY: &str = "key";
    pub const BUTTON: &str = "btn";
    pub const IS_DOWN: &str = "dwn";
}

/// A message payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// A full display frame (raw RGB pixel buffer).
    Frame(Frame),
    /// A key/controller event from the web interface.
    InputEvent(InputEvent),
    /// A directory listing, the response to `LIST`.
    DirectoryTree(DirectoryTree),
    /// A path, the source of a `LINK` or `UNLINK` request.
    Path(Vec<String>),
    /// No payload, or one whose shape is not recognised.
    #[default]
    Empty,
}

impl Payload {
    /// Converts the payload to its generic MessagePack value.
    pub fn encode(&self) -> Value {
        match self {
            Payload::Frame(frame) => Value::Binary(frame.to_bytes()),
            Payload::InputEvent(event) => encode_input_event(event),
            Payload::DirectoryTree(tree) => encode_directory_tree(tree),
            Payload::Path(path) => string_vec_value(path),
            Payload::Empty => Value::Nil,
        }
    }

    /// Recovers a payload from a generic MessagePack value.
    ///
    /// Never fails: a value that matches none of the known shapes decodes to
    /// [`Payload::Empty`].
    pub fn decode(value: &Value) -> Payload {
        for (name, decoder) in DECODERS {
            if let Some(payload) = decoder(value) {
                trace!("payload decoded as {name}");
                return payload;
            }
        }
        Payload::Empty
    }

    /// Returns the frame if this payload is one.
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Payload::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Returns the input event if this payload is one.
    pub fn as_input_event(&self) -> Option<&InputEvent> {
        match self {
            Payload::InputEvent(event) => Some(event),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}

impl From<Frame> for Payload {
    fn from(frame: Frame) -> Self {
        Payload::Frame(frame)
    }
}

impl From<InputEvent> for Payload {
    fn from(event: InputEvent) -> Self {
        Payload::InputEvent(event)
    }
}

impl From<DirectoryTree> for Payload {
    fn from(tree: DirectoryTree) -> Self {
        Payload::DirectoryTree(tree)
    }
}

// ── Ordered decoder table ─────────────────────────────────────────────────────

type Decoder = fn(&Value) -> Option<Payload>;

/// The decoders tried by [`Payload::decode`], highest priority first.
const DECODERS: [(&str, Decoder); 4] = [
    ("input event", input_event_payload),
    ("frame", frame_payload),
    ("directory tree", directory_tree_payload),
    ("path", path_payload),
];

fn input_event_payload(value: &Value) -> Option<Payload> {
    decode_input_event(value).map(Payload::InputEvent)
}

fn frame_payload(value: &Value) -> Option<Payload> {
    decode_frame(value).map(Payload::Frame)
}

fn directory_tree_payload(value: &Value) -> Option<Payload> {
    decode_directory_tree(value).map(Payload::DirectoryTree)
}

fn path_payload(value: &Value) -> Option<Payload> {
    as_string_vec(value).map(Payload::Path)
}

// ── Per-shape encoders/decoders ───────────────────────────────────────────────

fn encode_input_event(event: &InputEvent) -> Value {
    let mut entries = vec![(input_keys::SOURCE, Value::from(event.source))];
    if let Some(key) = event.key {
        entries.push((input_keys::KEY, Value::from(key)));
    }
    if let Some(button) = event.button {
        entries.push((input_keys::BUTTON, Value::from(button)));
    }
    entries.push((input_keys::IS_DOWN, Value::from(event.is_down)));
    string_map(entries)
}

fn decode_input_event(value: &Value) -> Option<InputEvent> {
    let map = value.as_map()?;
    let source = map_get(map, input_keys::SOURCE)?.as_i64()?;
    let is_down = map_get(map, input_keys::IS_DOWN)?.as_bool()?;
    Some(InputEvent {
        source,
        key: optional_i64(map, input_keys::KEY)?,
        button: optional_i64(map, input_keys::BUTTON)?,
        is_down,
    })
}

/// `Some(None)` when absent or nil, `Some(Some(n))` for an integer, `None`
/// (shape mismatch) for anything else.
fn optional_i64(map: &[(Value, Value)], key: &str) -> Option<Option<i64>> {
    match map_get(map, key) {
        None | Some(Value::Nil) => Some(None),
        Some(v) => v.as_i64().map(Some),
    }
}

fn decode_frame(value: &Value) -> Option<Frame> {
    match value {
        Value::Binary(bytes) => Frame::from_bytes(bytes).ok(),
        _ => None,
    }
}

fn encode_directory_tree(tree: &DirectoryTree) -> Value {
    Value::Map(
        tree.iter()
            .map(|(name, entry)| {
                let value = match entry {
                    Entry::Resource => Value::Nil,
                    Entry::Directory(child) => encode_directory_tree(child),
                };
                (Value::from(name.as_str()), value)
            })
            .collect(),
    )
}

fn decode_directory_tree(value: &Value) -> Option<DirectoryTree> {
    value
        .as_map()?
        .iter()
        .map(|(name, entry)| {
            let name = name.as_str()?.to_owned();
            let entry = match entry {
                Value::Nil => Entry::Resource,
                other => Entry::Directory(decode_directory_tree(other)?),
            };
            Some((name, entry))
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::display::{Color, FRAME_BYTES};

    fn round_trip(payload: &Payload) -> Payload {
        Payload::decode(&payload.encode())
    }

    #[test]
    fn test_frame_round_trip() {
        let mut frame = Frame::fill(Color::MAGENTA);
        frame.set(3, 4, Color::YELLOW);
        let payload = Payload::Frame(frame);

        assert_eq!(round_trip(&payload), payload);
    }

    #[test]
    fn test_frame_encodes_as_binary_blob() {
        let value = Payload::Frame(Frame::default()).encode();
        assert!(matches!(value, Value::Binary(ref b) if b.len() == FRAME_BYTES));
    }

    #[test]
    fn test_input_event_round_trip_with_and_without_optionals() {
        let key = Payload::InputEvent(InputEvent::key(1, 65, true));
        let button = Payload::InputEvent(InputEvent::button(2, 7, false));
        let bare = Payload::InputEvent(InputEvent {
            source: 0,
            key: None,
            button: None,
            is_down: false,
        });

        assert_eq!(round_trip(&key), key);
        assert_eq!(round_trip(&button), button);
        assert_eq!(round_trip(&bare), bare);
    }

    #[test]
    fn test_input_event_omits_absent_optionals() {
        let value = Payload::InputEvent(InputEvent::key(1, 65, true)).encode();
        let map = value.as_map().unwrap();

        assert!(map_get(map, "btn").is_none());
        assert_eq!(map_get(map, "key"), Some(&Value::from(65)));
    }

    #[test]
    fn test_directory_tree_round_trip() {
        let trees = [
            DirectoryTree::new(),
            DirectoryTree::new().with("a", Entry::Resource),
            DirectoryTree::new().with(
                "user",
                DirectoryTree::new()
                    .with("alice", DirectoryTree::new().with("model", Entry::Resource))
                    .with("empty", DirectoryTree::new()),
            ),
        ];
        for tree in trees {
            let payload = Payload::DirectoryTree(tree);
            assert_eq!(round_trip(&payload), payload);
        }
    }

    #[test]
    fn test_path_round_trip() {
        let payload = Payload::Path(vec!["user".into(), "bob".into(), "model".into()]);
        assert_eq!(round_trip(&payload), payload);
    }

    #[test]
    fn test_empty_encodes_as_nil() {
        assert_eq!(Payload::Empty.encode(), Value::Nil);
        assert_eq!(Payload::decode(&Value::Nil), Payload::Empty);
    }

    #[test]
    fn test_unrecognised_shapes_decode_to_empty() {
        let shapes = [
            Value::from(42),
            Value::from("hello"),
            Value::from(true),
            Value::F64(1.5),
            Value::Binary(vec![1, 2, 3]),
            Value::Array(vec![Value::from(1)]),
            // Map with a value that is neither nil nor a map: not a tree,
            // and missing `src`/`dwn`: not an input event.
            Value::Map(vec![(Value::from("x"), Value::from(1))]),
        ];
        for shape in shapes {
            assert_eq!(Payload::decode(&shape), Payload::Empty, "shape {shape:?}");
        }
    }

    #[test]
    fn test_wrong_length_binary_is_not_a_frame() {
        let value = Value::Binary(vec![0u8; FRAME_BYTES - 3]);
        assert_eq!(Payload::decode(&value), Payload::Empty);
    }

    #[test]
    fn test_input_event_takes_priority_over_directory_tree() {
        // `src`/`dwn` are not nil or maps, so this is not a tree either way;
        // the nil `key` must not make it fall through.
        let value = Value::Map(vec![
            (Value::from("src"), Value::from(1)),
            (Value::from("dwn"), Value::from(true)),
            (Value::from("key"), Value::Nil),
        ]);

        assert_eq!(
            Payload::decode(&value),
            Payload::InputEvent(InputEvent {
                source: 1,
                key: None,
                button: None,
                is_down: true,
            })
        );
    }

    #[test]
    fn test_empty_map_decodes_as_empty_directory() {
        let value = Value::Map(Vec::new());
        assert_eq!(
            Payload::decode(&value),
            Payload::DirectoryTree(DirectoryTree::new())
        );
    }
}
