//! Protocol module containing the envelopes, the payload codec and the wire codec.

pub mod codec;
pub mod messages;
pub mod payload;
mod value;

pub use codec::{
    decode_client_message, decode_server_message, encode_client_message, encode_server_message,
    ProtocolError,
};
pub use messages::*;
pub use payload::Payload;
