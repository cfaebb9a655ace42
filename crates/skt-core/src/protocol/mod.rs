//! Protocol module containing the reply vocabulary and the line codec.

pub mod codec;
pub mod messages;
pub mod sequence;

pub use codec::{decode_reply, encode_line, ProtocolError};
pub use messages::*;
pub use sequence::MessageCounter;
