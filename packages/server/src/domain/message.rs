//! Broadcast payload.

use bytes::{BufMut, Bytes, BytesMut};

/// Separator placed between coalesced messages in a single outbound frame.
pub const COALESCE_DELIMITER: u8 = b'\n';

/// An opaque, immutable message.
///
/// Cloning is cheap (reference counted), so fan-out to many peers never
/// copies the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(Bytes);

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self(payload.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `first` and every message in `rest` into one payload, separated
    /// by [`COALESCE_DELIMITER`].
    ///
    /// Returns `first` untouched when `rest` is empty.
    pub fn coalesce(first: Message, rest: Vec<Message>) -> Message {
        if rest.is_empty() {
            return first;
        }

        let capacity = rest.iter().map(|m| m.len() + 1).sum::<usize>() + first.len();
        let mut buf = BytesMut::with_capacity(capacity);
        buf.put_slice(first.as_bytes());
        for message in rest {
            buf.put_u8(COALESCE_DELIMITER);
            buf.put_slice(message.as_bytes());
        }
        Message(buf.freeze())
    }
}

impl From<&'static str> for Message {
    fn from(value: &'static str) -> Self {
        Self(Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Vec<u8>> for Message {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}
