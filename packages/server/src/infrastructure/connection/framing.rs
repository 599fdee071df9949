//! Frame rules for text carried over the room.

use crate::domain::{Message, TransportError};

/// Validate and normalize an inbound text frame.
///
/// Line breaks become spaces and surrounding whitespace is trimmed, so every
/// broadcast is a single line.
pub fn decode_text_frame(text: &str, max_frame_bytes: usize) -> Result<Message, TransportError> {
    if text.len() > max_frame_bytes {
        return Err(TransportError::FrameTooLarge {
            size: text.len(),
            limit: max_frame_bytes,
        });
    }

    let single_line = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    Ok(Message::from(single_line.trim().to_string()))
}
