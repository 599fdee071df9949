//! HTTP API response DTOs.

use agora_shared::time::millis_to_rfc3339;
use serde::{Deserialize, Serialize};

use crate::domain::PeerSnapshot;

/// One member of the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub peer_id: String,
    /// RFC 3339, UTC
    pub joined_at: String,
}

/// Response of `GET /api/room`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStateDto {
    pub count: usize,
    pub members: Vec<MemberDto>,
}

impl From<PeerSnapshot> for MemberDto {
    fn from(snapshot: PeerSnapshot) -> Self {
        Self {
            peer_id: snapshot.peer_id.to_string(),
            joined_at: millis_to_rfc3339(snapshot.joined_at),
        }
    }
}

impl From<Vec<PeerSnapshot>> for RoomStateDto {
    fn from(members: Vec<PeerSnapshot>) -> Self {
        let members: Vec<MemberDto> = members.into_iter().map(MemberDto::from).collect();
        Self {
            count: members.len(),
            members,
        }
    }
}
