//! Room hub: the single coordinator of membership and fan-out.
//!
//! The hub runs as one task that owns the membership map outright. Join,
//! leave and broadcast requests arrive as commands on one bounded intake
//! channel and are applied strictly one at a time, in arrival order, so the
//! map is never shared and needs no lock. Everything else in the process
//! talks to the hub through a cloneable [`RoomHandle`].

use std::collections::HashMap;

use agora_shared::time::now_millis;
use async_trait::async_trait;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::domain::{
    Delivery, HubError, Message, MessageSink, OutboundQueue, Peer, PeerId, PeerSnapshot,
};

/// Default capacity of each peer's outbound queue.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Default capacity of the hub's intake channel.
pub const DEFAULT_INTAKE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Pending messages a peer may accumulate before it is evicted.
    pub outbound_capacity: usize,
    /// Requests that may wait for the hub before senders are suspended.
    pub intake_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            intake_capacity: DEFAULT_INTAKE_CAPACITY,
        }
    }
}

#[derive(Debug)]
enum HubCommand {
    Join(Peer),
    Leave(PeerId),
    Broadcast(Message),
    Members(oneshot::Sender<Vec<PeerSnapshot>>),
}

/// Why a peer stopped being a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Left,
    /// Outbound queue was full at broadcast time.
    Evicted,
    /// Outbound loop already gone.
    Abandoned,
}

/// A joined peer and when the hub admitted it.
#[derive(Debug)]
struct Member {
    peer: Peer,
    joined_at: i64,
    /// Position in join order; breaks ties between equal timestamps.
    seq: u64,
}

/// Owner of the membership set.
#[derive(Debug)]
pub struct RoomHub {
    members: HashMap<PeerId, Member>,
    joins: u64,
    intake: mpsc::Receiver<HubCommand>,
}

impl RoomHub {
    /// Create a hub and the handle used to reach it.
    ///
    /// The hub does nothing until [`RoomHub::run`] is polled.
    pub fn new(config: HubConfig) -> (RoomHub, RoomHandle) {
        let (tx, rx) = mpsc::channel(config.intake_capacity.max(1));
        let hub = RoomHub {
            members: HashMap::new(),
            joins: 0,
            intake: rx,
        };
        let handle = RoomHandle {
            intake: tx,
            outbound_capacity: config.outbound_capacity.max(1),
        };
        (hub, handle)
    }

    /// Create a hub and run it on its own task.
    pub fn spawn(config: HubConfig) -> (RoomHandle, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Process commands until every [`RoomHandle`] has been dropped.
    pub async fn run(mut self) {
        tracing::info!("room hub started");
        while let Some(command) = self.intake.recv().await {
            self.handle(command);
        }
        tracing::info!(remaining = self.members.len(), "room hub stopped");
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Join(peer) => self.join(peer),
            HubCommand::Leave(peer_id) => {
                self.remove(peer_id, Removal::Left);
            }
            HubCommand::Broadcast(message) => self.broadcast(message),
            HubCommand::Members(reply) => {
                // requester may have given up waiting
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn join(&mut self, peer: Peer) {
        let peer_id = peer.id();
        let member = Member {
            peer,
            joined_at: now_millis(),
            seq: self.joins,
        };
        self.joins += 1;
        if self.members.insert(peer_id, member).is_some() {
            tracing::warn!(peer = %peer_id, "peer joined twice, replacing previous entry");
        }
        tracing::info!(peer = %peer_id, members = self.members.len(), "peer joined");
    }

    /// Remove a member, dropping its `Peer` and thereby closing its queue.
    ///
    /// Returns `false` when the peer was not a member.
    fn remove(&mut self, peer_id: PeerId, reason: Removal) -> bool {
        let Some(member) = self.members.remove(&peer_id) else {
            tracing::debug!(peer = %peer_id, "leave for non-member ignored");
            return false;
        };
        drop(member);

        match reason {
            Removal::Left => {
                tracing::info!(peer = %peer_id, members = self.members.len(), "peer left")
            }
            Removal::Evicted => tracing::warn!(
                peer = %peer_id,
                members = self.members.len(),
                "peer evicted: outbound queue full"
            ),
            Removal::Abandoned => tracing::info!(
                peer = %peer_id,
                members = self.members.len(),
                "peer removed: outbound loop gone"
            ),
        }
        true
    }

    fn broadcast(&mut self, message: Message) {
        let mut dropped = Vec::new();
        for (peer_id, member) in &self.members {
            match member.peer.try_deliver(message.clone()) {
                Delivery::Queued => {}
                Delivery::Full => dropped.push((*peer_id, Removal::Evicted)),
                Delivery::Closed => dropped.push((*peer_id, Removal::Abandoned)),
            }
        }
        tracing::debug!(
            bytes = message.len(),
            recipients = self.members.len() - dropped.len(),
            "broadcast"
        );

        for (peer_id, reason) in dropped {
            self.remove(peer_id, reason);
        }
    }

    fn snapshot(&self) -> Vec<PeerSnapshot> {
        let mut members: Vec<&Member> = self.members.values().collect();
        members.sort_by_key(|m| m.seq);
        members
            .into_iter()
            .map(|m| PeerSnapshot {
                peer_id: m.peer.id(),
                joined_at: m.joined_at,
            })
            .collect()
    }
}

/// Cloneable entry point to a running [`RoomHub`].
#[derive(Debug, Clone)]
pub struct RoomHandle {
    intake: mpsc::Sender<HubCommand>,
    outbound_capacity: usize,
}

impl RoomHandle {
    /// Create a peer whose outbound queue has the hub's configured capacity.
    pub fn new_peer(&self) -> (Peer, OutboundQueue) {
        Peer::new(self.outbound_capacity)
    }

    /// Current members, ordered by join time.
    pub async fn members(&self) -> Result<Vec<PeerSnapshot>, HubError> {
        let (reply, response) = oneshot::channel();
        self.submit(HubCommand::Members(reply)).await?;
        response.await.map_err(|_| HubError::Closed)
    }

    async fn submit(&self, command: HubCommand) -> Result<(), HubError> {
        self.intake.send(command).await.map_err(|_| HubError::Closed)
    }
}

#[async_trait]
impl MessageSink for RoomHandle {
    async fn join(&self, peer: Peer) -> Result<(), HubError> {
        self.submit(HubCommand::Join(peer)).await
    }

    async fn leave(&self, peer_id: PeerId) -> Result<(), HubError> {
        self.submit(HubCommand::Leave(peer_id)).await
    }

    async fn broadcast(&self, message: Message) -> Result<(), HubError> {
        self.submit(HubCommand::Broadcast(message)).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn member_ids(hub: &RoomHub) -> HashSet<PeerId> {
        hub.members.keys().copied().collect()
    }

    fn config_with_capacity(outbound_capacity: usize) -> HubConfig {
        HubConfig {
            outbound_capacity,
            ..HubConfig::default()
        }
    }

    #[test]
    fn test_membership_tracks_join_and_leave_sequence() {
        // given:
        let (mut hub, handle) = RoomHub::new(HubConfig::default());
        let (a, _qa) = handle.new_peer();
        let (b, _qb) = handle.new_peer();
        let (c, _qc) = handle.new_peer();
        let (a_id, b_id, c_id) = (a.id(), b.id(), c.id());

        // when:
        hub.handle(HubCommand::Join(a));
        hub.handle(HubCommand::Join(b));
        hub.handle(HubCommand::Leave(a_id));
        hub.handle(HubCommand::Join(c));
        hub.handle(HubCommand::Broadcast(Message::from("ping")));

        // then:
        assert_eq!(member_ids(&hub), HashSet::from([b_id, c_id]));
    }

    #[test]
    fn test_leave_for_non_member_is_noop() {
        // given:
        let (mut hub, handle) = RoomHub::new(HubConfig::default());
        let (member, _member_queue) = handle.new_peer();
        let member_id = member.id();
        hub.handle(HubCommand::Join(member));
        let (stranger, _stranger_queue) = handle.new_peer();

        // when:
        let removed = hub.remove(stranger.id(), Removal::Left);

        // then: membership unchanged and the stranger's queue still open
        assert!(!removed);
        assert_eq!(member_ids(&hub), HashSet::from([member_id]));
        assert_eq!(stranger.try_deliver(Message::from("x")), Delivery::Queued);
    }

    #[tokio::test]
    async fn test_leave_closes_queue_once() {
        // given:
        let (mut hub, handle) = RoomHub::new(HubConfig::default());
        let (peer, mut queue) = handle.new_peer();
        let peer_id = peer.id();
        hub.handle(HubCommand::Join(peer));

        // when: the leave is delivered twice
        hub.handle(HubCommand::Leave(peer_id));
        hub.handle(HubCommand::Leave(peer_id));

        // then:
        assert!(hub.members.is_empty());
        assert_eq!(queue.recv().await, None);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_member_including_sender() {
        // given: A and B joined; A is the sender
        let (handle, _task) = RoomHub::spawn(HubConfig::default());
        let (a, mut qa) = handle.new_peer();
        let (b, mut qb) = handle.new_peer();
        handle.join(a).await.unwrap();
        handle.join(b).await.unwrap();

        // when:
        handle.broadcast(Message::from("hello")).await.unwrap();

        // then:
        assert_eq!(qa.recv().await, Some(Message::from("hello")));
        assert_eq!(qb.recv().await, Some(Message::from("hello")));
    }

    #[tokio::test]
    async fn test_member_receives_broadcasts_in_order() {
        // given:
        let (handle, _task) = RoomHub::spawn(HubConfig::default());
        let (peer, mut queue) = handle.new_peer();
        handle.join(peer).await.unwrap();

        // when:
        for i in 0..10 {
            handle.broadcast(Message::from(format!("m{i}"))).await.unwrap();
        }

        // then:
        for i in 0..10 {
            assert_eq!(queue.recv().await, Some(Message::from(format!("m{i}"))));
        }
    }

    #[tokio::test]
    async fn test_broadcast_before_join_is_not_delivered() {
        // given:
        let (handle, _task) = RoomHub::spawn(HubConfig::default());
        let (peer, mut queue) = handle.new_peer();

        // when:
        handle.broadcast(Message::from("early")).await.unwrap();
        handle.join(peer).await.unwrap();
        handle.broadcast(Message::from("late")).await.unwrap();

        // then:
        assert_eq!(queue.recv().await, Some(Message::from("late")));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_after_leave_reaches_only_remaining_peer() {
        // given: two peers joined, one leaves
        let (handle, _task) = RoomHub::spawn(HubConfig::default());
        let (stays, mut stays_queue) = handle.new_peer();
        let (goes, mut goes_queue) = handle.new_peer();
        let (stays_id, goes_id) = (stays.id(), goes.id());
        handle.join(stays).await.unwrap();
        handle.join(goes).await.unwrap();
        handle.leave(goes_id).await.unwrap();

        // when:
        handle.broadcast(Message::from("after")).await.unwrap();

        // then:
        assert_eq!(stays_queue.recv().await, Some(Message::from("after")));
        assert_eq!(goes_queue.recv().await, None);
        let members = handle.members().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].peer_id, stays_id);
    }

    #[tokio::test]
    async fn test_full_queue_is_evicted_by_the_next_broadcast() {
        // given: C never drains; A drains after every broadcast
        let capacity = 256;
        let (handle, _task) = RoomHub::spawn(config_with_capacity(capacity));
        let (a, mut qa) = handle.new_peer();
        let (c, mut qc) = handle.new_peer();
        let (a_id, c_id) = (a.id(), c.id());
        handle.join(a).await.unwrap();
        handle.join(c).await.unwrap();
        for i in 0..capacity {
            handle.broadcast(Message::from(format!("{i}"))).await.unwrap();
            assert!(qa.recv().await.is_some());
        }
        assert_eq!(qc.len(), capacity);

        // when:
        handle.broadcast(Message::from("overflow")).await.unwrap();

        // then: C is gone, A got the message
        assert_eq!(qa.recv().await, Some(Message::from("overflow")));
        let ids: Vec<PeerId> = handle
            .members()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.peer_id)
            .collect();
        assert_eq!(ids, vec![a_id]);
        assert!(!ids.contains(&c_id));

        // and C's queue yields exactly what was queued, then closes
        let mut received = 0;
        while let Some(message) = qc.recv().await {
            assert_ne!(message, Message::from("overflow"));
            received += 1;
        }
        assert_eq!(received, capacity);
    }

    #[tokio::test]
    async fn test_later_broadcasts_never_reach_evicted_peer() {
        // given: capacity of one, never drained
        let (handle, _task) = RoomHub::spawn(config_with_capacity(1));
        let (slow, mut slow_queue) = handle.new_peer();
        handle.join(slow).await.unwrap();
        handle.broadcast(Message::from("first")).await.unwrap();

        // when:
        handle.broadcast(Message::from("second")).await.unwrap();
        handle.broadcast(Message::from("third")).await.unwrap();

        // then:
        assert_eq!(slow_queue.recv().await, Some(Message::from("first")));
        assert_eq!(slow_queue.recv().await, None);
        assert!(handle.members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_peer_with_dropped_queue_is_removed_on_broadcast() {
        // given:
        let (handle, _task) = RoomHub::spawn(HubConfig::default());
        let (peer, queue) = handle.new_peer();
        handle.join(peer).await.unwrap();
        drop(queue);

        // when:
        handle.broadcast(Message::from("anyone?")).await.unwrap();

        // then:
        assert!(handle.members().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_members_are_ordered_by_join_not_creation() {
        // given: created first, joined last
        let (handle, _task) = RoomHub::spawn(HubConfig::default());
        let (created_first, _q1) = handle.new_peer();
        let (created_second, _q2) = handle.new_peer();
        let (first_id, second_id) = (created_first.id(), created_second.id());

        // when:
        handle.join(created_second).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        handle.join(created_first).await.unwrap();

        // then:
        let members = handle.members().await.unwrap();
        let ids: Vec<PeerId> = members.iter().map(|m| m.peer_id).collect();
        assert_eq!(ids, vec![second_id, first_id]);
        assert!(members[0].joined_at < members[1].joined_at);
    }

    #[test]
    fn test_join_time_is_stamped_when_hub_applies_join() {
        // given: a peer created well before it joins
        let (mut hub, handle) = RoomHub::new(HubConfig::default());
        let (peer, _queue) = handle.new_peer();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let before_join = now_millis();

        // when:
        hub.handle(HubCommand::Join(peer));

        // then:
        let members = hub.snapshot();
        assert_eq!(members.len(), 1);
        assert!(members[0].joined_at >= before_join);
    }

    #[tokio::test]
    async fn test_hub_stops_when_all_handles_dropped() {
        // given:
        let (handle, task) = RoomHub::spawn(HubConfig::default());
        let (peer, mut queue) = handle.new_peer();
        handle.join(peer).await.unwrap();

        // when:
        drop(handle);

        // then: the task ends and members' queues close with it
        task.await.unwrap();
        assert_eq!(queue.recv().await, None);
    }

    #[tokio::test]
    async fn test_handle_reports_closed_hub() {
        // given:
        let (hub, handle) = RoomHub::new(HubConfig::default());
        drop(hub);

        // when:
        let result = handle.broadcast(Message::from("void")).await;

        // then:
        assert_eq!(result, Err(HubError::Closed));
        assert_eq!(handle.members().await, Err(HubError::Closed));
    }
}
