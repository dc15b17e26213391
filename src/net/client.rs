//! The peer client: one connection, message (de)serialization, typed events.
//!
//! The client owns at most one connection to exactly one peer. The host
//! implements [`Connection`] over its transport and forwards the
//! transport's lifecycle callbacks (`on_open`, `on_data`, `on_closed`,
//! `on_remote_stream`). Inbound messages replace the remote player state
//! wholesale and are surfaced as typed [`PeerEvent`]s on an internal queue;
//! the orchestrator drains the queue each tick with
//! [`PeerClient::poll_event`].
//!
//! The client does not interpret business meaning beyond the four request
//! kinds: what an event *does* is the turn orchestrator's concern.

use std::collections::VecDeque;

use tracing::debug;

use super::protocol::{Envelope, RequestKind};
use crate::state::Player;

/// Errors from the peer client.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// A send was attempted with no active connection.
    #[error("no active peer connection")]
    NotConnected,

    /// A protocol message could not be encoded.
    #[error("failed to encode protocol message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A live, ordered, reliable message channel to one peer.
///
/// Implemented by the host over its transport. `send` takes an encoded
/// protocol message; delivery is assumed reliable, so it does not fail.
pub trait Connection {
    /// Transmit one encoded message to the peer.
    fn send(&mut self, payload: &str);

    /// Close the channel.
    fn close(&mut self);
}

/// Typed events surfaced by the client, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum PeerEvent {
    /// A connection to a peer is established.
    Connected,
    /// The transport reported closure.
    Disconnected,
    /// The peer's media stream became available.
    RemoteStreamAvailable,
    /// Our outgoing battle request has been transmitted.
    BattleRequestSent,
    /// The peer asked us for a battle.
    BattleRequestReceived(Player),
    /// We accepted the peer's battle request (local decision; the match
    /// starts with us defending).
    AcceptedPeerRequest,
    /// The peer accepted our battle request (the match starts with us
    /// attacking).
    PeerAcceptedRequest(Player),
    /// The peer cast a spell; their player state carries it.
    PeerCastSpell(Player),
    /// The peer finished their defend phase.
    TurnOver(Player),
}

/// Connection lifecycle and protocol endpoint for one peer.
#[derive(Default)]
pub struct PeerClient {
    connection: Option<Box<dyn Connection>>,
    events: VecDeque<PeerEvent>,
}

impl PeerClient {
    /// Create a client with no connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a connection is active.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Take the next queued event, if any.
    pub fn poll_event(&mut self) -> Option<PeerEvent> {
        self.events.pop_front()
    }

    /// Adopt an outgoing connection to a peer.
    ///
    /// Any existing connection is closed first. The battle request is not
    /// sent until the transport reports the link open via
    /// [`PeerClient::on_open`].
    pub fn connect(&mut self, connection: Box<dyn Connection>) {
        if self.is_connected() {
            self.disconnect();
        }
        self.connection = Some(connection);
    }

    /// Offer an inbound connection attempt.
    ///
    /// Rejected outright (the offered connection is closed, no event) if a
    /// connection is already active: first come, first served. Returns
    /// whether the connection was adopted.
    pub fn accept_incoming(&mut self, mut connection: Box<dyn Connection>) -> bool {
        if self.is_connected() {
            debug!("rejecting inbound connection, peer already connected");
            connection.close();
            return false;
        }

        self.connection = Some(connection);
        self.events.push_back(PeerEvent::Connected);
        true
    }

    /// The transport reports an outgoing connection is open.
    ///
    /// Sends the battle request carrying the local player's state.
    pub fn on_open(&mut self, local_player: &Player) -> Result<(), NetError> {
        self.events.push_back(PeerEvent::Connected);
        self.send(&Envelope::new(RequestKind::BattleRequest, local_player))?;
        self.events.push_back(PeerEvent::BattleRequestSent);
        Ok(())
    }

    /// The transport delivered a message from the peer.
    ///
    /// Malformed payloads and unrecognized request kinds are dropped
    /// without an event.
    pub fn on_data(&mut self, payload: &str) {
        let envelope = match Envelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(error) => {
                debug!(%error, "dropping malformed peer message");
                return;
            }
        };

        let event = match envelope.request {
            RequestKind::BattleRequest => PeerEvent::BattleRequestReceived(envelope.player),
            RequestKind::BattleAccepted => PeerEvent::PeerAcceptedRequest(envelope.player),
            RequestKind::CastSpell => PeerEvent::PeerCastSpell(envelope.player),
            RequestKind::TurnOver => PeerEvent::TurnOver(envelope.player),
        };
        self.events.push_back(event);
    }

    /// The transport reported closure.
    pub fn on_closed(&mut self) {
        self.connection = None;
        self.events.push_back(PeerEvent::Disconnected);
    }

    /// The peer's media stream became available.
    pub fn on_remote_stream(&mut self) {
        self.events.push_back(PeerEvent::RemoteStreamAvailable);
    }

    /// Accept the most recently received battle request.
    pub fn accept_battle(&mut self, local_player: &Player) -> Result<(), NetError> {
        self.send(&Envelope::new(RequestKind::BattleAccepted, local_player))?;
        self.events.push_back(PeerEvent::AcceptedPeerRequest);
        Ok(())
    }

    /// Decline the most recently received battle request by disconnecting.
    pub fn decline_battle(&mut self) {
        self.disconnect();
    }

    /// Announce the spell cast in the completed attack phase.
    pub fn send_cast_spell(&mut self, local_player: &Player) -> Result<(), NetError> {
        self.send(&Envelope::new(RequestKind::CastSpell, local_player))
    }

    /// Announce completion of the defend phase.
    pub fn send_turn_over(&mut self, local_player: &Player) -> Result<(), NetError> {
        self.send(&Envelope::new(RequestKind::TurnOver, local_player))
    }

    /// Close and drop the active connection, if any.
    ///
    /// Closing locally does not queue a `Disconnected` event; that is
    /// reserved for transport-reported closure.
    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
    }

    fn send(&mut self, envelope: &Envelope) -> Result<(), NetError> {
        let connection = self.connection.as_mut().ok_or(NetError::NotConnected)?;
        connection.send(&envelope.encode()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeWire {
        sent: Vec<String>,
        closed: bool,
    }

    #[derive(Clone, Default)]
    struct FakeConnection {
        wire: Rc<RefCell<FakeWire>>,
    }

    impl Connection for FakeConnection {
        fn send(&mut self, payload: &str) {
            self.wire.borrow_mut().sent.push(payload.to_string());
        }

        fn close(&mut self) {
            self.wire.borrow_mut().closed = true;
        }
    }

    fn connected_client() -> (PeerClient, FakeConnection) {
        let mut client = PeerClient::new();
        let connection = FakeConnection::default();
        assert!(client.accept_incoming(Box::new(connection.clone())));
        client.poll_event(); // drop Connected
        (client, connection)
    }

    #[test]
    fn test_outgoing_connect_sends_request_on_open() {
        let mut client = PeerClient::new();
        let connection = FakeConnection::default();
        client.connect(Box::new(connection.clone()));

        // Nothing sent until the transport reports the link open
        assert!(connection.wire.borrow().sent.is_empty());

        let mut local = Player::new();
        local.set_id("me");
        client.on_open(&local).unwrap();

        assert_eq!(client.poll_event(), Some(PeerEvent::Connected));
        assert_eq!(client.poll_event(), Some(PeerEvent::BattleRequestSent));

        let sent = connection.wire.borrow().sent.clone();
        assert_eq!(sent.len(), 1);
        let envelope = Envelope::decode(&sent[0]).unwrap();
        assert_eq!(envelope.request, RequestKind::BattleRequest);
        assert_eq!(envelope.player.id.as_deref(), Some("me"));
    }

    #[test]
    fn test_inbound_rejected_while_connected() {
        let (mut client, _existing) = connected_client();

        let second = FakeConnection::default();
        assert!(!client.accept_incoming(Box::new(second.clone())));

        // The offered connection is closed, the active one kept
        assert!(second.wire.borrow().closed);
        assert!(client.is_connected());
        assert_eq!(client.poll_event(), None);
    }

    #[test]
    fn test_inbound_messages_become_typed_events() {
        let (mut client, _connection) = connected_client();

        let mut peer = Player::new();
        peer.set_id("them");
        peer.inflict_damage(10);

        for (kind, check) in [
            (
                RequestKind::BattleRequest,
                (|e| matches!(e, PeerEvent::BattleRequestReceived(_))) as fn(&PeerEvent) -> bool,
            ),
            (RequestKind::BattleAccepted, |e| {
                matches!(e, PeerEvent::PeerAcceptedRequest(_))
            }),
            (RequestKind::CastSpell, |e| {
                matches!(e, PeerEvent::PeerCastSpell(_))
            }),
            (RequestKind::TurnOver, |e| matches!(e, PeerEvent::TurnOver(_))),
        ] {
            let payload = Envelope::new(kind, &peer).encode().unwrap();
            client.on_data(&payload);

            let event = client.poll_event().expect("event for message");
            assert!(check(&event), "unexpected event {event:?} for {kind}");
        }
    }

    #[test]
    fn test_malformed_messages_dropped() {
        let (mut client, _connection) = connected_client();

        client.on_data("{{{{");
        client.on_data(r#"{"request":"Surrender","player":{"id":null,"health":1,"last_spell":null}}"#);

        assert_eq!(client.poll_event(), None);
    }

    #[test]
    fn test_transport_closure_emits_disconnected() {
        let (mut client, _connection) = connected_client();

        client.on_closed();

        assert_eq!(client.poll_event(), Some(PeerEvent::Disconnected));
        assert!(!client.is_connected());
        assert!(matches!(
            client.send_cast_spell(&Player::new()),
            Err(NetError::NotConnected)
        ));
    }

    #[test]
    fn test_accept_battle_sends_and_queues_local_event() {
        let (mut client, connection) = connected_client();

        client.accept_battle(&Player::new()).unwrap();

        assert_eq!(client.poll_event(), Some(PeerEvent::AcceptedPeerRequest));
        let sent = connection.wire.borrow().sent.clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            Envelope::decode(&sent[0]).unwrap().request,
            RequestKind::BattleAccepted
        );
    }

    #[test]
    fn test_decline_closes_quietly() {
        let (mut client, connection) = connected_client();

        client.decline_battle();

        assert!(connection.wire.borrow().closed);
        assert!(!client.is_connected());
        assert_eq!(client.poll_event(), None);
    }
}
