//! Steering FSM (C4, §4.4) — the core of the coordinator.
//!
//! `transition` is a pure function `(State, Event) -> (State, Vec<Action>)`
//! implemented as a lookup against the transition table below. Any
//! `(state, event)` pair not listed is a no-op: the state is returned
//! unchanged and no actions are produced (this is Property P9).

use tracing::debug;

/// ```text
///                 ASSOCIATED
///        +-------------------------+
///        |                         v
///   +---------+  PEER_NOT_WORSE  +-----------+
///   |  IDLE   |----------------->| REJECTED  |<-----------------+
///   +---------+                  +-----------+                  |
///        |  PEER_IS_WORSE              |  PEER_IS_WORSE          |
///        v                             v                        |
///   +------------+  CLOSED       +------------+   DISASSOC      |
///   | CONFIRMING |<--------------| ASSOCIATING|                 |
///   +------------+               +------------+                 |
///        ^                                                       |
///        | PEER_IS_WORSE / PEER_LOST_CLIENT                      |
///   +------------+   DISASSOC                                    |
///   | ASSOCIATED |----------------------------> REJECTING -------+
///   +------------+   CLOSE_CLIENT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    Confirming,
    Associating,
    Associated,
    Rejecting,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Associated,
    Disassociated,
    /// Inbound SCORE strictly greater than ours.
    PeerIsWorse,
    /// Inbound SCORE less-or-equal to ours (equality biases toward the peer).
    PeerNotWorse,
    /// Inbound SCORE == `SCORE_UNKNOWN`.
    PeerLostClient,
    /// Inbound CLOSE_CLIENT directed at us.
    CloseClient,
    /// Inbound CLOSED_CLIENT directed at us.
    ClosedClient,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    StartFlood,
    StopFlood,
    FloodClose,
    FloodClosed,
    BlacklistAdd,
    BlacklistRemove,
    /// Disassociate locally, either hard or via BTM per §4.4's rule.
    Disassociate,
    StartClientTimer,
    /// Distinct from `StartClientTimer` only in intent (§4.4 rationale #2:
    /// REJECTING→REJECTED *restarts*, not just stops, the client timer —
    /// mechanically identical, registration is always cancel-then-start).
    RestartClientTimer,
    StopClientTimer,
}

/// Looks up the §4.4 transition table. Returns the next state and the
/// ordered list of actions the caller must perform. An unlisted pair
/// returns `(state, [])` unchanged, satisfying P9.
pub fn transition(state: State, event: Event) -> (State, Vec<Action>) {
    use Action::*;
    use Event::*;
    use State::*;

    let (next, actions): (State, Vec<Action>) = match (state, event) {
        (Idle, Associated) => (Associated, vec![StartFlood]),
        (Idle, PeerIsWorse) => (Confirming, vec![FloodClose]),
        (Idle, PeerNotWorse) => (Rejected, vec![BlacklistAdd, StartClientTimer]),
        (Idle, PeerLostClient) => (Associating, vec![]),
        // Pre-emptively honours a peer's CLOSE even though we may never
        // have seen this STA locally. Surprising but intentional: see
        // DESIGN.md's open-question ledger before changing this.
        (Idle, CloseClient) => (Rejected, vec![FloodClose, BlacklistAdd, StartClientTimer]),

        (Confirming, Associated) => (Associated, vec![StartFlood]),
        (Confirming, PeerIsWorse) => (Confirming, vec![FloodClose]),
        // PeerNotWorse is deliberately absent here: we already told a peer
        // to close, so closing our side too would black-hole the STA while
        // both APs wait on each other.
        (Confirming, ClosedClient) => (Associating, vec![]),
        (Confirming, Timeout) => (Idle, vec![]),

        (Associating, Associated) => (Associated, vec![StartFlood]),
        (Associating, Disassociated) => (Idle, vec![]),
        (Associating, PeerIsWorse) => (Associating, vec![FloodClose]),
        (Associating, CloseClient) => {
            (Rejected, vec![FloodClosed, BlacklistAdd, StartClientTimer])
        }

        (Associated, Disassociated) => (Idle, vec![StopFlood]),
        (Associated, PeerIsWorse) => (Associated, vec![FloodClose]),
        (Associated, CloseClient) => (
            Rejecting,
            vec![BlacklistAdd, Disassociate, StartClientTimer, StopFlood],
        ),

        (Rejecting, Disassociated) => (Rejected, vec![FloodClosed, RestartClientTimer]),
        (Rejecting, PeerIsWorse) => {
            (Confirming, vec![BlacklistRemove, FloodClose, StopClientTimer])
        }
        (Rejecting, PeerLostClient) => (Confirming, vec![BlacklistRemove, StopClientTimer]),
        (Rejecting, Timeout) => (Associating, vec![BlacklistRemove, StopClientTimer]),

        (Rejected, PeerIsWorse) => {
            (Confirming, vec![BlacklistRemove, FloodClose, StopClientTimer])
        }
        (Rejected, PeerLostClient) => {
            (Confirming, vec![BlacklistRemove, FloodClose, StopClientTimer])
        }
        (Rejected, CloseClient) => (Rejected, vec![FloodClose]),
        (Rejected, Timeout) => (Associating, vec![BlacklistRemove, StopClientTimer]),

        (s, _) => (s, vec![]),
    };

    if next != state || !actions.is_empty() {
        debug!(?state, ?event, ?next, ?actions, "steering fsm transition");
    }
    (next, actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use State::*;

    const ALL_STATES: [State; 6] =
        [Idle, Confirming, Associating, Associated, Rejecting, Rejected];
    const ALL_EVENTS: [Event; 8] = [
        Event::Associated,
        Event::Disassociated,
        Event::PeerIsWorse,
        Event::PeerNotWorse,
        Event::PeerLostClient,
        Event::CloseClient,
        Event::ClosedClient,
        Event::Timeout,
    ];

    #[test]
    fn basic_claim_path() {
        let (s, actions) = transition(Idle, Event::Associated);
        assert_eq!(s, Associated);
        assert_eq!(actions, vec![Action::StartFlood]);
    }

    #[test]
    fn confirming_ignores_peer_not_worse() {
        let (s, actions) = transition(Confirming, Event::PeerNotWorse);
        assert_eq!(s, Confirming);
        assert!(actions.is_empty());
    }

    #[test]
    fn rejecting_to_rejected_restarts_client_timer() {
        let (s, actions) = transition(Rejecting, Event::Disassociated);
        assert_eq!(s, Rejected);
        assert_eq!(actions, vec![Action::FloodClosed, Action::RestartClientTimer]);
    }

    #[test]
    fn peer_lost_client_unwinds_rejection_without_auto_associating() {
        let (s, actions) = transition(Rejected, Event::PeerLostClient);
        assert_eq!(s, Confirming);
        assert!(actions.contains(&Action::BlacklistRemove));
    }

    #[test]
    fn every_unlisted_pair_is_a_true_no_op() {
        // Enumerate exactly the pairs the table defines, then assert every
        // other (state, event) combination is a no-op — this is P9.
        let defined: &[(State, Event)] = &[
            (Idle, Event::Associated),
            (Idle, Event::PeerIsWorse),
            (Idle, Event::PeerNotWorse),
            (Idle, Event::PeerLostClient),
            (Idle, Event::CloseClient),
            (Confirming, Event::Associated),
            (Confirming, Event::PeerIsWorse),
            (Confirming, Event::ClosedClient),
            (Confirming, Event::Timeout),
            (Associating, Event::Associated),
            (Associating, Event::Disassociated),
            (Associating, Event::PeerIsWorse),
            (Associating, Event::CloseClient),
            (Associated, Event::Disassociated),
            (Associated, Event::PeerIsWorse),
            (Associated, Event::CloseClient),
            (Rejecting, Event::Disassociated),
            (Rejecting, Event::PeerIsWorse),
            (Rejecting, Event::PeerLostClient),
            (Rejecting, Event::Timeout),
            (Rejected, Event::PeerIsWorse),
            (Rejected, Event::PeerLostClient),
            (Rejected, Event::CloseClient),
            (Rejected, Event::Timeout),
        ];
        for &state in ALL_STATES.iter() {
            for &event in ALL_EVENTS.iter() {
                if defined.contains(&(state, event)) {
                    continue;
                }
                let (next, actions) = transition(state, event);
                assert_eq!(next, state, "expected no-op for ({state:?}, {event:?})");
                assert!(actions.is_empty(), "expected no actions for ({state:?}, {event:?})");
            }
        }
    }
}
