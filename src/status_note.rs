//! Round status narration
//!
//! A read-only narrator for the round's state machine
//! (`Joining → Contributing → AwaitingClaim → Distributed`): it folds the
//! observed participant and round state into one human-readable line and
//! never attempts to change any state itself.

use alloy::primitives::Address;

use crate::types::Participant;

/// Everything the narrator looks at, as observed by one user.
#[derive(Debug, Clone)]
pub struct RoundView<'a> {
    /// Participants joined so far, with per-round contribution state.
    pub participants: &'a [Participant],
    /// Participant capacity; `None` while still loading.
    pub total_participants: Option<u64>,
    /// Whether the current round's pool has been distributed.
    pub is_distributed: bool,
    /// Current round's recipient, if known.
    pub recipient: Option<Address>,
    /// The viewing user's address, if a wallet is connected.
    pub user: Option<Address>,
}

impl RoundView<'_> {
    fn user_has_contributed(&self) -> bool {
        match self.user {
            Some(user) => self
                .participants
                .iter()
                .any(|p| p.address == user && p.is_paid()),
            None => false,
        }
    }

    fn all_contributed(&self) -> bool {
        self.participants.iter().all(Participant::is_paid)
    }

    fn user_is_recipient(&self) -> bool {
        match (self.user, self.recipient) {
            (Some(user), Some(recipient)) => user == recipient,
            _ => false,
        }
    }
}

/// Derive the phase-of-round message. First matching rule wins; the rule
/// order encodes the round's state machine and is pinned by tests.
pub fn derive_status_note(view: &RoundView) -> String {
    // 1. Capacity not loaded yet
    let Some(total_participants) = view.total_participants else {
        return "Loading status...".to_string();
    };

    // 2. Still filling up
    if (view.participants.len() as u64) < total_participants {
        return "Waiting for others to join.".to_string();
    }

    // 3. Contribution phase
    if !view.all_contributed() && !view.is_distributed {
        return if view.user_has_contributed() {
            "Waiting for others to contribute.".to_string()
        } else {
            "Please make your contribution for this round.".to_string()
        };
    }

    // 4. Awaiting claim
    if view.all_contributed() && !view.is_distributed {
        return if view.user_is_recipient() {
            "All contributions are in. You can claim this round's pool.".to_string()
        } else {
            "Waiting for the recipient to claim the pool.".to_string()
        };
    }

    // 5. Distributed
    if view.is_distributed {
        return "Round distributed. Waiting for the next round.".to_string();
    }

    // 6. Fallback
    "Waiting for the next action.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContributionStatus;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn participant(byte: u8, paid: bool) -> Participant {
        Participant {
            address: addr(byte),
            status: if paid {
                ContributionStatus::Paid
            } else {
                ContributionStatus::Pending
            },
            turn: byte as u64,
        }
    }

    #[test]
    fn test_loading_when_capacity_unknown() {
        let view = RoundView {
            participants: &[],
            total_participants: None,
            is_distributed: false,
            recipient: None,
            user: None,
        };
        assert_eq!(derive_status_note(&view), "Loading status...");
    }

    #[test]
    fn test_joining_phase_wins_over_contribution_phase() {
        // Capacity 5, 3 joined, round not distributed, caller unpaid:
        // the joining rule fires before the contribution rule.
        let participants = vec![
            participant(1, false),
            participant(2, true),
            participant(3, false),
        ];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(5),
            is_distributed: false,
            recipient: None,
            user: Some(addr(1)),
        };
        assert_eq!(derive_status_note(&view), "Waiting for others to join.");
    }

    #[test]
    fn test_prompts_unpaid_caller_to_contribute() {
        let participants = vec![participant(1, false), participant(2, true)];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(2),
            is_distributed: false,
            recipient: None,
            user: Some(addr(1)),
        };
        assert_eq!(
            derive_status_note(&view),
            "Please make your contribution for this round."
        );
    }

    #[test]
    fn test_paid_caller_waits_for_others() {
        let participants = vec![participant(1, true), participant(2, false)];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(2),
            is_distributed: false,
            recipient: None,
            user: Some(addr(1)),
        };
        assert_eq!(derive_status_note(&view), "Waiting for others to contribute.");
    }

    #[test]
    fn test_recipient_prompted_to_claim() {
        let participants = vec![participant(1, true), participant(2, true)];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(2),
            is_distributed: false,
            recipient: Some(addr(2)),
            user: Some(addr(2)),
        };
        assert_eq!(
            derive_status_note(&view),
            "All contributions are in. You can claim this round's pool."
        );
    }

    #[test]
    fn test_non_recipient_waits_for_claim() {
        let participants = vec![participant(1, true), participant(2, true)];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(2),
            is_distributed: false,
            recipient: Some(addr(2)),
            user: Some(addr(1)),
        };
        assert_eq!(
            derive_status_note(&view),
            "Waiting for the recipient to claim the pool."
        );
    }

    #[test]
    fn test_distributed_round() {
        let participants = vec![participant(1, true), participant(2, true)];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(2),
            is_distributed: true,
            recipient: Some(addr(2)),
            user: Some(addr(1)),
        };
        assert_eq!(
            derive_status_note(&view),
            "Round distributed. Waiting for the next round."
        );
    }

    #[test]
    fn test_anonymous_viewer_sees_contribution_wait() {
        // No wallet connected: the caller cannot have contributed, so the
        // contribute prompt is shown.
        let participants = vec![participant(1, false), participant(2, true)];
        let view = RoundView {
            participants: &participants,
            total_participants: Some(2),
            is_distributed: false,
            recipient: None,
            user: None,
        };
        assert_eq!(
            derive_status_note(&view),
            "Please make your contribution for this round."
        );
    }
}
