//! Booking status transitions.
//!
//! ```text
//! pending ──host──▶ confirmed ──system (after checkout)──▶ completed
//!    │                  │
//!    └─guest/host──▶ cancelled ◀──guest/host (before check-in)
//!                       ▲
//!                admin, from any live state
//! ```

use std::fmt;

use chrono::NaiveDate;

use super::domain::{ActorRole, BookingStatus, StayRange};

/// Why a requested status change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRejection {
    /// No edge exists between the two states.
    NotPermitted,
    /// The edge exists but this actor may not take it.
    ActorNotAllowed,
    CheckInPassed,
    StayNotFinished,
}

impl fmt::Display for TransitionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TransitionRejection::NotPermitted => "transition not permitted",
            TransitionRejection::ActorNotAllowed => "actor may not perform this transition",
            TransitionRejection::CheckInPassed => "check-in date has already passed",
            TransitionRejection::StayNotFinished => "stay has not reached its check-out date",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move booking from {from} to {to} as {actor}: {reason}")]
pub struct InvalidTransition {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub actor: ActorRole,
    pub reason: TransitionRejection,
}

/// Facts about the booking and the calendar that guard time-dependent edges.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext {
    pub stay: StayRange,
    pub today: NaiveDate,
    pub enforce_cancellation_cutoff: bool,
}

/// Validate `from -> to` for `actor`. Pure; callers persist the result.
pub fn check_transition(
    from: BookingStatus,
    to: BookingStatus,
    actor: ActorRole,
    context: &TransitionContext,
) -> Result<(), InvalidTransition> {
    use ActorRole::{Admin, Guest, Host, System};
    use BookingStatus::{Cancelled, Completed, Confirmed, Pending};

    let reject = |reason| {
        Err(InvalidTransition {
            from,
            to,
            actor,
            reason,
        })
    };

    match (from, to, actor) {
        (Cancelled, Cancelled, _) => reject(TransitionRejection::NotPermitted),
        (_, Cancelled, Admin) => Ok(()),

        (Pending, Confirmed, Host) => Ok(()),
        (Pending, Confirmed, _) => reject(TransitionRejection::ActorNotAllowed),

        (Pending, Cancelled, Guest | Host) => Ok(()),
        (Pending, Cancelled, System) => reject(TransitionRejection::ActorNotAllowed),

        (Confirmed, Cancelled, Guest | Host) => {
            if context.enforce_cancellation_cutoff && context.today >= context.stay.check_in() {
                reject(TransitionRejection::CheckInPassed)
            } else {
                Ok(())
            }
        }
        (Confirmed, Cancelled, System) => reject(TransitionRejection::ActorNotAllowed),

        (Confirmed, Completed, System) => {
            if context.today >= context.stay.check_out() {
                Ok(())
            } else {
                reject(TransitionRejection::StayNotFinished)
            }
        }
        (Confirmed, Completed, _) => reject(TransitionRejection::ActorNotAllowed),

        _ => reject(TransitionRejection::NotPermitted),
    }
}
