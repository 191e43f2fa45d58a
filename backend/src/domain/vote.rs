//! Votes, polls, and the identifiers that tie them together.
//!
//! A vote is an immutable fact: one user chose one option at one instant.
//! Uniqueness of (user, poll) is enforced by storage, not by these types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a persisted vote.
    VoteId
);
uuid_identifier!(
    /// Identifier of a poll.
    PollId
);
uuid_identifier!(
    /// Identifier of one answer option within a poll.
    OptionId
);

/// A persisted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub user_id: UserId,
    pub option_id: OptionId,
    pub poll_id: PollId,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    /// Project the fields vote-time rules inspect.
    pub fn context(&self) -> VoteContext {
        VoteContext {
            vote_id: self.id,
            user_id: self.user_id.clone(),
            cast_at: self.cast_at,
        }
    }
}

/// Input to vote-time badge rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteContext {
    pub vote_id: VoteId,
    pub user_id: UserId,
    pub cast_at: DateTime<Utc>,
}

/// One vote as seen by poll-close rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub user_id: UserId,
    pub option_id: OptionId,
    pub cast_at: DateTime<Utc>,
}

/// A vote about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub user_id: UserId,
    pub option_id: OptionId,
    pub cast_at: DateTime<Utc>,
}

/// A poll and its voting window.
///
/// The window is closed at both ends: a vote at exactly `opens_at` or exactly
/// `closes_at` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub option_ids: Vec<OptionId>,
}

impl Poll {
    /// Whether votes are accepted at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.opens_at <= now && now <= self.closes_at
    }

    /// Whether the voting window has ended at `now`.
    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        now > self.closes_at
    }

    /// Whether the option belongs to this poll.
    pub fn has_option(&self, option_id: OptionId) -> bool {
        self.option_ids.contains(&option_id)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, hour, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    #[fixture]
    fn poll() -> Poll {
        Poll {
            id: PollId::random(),
            opens_at: at(4, 0),
            closes_at: at(22, 0),
            option_ids: vec![OptionId::random(), OptionId::random()],
        }
    }

    #[rstest]
    #[case(at(3, 59), false)]
    #[case(at(4, 0), true)]
    #[case(at(12, 0), true)]
    #[case(at(22, 0), true)]
    #[case(at(22, 1), false)]
    fn window_is_inclusive(poll: Poll, #[case] now: DateTime<Utc>, #[case] open: bool) {
        assert_eq!(poll.is_open_at(now), open);
    }

    #[rstest]
    fn closed_only_after_window_ends(poll: Poll) {
        assert!(!poll.is_closed_at(at(3, 0)));
        assert!(!poll.is_closed_at(at(22, 0)));
        assert!(poll.is_closed_at(at(22, 1)));
    }

    #[rstest]
    fn option_membership(poll: Poll) {
        let first = poll.option_ids.first().copied().expect("fixture option");
        assert!(poll.has_option(first));
        assert!(!poll.has_option(OptionId::random()));
    }

    #[rstest]
    fn identifiers_serialise_transparently() {
        let uuid = Uuid::new_v4();
        let value = serde_json::to_value(PollId::from_uuid(uuid)).expect("serialise id");
        assert_eq!(value, uuid.to_string());
    }
}
