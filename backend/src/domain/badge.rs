//! Badge catalogue and grant records.
//!
//! Badges are a static catalogue seeded once; grants are one-way records that
//! a user has earned a badge. At most one grant exists per (user, badge).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

/// Storage identifier of a catalogued badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(i32);

impl BadgeId {
    /// Wrap a storage identifier.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw storage identifier.
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every badge in the catalogue, identified by its display name.
///
/// # Example
///
/// ```
/// # use ballot_backend::domain::BadgeKind;
/// assert_eq!(BadgeKind::FirstVote.as_str(), "First Vote");
/// assert_eq!("Chaos Agent".parse::<BadgeKind>(), Ok(BadgeKind::ChaosAgent));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BadgeKind {
    FirstVote,
    StreakStarter,
    FullWeekWarrior,
    MonthOfMayhem,
    UnderdogVoter,
    TrendRider,
    MidnightMaverick,
    FirstToVote,
    LastToVote,
    ClutchVoter,
    ChaosAgent,
    StreakSlayer,
    BallotBeast,
    MegaInfluencer,
    QuietPower,
    Overachiever,
}

impl BadgeKind {
    /// All catalogued badges.
    pub const ALL: [BadgeKind; 16] = [
        BadgeKind::FirstVote,
        BadgeKind::StreakStarter,
        BadgeKind::FullWeekWarrior,
        BadgeKind::MonthOfMayhem,
        BadgeKind::UnderdogVoter,
        BadgeKind::TrendRider,
        BadgeKind::MidnightMaverick,
        BadgeKind::FirstToVote,
        BadgeKind::LastToVote,
        BadgeKind::ClutchVoter,
        BadgeKind::ChaosAgent,
        BadgeKind::StreakSlayer,
        BadgeKind::BallotBeast,
        BadgeKind::MegaInfluencer,
        BadgeKind::QuietPower,
        BadgeKind::Overachiever,
    ];

    /// Catalogue name, used as the lookup key in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstVote => "First Vote",
            Self::StreakStarter => "Streak Starter",
            Self::FullWeekWarrior => "Full Week Warrior",
            Self::MonthOfMayhem => "Month of Mayhem",
            Self::UnderdogVoter => "Underdog Voter",
            Self::TrendRider => "Trend Rider",
            Self::MidnightMaverick => "Midnight Maverick",
            Self::FirstToVote => "First to Vote",
            Self::LastToVote => "Last to Vote",
            Self::ClutchVoter => "Clutch Voter",
            Self::ChaosAgent => "Chaos Agent",
            Self::StreakSlayer => "Streak Slayer",
            Self::BallotBeast => "Ballot Beast",
            Self::MegaInfluencer => "Mega Influencer",
            Self::QuietPower => "Quiet Power",
            Self::Overachiever => "Overachiever",
        }
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown badge name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown badge name '{input}'")]
pub struct ParseBadgeKindError {
    /// The unrecognised input.
    pub input: String,
}

impl FromStr for BadgeKind {
    type Err = ParseBadgeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| ParseBadgeKindError {
                input: s.to_owned(),
            })
    }
}

/// Static presentation data for one catalogued badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub kind: BadgeKind,
    pub icon: &'static str,
    pub unlock_hint: &'static str,
    pub description: &'static str,
}

/// The full badge catalogue, in seeding order.
pub const BADGE_CATALOGUE: [BadgeDefinition; 16] = [
    BadgeDefinition {
        kind: BadgeKind::FirstVote,
        icon: "🗳️",
        unlock_hint: "Cast your first vote",
        description: "You did it! You're now part of the problem.",
    },
    BadgeDefinition {
        kind: BadgeKind::StreakStarter,
        icon: "🔥",
        unlock_hint: "Vote 3 days in a row",
        description: "The flame has been lit. Don't blow it out.",
    },
    BadgeDefinition {
        kind: BadgeKind::FullWeekWarrior,
        icon: "📅",
        unlock_hint: "Vote 7 days in a row",
        description: "One week in. You're either committed or lost.",
    },
    BadgeDefinition {
        kind: BadgeKind::MonthOfMayhem,
        icon: "🧠",
        unlock_hint: "Vote 30 days in a row",
        description: "30 straight days of opinions. Are you okay?",
    },
    BadgeDefinition {
        kind: BadgeKind::UnderdogVoter,
        icon: "🐢",
        unlock_hint: "Vote for a losing option 10 times",
        description: "You support the little guys. Even when they're wrong.",
    },
    BadgeDefinition {
        kind: BadgeKind::TrendRider,
        icon: "🏄",
        unlock_hint: "Vote for the winning option 10 times",
        description: "You're either psychic or a sheep.",
    },
    BadgeDefinition {
        kind: BadgeKind::MidnightMaverick,
        icon: "🌙",
        unlock_hint: "Vote between 12–1am",
        description: "You vote when the freaks come out.",
    },
    BadgeDefinition {
        kind: BadgeKind::FirstToVote,
        icon: "⚡",
        unlock_hint: "Be the first voter on any poll",
        description: "Fastest draw in the democracy.",
    },
    BadgeDefinition {
        kind: BadgeKind::LastToVote,
        icon: "🐌",
        unlock_hint: "Be the last voter on a poll",
        description: "We waited all day for this?",
    },
    BadgeDefinition {
        kind: BadgeKind::ClutchVoter,
        icon: "🧨",
        unlock_hint: "Vote in a poll that ends in a tie",
        description: "You had one job…",
    },
    BadgeDefinition {
        kind: BadgeKind::ChaosAgent,
        icon: "🃏",
        unlock_hint: "Be the only voter for a poll option",
        description: "Statistically impressive. Or sabotage.",
    },
    BadgeDefinition {
        kind: BadgeKind::StreakSlayer,
        icon: "🪦",
        unlock_hint: "Break a 10+ day streak",
        description: "RIP your discipline.",
    },
    BadgeDefinition {
        kind: BadgeKind::BallotBeast,
        icon: "🦁",
        unlock_hint: "Cast 100 total votes",
        description: "You hunger for democracy.",
    },
    BadgeDefinition {
        kind: BadgeKind::MegaInfluencer,
        icon: "📣",
        unlock_hint: "Vote on 10+ polls that had 100+ total votes",
        description: "Clearly your opinion matters.",
    },
    BadgeDefinition {
        kind: BadgeKind::QuietPower,
        icon: "👻",
        unlock_hint: "Vote 50 times without ever commenting",
        description: "A silent force of nature.",
    },
    BadgeDefinition {
        kind: BadgeKind::Overachiever,
        icon: "🎓",
        unlock_hint: "Earn all other badges",
        description: "Your therapist is concerned.",
    },
];

/// A catalogued badge as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: BadgeId,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub unlock_hint: String,
}

/// The record that a user holds a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeGrant {
    pub user_id: UserId,
    pub badge_id: BadgeId,
    pub granted_at: DateTime<Utc>,
}

/// A badge a user holds, with the time it was earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnedBadge {
    #[serde(flatten)]
    pub badge: Badge,
    pub earned_at: DateTime<Utc>,
}

/// Result of attempting to grant a badge by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A new grant was recorded.
    Granted(BadgeId),
    /// The user already held the badge; nothing changed.
    AlreadyHeld,
}

impl GrantOutcome {
    /// The badge id when this call created the grant.
    pub fn newly_granted(self) -> Option<BadgeId> {
        match self {
            Self::Granted(id) => Some(id),
            Self::AlreadyHeld => None,
        }
    }
}

/// Result of attempting to grant a badge by catalogue name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantByNameOutcome {
    /// A new grant was recorded.
    Granted(BadgeId),
    /// The user already held the badge; nothing changed.
    AlreadyHeld,
    /// The catalogue has no badge with this name.
    UnknownBadge,
}

impl GrantByNameOutcome {
    /// The badge id when this call created the grant.
    pub fn newly_granted(self) -> Option<BadgeId> {
        match self {
            Self::Granted(id) => Some(id),
            Self::AlreadyHeld | Self::UnknownBadge => None,
        }
    }
}
