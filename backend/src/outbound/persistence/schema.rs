//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Voters and their cached vote counters.
    ///
    /// `vote_count`, `current_streak` and `last_voted_day` are a read-through
    /// cache refreshed after each vote; the votes table stays authoritative.
    users (id) {
        id -> Uuid,
        display_name -> Varchar,
        vote_count -> Int8,
        current_streak -> Int4,
        last_voted_day -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Daily polls and their voting windows (inclusive at both ends).
    polls (id) {
        id -> Uuid,
        question -> Text,
        opens_at -> Timestamptz,
        closes_at -> Timestamptz,
    }
}

diesel::table! {
    /// Answer options, ordered within a poll by `position`.
    poll_options (id) {
        id -> Uuid,
        poll_id -> Uuid,
        label -> Text,
        position -> Int4,
    }
}

diesel::table! {
    /// Append-only vote log. `(user_id, poll_id)` is unique.
    votes (id) {
        id -> Uuid,
        user_id -> Uuid,
        option_id -> Uuid,
        poll_id -> Uuid,
        cast_at -> Timestamptz,
    }
}

diesel::table! {
    /// Badge catalogue. `name` is unique and used as the seeding key.
    badges (id) {
        id -> Int4,
        name -> Varchar,
        icon -> Text,
        description -> Text,
        unlock_hint -> Text,
    }
}

diesel::table! {
    /// One-time badge grants keyed by `(user_id, badge_id)`.
    user_badges (user_id, badge_id) {
        user_id -> Uuid,
        badge_id -> Int4,
        earned_at -> Timestamptz,
    }
}

diesel::joinable!(poll_options -> polls (poll_id));
diesel::joinable!(votes -> users (user_id));
diesel::joinable!(votes -> poll_options (option_id));
diesel::joinable!(user_badges -> badges (badge_id));
diesel::joinable!(user_badges -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    polls,
    poll_options,
    votes,
    badges,
    user_badges,
);
