//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_roles_and_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_RESEARCHER: &str = "researcher";
pub const ROLE_PARTICIPANT: &str = "participant";

/// Role id of `participant` in the seeded `roles` table.
pub const PARTICIPANT_ROLE_ID: i64 = 3;
