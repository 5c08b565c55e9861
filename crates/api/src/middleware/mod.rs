//! Request extractors.
//!
//! - [`acting_user::ActingUser`] -- the user on whose behalf a request runs.

pub mod acting_user;
