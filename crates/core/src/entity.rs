//! Owned records with a stable identity.

use crate::UserId;

/// A record addressed by id and owned by exactly one user.
pub trait Entity {
    type Id: Copy + Eq + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    fn owner(&self) -> UserId;

    fn is_owned_by(&self, user: UserId) -> bool {
        self.owner() == user
    }
}
