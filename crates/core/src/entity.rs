//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Identity is allocated by the persistence layer, so an entity that has not
/// been saved yet has no identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier, if one has been allocated.
    fn id(&self) -> Option<Self::Id>;

    /// True once the persistence layer has allocated an identity.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}
