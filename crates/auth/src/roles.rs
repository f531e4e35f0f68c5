// ============================
// crates/auth/src/roles.rs
// ============================
//! Role bitmask and the role-name registry.
//!
//! Roles are single bits in a `u64` mask stored on the identity. The
//! embedding application registers the bit-to-name table once at
//! startup; granting a bit that was never registered is a
//! configuration defect and aborts via `assert!`.

use gatehouse_common::Identity;

/// Bit-to-name table supplied by the embedding application.
///
/// Iteration order of `list`/`describe` follows registration order.
/// Bit zero is reserved and can never be registered.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    entries: Vec<(u64, String)>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role bit with its display name.
    pub fn register(&mut self, role: u64, name: impl Into<String>) -> &mut Self {
        assert!(role != 0, "role bit zero is reserved");
        assert!(
            !self.entries.iter().any(|(bit, _)| *bit == role),
            "role bit {role:#x} registered twice"
        );
        self.entries.push((role, name.into()));
        self
    }

    pub fn contains(&self, role: u64) -> bool {
        self.entries.iter().any(|(bit, _)| *bit == role)
    }

    pub fn name(&self, role: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(bit, _)| *bit == role)
            .map(|(_, name)| name.as_str())
    }

    fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.entries.iter().map(|(bit, name)| (*bit, name.as_str()))
    }
}

/// Compact set of roles over a `u64` bitmask.
///
/// An all-zero mask means "no roles"; inserting into an empty set
/// yields exactly the inserted bit. No separate "never initialized"
/// state is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u64);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Grant a role. The bit must be present in the registry; an
    /// unregistered bit is a programmer error, not a runtime condition.
    pub fn insert(&mut self, registry: &RoleRegistry, role: u64) {
        assert!(registry.contains(role), "unknown role bit {role:#x}");
        self.0 |= role;
    }

    /// True if the mask shares any bit with `role`.
    pub fn has(&self, role: u64) -> bool {
        self.0 & role != 0
    }

    /// True if the mask shares any bit with any of `roles`.
    pub fn has_any(&self, roles: &[u64]) -> bool {
        roles.iter().any(|role| self.has(*role))
    }

    /// Full replace: the union of `roles`, discarding the previous mask.
    pub fn replace_with(roles: impl IntoIterator<Item = u64>) -> Self {
        Self(roles.into_iter().fold(0, |mask, role| mask | role))
    }

    /// Roles present in the mask, in registry order.
    pub fn list(&self, registry: &RoleRegistry) -> Vec<u64> {
        registry
            .iter()
            .filter(|(bit, _)| self.has(*bit))
            .map(|(bit, _)| bit)
            .collect()
    }

    /// Names of the roles present in the mask, in registry order.
    pub fn describe<'a>(&self, registry: &'a RoleRegistry) -> Vec<&'a str> {
        registry
            .iter()
            .filter(|(bit, _)| self.has(*bit))
            .map(|(_, name)| name)
            .collect()
    }
}

impl From<&Identity> for RoleSet {
    fn from(identity: &Identity) -> Self {
        Self(identity.roles)
    }
}
