/*
 * Responsibility
 * - The authenticated identity derived from a verified bearer token
 * - The permission set carried with it (normalised, case-insensitive)
 *
 * Notes
 * - An Identity is only ever built by the validator from a verified token
 * - It lives in request extensions for the lifetime of one request
 */
use std::collections::BTreeSet;

use serde::Serialize;

/// Normalised set of permission names.
///
/// Entries are trimmed, lowercased and deduplicated; empty entries are dropped.
/// Lowercasing is the chosen normal form, so the casing of the first occurrence
/// is not preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    pub fn insert(&mut self, permission: &str) -> bool {
        match Self::normalize(permission) {
            Some(p) => self.0.insert(p),
            None => false,
        }
    }

    pub fn contains(&self, permission: &str) -> bool {
        Self::normalize(permission).is_some_and(|p| self.0.contains(&p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.insert(p.as_ref());
        }
        set
    }
}

/// Identity of the caller, as established by a verified token.
///
/// `user_id == 0` means "not established": the token verified but its subject
/// was not a usable integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub permissions: PermissionSet,
}

impl Identity {
    pub fn is_established(&self) -> bool {
        self.user_id != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_are_trimmed_lowercased_and_deduplicated() {
        let set: PermissionSet = [" READ", "read ", "Write", "", "   "].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["read", "write"]);
    }

    #[test]
    fn contains_is_case_insensitive() {
        let set: PermissionSet = ["auctions.Activate"].into_iter().collect();
        assert!(set.contains("AUCTIONS.ACTIVATE"));
        assert!(set.contains(" auctions.activate "));
        assert!(!set.contains(""));
        assert!(!set.contains("auctions.delete"));
    }

    #[test]
    fn zero_subject_is_not_established() {
        let identity = Identity {
            user_id: 0,
            name: "ghost".into(),
            email: None,
            permissions: PermissionSet::new(),
        };
        assert!(!identity.is_established());
    }
}
