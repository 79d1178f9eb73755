//! Identity registry — display names per live connection

use crate::types::{ConnectionId, Identity};
use std::collections::HashMap;

/// Maps an active connection to its chosen display name
#[derive(Debug)]
pub struct IdentityRegistry {
    identities: HashMap<ConnectionId, Identity>,
    default_name: String,
    max_name_len: usize,
}

impl IdentityRegistry {
    /// Create a registry that substitutes `default_name` for blank names
    /// and truncates names to `max_name_len` characters
    pub fn new(default_name: impl Into<String>, max_name_len: usize) -> Self {
        Self {
            identities: HashMap::new(),
            default_name: default_name.into(),
            max_name_len,
        }
    }

    /// Store or overwrite the display name, returning the name that was kept
    pub fn set(&mut self, conn: &ConnectionId, name: Option<&str>) -> &Identity {
        let display_name = self.normalize(name);
        let identity = Identity {
            connection_id: conn.clone(),
            display_name,
        };
        self.identities.insert(conn.clone(), identity);
        &self.identities[conn]
    }

    pub fn has(&self, conn: &ConnectionId) -> bool {
        self.identities.contains_key(conn)
    }

    /// Display name for a connection, if registered
    pub fn name_of(&self, conn: &ConnectionId) -> Option<&str> {
        self.identities.get(conn).map(|i| i.display_name.as_str())
    }

    /// Placeholder used when no name is given
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    pub fn remove(&mut self, conn: &ConnectionId) -> Option<Identity> {
        self.identities.remove(conn)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    fn normalize(&self, name: Option<&str>) -> String {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.chars().take(self.max_name_len).collect(),
            None => self.default_name.clone(),
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new("Anonymous", 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_lookup() {
        let mut reg = IdentityRegistry::default();
        let a = ConnectionId::new("a");
        assert!(!reg.has(&a));

        reg.set(&a, Some("Alice"));
        assert!(reg.has(&a));
        assert_eq!(reg.name_of(&a), Some("Alice"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let mut reg = IdentityRegistry::default();
        let a = ConnectionId::new("a");
        reg.set(&a, Some("Alice"));
        reg.set(&a, Some("Alicia"));
        assert_eq!(reg.name_of(&a), Some("Alicia"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        let mut reg = IdentityRegistry::default();
        let a = ConnectionId::new("a");
        assert_eq!(reg.set(&a, None).display_name, "Anonymous");
        assert_eq!(reg.set(&a, Some("")).display_name, "Anonymous");
        assert_eq!(reg.set(&a, Some("   ")).display_name, "Anonymous");
        assert_eq!(reg.set(&a, Some("  Bob ")).display_name, "Bob");
    }

    #[test]
    fn test_long_name_truncated_on_char_boundary() {
        let mut reg = IdentityRegistry::new("Stranger", 3);
        let a = ConnectionId::new("a");
        assert_eq!(reg.set(&a, Some("héllo")).display_name, "hél");
        assert_eq!(reg.set(&a, None).display_name, "Stranger");
    }

    #[test]
    fn test_remove() {
        let mut reg = IdentityRegistry::default();
        let a = ConnectionId::new("a");
        reg.set(&a, Some("Alice"));
        let removed = reg.remove(&a).unwrap();
        assert_eq!(removed.display_name, "Alice");
        assert!(!reg.has(&a));
        assert!(reg.remove(&a).is_none());
        assert!(reg.is_empty());
    }
}
