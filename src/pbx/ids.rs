//! Content-derived object identifiers.
//!
//! Each object's identifier is derived from the project name, the object's
//! display name and its position in the depth-first traversal:
//!
//! ```text
//! SHA-1("<project> <display name> <counter>")
//! ```
//!
//! The 160-bit digest is folded into 96 bits by XOR-ing its five 32-bit
//! words into three slots (word `i` goes to slot `i % 3`) and written as 24
//! upper-case hexadecimal digits. Regenerating an unchanged project
//! therefore reproduces every identifier.

use super::{PbxError, PbxProject};
use digest::Digest;
use sha1::Sha1;
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::debug;

/// Derive the identifier for `name` at traversal position `counter`.
///
/// # Examples
///
/// ```
/// use pbxgen::pbx::object_id;
///
/// let id = object_id("all", "all", 0);
/// assert_eq!(id.len(), 24);
/// assert_eq!(id, object_id("all", "all", 0));
/// ```
#[must_use]
pub fn object_id(seed: &str, name: &str, counter: u64) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{seed} {name} {counter}").as_bytes());
    let digest = hasher.finalize();

    let mut slots = [[0_u8; 4]; 3];
    for (slot, word) in (0..slots.len()).cycle().zip(digest.chunks_exact(4)) {
        if let Some(target) = slots.get_mut(slot) {
            for (byte, value) in target.iter_mut().zip(word) {
                *byte ^= value;
            }
        }
    }
    slots
        .iter()
        .flatten()
        .fold(String::with_capacity(24), |mut id, byte| {
            // Writing to a String cannot fail.
            drop(write!(id, "{byte:02X}"));
            id
        })
}

impl PbxProject {
    /// Assign an identifier to every reachable object.
    ///
    /// Objects are visited in [`PbxProject::traversal_order`]. Should a
    /// derived identifier collide with one already handed out, the counter
    /// is advanced until a fresh identifier appears.
    ///
    /// # Errors
    ///
    /// Returns [`PbxError::IdentifierReassigned`] if any object already has
    /// an identifier.
    pub fn assign_ids(&mut self) -> Result<(), PbxError> {
        let mut counter: u64 = 0;
        let mut assigned: HashSet<String> = HashSet::with_capacity(self.len());
        for node in self.traversal_order() {
            let name = self.display_name(node);
            let mut id = object_id(&self.name, &name, counter);
            while assigned.contains(&id) {
                debug!(object = %name, counter, "identifier collision, advancing counter");
                counter = counter.saturating_add(1);
                id = object_id(&self.name, &name, counter);
            }
            counter = counter.saturating_add(1);

            let Some(object) = self.objects.get_mut(node.index()) else {
                continue;
            };
            if let Some(existing) = &object.id {
                return Err(PbxError::IdentifierReassigned {
                    class: object.class(),
                    name,
                    id: existing.clone(),
                });
            }
            object.id = Some(id.clone());
            assigned.insert(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbx::Attributes;
    use rstest::rstest;

    #[rstest]
    #[case("all", "all", 0, "1FA6C8E1FBE21B51DB69A747")]
    #[case("all", "Source", 2, "004C35DD1155CA632303E9E3")]
    #[case("demo", "PBXTargetDependency", 17, "C4D9102380F613B49A2AAC90")]
    fn derives_known_identifiers(
        #[case] seed: &str,
        #[case] name: &str,
        #[case] counter: u64,
        #[case] expected: &str,
    ) {
        assert_eq!(object_id(seed, name, counter), expected);
    }

    #[test]
    fn assigns_unique_identifiers_in_traversal_order() {
        let mut project = PbxProject::new("all", "Debug", "../..", Attributes::new());
        project.assign_ids().expect("assign");
        let order = project.traversal_order();
        let ids: Vec<&str> = order
            .iter()
            .filter_map(|&node| project.object(node).and_then(|o| o.id()))
            .collect();
        assert_eq!(ids.len(), order.len());
        assert_eq!(ids.first().copied(), Some("1FA6C8E1FBE21B51DB69A747"));
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn refuses_to_reassign() {
        let mut project = PbxProject::new("all", "Debug", "../..", Attributes::new());
        project.assign_ids().expect("assign");
        let err = project.assign_ids().expect_err("second assignment");
        assert!(matches!(err, PbxError::IdentifierReassigned { .. }));
    }
}
