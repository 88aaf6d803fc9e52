//! The track registry: a fixed, ordered set of track names fixed at
//! [`Session`](crate::Session) construction, and the opaque handles
//! ([`VarId`]) used to index into it and into the host's value storage.
//!
//! This replaces the raw-pointer variable binding of the original
//! C implementation: instead of handing out a pointer into the library's
//! own storage, the registry hands out a small `Copy` index that is only
//! ever meaningful alongside the [`Registry`] that produced it and a
//! parallel `&[Track]`/`&mut [f32]` slice of the same length.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate track name {0:?}")]
    DuplicateName(String),
}

/// An opaque handle to a track's position in a [`Registry`].
///
/// `VarId`s from one `Registry` are meaningless against another; nothing
/// prevents misuse at compile time, but nothing about the type
/// encourages treating it as anything but an index either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The ordered, immutable set of track names a [`Session`](crate::Session)
/// was built with.
///
/// Order is significant: it is the index space shared by every `&[Track]`
/// and `&mut [f32]` slice passed alongside a `Registry`.
#[derive(Debug, Clone)]
pub struct Registry {
    names: Vec<Box<str>>,
    by_name: HashMap<Box<str>, VarId>,
}

impl Registry {
    /// Build a registry from an ordered list of unique track names.
    pub fn new<I, S>(names: I) -> Result<Registry, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Box<str>>,
    {
        let mut ordered = Vec::new();
        let mut by_name = HashMap::new();
        for (index, name) in names.into_iter().enumerate() {
            let name: Box<str> = name.into();
            if by_name.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name.to_string()));
            }
            by_name.insert(name.clone(), VarId(index));
            ordered.push(name);
        }
        Ok(Registry {
            names: ordered,
            by_name,
        })
    }

    /// The number of tracks known to this registry.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a track's id by name.
    pub fn get(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    /// The name a [`VarId`] was registered with.
    ///
    /// Panics if `id` was not produced by this registry, which would be a
    /// caller bug (mixing `VarId`s across sessions).
    pub fn name(&self, id: VarId) -> &str {
        &self.names[id.index()]
    }

    /// Iterate over `(VarId, name)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (VarId(i), name.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_ids_in_registration_order() {
        let registry = Registry::new(["a", "b", "c"]).unwrap();
        assert_eq!(registry.get("a"), Some(VarId(0)));
        assert_eq!(registry.get("b"), Some(VarId(1)));
        assert_eq!(registry.get("c"), Some(VarId(2)));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_name_is_none() {
        let registry = Registry::new(["a"]).unwrap();
        assert_eq!(registry.get("nope"), None);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = Registry::new(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(name) if name == "a"));
    }

    #[test]
    fn name_round_trips_through_var_id() {
        let registry = Registry::new(["tempo", "camera:fov"]).unwrap();
        let id = registry.get("camera:fov").unwrap();
        assert_eq!(registry.name(id), "camera:fov");
    }

    #[test]
    fn iter_yields_pairs_in_order() {
        let registry = Registry::new(["x", "y"]).unwrap();
        let collected: Vec<(VarId, &str)> = registry.iter().collect();
        assert_eq!(collected, vec![(VarId(0), "x"), (VarId(1), "y")]);
    }
}
