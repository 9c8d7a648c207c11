//! Compound-view operations: add, remove by name or by identity,
//! membership, enumeration, and rename.
//!
//! Every mutator here goes through the same parent-exclusivity check: a
//! child already attached somewhere else must be removed from its old
//! slot before it can be added to a new one.

use std::collections::HashMap;

use crate::error::{NbtError, NbtResult};
use crate::tag::{Tag, TagValue};
use crate::tag_type::TagType;

impl Tag {
    fn with_compound<T>(&self, f: impl FnOnce(&HashMap<String, Tag>) -> T) -> NbtResult<T> {
        match &self.0.borrow().value {
            TagValue::Compound(map) => Ok(f(map)),
            _ => Err(NbtError::TypeMismatch { found: self.tag_type(), requested: "compound" }),
        }
    }

    fn with_compound_mut<T>(&self, f: impl FnOnce(&mut HashMap<String, Tag>) -> T) -> NbtResult<T> {
        match &mut self.0.borrow_mut().value {
            TagValue::Compound(map) => Ok(f(map)),
            _ => Err(NbtError::TypeMismatch { found: self.tag_type(), requested: "compound" }),
        }
    }

    /// Adds `child` under `name`. Fails if `name` is already in use
    /// (invariant 2), or if `child` is already parented elsewhere
    /// (invariant 1) — detach it first with `remove`.
    pub fn compound_add<S: Into<String>>(&self, name: S, child: Tag) -> NbtResult<()> {
        let name = name.into();
        if child.parent().is_some() {
            return Err(NbtError::InvalidState {
                message: "tag already has a parent; remove it before adding elsewhere".to_string(),
            });
        }
        let collided = self.with_compound(|map| map.contains_key(&name))?;
        if collided {
            return Err(NbtError::InvalidArgument {
                message: format!("compound already has an entry named {:?}", name),
            });
        }
        child.set_name(Some(name.clone()));
        child.set_parent(Some(self));
        self.with_compound_mut(|map| {
            map.insert(name, child);
        })
    }

    /// Indexing-assignment semantics: `Some(child)` inserts or replaces the
    /// slot (displacing and detaching any existing occupant), `None` clears
    /// it.
    pub fn compound_set<S: Into<String>>(&self, name: S, child: Option<Tag>) -> NbtResult<()> {
        let name = name.into();
        if let Some(child) = &child {
            if child.parent().as_ref().map_or(false, |p| !Tag::ptr_eq(p, self)) {
                return Err(NbtError::InvalidState {
                    message: "tag already has a parent; remove it before adding elsewhere"
                        .to_string(),
                });
            }
        }
        let previous = self.with_compound_mut(|map| match child {
            Some(child) => {
                child.set_name(Some(name.clone()));
                child.set_parent(Some(self));
                map.insert(name.clone(), child)
            }
            None => map.remove(&name),
        })?;
        if let Some(previous) = previous {
            if !self
                .with_compound(|map| map.get(&name).map_or(false, |t| Tag::ptr_eq(t, &previous)))?
            {
                previous.set_parent(None);
            }
        }
        Ok(())
    }

    /// Looks up a child by name without removing it.
    pub fn compound_get(&self, name: &str) -> Option<Tag> {
        self.with_compound(|map| map.get(name).cloned()).ok().flatten()
    }

    /// Alias for [`Tag::compound_get`], matching the "try_get" operation
    /// name in the tagged-model vocabulary.
    pub fn compound_try_get(&self, name: &str) -> Option<Tag> {
        self.compound_get(name)
    }

    pub fn compound_contains(&self, name: &str) -> bool {
        self.with_compound(|map| map.contains_key(name)).unwrap_or(false)
    }

    /// Removes and returns the child named `name`, detaching it so it can
    /// be reused elsewhere.
    pub fn compound_remove(&self, name: &str) -> Option<Tag> {
        let removed = self.with_compound_mut(|map| map.remove(name)).ok().flatten();
        if let Some(tag) = &removed {
            tag.set_parent(None);
        }
        removed
    }

    /// Removes `child` by identity rather than by name; returns `true` if
    /// it was found and removed.
    pub fn compound_remove_identity(&self, child: &Tag) -> bool {
        let name = self.with_compound(|map| {
            map.iter().find(|(_, v)| Tag::ptr_eq(v, child)).map(|(k, _)| k.clone())
        });
        match name {
            Ok(Some(name)) => self.compound_remove(&name).is_some(),
            _ => false,
        }
    }

    pub fn compound_names(&self) -> Vec<String> {
        self.with_compound(|map| map.keys().cloned().collect()).unwrap_or_default()
    }

    /// All children, in unspecified (`HashMap`) order — callers that need a
    /// stable order should sort by name themselves.
    pub fn compound_tags(&self) -> Vec<Tag> {
        self.with_compound(|map| map.values().cloned().collect()).unwrap_or_default()
    }

    pub fn compound_len(&self) -> usize {
        self.with_compound(|map| map.len()).unwrap_or(0)
    }

    /// Renames an existing child in place. Fails if `new_name` collides
    /// with a different, already-present entry (invariant 2).
    pub fn compound_rename(&self, old_name: &str, new_name: &str) -> NbtResult<()> {
        if old_name == new_name {
            return Ok(());
        }
        let collided = self.with_compound(|map| map.contains_key(new_name))?;
        if collided {
            return Err(NbtError::InvalidArgument {
                message: format!("compound already has an entry named {:?}", new_name),
            });
        }
        let child = self
            .with_compound_mut(|map| map.remove(old_name))?
            .ok_or_else(|| NbtError::InvalidArgument {
                message: format!("no entry named {:?}", old_name),
            })?;
        child.set_name(Some(new_name.to_string()));
        self.with_compound_mut(|map| map.insert(new_name.to_string(), child))?;
        Ok(())
    }

    /// The list/array element type a compound's own tag type can never have;
    /// present only so callers sharing generic code with `list.rs` can ask
    /// "is this even a container". Compounds have no uniform element type.
    pub(crate) fn compound_element_type() -> TagType {
        TagType::Compound
    }
}
