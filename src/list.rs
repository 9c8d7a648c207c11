//! List-view operations: uniform-type enforcement, positional
//! insert/remove, and identity-based removal.
//!
//! Lists track a *wire* element type that starts undetermined and commits
//! on first insert. Every mutator here enforces that every element shares
//! one `TagType`, and that a fresh list's `element_type` stays
//! [`TagType::Unknown`] until the first element sets it.

use crate::error::{NbtError, NbtResult};
use crate::tag::{Tag, TagValue};
use crate::tag_type::TagType;

impl Tag {
    fn with_list<T>(&self, f: impl FnOnce(TagType, &[Tag]) -> T) -> NbtResult<T> {
        match &self.0.borrow().value {
            TagValue::List { element_type, items } => Ok(f(*element_type, items)),
            _ => Err(NbtError::TypeMismatch { found: self.tag_type(), requested: "list" }),
        }
    }

    fn with_list_mut<T>(&self, f: impl FnOnce(&mut TagType, &mut Vec<Tag>) -> T) -> NbtResult<T> {
        match &mut self.0.borrow_mut().value {
            TagValue::List { element_type, items } => Ok(f(element_type, items)),
            _ => Err(NbtError::TypeMismatch { found: self.tag_type(), requested: "list" }),
        }
    }

    pub fn list_element_type(&self) -> NbtResult<TagType> {
        self.with_list(|element_type, _| element_type)
    }

    pub fn list_len(&self) -> NbtResult<usize> {
        self.with_list(|_, items| items.len())
    }

    /// Appends `element` to the end of the list.
    pub fn list_add(&self, element: Tag) -> NbtResult<()> {
        if element.parent().is_some() {
            return Err(NbtError::InvalidState {
                message: "tag already has a parent; remove it before adding elsewhere".to_string(),
            });
        }
        self.with_list_mut(|element_type, items| -> NbtResult<()> {
            let found = element.tag_type();
            if *element_type == TagType::Unknown {
                *element_type = found;
            } else if *element_type != found {
                return Err(NbtError::InvalidArgument {
                    message: format!("list holds {} elements, cannot add a {}", element_type, found),
                });
            }
            items.push(element.clone());
            Ok(())
        })??;
        element.set_parent(Some(self));
        Ok(())
    }

    /// Inserts `element` at `index`, shifting later elements right.
    /// `index == list_len()` appends.
    pub fn list_insert(&self, index: usize, element: Tag) -> NbtResult<()> {
        if element.parent().is_some() {
            return Err(NbtError::InvalidState {
                message: "tag already has a parent; remove it before adding elsewhere".to_string(),
            });
        }
        self.with_list_mut(|element_type, items| -> NbtResult<()> {
            if index > items.len() {
                return Err(NbtError::InvalidArgument {
                    message: format!(
                        "index {} out of bounds for list of length {}",
                        index,
                        items.len()
                    ),
                });
            }
            let found = element.tag_type();
            if *element_type == TagType::Unknown {
                *element_type = found;
            } else if *element_type != found {
                return Err(NbtError::InvalidArgument {
                    message: format!(
                        "list holds {} elements, cannot insert a {}",
                        element_type, found
                    ),
                });
            }
            items.insert(index, element.clone());
            Ok(())
        })??;
        element.set_parent(Some(self));
        Ok(())
    }

    /// Replaces the element at `index`, detaching the displaced tag.
    pub fn list_set(&self, index: usize, element: Tag) -> NbtResult<Tag> {
        if element.parent().is_some() {
            return Err(NbtError::InvalidState {
                message: "tag already has a parent; remove it before adding elsewhere".to_string(),
            });
        }
        let previous = self.with_list_mut(|element_type, items| -> NbtResult<Tag> {
            let slot = items.get_mut(index).ok_or_else(|| NbtError::InvalidArgument {
                message: format!(
                    "index {} out of bounds for list of length {}",
                    index,
                    items.len()
                ),
            })?;
            let found = element.tag_type();
            if *element_type != found {
                return Err(NbtError::InvalidArgument {
                    message: format!("list holds {} elements, cannot set a {}", element_type, found),
                });
            }
            Ok(std::mem::replace(slot, element.clone()))
        })??;
        previous.set_parent(None);
        element.set_parent(Some(self));
        Ok(previous)
    }

    pub fn list_get(&self, index: usize) -> Option<Tag> {
        self.with_list(|_, items| items.get(index).cloned()).ok().flatten()
    }

    /// Removes and returns the element at `index`, detaching it. Leaves the
    /// list's `element_type` unchanged even if the list becomes empty,
    /// since "committed, empty" and "never committed" are distinct states a
    /// round-tripped empty list relies on to keep its wire element type.
    pub fn list_remove_at(&self, index: usize) -> NbtResult<Tag> {
        let removed = self.with_list_mut(|_, items| -> NbtResult<Tag> {
            if index >= items.len() {
                return Err(NbtError::InvalidArgument {
                    message: format!(
                        "index {} out of bounds for list of length {}",
                        index,
                        items.len()
                    ),
                });
            }
            Ok(items.remove(index))
        })??;
        removed.set_parent(None);
        Ok(removed)
    }

    /// Removes `element` by identity; returns `true` if it was found.
    pub fn list_remove_identity(&self, element: &Tag) -> bool {
        let index = self.with_list(|_, items| items.iter().position(|t| Tag::ptr_eq(t, element)));
        match index {
            Ok(Some(index)) => self.list_remove_at(index).is_ok(),
            _ => false,
        }
    }

    pub fn list_index_of(&self, element: &Tag) -> Option<usize> {
        self.with_list(|_, items| items.iter().position(|t| Tag::ptr_eq(t, element))).ok().flatten()
    }

    pub fn list_contains(&self, element: &Tag) -> bool {
        self.list_index_of(element).is_some()
    }

    /// Detaches and drops every element, resetting `element_type` back to
    /// `Unknown` so the list is free to hold a different type next.
    pub fn list_clear(&self) -> NbtResult<()> {
        let removed = self.with_list_mut(|element_type, items| {
            *element_type = TagType::Unknown;
            std::mem::take(items)
        })?;
        for tag in removed {
            tag.set_parent(None);
        }
        Ok(())
    }

    pub fn list_items(&self) -> NbtResult<Vec<Tag>> {
        self.with_list(|_, items| items.to_vec())
    }

    /// Commits `ty` as the list's element type without adding any element.
    /// Used by the wire readers to preserve a zero-length list's
    /// wire-declared element type, which `list_add`'s commit-on-first-insert
    /// never runs for.
    pub(crate) fn commit_list_element_type(&self, ty: TagType) -> NbtResult<()> {
        self.with_list_mut(|element_type, _| {
            *element_type = ty;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_add_commits_element_type() {
        let list = Tag::empty_list();
        assert_eq!(list.list_element_type().unwrap(), TagType::Unknown);
        list.list_add(Tag::byte(1)).unwrap();
        assert_eq!(list.list_element_type().unwrap(), TagType::Byte);
    }

    #[test]
    fn mismatched_type_is_rejected() {
        let list = Tag::empty_list();
        list.list_add(Tag::byte(1)).unwrap();
        let err = list.list_add(Tag::string("no")).unwrap_err();
        assert!(matches!(err, NbtError::InvalidArgument { .. }));
    }

    #[test]
    fn clear_resets_to_unknown_and_detaches() {
        let list = Tag::empty_list();
        let child = Tag::byte(1);
        list.list_add(child.clone()).unwrap();
        list.list_clear().unwrap();
        assert_eq!(list.list_element_type().unwrap(), TagType::Unknown);
        assert!(child.parent().is_none());
    }

    #[test]
    fn remove_at_detaches_and_shifts() {
        let list = Tag::empty_list();
        list.list_add(Tag::int(1)).unwrap();
        let second = Tag::int(2);
        list.list_add(second.clone()).unwrap();
        list.list_add(Tag::int(3)).unwrap();
        let removed = list.list_remove_at(0).unwrap();
        assert_eq!(removed.as_int().unwrap(), 1);
        assert_eq!(list.list_get(0).unwrap().as_int().unwrap(), 2);
        assert!(Tag::ptr_eq(&list.list_get(0).unwrap(), &second));
    }

    #[test]
    fn empty_inner_list_round_trips_its_committed_type() {
        let outer = Tag::empty_list();
        let inner = Tag::empty_list();
        inner.list_add(Tag::short(1)).unwrap();
        inner.list_remove_at(0).unwrap();
        assert_eq!(inner.list_element_type().unwrap(), TagType::Short);
        outer.list_add(inner).unwrap();
        assert_eq!(outer.list_element_type().unwrap(), TagType::List);
    }
}
