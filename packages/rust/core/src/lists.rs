//! Named-list bookkeeping for one object kind.
//!
//! Every kind of object in an event (calo hits, clusters, ...) is grouped
//! into uniquely named lists of ids. One list per kind is *current*; lists
//! created as *temporary* belong to the algorithm scope that made them and
//! are removed by the content host when that scope ends. The list a manager
//! starts with (`Input` or `NullList`) is reserved and never saved into.

use std::collections::{BTreeMap, BTreeSet};

use pfcontent_shared::{PfContentError, Result};

use crate::content::ObjectKind;

/// Named lists of ids for one [`ObjectKind`].
#[derive(Debug, Clone)]
pub(crate) struct ListManager<Id> {
    kind: ObjectKind,
    lists: BTreeMap<String, Vec<Id>>,
    temporary: BTreeSet<String>,
    current: Option<String>,
    reserved: String,
}

impl<Id: Copy + PartialEq> ListManager<Id> {
    /// A manager holding one empty reserved list, which is made current.
    pub(crate) fn new(kind: ObjectKind, initial_list: &str) -> Self {
        let mut lists = BTreeMap::new();
        lists.insert(initial_list.to_string(), Vec::new());
        Self {
            kind,
            lists,
            temporary: BTreeSet::new(),
            current: Some(initial_list.to_string()),
            reserved: initial_list.to_string(),
        }
    }

    pub(crate) fn current_list_name(&self) -> Result<&str> {
        self.current
            .as_deref()
            .ok_or_else(|| PfContentError::not_initialized(format!("current {} list", self.kind)))
    }

    pub(crate) fn current_list(&self) -> Result<&[Id]> {
        let name = self.current_list_name()?;
        self.list(name)
    }

    pub(crate) fn list(&self, name: &str) -> Result<&[Id]> {
        self.lists
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| PfContentError::not_found(format!("{} list '{name}'", self.kind)))
    }

    pub(crate) fn is_temporary(&self, name: &str) -> bool {
        self.temporary.contains(name)
    }

    pub(crate) fn list_names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Register a new, non-temporary list.
    pub(crate) fn insert_list(&mut self, name: &str, ids: Vec<Id>) -> Result<()> {
        if self.lists.contains_key(name) {
            return Err(PfContentError::already_present(format!(
                "{} list '{name}'",
                self.kind
            )));
        }
        self.lists.insert(name.to_string(), ids);
        Ok(())
    }

    /// Append an id to the current list.
    pub(crate) fn add_to_current(&mut self, id: Id) -> Result<()> {
        let name = self.current_list_name()?.to_string();
        let list = self
            .lists
            .get_mut(&name)
            .ok_or_else(|| PfContentError::not_found(format!("{} list '{name}'", self.kind)))?;
        list.push(id);
        Ok(())
    }

    /// Create an empty temporary list and make it current.
    pub(crate) fn create_temporary(&mut self, name: &str) -> Result<()> {
        self.insert_list(name, Vec::new())?;
        self.temporary.insert(name.to_string());
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Move every id of the temporary list `source` into `target`, creating
    /// `target` if needed. `source` is left empty.
    ///
    /// Ids already in `target` are not duplicated. `target` must be neither
    /// temporary nor the reserved list.
    pub(crate) fn save(&mut self, source: &str, target: &str) -> Result<()> {
        if source == target {
            return Err(PfContentError::invalid_parameter(format!(
                "cannot save {} list '{source}' onto itself",
                self.kind
            )));
        }
        self.check_save_target(target)?;
        if self.lists.contains_key(source) && !self.temporary.contains(source) {
            return Err(PfContentError::not_allowed(format!(
                "only temporary {} lists can be saved, '{source}' is not temporary",
                self.kind
            )));
        }

        let moved = std::mem::take(
            self.lists
                .get_mut(source)
                .ok_or_else(|| PfContentError::not_found(format!("{} list '{source}'", self.kind)))?,
        );

        let destination = self.lists.entry(target.to_string()).or_default();
        for id in moved {
            if !destination.contains(&id) {
                destination.push(id);
            }
        }
        Ok(())
    }

    /// Add ids to a saved list, creating it if needed.
    pub(crate) fn save_ids(&mut self, target: &str, ids: &[Id]) -> Result<()> {
        self.check_save_target(target)?;
        let destination = self.lists.entry(target.to_string()).or_default();
        for id in ids {
            if !destination.contains(id) {
                destination.push(*id);
            }
        }
        Ok(())
    }

    fn check_save_target(&self, target: &str) -> Result<()> {
        if target == self.reserved {
            return Err(PfContentError::not_allowed(format!(
                "cannot save into reserved {} list '{target}'",
                self.kind
            )));
        }
        if self.temporary.contains(target) {
            return Err(PfContentError::not_allowed(format!(
                "cannot save into temporary {} list '{target}'",
                self.kind
            )));
        }
        Ok(())
    }

    /// Make an existing saved list current.
    pub(crate) fn replace_current(&mut self, name: &str) -> Result<()> {
        if !self.lists.contains_key(name) {
            return Err(PfContentError::not_found(format!("{} list '{name}'", self.kind)));
        }
        if self.temporary.contains(name) {
            return Err(PfContentError::not_allowed(format!(
                "temporary {} list '{name}' cannot replace the current list",
                self.kind
            )));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    pub(crate) fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Restore a previously recorded current list name.
    pub(crate) fn set_current(&mut self, name: Option<String>) {
        self.current = name;
    }

    pub(crate) fn drop_current(&mut self) {
        self.current = None;
    }

    /// Remove a temporary list, returning the ids it still held.
    pub(crate) fn delete_temporary(&mut self, name: &str) -> Vec<Id> {
        if !self.temporary.remove(name) {
            return Vec::new();
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        self.lists.remove(name).unwrap_or_default()
    }

    /// Remove an id from every list.
    pub(crate) fn remove_id(&mut self, id: Id) {
        for list in self.lists.values_mut() {
            list.retain(|existing| *existing != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfcontent_shared::StatusCode;

    fn manager() -> ListManager<u32> {
        ListManager::new(ObjectKind::Cluster, "NullList")
    }

    #[test]
    fn starts_with_empty_current_list() {
        let lists = manager();
        assert_eq!(lists.current_list_name().expect("current"), "NullList");
        assert!(lists.current_list().expect("current").is_empty());
    }

    #[test]
    fn missing_lists_report_host_codes() {
        let mut lists = manager();
        assert_eq!(
            lists.list("Nope").unwrap_err().status_code(),
            StatusCode::NotFound
        );
        lists.drop_current();
        assert_eq!(
            lists.current_list().unwrap_err().status_code(),
            StatusCode::NotInitialized
        );
    }

    #[test]
    fn temporary_list_becomes_current_and_saves() {
        let mut lists = manager();
        lists.create_temporary("tmp").expect("create");
        lists.add_to_current(1).expect("add");
        lists.add_to_current(2).expect("add");
        assert_eq!(lists.current_list().expect("current"), &[1, 2]);

        lists.save("tmp", "Saved").expect("save");
        assert!(lists.list("tmp").expect("tmp").is_empty());
        assert_eq!(lists.list("Saved").expect("saved"), &[1, 2]);

        // Saving again appends without duplicating.
        lists.create_temporary("tmp2").expect("create");
        lists.add_to_current(2).expect("add");
        lists.add_to_current(3).expect("add");
        lists.save("tmp2", "Saved").expect("save");
        assert_eq!(lists.list("Saved").expect("saved"), &[1, 2, 3]);
    }

    #[test]
    fn temporary_lists_cannot_be_targets() {
        let mut lists = manager();
        lists.create_temporary("tmp").expect("create");
        let err = lists.replace_current("tmp").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotAllowed);
        let err = lists.save_ids("tmp", &[4]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotAllowed);
    }

    #[test]
    fn delete_temporary_returns_leftovers() {
        let mut lists = manager();
        lists.create_temporary("tmp").expect("create");
        lists.add_to_current(7).expect("add");
        assert_eq!(lists.delete_temporary("tmp"), vec![7]);
        assert!(lists.list("tmp").is_err());
        assert!(lists.current_name().is_none());
        // Saved lists are never deleted this way.
        assert!(lists.delete_temporary("NullList").is_empty());
        assert!(lists.list("NullList").is_ok());
    }

    #[test]
    fn reserved_list_is_never_a_save_target() {
        let mut lists = manager();
        lists.create_temporary("tmp").expect("create");
        lists.add_to_current(1).expect("add");

        let err = lists.save("tmp", "NullList").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotAllowed);
        let err = lists.save_ids("NullList", &[1]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotAllowed);

        assert!(lists.list("NullList").expect("null list").is_empty());
        assert_eq!(lists.list("tmp").expect("tmp"), &[1]);
    }

    #[test]
    fn only_temporary_lists_are_saved() {
        let mut lists = manager();
        lists.create_temporary("tmp").expect("create");
        lists.add_to_current(1).expect("add");
        lists.save("tmp", "First").expect("save");
        lists.replace_current("First").expect("replace");

        let err = lists.save("First", "Second").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotAllowed);
        assert_eq!(lists.current_list().expect("current"), &[1]);
        assert!(lists.list("Second").is_err());

        let err = lists.save("Missing", "Second").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut lists = manager();
        let err = lists.insert_list("NullList", vec![]).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::AlreadyPresent);
    }
}
