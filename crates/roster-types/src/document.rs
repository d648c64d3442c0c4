use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AccountError, AccountResult};

/// Name given to a friend added without one.
pub const UNNAMED: &str = "Unnamed";

/// ID given to a friend added without one.
pub const NO_ID: &str = "No ID";

/// A roster entry: a named game ID, optionally filed under a section.
///
/// An empty `section` means "no section". A non-empty one must name an entry
/// of the owning account's `sections`; [`Account`] keeps that true for its own
/// mutations, but raw field access does not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friend {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub section: String,
}

impl Friend {
    pub fn new(name: impl Into<String>, id: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            section: section.into(),
        }
    }

    /// The section this friend is filed under, if any.
    pub fn section(&self) -> Option<&str> {
        if self.section.is_empty() {
            None
        } else {
            Some(&self.section)
        }
    }
}

/// One registered user's roster.
///
/// All fields default when missing so partially written accounts still load.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub friends: Vec<Friend>,
}

impl Account {
    /// A fresh account with no sections and no friends.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            sections: Vec::new(),
            friends: Vec::new(),
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s == name)
    }

    /// Append a section. Names are unique within the account.
    pub fn add_section(&mut self, name: &str) -> AccountResult<()> {
        if name.is_empty() {
            return Err(AccountError::EmptySectionName);
        }
        if self.has_section(name) {
            return Err(AccountError::SectionExists(name.to_string()));
        }
        self.sections.push(name.to_string());
        Ok(())
    }

    /// Remove a section together with every friend filed under it.
    ///
    /// Returns how many friends were dropped. Friends in other sections keep
    /// their relative order.
    pub fn remove_section(&mut self, name: &str) -> AccountResult<usize> {
        if !self.has_section(name) {
            return Err(AccountError::SectionNotFound(name.to_string()));
        }
        self.sections.retain(|s| s != name);
        let before = self.friends.len();
        self.friends.retain(|f| f.section != name);
        Ok(before - self.friends.len())
    }

    /// Append a friend, rejecting references to unknown sections.
    pub fn push_friend(&mut self, friend: Friend) -> AccountResult<()> {
        if let Some(section) = friend.section() {
            if !self.has_section(section) {
                return Err(AccountError::SectionNotFound(section.to_string()));
            }
        }
        self.friends.push(friend);
        Ok(())
    }

    /// Remove every friend with the given ID. Returns the number removed.
    pub fn remove_friend(&mut self, id: &str) -> usize {
        let before = self.friends.len();
        self.friends.retain(|f| f.id != id);
        before - self.friends.len()
    }

    /// Drag-reorder: take `dragged` out and insert it at `target`'s index.
    ///
    /// Both indices are resolved before the removal, so dragging downwards
    /// lands the entry just after the target and dragging upwards just before.
    pub fn move_friend(&mut self, dragged: &str, target: &str) -> AccountResult<()> {
        if dragged == target {
            return Ok(());
        }
        let from = self.position(dragged)?;
        let to = self.position(target)?;
        let entry = self.friends.remove(from);
        self.friends.insert(to, entry);
        Ok(())
    }

    fn position(&self, id: &str) -> AccountResult<usize> {
        self.friends
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| AccountError::FriendNotFound(id.to_string()))
    }

    /// Friends filed under `section` (`None` selects the unsectioned ones).
    pub fn friends_in(&self, section: Option<&str>) -> impl Iterator<Item = &Friend> + '_ {
        let wanted = section.unwrap_or("").to_string();
        self.friends.iter().filter(move |f| f.section == wanted)
    }

    /// Each section paired with its friend count, in section order.
    pub fn section_counts(&self) -> Vec<(String, usize)> {
        self.sections
            .iter()
            .map(|s| (s.clone(), self.friends_in(Some(s)).count()))
            .collect()
    }
}

/// The entire persisted state: passcode → account.
///
/// Serializes as a plain JSON object keyed by passcode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    accounts: BTreeMap<String, Account>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn contains(&self, passcode: &str) -> bool {
        self.accounts.contains_key(passcode)
    }

    pub fn account(&self, passcode: &str) -> Option<&Account> {
        self.accounts.get(passcode)
    }

    pub fn account_mut(&mut self, passcode: &str) -> Option<&mut Account> {
        self.accounts.get_mut(passcode)
    }

    /// Insert or replace an account, returning the previous one.
    pub fn insert(&mut self, passcode: impl Into<String>, account: Account) -> Option<Account> {
        self.accounts.insert(passcode.into(), account)
    }

    /// Parse from JSON bytes.
    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }

    /// Compact JSON, as kept in local caches.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Indented JSON, as stored remotely.
    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

impl FromIterator<(String, Account)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Account)>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_account() -> Account {
        let mut a = Account::new("Foo");
        a.add_section("Team1").unwrap();
        a.add_section("Team2").unwrap();
        a.push_friend(Friend::new("Bar", "999", "Team1")).unwrap();
        a.push_friend(Friend::new("Baz", "1000", "Team2")).unwrap();
        a.push_friend(Friend::new("Qux", "1001", "")).unwrap();
        a
    }

    // -----------------------------------------------------------------------
    // Serialization shape
    // -----------------------------------------------------------------------

    #[test]
    fn document_serializes_keyed_by_passcode() {
        let mut doc = Document::new();
        doc.insert("abc", Account::new("Foo"));
        let json: serde_json::Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"abc": {"username": "Foo", "sections": [], "friends": []}})
        );
    }

    #[test]
    fn partial_accounts_load_with_defaults() {
        let doc = Document::from_json(br#"{"g": {"sections": ["A"]}}"#).unwrap();
        let a = doc.account("g").unwrap();
        assert_eq!(a.username, "");
        assert_eq!(a.sections, vec!["A".to_string()]);
        assert!(a.friends.is_empty());
    }

    #[test]
    fn friend_without_section_field_is_unsectioned() {
        let f: Friend = serde_json::from_str(r#"{"name": "x", "id": "1"}"#).unwrap();
        assert_eq!(f.section(), None);
    }

    #[test]
    fn empty_document_is_empty_object() {
        assert_eq!(Document::new().to_json().unwrap(), b"{}");
        assert!(Document::from_json(b"{}").unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    #[test]
    fn add_section_rejects_duplicates_and_empty() {
        let mut a = Account::new("Foo");
        a.add_section("Team1").unwrap();
        assert_eq!(a.add_section("Team1"), Err(AccountError::SectionExists("Team1".into())));
        assert_eq!(a.add_section(""), Err(AccountError::EmptySectionName));
        assert_eq!(a.sections, vec!["Team1".to_string()]);
    }

    #[test]
    fn remove_section_drops_its_friends_only() {
        let mut a = sample_account();
        let dropped = a.remove_section("Team1").unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(a.sections, vec!["Team2".to_string()]);
        let ids: Vec<_> = a.friends.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1000", "1001"]);
    }

    #[test]
    fn remove_unknown_section_fails() {
        let mut a = sample_account();
        assert_eq!(a.remove_section("Nope"), Err(AccountError::SectionNotFound("Nope".into())));
    }

    #[test]
    fn section_counts_follow_section_order() {
        let a = sample_account();
        assert_eq!(a.section_counts(), vec![("Team1".into(), 1), ("Team2".into(), 1)]);
    }

    // -----------------------------------------------------------------------
    // Friends
    // -----------------------------------------------------------------------

    #[test]
    fn push_friend_into_unknown_section_fails() {
        let mut a = Account::new("Foo");
        let err = a.push_friend(Friend::new("Bar", "1", "Ghost")).unwrap_err();
        assert_eq!(err, AccountError::SectionNotFound("Ghost".into()));
        assert!(a.friends.is_empty());
    }

    #[test]
    fn remove_friend_removes_all_with_id() {
        let mut a = Account::new("Foo");
        a.push_friend(Friend::new("A", "1", "")).unwrap();
        a.push_friend(Friend::new("B", "1", "")).unwrap();
        a.push_friend(Friend::new("C", "2", "")).unwrap();
        assert_eq!(a.remove_friend("1"), 2);
        assert_eq!(a.remove_friend("1"), 0);
        assert_eq!(a.friends.len(), 1);
    }

    #[test]
    fn move_friend_down_and_up() {
        let mut a = sample_account();
        a.move_friend("999", "1001").unwrap();
        let ids: Vec<_> = a.friends.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1000", "1001", "999"]);

        a.move_friend("999", "1000").unwrap();
        let ids: Vec<_> = a.friends.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["999", "1000", "1001"]);
    }

    #[test]
    fn move_friend_unknown_id_fails() {
        let mut a = sample_account();
        assert_eq!(
            a.move_friend("nope", "999"),
            Err(AccountError::FriendNotFound("nope".into()))
        );
    }

    #[test]
    fn friends_in_filters_by_section() {
        let a = sample_account();
        assert_eq!(a.friends_in(Some("Team2")).count(), 1);
        assert_eq!(a.friends_in(None).next().unwrap().id, "1001");
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn arb_account() -> impl Strategy<Value = Account> {
        let sections = prop::collection::btree_set("[a-z]{1,4}", 1..4);
        sections.prop_flat_map(|sections| {
            let sections: Vec<String> = sections.into_iter().collect();
            let mut choices = sections.clone();
            choices.push(String::new());
            let friend = (0..choices.len(), "[0-9]{1,3}")
                .prop_map(move |(i, id)| Friend::new("f", id, choices[i].clone()));
            let sections = sections.clone();
            prop::collection::vec(friend, 0..12).prop_map(move |friends| Account {
                username: "u".into(),
                sections: sections.clone(),
                friends,
            })
        })
    }

    proptest! {
        #[test]
        fn remove_section_leaves_no_dangling_friends(account in arb_account(), pick in 0usize..3) {
            let mut a = account.clone();
            let target = a.sections[pick % a.sections.len()].clone();
            a.remove_section(&target).unwrap();

            prop_assert!(!a.has_section(&target));
            prop_assert!(a.friends.iter().all(|f| f.section != target));
            let untouched: Vec<_> = account.friends.iter().filter(|f| f.section != target).cloned().collect();
            prop_assert_eq!(a.friends, untouched);
        }
    }
}
