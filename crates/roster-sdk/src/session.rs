use std::sync::Arc;

use roster_store::{keys, KeyValueSlots};
use roster_sync::{Poller, SaveOutcome, TieredStore};
use roster_types::{Account, Document, Friend, NO_ID, UNNAMED};
use tracing::{debug, info, warn};

use crate::error::{SdkError, SdkResult};

/// Who a [`Session`] acts for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    /// A registered account, addressed by its passcode.
    Member { passcode: String },
    /// Local-only account kept in the guest slot; never synced.
    Guest,
}

/// Which friends to list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    All,
    Unsectioned,
    Section(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSummary {
    pub name: String,
    pub friends: usize,
}

/// Name shown for the guest account.
pub const GUEST_NAME: &str = "Guest";

fn required<'a>(field: &'static str, value: &'a str) -> SdkResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(SdkError::MissingField(field))
    } else {
        Ok(value)
    }
}

/// A remote refusal is an error; having no remote at all is not.
fn ensure_persisted(outcome: SaveOutcome) -> SdkResult<()> {
    match outcome {
        SaveOutcome::LocalOnly { error: Some(e), .. } => Err(SdkError::NotPersisted(e)),
        _ => Ok(()),
    }
}

/// Create an account. The new account is not logged in.
pub async fn register(store: &TieredStore, username: &str, passcode: &str) -> SdkResult<()> {
    let username = required("username", username)?;
    let passcode = required("passcode", passcode)?;
    let updated = store
        .update(|doc| {
            if doc.contains(passcode) {
                return Err(SdkError::PasscodeTaken);
            }
            doc.insert(passcode, Account::new(username));
            Ok(())
        })
        .await?;
    ensure_persisted(updated.outcome)?;
    info!(%username, "account registered");
    Ok(())
}

/// Wipe every local slot and replace the shared document with an empty one.
pub async fn erase_all(store: &TieredStore, slots: &dyn KeyValueSlots) -> SdkResult<()> {
    slots.clear()?;
    store.invalidate();
    let updated = store
        .update(|doc| {
            *doc = Document::new();
            Ok::<_, SdkError>(())
        })
        .await?;
    ensure_persisted(updated.outcome)?;
    warn!("all accounts erased");
    Ok(())
}

/// An authenticated (or guest) view of the roster.
pub struct Session {
    store: Arc<TieredStore>,
    slots: Arc<dyn KeyValueSlots>,
    identity: Identity,
    poller: Poller,
}

impl Session {
    fn new(store: Arc<TieredStore>, slots: Arc<dyn KeyValueSlots>, identity: Identity) -> Self {
        let poller = Poller::new(store.clone());
        Self {
            store,
            slots,
            identity,
            poller,
        }
    }

    /// Log in with a passcode and remember it for [`Session::resume`].
    pub async fn login(
        store: Arc<TieredStore>,
        slots: Arc<dyn KeyValueSlots>,
        passcode: &str,
    ) -> SdkResult<Self> {
        let passcode = required("passcode", passcode)?;
        let doc = store.get_data(false).await;
        if !doc.contains(passcode) {
            return Err(SdkError::InvalidPasscode);
        }
        slots.set(keys::CURRENT_USER, passcode)?;
        debug!("logged in");
        Ok(Self::new(
            store,
            slots,
            Identity::Member { passcode: passcode.to_string() },
        ))
    }

    /// Pick up the remembered login, if its account still exists.
    pub async fn resume(
        store: Arc<TieredStore>,
        slots: Arc<dyn KeyValueSlots>,
    ) -> SdkResult<Option<Self>> {
        let Some(passcode) = slots.get(keys::CURRENT_USER)? else {
            return Ok(None);
        };
        let doc = store.get_data(false).await;
        if !doc.contains(&passcode) {
            info!("remembered account is gone; clearing login");
            slots.remove(keys::CURRENT_USER)?;
            return Ok(None);
        }
        Ok(Some(Self::new(store, slots, Identity::Member { passcode })))
    }

    /// A guest session. Its account lives only in the guest slot.
    pub fn guest(store: Arc<TieredStore>, slots: Arc<dyn KeyValueSlots>) -> Self {
        Self::new(store, slots, Identity::Guest)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_guest(&self) -> bool {
        self.identity == Identity::Guest
    }

    /// End the session: forget the remembered login and stop watching.
    pub async fn logout(self) -> SdkResult<()> {
        self.poller.shutdown().await;
        if let Identity::Member { .. } = self.identity {
            self.slots.remove(keys::CURRENT_USER)?;
        }
        debug!("logged out");
        Ok(())
    }

    pub async fn account(&self) -> SdkResult<Account> {
        match &self.identity {
            Identity::Guest => self.guest_account(),
            Identity::Member { passcode } => self
                .store
                .get_data(false)
                .await
                .account(passcode)
                .cloned()
                .ok_or(SdkError::AccountMissing),
        }
    }

    fn guest_account(&self) -> SdkResult<Account> {
        match self.slots.get(keys::GUEST)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Account::new(GUEST_NAME)),
        }
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut Account) -> SdkResult<T>) -> SdkResult<T> {
        match &self.identity {
            Identity::Guest => {
                let mut account = self.guest_account()?;
                let value = f(&mut account)?;
                self.slots.set(keys::GUEST, &serde_json::to_string(&account)?)?;
                Ok(value)
            }
            Identity::Member { passcode } => {
                let updated = self
                    .store
                    .update(|doc| {
                        let account = doc.account_mut(passcode).ok_or(SdkError::AccountMissing)?;
                        f(account)
                    })
                    .await?;
                ensure_persisted(updated.outcome)?;
                Ok(updated.value)
            }
        }
    }

    pub async fn add_section(&self, name: &str) -> SdkResult<()> {
        let name = required("section name", name)?;
        self.mutate(|account| Ok(account.add_section(name)?)).await
    }

    /// Delete a section and every friend filed under it. Returns how many
    /// friends went with it.
    pub async fn delete_section(&self, name: &str) -> SdkResult<usize> {
        let name = name.trim();
        self.mutate(|account| Ok(account.remove_section(name)?)).await
    }

    /// Add a friend. Blank names and IDs get placeholders; a blank section
    /// files the friend under no section.
    pub async fn add_friend(&self, name: &str, id: &str, section: &str) -> SdkResult<Friend> {
        let name = match name.trim() {
            "" => UNNAMED,
            n => n,
        };
        let id = match id.trim() {
            "" => NO_ID,
            i => i,
        };
        let friend = Friend::new(name, id, section.trim());
        self.mutate(|account| {
            account.push_friend(friend.clone())?;
            Ok(friend)
        })
        .await
    }

    /// Remove every friend with this ID. Returns how many were removed.
    pub async fn delete_friend(&self, id: &str) -> SdkResult<usize> {
        let id = id.trim();
        self.mutate(|account| Ok(account.remove_friend(id))).await
    }

    /// Drag `dragged_id` onto `target_id`'s position.
    pub async fn move_friend(&self, dragged_id: &str, target_id: &str) -> SdkResult<()> {
        self.mutate(|account| Ok(account.move_friend(dragged_id.trim(), target_id.trim())?))
            .await
    }

    pub async fn friends(&self, view: View) -> SdkResult<Vec<Friend>> {
        let account = self.account().await?;
        let friends = match &view {
            View::All => account.friends,
            View::Unsectioned => account.friends_in(None).cloned().collect(),
            View::Section(name) => {
                if !account.has_section(name) {
                    return Err(SdkError::SectionNotFound(name.clone()));
                }
                account.friends_in(Some(name)).cloned().collect()
            }
        };
        Ok(friends)
    }

    pub async fn section_summaries(&self) -> SdkResult<Vec<SectionSummary>> {
        let account = self.account().await?;
        Ok(account
            .section_counts()
            .into_iter()
            .map(|(name, friends)| SectionSummary { name, friends })
            .collect())
    }

    /// Start background refresh. `on_account` gets this session's account
    /// each time a refresh contains it. Returns `false` for guests and when
    /// already watching.
    pub fn watch<F>(&self, on_account: F) -> bool
    where
        F: Fn(&Account) + Send + Sync + 'static,
    {
        let Identity::Member { passcode } = &self.identity else {
            return false;
        };
        let passcode = passcode.clone();
        self.poller.start(move |doc: &Document| {
            if let Some(account) = doc.account(&passcode) {
                on_account(account);
            }
        })
    }

    pub fn is_watching(&self) -> bool {
        self.poller.is_running()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let who = match &self.identity {
            Identity::Member { .. } => "member",
            Identity::Guest => "guest",
        };
        f.debug_struct("Session")
            .field("identity", &who)
            .field("store", &self.store)
            .field("watching", &self.is_watching())
            .finish()
    }
}
