use std::fmt;
use std::future::Future;

use roster_remote::{RemoteError, RemoteKind};
use roster_types::Document;
use tracing::debug;

/// One place a document can come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    BlobStore,
    Fallback,
    LocalCache,
    /// No tier answered; the caller got an empty document.
    Empty,
}

impl Tier {
    pub fn is_remote(self) -> bool {
        matches!(self, Self::BlobStore | Self::Fallback)
    }
}

impl From<RemoteKind> for Tier {
    fn from(kind: RemoteKind) -> Self {
        match kind {
            RemoteKind::BlobStore => Self::BlobStore,
            RemoteKind::Fallback => Self::Fallback,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlobStore => f.write_str("blob-store"),
            Self::Fallback => f.write_str("fallback"),
            Self::LocalCache => f.write_str("local-cache"),
            Self::Empty => f.write_str("empty"),
        }
    }
}

/// What a single tier said when asked.
#[derive(Clone, Debug, PartialEq)]
pub enum TierOutcome {
    Hit(Document),
    /// Nothing there, or the tier was not eligible this time.
    Miss,
    Failed(RemoteError),
}

impl From<Option<Document>> for TierOutcome {
    fn from(doc: Option<Document>) -> Self {
        doc.map_or(Self::Miss, Self::Hit)
    }
}

/// Result of a read: the document and the tier that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched {
    pub document: Document,
    pub source: Tier,
    /// Tiers that failed before `source` answered, in the order asked.
    pub failures: Vec<(Tier, RemoteError)>,
}

/// Try-in-order combinator over tiers.
///
/// Each `or_else*` step runs only if no earlier tier produced a hit. Misses
/// fall through silently, failures are recorded. [`finish`](Self::finish)
/// yields the first hit, or an empty document sourced from [`Tier::Empty`].
#[derive(Debug, Default)]
pub struct Resolution {
    answer: Option<(Tier, Document)>,
    failures: Vec<(Tier, RemoteError)>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn or_else(mut self, tier: Tier, ask: impl FnOnce() -> TierOutcome) -> Self {
        if self.answer.is_none() {
            let outcome = ask();
            self.record(tier, outcome);
        }
        self
    }

    pub async fn or_else_async<F, Fut>(mut self, tier: Tier, ask: F) -> Self
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TierOutcome>,
    {
        if self.answer.is_none() {
            let outcome = ask().await;
            self.record(tier, outcome);
        }
        self
    }

    fn record(&mut self, tier: Tier, outcome: TierOutcome) {
        match outcome {
            TierOutcome::Hit(doc) => {
                debug!(%tier, accounts = doc.len(), "tier answered");
                self.answer = Some((tier, doc));
            }
            TierOutcome::Miss => debug!(%tier, "tier missed"),
            TierOutcome::Failed(e) => self.failures.push((tier, e)),
        }
    }

    pub fn finish(self) -> Fetched {
        let (source, document) = self.answer.unwrap_or((Tier::Empty, Document::new()));
        Fetched {
            document,
            source,
            failures: self.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::Account;

    fn doc(name: &str) -> Document {
        let mut d = Document::new();
        d.insert(name, Account::new(name));
        d
    }

    #[test]
    fn first_hit_wins_and_later_tiers_are_not_asked() {
        let fetched = Resolution::new()
            .or_else(Tier::LocalCache, || TierOutcome::Hit(doc("a")))
            .or_else(Tier::Fallback, || panic!("must not be asked"))
            .finish();
        assert_eq!(fetched.source, Tier::LocalCache);
        assert_eq!(fetched.document, doc("a"));
        assert!(fetched.failures.is_empty());
    }

    #[test]
    fn failures_are_recorded_in_order() {
        let fetched = Resolution::new()
            .or_else(Tier::BlobStore, || TierOutcome::Failed(RemoteError::Unavailable("down".into())))
            .or_else(Tier::Fallback, || TierOutcome::Failed(RemoteError::Decode("junk".into())))
            .or_else(Tier::LocalCache, || TierOutcome::Hit(doc("c")))
            .finish();
        assert_eq!(fetched.source, Tier::LocalCache);
        let tiers: Vec<_> = fetched.failures.iter().map(|(t, _)| *t).collect();
        assert_eq!(tiers, vec![Tier::BlobStore, Tier::Fallback]);
    }

    #[test]
    fn nothing_answers_gives_empty() {
        let fetched = Resolution::new()
            .or_else(Tier::LocalCache, || TierOutcome::Miss)
            .finish();
        assert_eq!(fetched.source, Tier::Empty);
        assert!(fetched.document.is_empty());
    }

    #[tokio::test]
    async fn async_step_is_skipped_after_hit() {
        let asked = std::cell::Cell::new(false);
        let fetched = Resolution::new()
            .or_else(Tier::LocalCache, || TierOutcome::Hit(doc("a")))
            .or_else_async(Tier::BlobStore, || async {
                asked.set(true);
                TierOutcome::Miss
            })
            .await
            .finish();
        assert_eq!(fetched.source, Tier::LocalCache);
        assert!(!asked.get());
    }

    #[test]
    fn option_converts_to_outcome() {
        assert_eq!(TierOutcome::from(None), TierOutcome::Miss);
        assert_eq!(TierOutcome::from(Some(doc("x"))), TierOutcome::Hit(doc("x")));
    }

    #[test]
    fn remote_tiers() {
        assert!(Tier::BlobStore.is_remote());
        assert!(Tier::Fallback.is_remote());
        assert!(!Tier::LocalCache.is_remote());
        assert!(!Tier::Empty.is_remote());
        assert_eq!(Tier::from(RemoteKind::Fallback), Tier::Fallback);
    }
}
