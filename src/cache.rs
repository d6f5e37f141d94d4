//! Process-lifetime projections of the spreadsheet. Neither cache writes back, and both are only
//! ever replaced whole.

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::model::{short_link, Record};
use tokio::sync::RwLock;
use tracing::{error, info};

/// Autocomplete lists never hold more than this many choices.
pub const MAX_CHOICES: usize = 25;

/// The list of known creator names, read from the spreadsheet once and kept until `invalidate`
/// is called.
#[derive(Debug, Default)]
pub struct CreatorCache {
    names: RwLock<Option<Vec<String>>>,
}

impl CreatorCache {
    /// Returns the cached creators, reading them through `ledger` if they have not been read yet.
    ///
    /// A failed read leaves the cache unset so that the next call tries again; this call gets an
    /// empty list.
    pub async fn get_or_fetch(&self, ledger: &Ledger) -> Vec<String> {
        if let Some(names) = self.names.read().await.as_ref() {
            return names.clone();
        }

        let mut names = self.names.write().await;
        if let Some(names) = names.as_ref() {
            return names.clone();
        }
        match ledger.creators().await {
            Ok(fetched) => {
                info!("Cached {} creator names", fetched.len());
                *names = Some(fetched.clone());
                fetched
            }
            Err(e) => {
                error!("Error fetching creator names: {e:#}");
                Vec::new()
            }
        }
    }

    /// Creators whose name contains `current`, ignoring case, for autocomplete.
    pub async fn matching(&self, ledger: &Ledger, current: &str) -> Vec<String> {
        let current = current.to_lowercase();
        self.get_or_fetch(ledger)
            .await
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&current))
            .take(MAX_CHOICES)
            .collect()
    }

    pub async fn invalidate(&self) {
        *self.names.write().await = None;
    }
}

/// The records shown by the most recent logs listing. Short links from that listing resolve back
/// to full links through this cache.
#[derive(Debug, Default)]
pub struct RecentLogs {
    records: RwLock<Vec<Record>>,
}

impl RecentLogs {
    /// Replaces the cached records. An empty listing leaves the previous one in place.
    pub async fn replace(&self, records: &[Record]) {
        if records.is_empty() {
            return;
        }
        *self.records.write().await = records.to_vec();
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Finds the full link whose trailing path segment is `short`.
    pub async fn resolve(&self, short: &str) -> Result<String, LedgerError> {
        let records = self.records.read().await;
        if records.is_empty() {
            return Err(LedgerError::NoRecentLogs);
        }
        records
            .iter()
            .find(|record| record.short_link() == short)
            .map(|record| record.link.clone())
            .ok_or_else(|| LedgerError::LinkNotFound(short.to_string()))
    }

    /// Short links containing `current`, ignoring case, for autocomplete.
    pub async fn short_links(&self, current: &str) -> Vec<String> {
        let current = current.to_lowercase();
        self.records
            .read()
            .await
            .iter()
            .map(|record| short_link(&record.link))
            .filter(|short| short.to_lowercase().contains(&current))
            .take(MAX_CHOICES)
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_creators_are_read_once() {
        let env = TestEnv::new();
        let first = env.creators().get_or_fetch(env.ledger()).await;
        env.sheet().set_cell("Logs", "P10", "dave").unwrap();
        let second = env.creators().get_or_fetch(env.ledger()).await;
        assert_eq!(first, vec!["alice", "bob", "carol"]);
        assert_eq!(first, second);
        assert_eq!(env.sheet().calls().get, 1);

        env.creators().invalidate().await;
        let third = env.creators().get_or_fetch(env.ledger()).await;
        assert_eq!(third.last().unwrap(), "dave");
        assert_eq!(env.sheet().calls().get, 2);
    }

    #[tokio::test]
    async fn test_creator_fetch_failure_is_retried() {
        let env = TestEnv::new();
        env.sheet().set_offline(true);
        assert!(env.creators().get_or_fetch(env.ledger()).await.is_empty());
        env.sheet().set_offline(false);
        assert_eq!(env.creators().get_or_fetch(env.ledger()).await.len(), 3);
        assert_eq!(env.sheet().calls().get, 2);
    }

    #[tokio::test]
    async fn test_creator_matching() {
        let env = TestEnv::new();
        let matches = env.creators().matching(env.ledger(), "AL").await;
        assert_eq!(matches, vec!["alice"]);
        assert_eq!(env.creators().matching(env.ledger(), "").await.len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_with_empty_cache() {
        let recent = RecentLogs::default();
        assert_eq!(
            recent.resolve("first.png").await,
            Err(LedgerError::NoRecentLogs)
        );
        assert!(recent.short_links("").await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve() {
        let env = TestEnv::new();
        let records = env.ledger().records(None).await.unwrap();
        env.recent().replace(&records).await;

        assert_eq!(
            env.recent().resolve("second.png").await.unwrap(),
            "https://i.ibb.co/d4e5f6/second.png"
        );
        assert_eq!(
            env.recent().resolve("nope.png").await,
            Err(LedgerError::LinkNotFound("nope.png".to_string()))
        );
        assert_eq!(env.recent().short_links("FIR").await, vec!["first.png"]);
    }

    #[tokio::test]
    async fn test_empty_listing_keeps_previous() {
        let recent = RecentLogs::default();
        recent
            .replace(&[Record::new("alice", "https://x/a.png", "1", "No")])
            .await;
        recent.replace(&[]).await;
        assert!(!recent.is_empty().await);
        assert_eq!(recent.resolve("a.png").await.unwrap(), "https://x/a.png");
    }
}
