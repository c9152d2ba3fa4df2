//! Optimistic favorites cache.

use std::sync::{Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use uuid::Uuid;

use quotes_model::{sort_newest_first, AddFavorite, FavoriteQuote, Quote, RemoveFavorite};

use crate::api::FavoritesApi;
use crate::error::ClientError;
use crate::optimistic::{Mutation, MutationState, PROVISIONAL_PREFIX};

/// Result of [`FavoritesStore::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Added(FavoriteQuote),
    Removed,
}

/// In-memory favorites list kept in sync with the proxy through optimistic
/// updates.
///
/// Reads never wait on the network and observe provisional entries. All
/// mutations go through a single writer, so two calls touching the same
/// quote are applied one after the other, each against the state the
/// previous one left behind.
pub struct FavoritesStore<A> {
    api: A,
    user_id: String,
    favorites: Mutex<Vec<FavoriteQuote>>,
    writer: tokio::sync::Mutex<()>,
}

impl<A: FavoritesApi> FavoritesStore<A> {
    pub fn new(api: A) -> Self {
        Self::with_user(api, String::new())
    }

    /// `user_id` is only used for provisional entries; confirmed entries
    /// carry whatever the server returns.
    pub fn with_user(api: A, user_id: impl Into<String>) -> Self {
        Self {
            api,
            user_id: user_id.into(),
            favorites: Mutex::new(Vec::new()),
            writer: tokio::sync::Mutex::new(()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the full set for the current user, newest first.
    pub async fn load(&self) -> Result<Vec<FavoriteQuote>, ClientError> {
        let _writer = self.writer.lock().await;

        let mut fetched = self.api.list_favorites().await?;
        sort_newest_first(&mut fetched);

        *self.favorites() = fetched.clone();
        tracing::debug!(count = fetched.len(), "favorites loaded");
        Ok(fetched)
    }

    /// Snapshot of the current list, provisional entries included.
    pub fn list(&self) -> Vec<FavoriteQuote> {
        self.favorites().clone()
    }

    pub fn contains(&self, quote_id: &str) -> bool {
        self.find(quote_id).is_some()
    }

    pub fn find(&self, quote_id: &str) -> Option<FavoriteQuote> {
        self.favorites()
            .iter()
            .find(|fav| fav.quote_id == quote_id)
            .cloned()
    }

    /// Whether `favorite_id` names an entry the server has not confirmed yet.
    pub fn is_pending(favorite_id: &str) -> bool {
        favorite_id.starts_with(PROVISIONAL_PREFIX)
    }

    /// Favorite `quote`. Already-favorited quotes are returned as they are.
    pub async fn add(
        &self,
        quote: &Quote,
        translated_text: Option<String>,
    ) -> Result<FavoriteQuote, ClientError> {
        let _writer = self.writer.lock().await;
        self.add_locked(quote, translated_text).await
    }

    /// Un-favorite. On failure the entry returns to its previous position.
    pub async fn remove(&self, favorite_id: &str, quote_id: &str) -> Result<(), ClientError> {
        let _writer = self.writer.lock().await;
        self.remove_locked(favorite_id, quote_id).await
    }

    /// Remove `quote` if it is a favorite, add it otherwise.
    pub async fn toggle(
        &self,
        quote: &Quote,
        translated_text: Option<String>,
    ) -> Result<Toggled, ClientError> {
        let _writer = self.writer.lock().await;
        match self.find(&quote.id) {
            Some(existing) => {
                self.remove_locked(&existing.id, &quote.id).await?;
                Ok(Toggled::Removed)
            }
            None => self
                .add_locked(quote, translated_text)
                .await
                .map(Toggled::Added),
        }
    }

    async fn add_locked(
        &self,
        quote: &Quote,
        translated_text: Option<String>,
    ) -> Result<FavoriteQuote, ClientError> {
        let mutation = {
            let mut favorites = self.favorites();
            // A provisional entry is never a confirmed favorite.
            favorites.retain(|fav| !(fav.quote_id == quote.id && Self::is_pending(&fav.id)));
            if let Some(existing) = favorites.iter().find(|fav| fav.quote_id == quote.id) {
                return Ok(existing.clone());
            }

            let provisional = FavoriteQuote {
                id: format!("{PROVISIONAL_PREFIX}{}", Uuid::new_v4()),
                user_id: self.user_id.clone(),
                quote_id: quote.id.clone(),
                created_at: OffsetDateTime::now_utc(),
                translated_content: translated_text.clone(),
                quote: quote.clone(),
            };
            Mutation::insert(&mut favorites, provisional)
        };
        let in_flight = InFlight::new(&self.favorites, mutation);

        let request = AddFavorite {
            quote_id: quote.id.clone(),
            translated_text,
        };

        match self.api.add_favorite(&request).await {
            Ok(created) => {
                in_flight.commit(Some(created.clone()));
                tracing::debug!(quote_id = %quote.id, favorite_id = %created.id, "favorite added");
                Ok(created)
            }
            Err(error) => {
                in_flight.rollback();
                tracing::warn!(quote_id = %quote.id, %error, "adding favorite failed; rolled back");
                Err(error)
            }
        }
    }

    async fn remove_locked(&self, favorite_id: &str, quote_id: &str) -> Result<(), ClientError> {
        let in_flight = Mutation::delete(&mut self.favorites(), favorite_id)
            .map(|mutation| InFlight::new(&self.favorites, mutation));

        let request = RemoveFavorite {
            quote_id: quote_id.to_string(),
        };

        match self.api.remove_favorite(&request).await {
            Ok(()) => {
                if let Some(in_flight) = in_flight {
                    in_flight.commit(None);
                }
                tracing::debug!(%quote_id, %favorite_id, "favorite removed");
                Ok(())
            }
            Err(error) => {
                if let Some(in_flight) = in_flight {
                    in_flight.rollback();
                }
                tracing::warn!(%quote_id, %error, "removing favorite failed; rolled back");
                Err(error)
            }
        }
    }

    fn favorites(&self) -> MutexGuard<'_, Vec<FavoriteQuote>> {
        lock(&self.favorites)
    }
}

fn lock(favorites: &Mutex<Vec<FavoriteQuote>>) -> MutexGuard<'_, Vec<FavoriteQuote>> {
    favorites.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A [`Mutation`] bound to the list it changed. If the remote call is
/// cancelled (the caller's future is dropped) while the mutation is still
/// pending, dropping this rolls it back.
struct InFlight<'a> {
    favorites: &'a Mutex<Vec<FavoriteQuote>>,
    mutation: Mutation,
}

impl<'a> InFlight<'a> {
    fn new(favorites: &'a Mutex<Vec<FavoriteQuote>>, mutation: Mutation) -> Self {
        Self {
            favorites,
            mutation,
        }
    }

    fn commit(mut self, confirmed: Option<FavoriteQuote>) {
        self.mutation.commit(&mut lock(self.favorites), confirmed);
    }

    fn rollback(mut self) {
        self.mutation.rollback(&mut lock(self.favorites));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.mutation.state() == MutationState::Pending {
            self.mutation.rollback(&mut lock(self.favorites));
            tracing::debug!("favorite mutation cancelled before it settled; rolled back");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use time::macros::datetime;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeApi {
        server: Mutex<Vec<FavoriteQuote>>,
        fail_add: AtomicBool,
        fail_remove: AtomicBool,
        next_id: AtomicUsize,
        add_calls: AtomicUsize,
        add_gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    fn failure() -> ClientError {
        ClientError::Api {
            status: 502,
            code: "upstream_error".to_string(),
            message: "Failed to reach backend".to_string(),
        }
    }

    #[async_trait]
    impl FavoritesApi for FakeApi {
        async fn list_favorites(&self) -> Result<Vec<FavoriteQuote>, ClientError> {
            Ok(self.server.lock().unwrap().clone())
        }

        async fn add_favorite(&self, request: &AddFavorite) -> Result<FavoriteQuote, ClientError> {
            self.add_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.add_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if self.fail_add.load(Ordering::SeqCst) {
                return Err(failure());
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let created = FavoriteQuote {
                id: format!("f{n}"),
                user_id: "u1".to_string(),
                quote_id: request.quote_id.clone(),
                created_at: datetime!(2024-06-01 12:00:00 UTC),
                translated_content: request.translated_text.clone(),
                quote: quote(&request.quote_id),
            };
            self.server.lock().unwrap().insert(0, created.clone());
            Ok(created)
        }

        async fn remove_favorite(&self, request: &RemoveFavorite) -> Result<(), ClientError> {
            if self.fail_remove.load(Ordering::SeqCst) {
                return Err(failure());
            }
            self.server
                .lock()
                .unwrap()
                .retain(|fav| fav.quote_id != request.quote_id);
            Ok(())
        }
    }

    fn quote(id: &str) -> Quote {
        Quote {
            id: id.to_string(),
            content: format!("content of {id}"),
            author: "A".to_string(),
            tags: vec![],
        }
    }

    fn stored(id: &str, quote_id: &str, created_at: OffsetDateTime) -> FavoriteQuote {
        FavoriteQuote {
            id: id.to_string(),
            user_id: "u1".to_string(),
            quote_id: quote_id.to_string(),
            created_at,
            translated_content: None,
            quote: quote(quote_id),
        }
    }

    async fn seeded_store() -> FavoritesStore<FakeApi> {
        let api = FakeApi::default();
        *api.server.lock().unwrap() = vec![
            stored("f-old", "q-old", datetime!(2024-01-01 00:00:00 UTC)),
            stored("f-new", "q-new", datetime!(2024-03-01 00:00:00 UTC)),
            stored("f-mid", "q-mid", datetime!(2024-02-01 00:00:00 UTC)),
        ];
        let store = FavoritesStore::with_user(api, "u1");
        store.load().await.unwrap();
        store
    }

    fn quote_ids(store: &FavoritesStore<FakeApi>) -> Vec<String> {
        store.list().into_iter().map(|fav| fav.quote_id).collect()
    }

    #[tokio::test]
    async fn load_sorts_newest_first() {
        let store = seeded_store().await;
        assert_eq!(quote_ids(&store), ["q-new", "q-mid", "q-old"]);
    }

    #[tokio::test]
    async fn add_then_remove_tracks_membership() {
        let store = seeded_store().await;

        let created = store.add(&quote("q1"), Some("hola".to_string())).await.unwrap();
        let matching: Vec<_> = store
            .list()
            .into_iter()
            .filter(|fav| fav.quote_id == "q1")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0], created);
        assert_eq!(store.list()[0].id, created.id);
        assert_eq!(created.translated_content.as_deref(), Some("hola"));

        store.remove(&created.id, "q1").await.unwrap();
        assert!(!store.contains("q1"));
    }

    #[tokio::test]
    async fn adding_an_existing_favorite_skips_the_remote_call() {
        let store = seeded_store().await;
        let existing = store.add(&quote("q-mid"), None).await.unwrap();

        assert_eq!(existing.id, "f-mid");
        assert_eq!(store.api().add_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.list().len(), 3);
    }

    #[tokio::test]
    async fn failed_add_rolls_back() {
        let store = seeded_store().await;
        let before = store.list();
        store.api().fail_add.store(true, Ordering::SeqCst);

        let result = store.add(&quote("q1"), None).await;

        assert!(result.is_err());
        assert_eq!(store.list(), before);
    }

    #[tokio::test]
    async fn failed_remove_restores_exact_list() {
        let store = seeded_store().await;
        let before = store.list();
        store.api().fail_remove.store(true, Ordering::SeqCst);

        let result = store.remove("f-mid", "q-mid").await;

        assert!(result.is_err());
        assert_eq!(store.list(), before);
    }

    #[tokio::test]
    async fn provisional_entry_is_visible_until_confirmed() {
        let store = Arc::new(seeded_store().await);
        let (release, gate) = oneshot::channel();
        *store.api().add_gate.lock().unwrap() = Some(gate);

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.add(&quote("q1"), None).await }
        });

        while store.api().add_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let head = store.list()[0].clone();
        assert_eq!(head.quote_id, "q1");
        assert!(FavoritesStore::<FakeApi>::is_pending(&head.id));

        release.send(()).unwrap();
        let created = pending.await.unwrap().unwrap();

        let head = store.list()[0].clone();
        assert_eq!(head.id, created.id);
        assert!(!FavoritesStore::<FakeApi>::is_pending(&head.id));
        assert_eq!(store.list().len(), 4);
    }

    #[tokio::test]
    async fn toggle_adds_then_removes() {
        let store = seeded_store().await;

        let first = store.toggle(&quote("q1"), None).await.unwrap();
        assert!(matches!(first, Toggled::Added(ref fav) if fav.quote_id == "q1"));

        let second = store.toggle(&quote("q1"), None).await.unwrap();
        assert_eq!(second, Toggled::Removed);
        assert!(!store.contains("q1"));
    }

    #[tokio::test]
    async fn concurrent_adds_of_one_quote_create_a_single_entry() {
        let store = Arc::new(seeded_store().await);

        let q1 = quote("q1");
        let (a, b) = tokio::join!(store.add(&q1, None), store.add(&q1, None));

        assert_eq!(a.unwrap().id, b.unwrap().id);
        assert_eq!(store.api().add_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.list().iter().filter(|fav| fav.quote_id == "q1").count(),
            1
        );
    }

    #[tokio::test]
    async fn cancelled_add_rolls_back_and_can_be_retried() {
        let store = seeded_store().await;
        let before = store.list();
        let (_release, gate) = oneshot::channel::<()>();
        *store.api().add_gate.lock().unwrap() = Some(gate);
        let q1 = quote("q1");

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), store.add(&q1, None)).await;

        assert!(cancelled.is_err());
        assert_eq!(store.list(), before);
        assert!(!store.contains("q1"));

        let created = store.add(&q1, None).await.unwrap();
        assert!(!FavoritesStore::<FakeApi>::is_pending(&created.id));
        assert_eq!(store.api().add_calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.find("q1"), Some(created));
    }

    #[tokio::test]
    async fn stale_provisional_entry_is_not_a_favorite() {
        let store = seeded_store().await;
        let stale = stored("pending-stale", "q1", datetime!(2024-04-01 00:00:00 UTC));
        store.favorites().insert(0, stale);

        let created = store.add(&quote("q1"), None).await.unwrap();

        assert_eq!(created.id, "f1");
        assert_eq!(store.api().add_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.list().iter().filter(|fav| fav.quote_id == "q1").count(),
            1
        );
    }
}
