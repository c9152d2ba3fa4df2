//! Two-phase optimistic mutations over the local favorites list.
//!
//! A [`Mutation`] is applied to the list immediately and starts out
//! [`MutationState::Pending`]. Once the remote call finishes it is either
//! committed or rolled back; both transitions are only valid from `Pending`.

use quotes_model::FavoriteQuote;

/// Prefix for identifiers of entries the server has not confirmed yet.
pub const PROVISIONAL_PREFIX: &str = "pending-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Committed,
    RolledBack,
}

#[derive(Debug)]
enum Change {
    Insert { provisional_id: String },
    Delete { entry: FavoriteQuote, index: usize },
}

/// A provisional change to the favorites list awaiting remote confirmation.
#[derive(Debug)]
pub struct Mutation {
    change: Change,
    state: MutationState,
}

impl Mutation {
    /// Put `provisional` at the head of the list (newest first).
    pub fn insert(list: &mut Vec<FavoriteQuote>, provisional: FavoriteQuote) -> Self {
        let provisional_id = provisional.id.clone();
        list.insert(0, provisional);
        Self {
            change: Change::Insert { provisional_id },
            state: MutationState::Pending,
        }
    }

    /// Take the entry with `favorite_id` out of the list. Returns `None` when
    /// there is nothing to remove locally.
    pub fn delete(list: &mut Vec<FavoriteQuote>, favorite_id: &str) -> Option<Self> {
        let index = list.iter().position(|fav| fav.id == favorite_id)?;
        let entry = list.remove(index);
        Some(Self {
            change: Change::Delete { entry, index },
            state: MutationState::Pending,
        })
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Confirm the change. For inserts, `confirmed` replaces the provisional
    /// entry in place.
    pub fn commit(&mut self, list: &mut [FavoriteQuote], confirmed: Option<FavoriteQuote>) {
        if !self.begin_transition(MutationState::Committed) {
            return;
        }

        if let (Change::Insert { provisional_id }, Some(confirmed)) = (&self.change, confirmed) {
            match list.iter_mut().find(|fav| &fav.id == provisional_id) {
                Some(slot) => *slot = confirmed,
                None => tracing::debug!(
                    %provisional_id,
                    "provisional favorite vanished before commit"
                ),
            }
        }
    }

    /// Undo the change.
    pub fn rollback(&mut self, list: &mut Vec<FavoriteQuote>) {
        if !self.begin_transition(MutationState::RolledBack) {
            return;
        }

        match &self.change {
            Change::Insert { provisional_id } => list.retain(|fav| &fav.id != provisional_id),
            Change::Delete { entry, index } => {
                if list.iter().any(|fav| fav.quote_id == entry.quote_id) {
                    return;
                }
                let index = (*index).min(list.len());
                list.insert(index, entry.clone());
            }
        }
    }

    fn begin_transition(&mut self, next: MutationState) -> bool {
        if self.state != MutationState::Pending {
            tracing::warn!(
                from = ?self.state,
                to = ?next,
                "ignoring transition of a settled mutation"
            );
            return false;
        }
        self.state = next;
        true
    }
}
