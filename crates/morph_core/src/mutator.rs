//! Cooperative-cancel mutual exclusion for animation targets
//!
//! A [`MutatorMutex`] guards one animatable target. At most one mutation
//! (an animation, a snap, a drag-driven write) runs against the target at a
//! time. Starting a new mutation cancels the running one and waits for it
//! to release before running, so the newest intent always wins and intents
//! never queue behind each other.
//!
//! Cancellation is cooperative: the superseded mutation observes its
//! [`MutationScope`] being cancelled at its next suspension point and exits
//! without writing again.
//!
//! ```ignore
//! let mutex = MutatorMutex::new();
//!
//! // Long-running animation
//! let animation = mutex.mutate(MutatePriority::Default, |scope| async move {
//!     while scope.is_active() {
//!         frame().await;
//!     }
//! });
//!
//! // Later: a snap takes over and the animation resolves to Cancelled
//! mutex.mutate(MutatePriority::Default, |_| async { snap() }).await?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::MutationError;
use crate::sync::lock;

/// Priority of a mutation
///
/// A new mutation may only take over a running one of equal or lower
/// priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MutatePriority {
    /// Programmatic animations
    #[default]
    Default,
    /// Driven by user input (drags, flings)
    UserInput,
    /// Must not be interrupted by user input
    PreventUserInput,
}

/// Cancellation view handed to a running mutation
#[derive(Clone, Debug)]
pub struct MutationScope {
    token: CancellationToken,
}

impl MutationScope {
    /// Whether this mutation still owns the target
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Resolve once this mutation has been superseded
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Ownership of a target claimed by [`MutatorMutex::reserve`]
#[must_use = "a reserved target stays locked until the ticket is run or abandoned"]
#[derive(Debug)]
pub struct MutationTicket {
    id: u64,
    token: CancellationToken,
}

impl MutationTicket {
    /// Whether no newer mutation has taken over since the reservation
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

struct Mutator {
    id: u64,
    priority: MutatePriority,
    token: CancellationToken,
}

/// Per-target exclusive task slot with cancel-then-replace semantics
pub struct MutatorMutex {
    current: Mutex<Option<Mutator>>,
    exclusive: AsyncMutex<()>,
    next_id: AtomicU64,
}

impl Default for MutatorMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MutatorMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutatorMutex")
            .field("locked", &self.is_locked())
            .finish()
    }
}

impl MutatorMutex {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            exclusive: AsyncMutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `block` as the sole mutation of this target
    ///
    /// Cancels the running mutation if its priority is not higher than
    /// `priority`, waits for it to release, then runs `block`.
    ///
    /// Returns [`MutationError::Cancelled`] if a newer mutation took over
    /// before or while `block` ran, and [`MutationError::Rejected`] if a
    /// higher-priority mutation is running.
    pub async fn mutate<F, Fut, R>(
        &self,
        priority: MutatePriority,
        block: F,
    ) -> Result<R, MutationError>
    where
        F: FnOnce(MutationScope) -> Fut,
        Fut: Future<Output = R>,
    {
        let ticket = self.reserve(priority)?;
        self.mutate_reserved(ticket, block).await
    }

    /// Take over the target now and run the mutation later
    ///
    /// The running mutation is cancelled before this returns, so the order
    /// of `reserve` calls decides which mutation wins, regardless of the
    /// order in which the tasks running them are scheduled.
    pub fn reserve(&self, priority: MutatePriority) -> Result<MutationTicket, MutationError> {
        let (id, token) = self.try_acquire(priority)?;
        Ok(MutationTicket { id, token })
    }

    /// Run `block` under a ticket from [`reserve`](Self::reserve)
    ///
    /// Fails with [`MutationError::Cancelled`] without running `block` if
    /// the ticket was superseded in the meantime.
    pub async fn mutate_reserved<F, Fut, R>(
        &self,
        ticket: MutationTicket,
        block: F,
    ) -> Result<R, MutationError>
    where
        F: FnOnce(MutationScope) -> Fut,
        Fut: Future<Output = R>,
    {
        let MutationTicket { id, token } = ticket;
        let _release = ReleaseOnDrop { mutex: self, id };

        let _guard = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(MutationError::Cancelled),
            guard = self.exclusive.lock() => guard,
        };

        let scope = MutationScope {
            token: token.clone(),
        };
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(MutationError::Cancelled),
            value = block(scope) => Ok(value),
        }
    }

    /// Give up a ticket without running anything
    ///
    /// Returns whether the ticket still owned the target.
    pub fn abandon(&self, ticket: MutationTicket) -> bool {
        let owned = !ticket.token.is_cancelled();
        ticket.token.cancel();
        self.release(ticket.id);
        owned
    }

    /// Cancel the running mutation, if any, without starting a new one
    ///
    /// This is the synchronous stop used when a gesture grabs the target:
    /// the cancelled mutation never writes again.
    pub fn cancel_current(&self) -> bool {
        match lock(&self.current).as_ref() {
            Some(running) => {
                running.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a mutation currently owns the target
    pub fn is_locked(&self) -> bool {
        lock(&self.current)
            .as_ref()
            .is_some_and(|running| !running.token.is_cancelled())
    }

    fn try_acquire(
        &self,
        priority: MutatePriority,
    ) -> Result<(u64, CancellationToken), MutationError> {
        let mut current = lock(&self.current);
        if let Some(running) = current.as_ref() {
            if !running.token.is_cancelled() && priority < running.priority {
                trace!(?priority, running = ?running.priority, "mutation rejected");
                return Err(MutationError::Rejected);
            }
            trace!(id = running.id, "superseding running mutation");
            running.token.cancel();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *current = Some(Mutator {
            id,
            priority,
            token: token.clone(),
        });
        Ok((id, token))
    }

    fn release(&self, id: u64) {
        let mut current = lock(&self.current);
        if current.as_ref().is_some_and(|running| running.id == id) {
            *current = None;
        }
    }
}

struct ReleaseOnDrop<'a> {
    mutex: &'a MutatorMutex,
    id: u64,
}

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.mutex.release(self.id);
    }
}
