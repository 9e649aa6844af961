//! Room session: binds the local participant to one room at a time.
//!
//! A session owns the subscription to the joined room and mirrors every
//! snapshot into a `watch` channel that games and callers read from. All
//! writes go through the session, which stamps `lastUpdated` on shared
//! writes and the current nickname on participant writes.
//!
//! ```text
//! join(room) ──→ subscribe ──→ bootstrap (CAS on room) ──→ placeholder ──→ bind
//!                    │
//!                    └──→ mirror task ──→ watch::Sender<Option<RoomView>>
//!
//! dispatch(action) ──→ validate ──→ handle ──→ [Intent] ──→ store writes
//! ```
//!
//! Every join gets a fresh binding generation. Mirror tasks and deferred
//! writes carry the generation they were started under and go quiet once
//! the session has been rebound or cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::Stream;
use rand::Rng;
use roomsync_protocol::{
    Codec, JsonCodec, ParticipantRecord, Patch, Path, RoomId, Round, RoundTag, Stamp,
};
use roomsync_session::Identity;
use roomsync_store::{Snapshot, Store, Subscription};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{GameRules, Intent, RoomConfig, RoomError, RoomPhase, RoomView, host};

/// Counter for telling bindings apart, so a stale cancel handle cannot
/// unbind a newer join.
static NEXT_BINDING: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
struct Binding {
    room_id: RoomId,
    generation: u64,
}

type SharedBinding = Arc<Mutex<Option<Binding>>>;

fn lock(binding: &SharedBinding) -> MutexGuard<'_, Option<Binding>> {
    binding.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// CancelHandle
// ---------------------------------------------------------------------------

/// Stops observing a joined room.
///
/// Dropping the handle without calling [`cancel`](CancelHandle::cancel)
/// leaves the observation running.
#[derive(Debug)]
pub struct CancelHandle {
    room_id: RoomId,
    generation: u64,
    task: JoinHandle<()>,
    binding: SharedBinding,
}

impl CancelHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Returns `true` once the mirror task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the subscription. If the session is still bound to this
    /// room, it becomes unbound and further writes are skipped.
    pub fn cancel(self) {
        self.task.abort();
        let mut binding = lock(&self.binding);
        if binding
            .as_ref()
            .is_some_and(|b| b.generation == self.generation)
        {
            *binding = None;
        }
        tracing::info!(room_id = %self.room_id, "left room");
    }
}

// ---------------------------------------------------------------------------
// RoomSession
// ---------------------------------------------------------------------------

/// The local participant's connection to one room of game `G`.
///
/// Cheap to clone; clones share the binding and the snapshot.
pub struct RoomSession<G: GameRules, S: Store> {
    inner: Arc<Inner<G, S>>,
}

struct Inner<G: GameRules, S: Store> {
    store: S,
    identity: Identity,
    config: RoomConfig,
    rules: G::Config,
    codec: JsonCodec,
    binding: SharedBinding,
    snapshot: watch::Sender<Option<RoomView<G>>>,
}

impl<G: GameRules, S: Store> Clone for RoomSession<G, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: GameRules, S: Store> RoomSession<G, S> {
    /// Creates an unbound session.
    pub fn new(store: S, identity: Identity, config: RoomConfig, rules: G::Config) -> Self {
        let (snapshot, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                store,
                identity,
                config,
                rules,
                codec: JsonCodec,
                binding: Arc::new(Mutex::new(None)),
                snapshot,
            }),
        }
    }

    /// Creates an unbound session with default room and game settings.
    pub fn with_defaults(store: S, identity: Identity) -> Self {
        Self::new(store, identity, RoomConfig::default(), G::Config::default())
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn rules(&self) -> &G::Config {
        &self.inner.rules
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// The room this session is bound to, if any.
    pub fn room_id(&self) -> Option<RoomId> {
        lock(&self.inner.binding).as_ref().map(|b| b.room_id.clone())
    }

    // -- Observation -------------------------------------------------------

    /// Starts observing `room_id`, bootstrapping it if needed.
    ///
    /// - If nothing is stored for the room, exactly one concurrent joiner
    ///   wins a compare-and-set on the room path and writes the game's
    ///   initial shared state with `round = 1` in that single write.
    /// - A room left without a `gameId` by an interrupted setup gets its
    ///   missing initial keys filled in.
    /// - If the local participant has no record, a placeholder tagged
    ///   "joined" is written, without overwriting a record that appears
    ///   concurrently.
    ///
    /// Joining again without cancelling the previous handle rebinds the
    /// session. From then on only the new room feeds the snapshot; the
    /// previous mirror task stops at its next update.
    ///
    /// # Errors
    /// Store failures are returned and the session keeps its previous
    /// binding.
    pub async fn join(&self, room_id: RoomId) -> Result<CancelHandle, RoomError> {
        let room_path = self.inner.config.room_path(&room_id);
        let mut subscription = self.inner.store.subscribe(&room_path).await?;

        self.bootstrap(&room_id, &room_path).await?;
        self.ensure_placeholder(&room_id).await?;

        let generation = NEXT_BINDING.fetch_add(1, Ordering::Relaxed);
        let previous = lock(&self.inner.binding).replace(Binding {
            room_id: room_id.clone(),
            generation,
        });
        if let Some(previous) = previous {
            tracing::debug!(
                room_id = %room_id,
                previous = %previous.room_id,
                "rebinding session without cancelling previous room"
            );
        }

        // Everything written so far is already buffered; apply it before
        // the mirror task takes over so `snapshot()` is current on return.
        while let Some(snapshot) = subscription.try_next() {
            self.publish(generation, &room_id, snapshot);
        }
        let phase = self
            .snapshot()
            .filter(|view| view.room_id() == &room_id)
            .map_or(RoomPhase::Uninitialized, |view| view.phase());

        let task = tokio::spawn(self.clone().mirror(generation, room_id.clone(), subscription));
        tracing::info!(
            room_id = %room_id,
            participant = %self.inner.identity.participant_id(),
            %phase,
            "joined room"
        );

        Ok(CancelHandle {
            room_id,
            generation,
            task,
            binding: Arc::clone(&self.inner.binding),
        })
    }

    /// The last snapshot seen, or `None` before any join.
    pub fn snapshot(&self) -> Option<RoomView<G>> {
        self.inner.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every new snapshot.
    pub fn watch(&self) -> watch::Receiver<Option<RoomView<G>>> {
        self.inner.snapshot.subscribe()
    }

    /// The snapshots as a stream, starting with the current one.
    pub fn snapshots(&self) -> impl Stream<Item = RoomView<G>> + Send + 'static {
        let mut receiver = self.watch();
        receiver.mark_changed();
        futures_util::stream::unfold(receiver, |mut receiver| async move {
            loop {
                receiver.changed().await.ok()?;
                let view = receiver.borrow_and_update().clone();
                if let Some(view) = view {
                    return Some((view, receiver));
                }
            }
        })
    }

    /// Re-reads the bound room and replaces the cached snapshot.
    ///
    /// Returns `Ok(None)` when unbound.
    pub async fn refresh(&self) -> Result<Option<RoomView<G>>, RoomError> {
        let Some(binding) = lock(&self.inner.binding).clone() else {
            return Ok(None);
        };
        self.load(&binding).await.map(Some)
    }

    // -- Writes ------------------------------------------------------------

    /// Merges `fields` into the room's shared state and stamps
    /// `lastUpdated` with the store's clock.
    ///
    /// Skipped when no room is joined.
    pub async fn update_shared_state(&self, fields: &[G::SharedField]) -> Result<(), RoomError> {
        let Some(Binding { room_id, .. }) = self.bound_or_skip("update shared state") else {
            return Ok(());
        };
        self.write_shared(&room_id, fields).await
    }

    /// Merges `fields` into the local participant's own record, stamping
    /// the current nickname.
    ///
    /// Skipped when no room is joined.
    pub async fn update_participant_state(
        &self,
        fields: &[G::ParticipantField],
    ) -> Result<(), RoomError> {
        let Some(Binding { room_id, .. }) = self.bound_or_skip("update participant state") else {
            return Ok(());
        };
        let mut patch = Patch::from_fields(fields)?;
        if let Some(nickname) = self.inner.identity.stamped_nickname() {
            patch.insert("nickname", Value::String(nickname));
        }
        self.inner
            .store
            .update(&self.participant_path(&room_id), patch.into_map())
            .await?;
        Ok(())
    }

    /// Replaces the local participant's own record, stamping the current
    /// nickname.
    ///
    /// Skipped when no room is joined.
    pub async fn set_participant_state(
        &self,
        round: RoundTag,
        data: G::Participant,
    ) -> Result<(), RoomError> {
        let Some(Binding { room_id, .. }) = self.bound_or_skip("set participant state") else {
            return Ok(());
        };
        let record = ParticipantRecord {
            round,
            nickname: self.inner.identity.stamped_nickname(),
            data,
        };
        let value = self.inner.codec.encode(&record)?;
        self.inner
            .store
            .set(&self.participant_path(&room_id), value)
            .await?;
        Ok(())
    }

    /// Tries to become the room's host; see [`host`](crate::host).
    ///
    /// `then` is written to the shared state only if this call wins.
    /// Returns `Ok(false)` when unbound or when a host already exists.
    pub async fn claim_host(&self, then: &[G::SharedField]) -> Result<bool, RoomError> {
        let Some(Binding { room_id, .. }) = self.bound_or_skip("claim host") else {
            return Ok(false);
        };
        let room_path = self.inner.config.room_path(&room_id);
        let won = host::elect_host(
            &self.inner.store,
            &room_id,
            &room_path,
            self.inner.identity.participant_id(),
        )
        .await?;
        if won && !then.is_empty() {
            self.write_shared(&room_id, then).await?;
        }
        Ok(won)
    }

    /// Runs `action` through the game's rules against the current
    /// snapshot and applies the resulting intents in order.
    ///
    /// When the cached snapshot is missing or belongs to another room,
    /// the bound room is read from the store first.
    ///
    /// Skipped when no room is joined.
    ///
    /// # Errors
    /// - [`RoomError::NotInitialized`] if the room has no `round`.
    /// - [`RoomError::InvalidAction`] if the rules reject the action.
    /// - Store and encoding failures from the reads and writes.
    pub async fn dispatch(&self, action: G::Action) -> Result<(), RoomError> {
        let Some((room_id, view)) = self.current_view().await? else {
            return Ok(());
        };
        let intents = {
            let mut rng = rand::rng();
            self.plan(&view, action, &mut rng)
        }?;
        self.apply_all(&room_id, view.round(), intents).await
    }

    /// Like [`dispatch`](Self::dispatch), drawing randomness from `rng`
    /// instead of the thread-local generator.
    ///
    /// The returned future is `Send` only when `R` is.
    pub async fn dispatch_with_rng<R: Rng + ?Sized>(
        &self,
        action: G::Action,
        rng: &mut R,
    ) -> Result<(), RoomError> {
        let Some((room_id, view)) = self.current_view().await? else {
            return Ok(());
        };
        let intents = self.plan(&view, action, rng)?;
        self.apply_all(&room_id, view.round(), intents).await
    }

    // -- Internals ---------------------------------------------------------

    async fn current_view(&self) -> Result<Option<(RoomId, RoomView<G>)>, RoomError> {
        let Some(binding) = self.bound_or_skip("dispatch action") else {
            return Ok(None);
        };
        let cached = self
            .snapshot()
            .filter(|view| view.room_id() == &binding.room_id);
        let view = match cached {
            Some(view) => view,
            None => self.load(&binding).await?,
        };
        Ok(Some((binding.room_id, view)))
    }

    fn plan<R: Rng + ?Sized>(
        &self,
        view: &RoomView<G>,
        action: G::Action,
        rng: &mut R,
    ) -> Result<Vec<Intent<G>>, RoomError> {
        let room_id = view.room_id();
        let phase = view.phase();
        if !phase.is_active() {
            tracing::debug!(room_id = %room_id, %phase, ?action, "action on uninitialized room");
            return Err(RoomError::NotInitialized(room_id.clone()));
        }

        let identity = &self.inner.identity;
        if let Err(reason) = G::validate_action(&self.inner.rules, view, identity, &action) {
            tracing::debug!(
                room_id = %room_id,
                participant = %identity.participant_id(),
                ?action,
                %reason,
                "action rejected"
            );
            return Err(RoomError::InvalidAction(reason));
        }

        tracing::debug!(room_id = %room_id, ?action, "handling action");
        Ok(G::handle_action(&self.inner.rules, view, identity, action, rng))
    }

    async fn apply_all(
        &self,
        room_id: &RoomId,
        round: Round,
        intents: Vec<Intent<G>>,
    ) -> Result<(), RoomError> {
        for intent in intents {
            self.apply(room_id, round, intent).await?;
        }
        Ok(())
    }

    /// `planned` is the round the intents were computed against.
    async fn apply(
        &self,
        room_id: &RoomId,
        planned: Round,
        intent: Intent<G>,
    ) -> Result<(), RoomError> {
        match intent {
            Intent::UpdateShared(fields) => self.write_shared(room_id, &fields).await,
            Intent::UpdateParticipant(fields) => self.update_participant_state(&fields).await,
            Intent::SetParticipant { round, data } => {
                self.set_participant_state(round, data).await
            }
            Intent::ClaimHost { then } => self.claim_host(&then).await.map(|_| ()),
            Intent::Deferred { after, fields } => {
                let session = self.clone();
                let room_id = room_id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    if let Err(e) = session.write_deferred(&room_id, planned, &fields).await {
                        tracing::warn!(room_id = %room_id, error = %e, "deferred write failed");
                    }
                });
                Ok(())
            }
        }
    }

    /// Writes `fields` unless the session left `room_id` or the room moved
    /// past `round` in the meantime.
    async fn write_deferred(
        &self,
        room_id: &RoomId,
        round: Round,
        fields: &[G::SharedField],
    ) -> Result<(), RoomError> {
        if self.room_id().as_ref() != Some(room_id) {
            tracing::debug!(room_id = %room_id, "deferred write skipped, room left");
            return Ok(());
        }
        let round_path = self.inner.config.room_path(room_id).child("round");
        let stored = self.inner.store.get(&round_path).await?;
        if stored != Some(self.inner.codec.encode(&round)?) {
            tracing::debug!(
                room_id = %room_id,
                %round,
                ?stored,
                "deferred write skipped, round moved on"
            );
            return Ok(());
        }
        self.write_shared(room_id, fields).await
    }

    async fn write_shared(
        &self,
        room_id: &RoomId,
        fields: &[G::SharedField],
    ) -> Result<(), RoomError> {
        let mut patch = Patch::from_fields(fields)?;
        patch.insert("lastUpdated", Stamp::server_value());
        self.inner
            .store
            .update(&self.inner.config.room_path(room_id), patch.into_map())
            .await?;
        Ok(())
    }

    /// Writes the game's initial shared state into an empty room.
    ///
    /// The whole initial object goes in with one compare-and-set on the
    /// room path, so other joiners see either nothing or a complete room.
    /// A room that exists without a `gameId` was set up only partially;
    /// each missing initial key is then filled with its own
    /// compare-and-set, leaving keys that are present untouched.
    async fn bootstrap(&self, room_id: &RoomId, room_path: &Path) -> Result<(), RoomError> {
        let mut initial = Patch::from_fields(&G::initial_shared(&self.inner.rules))?;
        initial.insert("round", self.inner.codec.encode(&Round::FIRST)?);
        initial.insert_serialized("gameId", &G::GAME)?;
        let initial = initial.into_map();

        let mut room = initial.clone();
        room.insert("lastUpdated".into(), Stamp::server_value());
        let won = self
            .inner
            .store
            .compare_and_set(room_path, None, Value::Object(room))
            .await?;
        if won {
            tracing::info!(room_id = %room_id, game = %G::GAME, "room bootstrapped");
            return Ok(());
        }

        if self.inner.store.get(&room_path.child("gameId")).await?.is_some() {
            return Ok(());
        }
        let mut filled = Vec::new();
        for (key, value) in initial {
            if value.is_null() {
                continue;
            }
            let path = room_path.child(key.as_str());
            if self.inner.store.compare_and_set(&path, None, value).await? {
                filled.push(key);
            }
        }
        if !filled.is_empty() {
            let mut stamp = Patch::new();
            stamp.insert("lastUpdated", Stamp::server_value());
            self.inner.store.update(room_path, stamp.into_map()).await?;
            tracing::info!(
                room_id = %room_id,
                game = %G::GAME,
                keys = ?filled,
                "room repaired"
            );
        }
        Ok(())
    }

    /// Writes a "joined" placeholder unless a record already exists.
    async fn ensure_placeholder(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let nickname = self.inner.identity.stamped_nickname();
        let record = ParticipantRecord::<G::Participant>::placeholder(nickname);
        let written = self
            .inner
            .store
            .compare_and_set(
                &self.participant_path(room_id),
                None,
                self.inner.codec.encode(&record)?,
            )
            .await?;
        if written {
            tracing::debug!(
                room_id = %room_id,
                participant = %self.inner.identity.participant_id(),
                "participant placeholder written"
            );
        }
        Ok(())
    }

    async fn mirror(self, generation: u64, room_id: RoomId, mut subscription: Subscription) {
        while let Some(snapshot) = subscription.next().await {
            if !self.publish(generation, &room_id, snapshot) {
                tracing::debug!(room_id = %room_id, "session rebound, room updates stopped");
                return;
            }
        }
        tracing::debug!(room_id = %room_id, "room subscription closed");
    }

    /// Returns `false` once `generation` is no longer the session's binding.
    fn publish(&self, generation: u64, room_id: &RoomId, snapshot: Snapshot) -> bool {
        match self.decode(room_id, snapshot.value) {
            Ok(view) => self.replace_snapshot(generation, view),
            Err(e) => {
                tracing::warn!(room_id = %room_id, error = %e, "undecodable room snapshot");
                true
            }
        }
    }

    /// Replaces the cached snapshot only while `generation` is current.
    ///
    /// The binding lock is held across the replace so a rebind cannot
    /// slip in between the check and the write.
    fn replace_snapshot(&self, generation: u64, view: RoomView<G>) -> bool {
        let binding = lock(&self.inner.binding);
        if binding.as_ref().map(|b| b.generation) != Some(generation) {
            return false;
        }
        self.inner.snapshot.send_replace(Some(view));
        true
    }

    async fn load(&self, binding: &Binding) -> Result<RoomView<G>, RoomError> {
        let room_path = self.inner.config.room_path(&binding.room_id);
        let value = self.inner.store.get(&room_path).await?;
        let view = self.decode(&binding.room_id, value)?;
        self.replace_snapshot(binding.generation, view.clone());
        Ok(view)
    }

    fn decode(&self, room_id: &RoomId, value: Option<Value>) -> Result<RoomView<G>, RoomError> {
        let record = match value {
            Some(value) => self.inner.codec.decode(value)?,
            None => return Ok(RoomView::empty(room_id.clone())),
        };
        Ok(RoomView::new(room_id.clone(), record))
    }

    fn bound_or_skip(&self, operation: &str) -> Option<Binding> {
        let binding = lock(&self.inner.binding).clone();
        if binding.is_none() {
            tracing::debug!(operation, "no room joined, skipping");
        }
        binding
    }

    fn participant_path(&self, room_id: &RoomId) -> Path {
        Path::participant(
            &self.inner.config.root,
            room_id,
            self.inner.identity.participant_id(),
        )
    }
}
