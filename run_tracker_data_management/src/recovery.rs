//! Startup recovery of an interrupted session.
//!
//! Runs once before any new fix is accepted. The state machine is
//! Init → CheckPending → AwaitDecision → Restoring → Idle, where every state
//! may fall through to Idle.

use std::path::Path;

use run_tracker_lib::{photo::PhotoRecord, photo_codec::PhotoCodec};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Init,
    CheckPending,
    AwaitDecision,
    Restoring,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    Resume,
    Discard,
    /// No answer was given. Both stores are left as they are.
    Undecided,
}

/// Result of startup recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The photo store could not be opened. Recovery was skipped and photos
    /// are kept in memory only.
    BlobStoreUnavailable,
    NoPendingSession,
    Discarded,
    /// A session is pending but no decision was made. Nothing was restored
    /// or deleted.
    Undecided,
    Resumed { track_points: usize, photos: usize },
}

/// Answers the one question asked at startup: continue the unfinished run?
#[async_trait::async_trait]
pub trait DecisionProvider: Send + Sync {
    async fn decide(&self) -> RecoveryDecision;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub RecoveryDecision);

#[async_trait::async_trait]
impl DecisionProvider for FixedDecision {
    async fn decide(&self) -> RecoveryDecision {
        self.0
    }
}

/// Asks on the terminal. An explicit yes resumes and any other answer
/// discards. Closed or unreadable input is no answer at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinDecision;

#[async_trait::async_trait]
impl DecisionProvider for StdinDecision {
    async fn decide(&self) -> RecoveryDecision {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(b"Found an unfinished run. Restore GPS & Photos? [y/N] ").await;
        let _ = stdout.flush().await;

        read_decision(&mut tokio::io::BufReader::new(tokio::io::stdin())).await
    }
}

async fn read_decision<R: AsyncBufRead + Unpin>(reader: &mut R) -> RecoveryDecision {
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) => {
            warn!("No answer on stdin, leaving the unfinished run untouched");
            RecoveryDecision::Undecided
        }
        Ok(_) => parse_answer(&line),
        Err(err) => {
            warn!("Could not read answer: {}", err);
            RecoveryDecision::Undecided
        }
    }
}

fn parse_answer(line: &str) -> RecoveryDecision {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => RecoveryDecision::Resume,
        _ => RecoveryDecision::Discard,
    }
}

fn transition(from: RecoveryState, to: RecoveryState) -> RecoveryState {
    debug!(from = ?from, to = ?to, "Recovery transition");
    to
}

/// Open the photo store at `photo_database_path` and offer to restore any
/// session left behind by a previous run.
pub async fn recover(manager: &mut SessionManager, photo_database_path: &Path, decider: &dyn DecisionProvider) -> RecoveryOutcome {
    let mut state = RecoveryState::Init;

    if let Err(err) = manager.blob_store_mut().open(photo_database_path).await {
        warn!(path = %photo_database_path.display(), error = %err, "Photo store unavailable, photos will not persist");
        transition(state, RecoveryState::Idle);
        return RecoveryOutcome::BlobStoreUnavailable;
    }
    state = transition(state, RecoveryState::CheckPending);

    let Some(persisted) = manager.scalar_store().load() else {
        transition(state, RecoveryState::Idle);
        return RecoveryOutcome::NoPendingSession;
    };
    state = transition(state, RecoveryState::AwaitDecision);

    match decider.decide().await {
        RecoveryDecision::Resume => {}
        RecoveryDecision::Discard => {
            manager.wipe_stores().await;
            transition(state, RecoveryState::Idle);
            info!("Discarded unfinished session");
            return RecoveryOutcome::Discarded;
        }
        RecoveryDecision::Undecided => {
            transition(state, RecoveryState::Idle);
            return RecoveryOutcome::Undecided;
        }
    }
    state = transition(state, RecoveryState::Restoring);

    let stored = manager.blob_store().get_all().await;
    let photos = readable_photos(manager.codec(), stored);
    let outcome = RecoveryOutcome::Resumed {
        track_points: persisted.track_points.len(),
        photos: photos.len(),
    };

    manager.restore(persisted, photos);
    transition(state, RecoveryState::Idle);

    info!(
        track_points = manager.state().track_points.len(),
        photos = manager.state().photos.len(),
        distance = manager.state().total_distance_meters,
        "Restored unfinished session"
    );
    outcome
}

/// Drop records whose chunks no longer form an image, and order the rest by
/// capture time.
fn readable_photos(codec: &PhotoCodec, photos: Vec<PhotoRecord>) -> Vec<PhotoRecord> {
    let mut readable: Vec<PhotoRecord> = photos
        .into_iter()
        .filter(|photo| match codec.decode_image(&photo.encoded_chunks) {
            Ok(_) => true,
            Err(err) => {
                warn!(timestamp = photo.capture_timestamp_ms, error = %err, "Dropping unreadable photo");
                false
            }
        })
        .collect();

    readable.sort_by_key(|photo| photo.capture_timestamp_ms);
    readable
}
