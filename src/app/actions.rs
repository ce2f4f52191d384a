use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tokio::runtime::Handle;

use crate::api::{NoteRepository, SharedRepository};

use super::controller::{Completion, Effect};
use super::state::SaveMode;

pub struct ActionDispatcher {
    repository: SharedRepository,
    runtime: Handle,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
}

impl ActionDispatcher {
    pub fn new(repository: SharedRepository, runtime: Handle) -> Self {
        let (tx, rx) = unbounded();
        Self {
            repository,
            runtime,
            tx,
            rx,
        }
    }

    pub fn dispatch(&self, effect: Effect) {
        tracing::debug!(?effect, "dispatching effect");
        let repository = self.repository.clone();
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let completion = run_effect(repository.as_ref(), effect).await;
            if tx.send(completion).is_err() {
                tracing::debug!("completion dropped, dispatcher is gone");
            }
        });
    }

    pub fn dispatch_all(&self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.dispatch(effect);
        }
    }

    pub fn drain(&self) -> Vec<Completion> {
        self.rx.try_iter().collect()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        self.rx.recv_timeout(timeout).ok()
    }
}

pub async fn run_effect(repository: &dyn NoteRepository, effect: Effect) -> Completion {
    match effect {
        Effect::FetchNotes { seq, query } => Completion::NotesFetched {
            seq,
            result: repository.list(&query).await,
        },
        Effect::CreateNote { draft } => Completion::Saved {
            mode: SaveMode::Create,
            result: repository.create(&draft).await,
        },
        Effect::UpdateNote { id, draft } => Completion::Saved {
            mode: SaveMode::Update,
            result: repository.update(&id, &draft).await,
        },
        Effect::DeleteNote { id } => {
            let result = repository.delete(&id).await;
            Completion::Deleted { id, result }
        }
    }
}
