//! Task-spawning contract for fire-and-forget local futures.

use std::{future::Future, pin::Pin};

use futures::{executor::LocalSpawner, task::LocalSpawnExt};

/// Boxed `!Send` unit future handed to a [`TaskSpawner`].
pub type SpawnedTask = Pin<Box<dyn Future<Output = ()>>>;

/// Host service that drives detached futures on the current thread.
pub trait TaskSpawner {
    /// Spawns `task`; the caller never observes its completion.
    fn spawn(&self, task: SpawnedTask);
}

#[derive(Clone)]
/// Spawner backed by a [`futures::executor::LocalPool`].
pub struct LocalPoolSpawner {
    spawner: LocalSpawner,
}

impl LocalPoolSpawner {
    /// Wraps the spawner of a local pool owned by the caller.
    pub fn new(spawner: LocalSpawner) -> Self {
        Self { spawner }
    }
}

impl TaskSpawner for LocalPoolSpawner {
    fn spawn(&self, task: SpawnedTask) {
        // Spawning only fails once the pool has been dropped; the task is moot then.
        let _ = self.spawner.spawn_local(task);
    }
}
