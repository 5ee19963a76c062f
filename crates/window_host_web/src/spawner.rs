//! Microtask-queue task spawner.

use window_host::{SpawnedTask, TaskSpawner};

#[derive(Debug, Clone, Copy, Default)]
/// Spawner driving detached futures with `wasm_bindgen_futures::spawn_local`.
///
/// Off the browser there is no event loop to drive them, so tasks are dropped unpolled.
pub struct WebTaskSpawner;

impl TaskSpawner for WebTaskSpawner {
    fn spawn(&self, task: SpawnedTask) {
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);

        #[cfg(not(target_arch = "wasm32"))]
        drop(task);
    }
}
