use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use camsight_core::detection::infrastructure::model_resolver::{
    self, ModelSpec, FACE_MODEL, HAND_LANDMARK_MODEL, PALM_MODEL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedModel {
    Palm,
    HandLandmark,
    Face,
}

/// Resolves the detector models on a background thread at startup.
/// Callers wait on the slot they need.
pub struct ModelCache {
    palm: Arc<ModelSlot>,
    hand_landmark: Arc<ModelSlot>,
    face: Arc<ModelSlot>,
}

struct ModelSlot {
    result: Mutex<Option<Result<PathBuf, String>>>,
    ready: Condvar,
    progress: Mutex<(u64, u64)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ModelCache {
    pub fn new() -> Arc<Self> {
        let cache = Arc::new(Self {
            palm: Arc::new(ModelSlot::new()),
            hand_landmark: Arc::new(ModelSlot::new()),
            face: Arc::new(ModelSlot::new()),
        });

        let jobs = [
            (cache.palm.clone(), PALM_MODEL),
            (cache.hand_landmark.clone(), HAND_LANDMARK_MODEL),
            (cache.face.clone(), FACE_MODEL),
        ];
        let spawned = thread::Builder::new()
            .name("model-cache".into())
            .spawn(move || {
                for (slot, spec) in jobs {
                    slot.resolve(&spec);
                }
            });
        if let Err(e) = spawned {
            let reason = format!("failed to start model download: {e}");
            for slot in [&cache.palm, &cache.hand_landmark, &cache.face] {
                slot.finish(Err(reason.clone()));
            }
        }

        cache
    }

    /// Waits for a model path, forwarding download progress. Returns early
    /// if `cancelled` is set.
    pub fn wait_for(
        &self,
        model: CachedModel,
        on_progress: &dyn Fn(u64, u64),
        cancelled: &AtomicBool,
    ) -> Result<PathBuf, String> {
        self.slot(model).wait(on_progress, cancelled)
    }

    fn slot(&self, model: CachedModel) -> &ModelSlot {
        match model {
            CachedModel::Palm => &self.palm,
            CachedModel::HandLandmark => &self.hand_landmark,
            CachedModel::Face => &self.face,
        }
    }
}

impl ModelSlot {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
            progress: Mutex::new((0, 0)),
        }
    }

    fn resolve(self: &Arc<Self>, spec: &ModelSpec) {
        let slot = self.clone();
        let result = model_resolver::resolve(
            spec,
            None,
            Some(Box::new(move |downloaded, total| {
                *lock(&slot.progress) = (downloaded, total);
            })),
        );
        if let Err(ref e) = result {
            log::error!("Failed to resolve {}: {e}", spec.name);
        }
        self.finish(result.map_err(|e| e.to_string()));
    }

    fn finish(&self, result: Result<PathBuf, String>) {
        *lock(&self.result) = Some(result);
        self.ready.notify_all();
    }

    fn wait(&self, on_progress: &dyn Fn(u64, u64), cancelled: &AtomicBool) -> Result<PathBuf, String> {
        let mut guard = lock(&self.result);
        loop {
            if cancelled.load(Ordering::Relaxed) {
                return Err("Cancelled".into());
            }
            if let Some(ref result) = *guard {
                return result.clone();
            }
            if let Ok(progress) = self.progress.try_lock() {
                let (downloaded, total) = *progress;
                if total > 0 {
                    on_progress(downloaded, total);
                }
            }
            guard = match self.ready.wait_timeout(guard, Duration::from_millis(100)) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}
