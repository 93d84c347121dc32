use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use camsight_core::detection::domain::detector_adapter::{DetectorAdapter, DetectorKind};
use camsight_core::detection::domain::hand_detector::HandDrawOptions;
use camsight_core::detection::domain::hand_landmark_model::HandModelConfig;
use camsight_core::detection::infrastructure::detector_factory::{
    create_face_detector, create_hand_detector,
};

use super::model_cache::{CachedModel, ModelCache};

pub enum BuildMessage {
    DownloadProgress(DetectorKind, u64, u64),
    Ready(Box<dyn DetectorAdapter>),
    Failed(DetectorKind, String),
}

pub struct BuildParams {
    pub hand_config: HandModelConfig,
    pub model_cache: Arc<ModelCache>,
}

/// Builds the hand and face adapters off the UI thread. Each one is sent as
/// soon as it is ready; a failure for one does not stop the other.
pub fn spawn(params: BuildParams) -> (Receiver<BuildMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<BuildMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    let spawned = thread::Builder::new()
        .name("detector-builder".into())
        .spawn(move || {
            for kind in [DetectorKind::Hand, DetectorKind::Face] {
                if cancelled_clone.load(Ordering::Relaxed) {
                    return;
                }
                let message = match build(kind, &params, &tx, &cancelled_clone) {
                    Ok(adapter) => BuildMessage::Ready(adapter),
                    Err(e) => BuildMessage::Failed(kind, e.to_string()),
                };
                if tx.send(message).is_err() {
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        log::error!("Failed to start detector builder: {e}");
    }

    (rx, cancelled)
}

fn build(
    kind: DetectorKind,
    params: &BuildParams,
    tx: &Sender<BuildMessage>,
    cancelled: &AtomicBool,
) -> Result<Box<dyn DetectorAdapter>, Box<dyn std::error::Error>> {
    let wait = |model: CachedModel| -> Result<PathBuf, Box<dyn std::error::Error>> {
        let tx_dl = tx.clone();
        params
            .model_cache
            .wait_for(
                model,
                &|dl, total| {
                    let _ = tx_dl.send(BuildMessage::DownloadProgress(kind, dl, total));
                },
                cancelled,
            )
            .map_err(|e| -> Box<dyn std::error::Error> { e.into() })
    };

    match kind {
        DetectorKind::Hand => {
            let palm = wait(CachedModel::Palm)?;
            let landmark = wait(CachedModel::HandLandmark)?;
            Ok(Box::new(create_hand_detector(
                &palm,
                &landmark,
                params.hand_config,
                HandDrawOptions::default(),
            )?))
        }
        DetectorKind::Face => {
            let face = wait(CachedModel::Face)?;
            Ok(Box::new(create_face_detector(&face, true)?))
        }
    }
}
