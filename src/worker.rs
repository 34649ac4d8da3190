//! Background feature extraction.
//!
//! [`FeatureWorker`] moves [`extract_features`] onto a dedicated thread that
//! talks to the driver through a pair of bounded channels of capacity one.
//! The driver sends a raster, waits for the matching feature, and gets the
//! raster back so its allocation is reused for the next capture. At most one
//! request is ever in flight.
//!
//! Dropping the worker closes the request channel; the thread sees the
//! disconnect and exits, and `Drop` joins it.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::{self, JoinHandle};

use crate::error::AnalysisError;
use crate::features::{FrameFeature, extract_features};

struct FeatureRequest {
    timestamp: f64,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

struct FeatureResponse {
    feature: Result<FrameFeature, AnalysisError>,
    pixels: Vec<u8>,
}

/// A feature-extraction thread with one request in flight.
pub struct FeatureWorker {
    requests: Option<SyncSender<FeatureRequest>>,
    responses: Receiver<FeatureResponse>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for FeatureWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureWorker")
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl FeatureWorker {
    /// Start the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::IoError`] if the thread cannot be spawned.
    pub fn spawn() -> Result<Self, AnalysisError> {
        let (request_sender, request_receiver) = sync_channel::<FeatureRequest>(1);
        let (response_sender, response_receiver) = sync_channel::<FeatureResponse>(1);

        let handle = thread::Builder::new()
            .name("shotlens-features".to_string())
            .spawn(move || {
                while let Ok(request) = request_receiver.recv() {
                    let feature = extract_features(
                        &request.pixels,
                        request.width,
                        request.height,
                        request.timestamp,
                    );
                    let response = FeatureResponse {
                        feature,
                        pixels: request.pixels,
                    };
                    if response_sender.send(response).is_err() {
                        break;
                    }
                }
                log::trace!("Feature worker exiting");
            })?;

        Ok(Self {
            requests: Some(request_sender),
            responses: response_receiver,
            handle: Some(handle),
        })
    }

    /// Extract the feature of one RGBA raster on the worker thread.
    ///
    /// Blocks until the worker answers. On success the raster is returned
    /// alongside the feature so the caller can reuse it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::WorkerDisconnected`] if the thread is gone,
    /// or the extraction error for a malformed raster.
    pub fn extract(
        &mut self,
        timestamp: f64,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<(FrameFeature, Vec<u8>), AnalysisError> {
        let requests = self
            .requests
            .as_ref()
            .ok_or(AnalysisError::WorkerDisconnected)?;
        requests
            .send(FeatureRequest {
                timestamp,
                width,
                height,
                pixels,
            })
            .map_err(|_| AnalysisError::WorkerDisconnected)?;

        let response = self
            .responses
            .recv()
            .map_err(|_| AnalysisError::WorkerDisconnected)?;
        Ok((response.feature?, response.pixels))
    }
}

impl Drop for FeatureWorker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("Feature worker thread panicked");
        }
    }
}
