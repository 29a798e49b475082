use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use rollcall_core::{
    EmbeddingExtractor, ExtractorError, Gallery, GalleryError, MatchError, MatchResult, Matcher,
};

use crate::frame::Frame;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("gallery error: {0}")]
    Gallery(#[from] GalleryError),
    #[error("match error: {0}")]
    Match(#[from] MatchError),
    #[error("extractor error: {0}")]
    Extractor(#[from] ExtractorError),
    #[error("service thread exited")]
    ChannelClosed,
}

/// Result of an enrollment request.
#[derive(Debug)]
pub struct EnrollOutcome {
    /// Embeddings stored for the subject.
    pub stored: usize,
    /// Frames skipped because they held zero or several faces, or failed
    /// extraction.
    pub skipped_frames: usize,
}

/// Messages sent from request handlers to the service thread.
enum ServiceRequest {
    Enroll {
        subject_id: String,
        display_name: String,
        frames: Vec<Frame>,
        reply: oneshot::Sender<Result<EnrollOutcome, ServiceError>>,
    },
    Recognize {
        frame: Frame,
        threshold: f32,
        reply: oneshot::Sender<Result<Vec<MatchResult>, ServiceError>>,
    },
}

/// Clone-safe handle to the service thread.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<ServiceRequest>,
}

impl ServiceHandle {
    /// Request enrollment: extract one embedding per usable frame and
    /// store the subject in the gallery.
    pub async fn enroll(
        &self,
        subject_id: &str,
        display_name: &str,
        frames: Vec<Frame>,
    ) -> Result<EnrollOutcome, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ServiceRequest::Enroll {
                subject_id: subject_id.to_string(),
                display_name: display_name.to_string(),
                frames,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ServiceError::ChannelClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ChannelClosed)?
    }

    /// Request recognition: extract every face in the frame and match each
    /// against the gallery.
    pub async fn recognize(
        &self,
        frame: Frame,
        threshold: f32,
    ) -> Result<Vec<MatchResult>, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ServiceRequest::Recognize {
                frame,
                threshold,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ServiceError::ChannelClosed)?;
        reply_rx.await.map_err(|_| ServiceError::ChannelClosed)?
    }
}

/// Spawn the service on a dedicated OS thread.
///
/// The thread owns the extractor (embedding backends are CPU-bound and
/// hold mutable session state); requests arrive over a bounded channel.
pub fn spawn_service(mut extractor: Box<dyn EmbeddingExtractor>, gallery: Arc<Gallery>) -> ServiceHandle {
    let (tx, mut rx) = mpsc::channel::<ServiceRequest>(4);

    std::thread::Builder::new()
        .name("rollcall-service".into())
        .spawn(move || {
            tracing::info!("service thread started");
            let matcher = Matcher::new();
            while let Some(req) = rx.blocking_recv() {
                match req {
                    ServiceRequest::Enroll {
                        subject_id,
                        display_name,
                        frames,
                        reply,
                    } => {
                        let result = run_enroll(
                            extractor.as_mut(),
                            &gallery,
                            &subject_id,
                            &display_name,
                            frames,
                        );
                        let _ = reply.send(result);
                    }
                    ServiceRequest::Recognize {
                        frame,
                        threshold,
                        reply,
                    } => {
                        let result =
                            run_recognize(extractor.as_mut(), &gallery, &matcher, frame, threshold);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("service thread exiting");
        })
        .expect("failed to spawn service thread");

    ServiceHandle { tx }
}

/// Extract one embedding per usable frame and enroll the subject.
///
/// A frame is usable only when exactly one face is found — an enrollment
/// photo must be unambiguous about whose face it shows. Zero-face and
/// multi-face frames are skipped, as are frames the backend fails on.
fn run_enroll(
    extractor: &mut dyn EmbeddingExtractor,
    gallery: &Gallery,
    subject_id: &str,
    display_name: &str,
    frames: Vec<Frame>,
) -> Result<EnrollOutcome, ServiceError> {
    let mut embeddings = Vec::new();
    let mut skipped_frames = 0usize;

    for (i, frame) in frames.iter().enumerate() {
        let mut detections =
            match extractor.extract_embeddings(&frame.data, frame.width, frame.height) {
                Ok(d) => d,
                Err(err) => {
                    skipped_frames += 1;
                    tracing::warn!(subject_id, frame = i, error = %err, "frame extraction failed");
                    continue;
                }
            };
        match detections.len() {
            1 => {
                let detection = detections.remove(0);
                embeddings.push(detection.embedding);
            }
            n => {
                skipped_frames += 1;
                tracing::warn!(subject_id, frame = i, faces = n, "skipping enrollment frame");
            }
        }
    }

    let stored = gallery.enroll(subject_id, display_name, embeddings)?;
    tracing::info!(subject_id, stored, skipped_frames, "enrollment complete");

    Ok(EnrollOutcome {
        stored,
        skipped_frames,
    })
}

/// Extract every face in the frame and match each against the gallery.
/// Faces with no qualifying subject are omitted from the result; a frame
/// with no faces yields an empty list, not an error.
fn run_recognize(
    extractor: &mut dyn EmbeddingExtractor,
    gallery: &Gallery,
    matcher: &Matcher,
    frame: Frame,
    threshold: f32,
) -> Result<Vec<MatchResult>, ServiceError> {
    let detections = extractor.extract_embeddings(&frame.data, frame.width, frame.height)?;
    if detections.is_empty() {
        return Ok(Vec::new());
    }

    let probes: Vec<_> = detections.into_iter().map(|d| d.embedding).collect();
    let matches = matcher.find_all_matches(gallery, &probes, threshold)?;
    tracing::debug!(
        faces = probes.len(),
        matches = matches.len(),
        "recognition pass"
    );
    Ok(matches)
}
