//! Runs a stippling pass off the calling thread.
//!
//! The worker owns its inputs and the index it builds. The index reaches the
//! caller only inside [`WorkerEvent::Finished`], once the pass is complete.

use crate::errors::StippleError;
use crate::stipple::classifier::{PixelClassifier, StippleJob, StippleResult};
use crossbeam_channel::{Receiver, Sender};
use std::thread::JoinHandle;
use tracing::{info, warn};

#[derive(Debug)]
pub enum WorkerEvent {
    /// Percentage of pixels classified so far, in steps of 10.
    Progress(u32),
    Finished(Box<StippleResult>),
    Failed(StippleError),
}

pub struct DotGenerationWorker;

impl DotGenerationWorker {
    /// Start preparing and classifying `job` on a dedicated thread. The
    /// configured dot dispersion is applied before the result is sent.
    pub fn spawn(classifier: PixelClassifier, job: StippleJob) -> Result<WorkerHandle, StippleError> {
        let (sender, events) = crossbeam_channel::unbounded();
        let thread = std::thread::Builder::new()
            .name("dot-generation".into())
            .spawn(move || Self::run(&classifier, job, &sender))?;
        Ok(WorkerHandle {
            events,
            thread: Some(thread),
        })
    }

    fn run(classifier: &PixelClassifier, job: StippleJob, sender: &Sender<WorkerEvent>) {
        info!("beginning stippling process");
        let inputs = match classifier.prepare(job) {
            Ok(inputs) => inputs,
            Err(error) => {
                let _ = sender.send(WorkerEvent::Failed(error));
                return;
            },
        };
        let mut result = classifier.classify(&inputs, |percent| {
            let _ = sender.send(WorkerEvent::Progress(percent));
        });
        let configuration = classifier.configuration();
        if configuration.stipple_dot_dispersion > 0 {
            result.redisperse(configuration.stipple_dot_dispersion, configuration.rng_seed);
        }
        if sender.send(WorkerEvent::Finished(Box::new(result))).is_err() {
            warn!("stippling result discarded, nobody is waiting for it");
        }
    }
}

/// Caller side of a running pass.
#[derive(Debug)]
pub struct WorkerHandle {
    events: Receiver<WorkerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Event stream, for callers that poll progress themselves.
    pub const fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Block until the pass ends, skipping progress events.
    pub fn wait(mut self) -> Result<StippleResult, StippleError> {
        let outcome = loop {
            match self.events.recv() {
                Ok(WorkerEvent::Progress(_)) => continue,
                Ok(WorkerEvent::Finished(result)) => break Ok(*result),
                Ok(WorkerEvent::Failed(error)) => break Err(error),
                Err(_) => break Err(StippleError::WorkerDisconnected),
            }
        };
        match self.thread.take().map(JoinHandle::join) {
            Some(Err(_)) => Err(StippleError::WorkerDisconnected),
            _ => outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stipple::classifier::{BACKGROUND_MARKER, EntityLayer};
    use crate::stipple::config::{Configuration, EntityConfiguration};
    use crate::stipple::dither::DitheringMethod;
    use image::{Rgb, RgbImage};

    fn job(size: u32) -> StippleJob {
        let covered = RgbImage::from_fn(size, size, |x, _| {
            if x < size / 2 { Rgb([0, 200, 0]) } else { BACKGROUND_MARKER }
        });
        StippleJob {
            source: RgbImage::from_pixel(size, size, Rgb([40, 40, 40])),
            dithering: DitheringMethod::FloydSteinberg,
            scene_rendering: covered.clone(),
            layers: vec![EntityLayer {
                name: "Prism 1".into(),
                rendering: covered,
                configuration: EntityConfiguration::default(),
            }],
        }
    }

    #[test]
    fn worker_reports_progress_then_result() {
        let classifier = PixelClassifier::new(Configuration::default(), (3, 3), 4).expect("valid");
        let handle = DotGenerationWorker::spawn(classifier, job(10)).expect("spawned");

        let mut progress = Vec::new();
        let result = loop {
            match handle.events().recv().expect("worker alive") {
                WorkerEvent::Progress(p) => progress.push(p),
                WorkerEvent::Finished(result) => break result,
                WorkerEvent::Failed(error) => panic!("pass failed: {error}"),
            }
        };
        assert_eq!(progress.last(), Some(&100));
        assert!(!result.index.is_empty());
    }

    #[test]
    fn wait_surfaces_preparation_errors() {
        let classifier = PixelClassifier::new(Configuration::default(), (3, 3), 4).expect("valid");
        let mut bad = job(6);
        bad.scene_rendering = RgbImage::new(3, 3);
        let err = DotGenerationWorker::spawn(classifier, bad)
            .expect("spawned")
            .wait()
            .unwrap_err();
        assert!(matches!(err, StippleError::ImageSizeMismatch { .. }));
    }

    #[test]
    fn wait_matches_inline_pass() {
        let classifier = PixelClassifier::new(Configuration::default(), (2, 2), 3).expect("valid");
        let inline = classifier
            .classify(&classifier.prepare(job(12)).expect("prepared"), |_| {});
        let threaded = DotGenerationWorker::spawn(classifier, job(12))
            .expect("spawned")
            .wait()
            .expect("finished");
        let a: Vec<_> = inline.index.iter().copied().collect();
        let b: Vec<_> = threaded.index.iter().copied().collect();
        assert_eq!(a, b);
    }
}
