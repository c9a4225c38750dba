//! Background frame processing
//!
//! Capture files are processed frame by frame on a worker thread and the
//! resulting radar cubes are forwarded to a sink, either a file written by a
//! second thread in batches, or a queue owned by the caller.
//!
//! The worker only checks for a stop request between frames, or while a
//! processed frame waits on a full sink.

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::errors::SourceError;
use crate::source::FrameSource;
use crate::{CubeFile, FrameGeometry, FramePipeline, ProcessedFrame, Writer};

/// Number of frames collected before they are handed to the file writer.
///
/// A default frame is 3 MiB of samples, keep batches small.
const BATCH_SIZE: usize = 16;

/// Capacity of the queue between worker and file writer.
const QUEUE_SIZE: usize = 32;

/// How long a send to a full sink blocks before the stop flag is rechecked.
const SEND_POLL_INTERVAL: Duration = Duration::from_millis(50);

type BoxedSource = FrameSource<Box<dyn Read + Send>>;

/// A sink to receive processed frames
pub enum CubeSink {
    File(CubeFile),
    Queue(Sender<ProcessedFrame>),
}

/// Counts reported by the worker once it stops.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct StreamSummary {
    pub processed: usize,
    pub failed: usize,
    /// The source was read to its end (or the frame limit) without a fatal
    /// error or stop request.
    pub exhausted: bool,
}

/// Runs the frame pipeline over a source in the background.
pub struct CubeStream {
    source: Option<BoxedSource>,
    pipeline: FramePipeline,
    limit: Option<usize>,
    sink: Option<Sender<ProcessedFrame>>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<StreamSummary>>,
    file_writer: Option<JoinHandle<()>>,
}

impl CubeStream {
    /// Creates a stream reading from a capture file
    pub fn from_file(path: &Path, geometry: FrameGeometry) -> Result<Self, SourceError> {
        log::trace!("Creating a cube stream from file {}", path.display());
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file), geometry))
    }

    /// Creates a stream reading from any byte stream
    pub fn from_reader(reader: impl Read + Send + 'static, geometry: FrameGeometry) -> Self {
        let reader: Box<dyn Read + Send> = Box::new(reader);
        Self {
            source: Some(FrameSource::new(reader, geometry)),
            pipeline: FramePipeline::new(geometry),
            limit: None,
            sink: None,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            file_writer: None,
        }
    }

    /// Skip the first `count` frames of the source.
    ///
    /// # Errors
    /// * `AlreadyStarted` - if called after `start`
    /// * any error of `FrameSource::skip_frames`
    pub fn skip_frames(&mut self, count: usize) -> Result<(), SourceError> {
        let source = self.source.as_mut().ok_or(SourceError::AlreadyStarted)?;
        source.skip_frames(count)
    }

    /// Process at most `count` frames. The source must hold that many.
    pub fn limit_frames(&mut self, count: usize) {
        self.limit = Some(count);
    }

    /// Registers a sink for processed frames.
    ///
    /// - `CubeSink::File`: Frames are batched and written to the file by a background thread.
    /// - `CubeSink::Queue`: Frames are sent to an in-process queue.
    pub fn subscribe(&mut self, sink: CubeSink) {
        if self.sink.is_some() {
            panic!("Cant set two cube sinks (currently)");
        }

        let sink = match sink {
            CubeSink::File(file) => {
                let (tx, rx) = bounded(QUEUE_SIZE);
                log::trace!(
                    "Spawning background thread to write processed frames to file {:?}",
                    file
                );
                self.file_writer = Some(thread::spawn(move || write_frames_to_file(rx, file)));
                tx
            }
            CubeSink::Queue(queue) => queue,
        };

        self.sink = Some(sink);
    }

    /// Starts processing frames on a worker thread.
    ///
    /// # Parameters
    /// * `print` - Whether to print a line per processed frame to stdout.
    pub fn start(&mut self, print: bool) {
        let Some(source) = self.source.take() else {
            log::warn!("Stream already started; Ignoring.");
            return;
        };

        log::info!("Starting frame processing");
        self.running.store(true, Ordering::SeqCst);

        let pipeline = self.pipeline.clone();
        let limit = self.limit;
        let running = self.running.clone();
        let sink = self.sink.take();
        self.worker = Some(thread::spawn(move || {
            process(pipeline, source, limit, running, sink, print)
        }));
    }

    /// Whether the worker has run out of frames (or was never started).
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, |worker| worker.is_finished())
    }

    /// Stops processing after the current frame and waits for all
    /// background threads.
    ///
    /// Returns the worker's summary if it was started and did not panic.
    pub fn stop(&mut self) -> Option<StreamSummary> {
        log::info!("Stopping frame processing.");
        self.running.store(false, Ordering::SeqCst);

        let summary = match self.worker.take().map(JoinHandle::join) {
            Some(Ok(summary)) => Some(summary),
            Some(Err(e)) => {
                log::error!("Couldn't join worker thread. Error: {:?}", e);
                None
            }
            None => None,
        };

        // The worker dropped its sender; the writer drains and exits.
        self.sink = None;
        if let Some(file_writer) = self.file_writer.take() {
            if let Err(e) = file_writer.join() {
                log::error!("Couldn't join file writer thread. Error: {:?}", e);
            }
        }

        summary
    }
}

impl Drop for CubeStream {
    fn drop(&mut self) {
        if self.worker.is_some() || self.file_writer.is_some() {
            self.stop();
        }
    }
}

/// Read and transform frames until the source is exhausted, a fatal error
/// occurs or `running` is cleared.
fn process(
    pipeline: FramePipeline,
    source: BoxedSource,
    limit: Option<usize>,
    running: Arc<AtomicBool>,
    sink: Option<Sender<ProcessedFrame>>,
    print: bool,
) -> StreamSummary {
    let mut summary = StreamSummary {
        exhausted: true,
        ..Default::default()
    };

    for result in pipeline.frames(source, limit) {
        let frame = match result {
            Ok(frame) => frame,
            Err(e) if e.is_fatal() => {
                log::error!("{}. Stopping.", e);
                summary.exhausted = false;
                break;
            }
            Err(e) => {
                log::warn!("{}. Skipping.", e);
                summary.failed += 1;
                continue;
            }
        };
        summary.processed += 1;
        let frame_index = frame.index;

        if print {
            println!(
                "Frame {}: shape {:?}, last sample {:?}",
                frame.index,
                frame.cube.shape(),
                frame.cube.probe()
            );
        }

        if let Some(sink) = &sink {
            match forward(sink, frame, &running) {
                Forwarded::Sent => {}
                Forwarded::Stopped => {
                    log::info!("Stop requested while frame {} was queued", frame_index);
                    summary.exhausted = false;
                    break;
                }
                Forwarded::Disconnected => {
                    log::error!("Frame sink disconnected; Stopping processing.");
                    summary.exhausted = false;
                    break;
                }
            }
        }

        if !running.load(Ordering::SeqCst) {
            log::info!("Stop requested after frame {}", frame_index);
            summary.exhausted = false;
            break;
        }
    }

    log::info!(
        "Frame processing completed: {} processed, {} failed",
        summary.processed,
        summary.failed
    );
    summary
}

enum Forwarded {
    Sent,
    Stopped,
    Disconnected,
}

/// Send `frame` to the sink, giving up if `running` is cleared while the
/// sink is full.
fn forward(
    sink: &Sender<ProcessedFrame>,
    mut frame: ProcessedFrame,
    running: &AtomicBool,
) -> Forwarded {
    loop {
        match sink.send_timeout(frame, SEND_POLL_INTERVAL) {
            Ok(()) => return Forwarded::Sent,
            Err(SendTimeoutError::Disconnected(_)) => return Forwarded::Disconnected,
            Err(SendTimeoutError::Timeout(pending)) => {
                if !running.load(Ordering::SeqCst) {
                    return Forwarded::Stopped;
                }
                frame = pending;
            }
        }
    }
}

/// Writes processed frames to a file in batches, receiving them from a queue.
///
/// # Parameters
/// - `rx`: Receiver channel that receives the processed frames to write.
/// - `out_file`: The file to which frames are saved in batches.
fn write_frames_to_file(rx: Receiver<ProcessedFrame>, out_file: CubeFile) {
    let mut writer = match Writer::new(out_file) {
        Ok(writer) => writer,
        Err(e) => {
            log::error!("Couldn't create a file writer: {}. Exiting writer.", e);
            return;
        }
    };

    let mut frame_buffer = Vec::with_capacity(BATCH_SIZE);
    while let Ok(frame) = rx.recv() {
        frame_buffer.push(frame);
        if frame_buffer.len() < BATCH_SIZE {
            continue;
        }

        if let Err(e) = writer.add_batch(&frame_buffer) {
            log::error!("Error encountered on batch writing: {}. Exiting writer.", e);
            return;
        }
        frame_buffer.clear();
    }

    // Write any remaining frames when the channel is closed
    if !frame_buffer.is_empty() {
        if let Err(e) = writer.add_batch(&frame_buffer) {
            log::error!("Error encountered on batch writing: {}. Exiting writer.", e);
            return;
        }
    }

    match writer.finalize() {
        Ok(bytes) => log::info!("Finished writing processed frames ({} bytes)", bytes),
        Err(e) => log::error!("Error finalizing output file: {}", e),
    }
}
