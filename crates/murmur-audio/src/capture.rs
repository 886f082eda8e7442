//! Capture thread: cpal input stream, block assembly, recognizer feed loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use murmur_core::{BLOCK_SIZE, QUEUE_CAPACITY, QUEUE_TIMEOUT, SAMPLE_RATE};
use murmur_speech::Recognizer;
use tracing::{error, info, warn};

use crate::{CaptureError, Result};

/// Events emitted by the capture thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The recognizer finalized an utterance with non-empty text.
    Utterance(String),
    /// The capture thread exited. Sent on every exit path, whether the
    /// stop was requested or setup/streaming failed.
    Stopped,
}

/// Factory invoked on the capture thread to build the recognizer, so the
/// engine never has to cross a thread boundary.
pub type RecognizerFactory = Box<dyn FnOnce() -> murmur_speech::Result<Box<dyn Recognizer>> + Send>;

/// Accumulates driver callback buffers into fixed-size blocks and hands
/// them to the bounded queue. Runs inside the audio callback, so a full
/// queue drops the block instead of blocking the driver.
pub struct BlockAssembler {
    block_size: usize,
    pending: Vec<i16>,
    sender: Sender<Vec<i16>>,
    dropped: Arc<AtomicUsize>,
}

impl BlockAssembler {
    pub fn new(block_size: usize, sender: Sender<Vec<i16>>, dropped: Arc<AtomicUsize>) -> Self {
        Self {
            block_size: block_size.max(1),
            pending: Vec::with_capacity(block_size),
            sender,
            dropped,
        }
    }

    pub fn push(&mut self, data: &[i16]) {
        self.pending.extend_from_slice(data);

        while self.pending.len() >= self.block_size {
            let block: Vec<i16> = self.pending.drain(..self.block_size).collect();
            match self.sender.try_send(block) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    }
}

pub struct Capture;

impl Capture {
    /// Spawns the capture thread for the named input device and returns a
    /// handle immediately. All fallible setup (device resolution,
    /// recognizer construction, stream creation) happens on the thread;
    /// failures are logged and surface as a [`CaptureEvent::Stopped`].
    pub fn spawn(
        device_name: String,
        make_recognizer: RecognizerFactory,
        events: Sender<CaptureEvent>,
    ) -> CaptureHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let thread_events = events.clone();

        let thread = std::thread::Builder::new()
            .name("murmur-capture".to_string())
            .spawn(move || {
                if let Err(e) = run_capture(&device_name, make_recognizer, &thread_stop, &thread_events)
                {
                    error!("Audio capture error: {}", e);
                }
                info!("Audio capture stopped");
                thread_events.send(CaptureEvent::Stopped).ok();
            });

        let thread = match thread {
            Ok(thread) => Some(thread),
            Err(e) => {
                error!("Failed to spawn capture thread: {}", e);
                events.send(CaptureEvent::Stopped).ok();
                None
            }
        };

        CaptureHandle { stop, thread }
    }
}

fn run_capture(
    device_name: &str,
    make_recognizer: RecognizerFactory,
    stop: &AtomicBool,
    events: &Sender<CaptureEvent>,
) -> Result<()> {
    let device = find_device(device_name)?;
    info!(device = %device_name, "Selected input device");

    let mut recognizer = make_recognizer()?;
    info!(recognizer = recognizer.name(), "Recognizer ready");

    let (block_tx, block_rx) = bounded(QUEUE_CAPACITY);
    let dropped = Arc::new(AtomicUsize::new(0));
    let mut assembler = BlockAssembler::new(BLOCK_SIZE, block_tx, dropped.clone());

    let config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(SAMPLE_RATE),
        buffer_size: BufferSize::Default,
    };
    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| assembler.push(data),
        |err| error!("an error occurred on stream: {}", err),
        None,
    )?;
    stream.play()?;
    info!("Microphone initialized, listening for speech");

    run_feed_loop(&block_rx, stop, recognizer.as_mut(), events);

    // Teardown runs on every exit path: the stream is owned here and
    // dropping it releases the device.
    drop(stream);
    let dropped = dropped.load(Ordering::Relaxed);
    if dropped > 0 {
        warn!(blocks = dropped, "Dropped audio blocks on full queue");
    }
    Ok(())
}

/// Pulls blocks with a bounded wait and feeds the recognizer. A poll
/// timeout only re-checks the stop flag; that flag is the sole
/// cancellation mechanism, so stop latency is one queue timeout.
fn run_feed_loop(
    blocks: &Receiver<Vec<i16>>,
    stop: &AtomicBool,
    recognizer: &mut dyn Recognizer,
    events: &Sender<CaptureEvent>,
) {
    while !stop.load(Ordering::Relaxed) {
        let block = match blocks.recv_timeout(QUEUE_TIMEOUT) {
            Ok(block) => block,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if let Some(text) = recognizer.accept(&block) {
            if events.send(CaptureEvent::Utterance(text)).is_err() {
                break;
            }
        }
    }
}

fn find_device(name: &str) -> Result<cpal::Device> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::Devices(e.to_string()))?;

    for device in devices {
        if device.name().map(|n| n == name).unwrap_or(false) {
            return Ok(device);
        }
    }
    Err(CaptureError::DeviceNotFound(name.to_string()))
}

/// Handle to the active capture. Stop is cooperative: the flag is set and
/// the feed loop observes it within one queue timeout. Dropping the handle
/// stops the capture and joins the thread.
pub struct CaptureHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    /// Request a cooperative stop. Safe to call more than once.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            thread.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crossbeam_channel::unbounded;

    use super::*;

    /// Recognizer that finalizes a fixed utterance every `every` blocks.
    struct ScriptedRecognizer {
        every: usize,
        fed: usize,
        text: String,
    }

    impl Recognizer for ScriptedRecognizer {
        fn accept(&mut self, _block: &[i16]) -> Option<String> {
            self.fed += 1;
            if self.fed % self.every == 0 {
                Some(self.text.clone())
            } else {
                None
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_assembler_emits_fixed_size_blocks() {
        let (tx, rx) = bounded(8);
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut assembler = BlockAssembler::new(4, tx, dropped.clone());

        assembler.push(&[1, 2, 3]);
        assert!(rx.is_empty());

        assembler.push(&[4, 5, 6, 7, 8, 9]);
        assert_eq!(rx.recv().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(rx.recv().unwrap(), vec![5, 6, 7, 8]);
        assert!(rx.is_empty());
        assert_eq!(dropped.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (tx, rx) = bounded(QUEUE_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));
        let mut assembler = BlockAssembler::new(1, tx, dropped.clone());

        let samples: Vec<i16> = (0..25).collect();
        let before = Instant::now();
        assembler.push(&samples);

        // Never more than capacity in the queue, overflow counted, and the
        // producer did not block on the full queue.
        assert_eq!(rx.len(), QUEUE_CAPACITY);
        assert_eq!(dropped.load(Ordering::Relaxed), 5);
        assert!(before.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_feed_loop_stops_within_one_queue_timeout() {
        let (_block_tx, block_rx) = bounded::<Vec<i16>>(QUEUE_CAPACITY);
        let (event_tx, _event_rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let loop_stop = stop.clone();
        let thread = std::thread::spawn(move || {
            let mut recognizer = ScriptedRecognizer {
                every: 1,
                fed: 0,
                text: String::new(),
            };
            run_feed_loop(&block_rx, &loop_stop, &mut recognizer, &event_tx);
        });

        std::thread::sleep(Duration::from_millis(20));
        let before = Instant::now();
        stop.store(true, Ordering::Relaxed);
        thread.join().unwrap();

        // One queue timeout plus scheduling slack.
        assert!(before.elapsed() < QUEUE_TIMEOUT + Duration::from_millis(400));
    }

    #[test]
    fn test_feed_loop_forwards_finalized_utterances() {
        let (block_tx, block_rx) = bounded(QUEUE_CAPACITY);
        let (event_tx, event_rx) = unbounded();
        let stop = AtomicBool::new(false);

        for _ in 0..6 {
            block_tx.send(vec![0i16; 4]).unwrap();
        }
        // Disconnect the producer so the loop ends after draining.
        drop(block_tx);

        let mut recognizer = ScriptedRecognizer {
            every: 3,
            fed: 0,
            text: "testing one two".to_string(),
        };
        run_feed_loop(&block_rx, &stop, &mut recognizer, &event_tx);

        let events: Vec<CaptureEvent> = event_rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                CaptureEvent::Utterance("testing one two".to_string()),
                CaptureEvent::Utterance("testing one two".to_string()),
            ]
        );
    }

    #[test]
    fn test_feed_loop_exits_when_event_receiver_is_gone() {
        let (block_tx, block_rx) = bounded(QUEUE_CAPACITY);
        let (event_tx, event_rx) = unbounded();
        drop(event_rx);

        block_tx.send(vec![0i16; 4]).unwrap();
        let stop = AtomicBool::new(false);
        let mut recognizer = ScriptedRecognizer {
            every: 1,
            fed: 0,
            text: "x".to_string(),
        };
        run_feed_loop(&block_rx, &stop, &mut recognizer, &event_tx);
        assert_eq!(recognizer.fed, 1);
    }
}
