//! # How it works
//! ```text
//!     ┌──────────────────────────┐
//!     │      control thread      │
//!     └──────────────────────────┘
//!        |  ↑              ↑
//!  Event |  | results      | retired window buffers
//!        ↓  |              |
//!     ┌──────────────────────────┐        ┌─────────────┐
//!     │          Stream          │ -----> |  Estimator  |
//!     │      (audio thread)      │ <----- |             |
//!     └──────────────────────────┘        └─────────────┘
//! ```
//! Events are only applied between two blocks, so coefficients never change
//! while a block is processed. Window buffers get allocated by the control side
//! and are handed back to it once replaced, the audio thread never allocates
//! or frees memory and never blocks. A retired buffer that does not fit into the
//! full garbage queue stays with the `Stream`, and further events wait until
//! `Controller::collect_garbage()` made room for it. Only once the `Controller`
//! is dropped, retired buffers are freed on the audio thread.
//!
//! Any number of control threads can send events through cloned `Handle`s,
//! results and retired buffers only go to the single `Controller`.
//!
//! ## Example
//! ```
//! use goertzel::estimator::stream;
//! use goertzel::estimator::config::EstimatorConfig;
//! use std::thread;
//!
//! let (controller, mut stream) = stream::channel(EstimatorConfig::default());
//! controller.set_target_frequency(1000.0).unwrap();
//!
//! let audio = thread::spawn(move || {
//!     for _ in 0..16 {
//!         stream.process_block(&[0.0; 128], 44_100.0);
//!     }
//! });
//! audio.join().unwrap();
//! controller.collect_garbage();
//!
//! let results: Vec<_> = controller.results().collect();
//! assert_eq!(results.len(), 2);
//! ```

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};

use super::config::{EstimatorConfig, Output};
use super::processor::Estimator;
use super::ring_buffer::RingBuffer;
use super::GoertzelResult;
use crate::error::{Error, Result};

/// number of events, results and retired buffers that can be queued
pub const QUEUE_SIZE: usize = 64;

#[derive(Debug)]
pub enum Event {
    SetTargetFrequency(f32),
    /// already allocated buffer, its capacity becomes the new window size
    SetWindow(RingBuffer),
    SetOutput(Output),
    Reset,
}

/// sends events to the `Stream`, can be cloned and moved to other control threads
#[derive(Clone, Debug)]
pub struct Handle {
    event_sender: SyncSender<Event>,
}

/// control side, lives on a non real-time thread
#[derive(Debug)]
pub struct Controller {
    handle: Handle,
    result_receiver: Receiver<GoertzelResult>,
    garbage_receiver: Receiver<RingBuffer>,
}

/// audio side, owns the estimator
#[derive(Debug)]
pub struct Stream {
    estimator: Estimator,
    event_receiver: Receiver<Event>,
    result_sender: SyncSender<GoertzelResult>,
    garbage_sender: SyncSender<RingBuffer>,
    /// replaced buffer the garbage queue had no room for
    retired: Option<RingBuffer>,
    /// window that waits for `retired` to be handed back
    deferred: Option<RingBuffer>,
}

/// creates a connected `Controller` / `Stream` pair
pub fn channel(config: EstimatorConfig) -> (Controller, Stream) {
    let (event_sender, event_receiver) = mpsc::sync_channel(QUEUE_SIZE);
    let (result_sender, result_receiver) = mpsc::sync_channel(QUEUE_SIZE);
    let (garbage_sender, garbage_receiver) = mpsc::sync_channel(QUEUE_SIZE);

    let controller = Controller {
        handle: Handle { event_sender },
        result_receiver,
        garbage_receiver,
    };
    let stream = Stream {
        estimator: Estimator::new(config),
        event_receiver,
        result_sender,
        garbage_sender,
        retired: None,
        deferred: None,
    };
    (controller, stream)
}

impl Handle {
    /// blocks if the event queue is full
    pub fn send(&self, event: Event) -> Result<()> {
        self.event_sender.send(event).map_err(|_| Error::Disconnected)
    }

    /// validated by the audio thread against its current sample rate,
    /// a rejected frequency is logged there and ignored
    pub fn set_target_frequency(&self, frequency: f32) -> Result<()> {
        self.send(Event::SetTargetFrequency(frequency))
    }

    /// allocates the new window on the calling thread
    ///
    /// allocation errors are reported here, the stream keeps its current window
    pub fn set_window_size(&self, window_size: usize) -> Result<()> {
        let buffer = RingBuffer::try_new(window_size)?;
        self.send(Event::SetWindow(buffer))
    }

    pub fn set_output(&self, output: Output) -> Result<()> {
        self.send(Event::SetOutput(output))
    }

    pub fn reset(&self) -> Result<()> {
        self.send(Event::Reset)
    }
}

impl Controller {
    /// another sender for the same stream
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// blocks if the event queue is full
    pub fn send(&self, event: Event) -> Result<()> {
        self.handle.send(event)
    }

    pub fn set_target_frequency(&self, frequency: f32) -> Result<()> {
        self.handle.set_target_frequency(frequency)
    }

    /// see `Handle::set_window_size()`
    pub fn set_window_size(&self, window_size: usize) -> Result<()> {
        self.handle.set_window_size(window_size)
    }

    pub fn set_output(&self, output: Output) -> Result<()> {
        self.handle.set_output(output)
    }

    pub fn reset(&self) -> Result<()> {
        self.handle.reset()
    }

    /// next result if one is available, never blocks
    pub fn try_recv_result(&self) -> Result<Option<GoertzelResult>> {
        match self.result_receiver.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::Disconnected),
        }
    }

    /// all results that are currently queued
    pub fn results(&self) -> impl Iterator<Item = GoertzelResult> + '_ {
        self.result_receiver.try_iter()
    }

    /// frees window buffers the stream no longer uses, returns how many were freed
    pub fn collect_garbage(&self) -> usize {
        self.garbage_receiver.try_iter().count()
    }
}

impl Stream {
    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// applies queued events, then processes the block
    ///
    /// every completed window is also sent to the `Controller`. If its result
    /// queue is full, results are dropped rather than blocking.
    pub fn process_block(&mut self, samples: &[f32], sample_rate: f32) -> Option<GoertzelResult> {
        self.apply_events();

        let mut last = None;
        let result_sender = &self.result_sender;
        self.estimator.process_block_with(samples, sample_rate, |result| {
            last = Some(result);
            match result_sender.try_send(result) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => (),
                Err(TrySendError::Full(_)) => log::trace!("result queue full, dropping result"),
            }
        });
        last
    }

    /// returns the number of applied events
    ///
    /// a window change that finds the previously retired buffer still undelivered
    /// is held back, together with every event queued after it
    pub fn apply_events(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let event = match self.deferred.take() {
                Some(buffer) => Event::SetWindow(buffer),
                None => match self.event_receiver.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };

            match event {
                // rejection is already logged by the estimator
                Event::SetTargetFrequency(f) => {
                    self.estimator.set_target_frequency(f).ok();
                }
                Event::SetWindow(buffer) => {
                    if !self.hand_back_retired() {
                        self.deferred = Some(buffer);
                        break;
                    }
                    self.retired = Some(self.estimator.replace_buffer(buffer));
                    self.hand_back_retired();
                }
                Event::SetOutput(output) => self.estimator.set_output(output),
                Event::Reset => self.estimator.reset(),
            }
            applied += 1;
        }
        applied
    }

    /// tries to pass the retired buffer on to the control side, true once nothing is left
    fn hand_back_retired(&mut self) -> bool {
        let buffer = match self.retired.take() {
            Some(buffer) => buffer,
            None => return true,
        };
        match self.garbage_sender.try_send(buffer) {
            Ok(()) => true,
            Err(TrySendError::Full(buffer)) => {
                log::trace!("garbage queue full, holding on to retired window buffer");
                self.retired = Some(buffer);
                false
            }
            // the controller is gone, nobody is left to free it
            Err(TrySendError::Disconnected(buffer)) => {
                log::warn!("controller disconnected, freeing window buffer on audio thread");
                drop(buffer);
                true
            }
        }
    }
}
