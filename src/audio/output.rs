// Audio output using cpal
// Streams queued samples to the output device through a ring buffer

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use parking_lot::Mutex;
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

const RING_BUFFER_SIZE: usize = 48000 * 2 / 4; // ~250ms of stereo audio at 48kHz

type RingProducer = ringbuf::HeapProd<f32>;
type RingConsumer = ringbuf::HeapCons<f32>;

/// Handle to the output device. The cpal stream itself is not Send, so it
/// lives on a dedicated thread for the life of the process; this handle only
/// carries the producer side of the ring buffer and the shared controls.
pub struct AudioOutput {
    producer: Mutex<RingProducer>,
    volume: Arc<Mutex<f32>>,
    clear_flag: Arc<AtomicBool>,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Open the default output device on a dedicated thread.
    pub fn spawn() -> Result<Self, String> {
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match Self::open_stream() {
                Ok((stream, output)) => {
                    if tx.send(Ok(output)).is_err() {
                        return;
                    }
                    // Keep the stream alive; dropping it stops the callback
                    let _stream = stream;
                    loop {
                        std::thread::park();
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                }
            })
            .map_err(|e| format!("Failed to spawn audio thread: {}", e))?;

        rx.recv()
            .map_err(|_| "Audio thread exited before reporting a device".to_string())?
    }

    fn open_stream() -> Result<(cpal::Stream, Self), String> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or("No output device available")?;

        let config = device
            .default_output_config()
            .map_err(|e| format!("Failed to get default output config: {}", e))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let rb = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, consumer) = rb.split();
        let consumer = Arc::new(Mutex::new(consumer));

        let volume = Arc::new(Mutex::new(1.0f32));
        let clear_flag = Arc::new(AtomicBool::new(false));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config.into(),
                consumer,
                Arc::clone(&volume),
                Arc::clone(&clear_flag),
            )?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config.into(),
                consumer,
                Arc::clone(&volume),
                Arc::clone(&clear_flag),
            )?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config.into(),
                consumer,
                Arc::clone(&volume),
                Arc::clone(&clear_flag),
            )?,
            format => return Err(format!("Unsupported sample format: {:?}", format)),
        };

        stream
            .play()
            .map_err(|e| format!("Failed to start stream: {}", e))?;

        Ok((
            stream,
            Self {
                producer: Mutex::new(producer),
                volume,
                clear_flag,
                sample_rate,
                channels,
            },
        ))
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        consumer: Arc<Mutex<RingConsumer>>,
        volume: Arc<Mutex<f32>>,
        clear_flag: Arc<AtomicBool>,
    ) -> Result<cpal::Stream, String> {
        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut consumer = consumer.lock();
                    let vol = *volume.lock();

                    // stop() raised the flag: drop everything still queued so
                    // the device goes silent right now
                    if clear_flag.swap(false, Ordering::SeqCst) {
                        while consumer.try_pop().is_some() {}
                    }

                    for sample in data.iter_mut() {
                        let value = consumer.try_pop().unwrap_or(0.0) * vol;
                        *sample = T::from_sample(value);
                    }
                },
                move |err| {
                    log::error!("Audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| format!("Failed to build output stream: {}", e))?;

        Ok(stream)
    }

    /// Push as many samples as fit right now; returns the number written.
    fn push(&self, samples: &[f32]) -> usize {
        let mut producer = self.producer.lock();
        let mut written = 0;

        for &sample in samples {
            if producer.try_push(sample).is_ok() {
                written += 1;
            } else {
                break; // ring full
            }
        }

        written
    }

    /// Push every sample, blocking while the ring is full. Returns false if
    /// `cancelled` was raised before all samples were handed over.
    pub fn push_interruptible(&self, samples: &[f32], cancelled: &AtomicBool) -> bool {
        let mut remaining = samples;

        while !remaining.is_empty() {
            if cancelled.load(Ordering::SeqCst) {
                return false;
            }
            let written = self.push(remaining);
            if written > 0 {
                remaining = &remaining[written..];
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }

        !cancelled.load(Ordering::SeqCst)
    }

    /// Block until the device has consumed everything queued, a deadline
    /// passes, or `cancelled` is raised. The ring holds at most ~250ms, so a
    /// deadline of a second or two is generous.
    pub fn drain(&self, cancelled: &AtomicBool, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cancelled.load(Ordering::SeqCst) {
                return;
            }
            if self.producer.lock().occupied_len() == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Drop all queued samples on the next device callback.
    pub fn clear(&self) {
        self.clear_flag.store(true, Ordering::SeqCst);
    }

    /// Set the output volume (0.0 to 1.0)
    pub fn set_volume(&self, vol: f32) {
        *self.volume.lock() = vol.clamp(0.0, 1.0);
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of output channels
    pub fn channels(&self) -> u16 {
        self.channels
    }
}
