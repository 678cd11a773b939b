use super::{AudioFuture, AudioResource};
use crate::asset_loader::{is_remote, AssetCache};
use crate::error::{AudioError, AudioResult};
use log::{debug, info, warn};
use parking_lot::Mutex;
use rodio::{buffer::SamplesBuffer, Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::sync::{mpsc, Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// Sinks the fade thread drives.
struct FadeBoard {
    active: Option<Arc<Sink>>,
    /// Target of the active sink
    target: f32,
    /// Previous tracks fading out; dropped once silent
    retiring: Vec<Arc<Sink>>,
}

/// The looping background track on the native output.
///
/// A new source crossfades: the old sink ramps to silence while the new one
/// ramps to the target volume.
pub struct AmbienceResource {
    stream_handle: OutputStreamHandle,
    assets: AssetCache,
    board: Arc<Mutex<FadeBoard>>,
    source: Option<String>,
    muted: bool,
    volume: f32,
}

/// Open the default output device.
///
/// `OutputStream` cannot leave its thread, so it lives on a parked thread
/// for the rest of the process and only the handle is returned.
pub fn open_default_output() -> AudioResult<OutputStreamHandle> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("soundscape-output".into())
        .spawn(move || match OutputStream::try_default() {
            Ok((stream, handle)) => {
                let _ = tx.send(Ok(handle));
                let _stream = stream;
                loop {
                    thread::park();
                }
            }
            Err(e) => {
                let _ = tx.send(Err(AudioError::Device(e.to_string())));
            }
        })
        .map_err(|e| AudioError::Device(e.to_string()))?;

    rx.recv().map_err(|e| AudioError::Device(e.to_string()))?
}

impl AmbienceResource {
    pub fn new(stream_handle: OutputStreamHandle, assets: AssetCache, fade: Duration) -> Self {
        let board = Arc::new(Mutex::new(FadeBoard {
            active: None,
            target: 0.0,
            retiring: Vec::new(),
        }));
        spawn_fader(Arc::downgrade(&board), fade);
        info!("Ambience output ready (fade {:?})", fade);

        Self {
            stream_handle,
            assets,
            board,
            source: None,
            muted: false,
            volume: 0.0,
        }
    }

    fn retarget(&self) {
        self.board.lock().target = self.audible_level();
    }
}

/// Ramp every sink toward its target until the board is dropped.
fn spawn_fader(board: Weak<Mutex<FadeBoard>>, fade: Duration) {
    thread::spawn(move || {
        let fade_secs = fade.as_secs_f32().max(0.001);
        let mut last_tick = Instant::now();

        while let Some(shared) = board.upgrade() {
            let now = Instant::now();
            let dt = now.duration_since(last_tick).as_secs_f32();
            last_tick = now;
            let step = dt / fade_secs;

            let retired = fade_step(&mut shared.lock(), step);
            if retired > 0 {
                debug!("Retired {} faded track(s)", retired);
            }
            drop(shared);

            // 10ms = 100 updates/second
            thread::sleep(Duration::from_millis(10));
        }
    });
}

/// One fader tick. Returns how many silent tracks were dropped.
fn fade_step(fades: &mut FadeBoard, step: f32) -> usize {
    if let Some(sink) = &fades.active {
        ramp(sink, fades.target, step);
    }
    for sink in &fades.retiring {
        ramp(sink, 0.0, step);
    }
    let before = fades.retiring.len();
    fades.retiring.retain(|sink| sink.volume() > 0.0);
    before - fades.retiring.len()
}

fn ramp(sink: &Sink, target: f32, step: f32) {
    let current = sink.volume();
    if (current - target).abs() > 0.001 {
        let next = if current < target {
            (current + step).min(target)
        } else {
            (current - step).max(target)
        };
        sink.set_volume(next);
    } else if current != target {
        sink.set_volume(target);
    }
}

async fn load_track(assets: &AssetCache, url: &str) -> AudioResult<Vec<u8>> {
    if is_remote(url) {
        assets.fetch(url).await
    } else {
        tokio::fs::read(url)
            .await
            .map_err(|e| AudioError::ResourceUnavailable(format!("{}: {}", url, e)))
    }
}

/// Decode to PCM so the track can loop without re-decoding.
fn decode_track(data: Vec<u8>) -> AudioResult<SamplesBuffer<f32>> {
    let decoder = Decoder::new(Cursor::new(data)).map_err(|e| AudioError::Decode(e.to_string()))?;
    // Metadata must be read before the decoder is consumed
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
    Ok(SamplesBuffer::new(channels, sample_rate, samples))
}

impl AudioResource for AmbienceResource {
    fn set_source(&mut self, source_url: &str) {
        self.source = Some(source_url.to_string());

        let mut board = self.board.lock();
        if let Some(previous) = board.active.take() {
            board.retiring.push(previous);
        }
        match Sink::try_new(&self.stream_handle) {
            Ok(sink) => {
                sink.set_volume(0.0);
                board.active = Some(Arc::new(sink));
            }
            Err(e) => warn!("Sink creation failed for {}: {}", source_url, e),
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.retarget();
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.retarget();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn play(&mut self) -> AudioFuture {
        let Some(url) = self.source.clone() else {
            return Box::pin(async {
                Err(AudioError::ResourceUnavailable("no source bound".into()))
            });
        };
        let Some(sink) = self.board.lock().active.clone() else {
            return Box::pin(async { Err(AudioError::Device("no output sink".into())) });
        };

        if !sink.empty() {
            sink.play();
            return Box::pin(async { Ok(()) });
        }

        let assets = self.assets.clone();
        Box::pin(async move {
            let data = load_track(&assets, &url).await?;
            let buffer = tokio::task::spawn_blocking(move || decode_track(data))
                .await
                .map_err(|e| AudioError::Decode(e.to_string()))??;

            sink.append(buffer.repeat_infinite());
            sink.play();
            info!("Soundscape track playing: {}", url);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_sink(volume: f32) -> Sink {
        let (sink, _queue) = Sink::new_idle();
        sink.set_volume(volume);
        sink
    }

    #[test]
    fn test_ramp_up_stops_at_target() {
        let sink = idle_sink(0.0);
        let mut previous = sink.volume();
        for _ in 0..20 {
            ramp(&sink, 0.3, 0.05);
            let current = sink.volume();
            assert!(current <= 0.3);
            if current == 0.3 {
                break;
            }
            assert!(current > previous);
            previous = current;
        }
        assert_eq!(sink.volume(), 0.3);

        // Already there: nothing moves
        ramp(&sink, 0.3, 0.05);
        assert_eq!(sink.volume(), 0.3);
    }

    #[test]
    fn test_ramp_down_stops_at_silence() {
        let sink = idle_sink(1.0);
        let mut previous = sink.volume();
        for _ in 0..10 {
            ramp(&sink, 0.0, 0.3);
            let current = sink.volume();
            assert!(current >= 0.0);
            assert!(current < previous || current == 0.0);
            previous = current;
        }
        assert_eq!(sink.volume(), 0.0);
    }

    #[test]
    fn test_ramp_snaps_when_close() {
        let sink = idle_sink(0.2995);
        ramp(&sink, 0.3, 0.0);
        assert_eq!(sink.volume(), 0.3);
    }

    #[test]
    fn test_fade_step_crossfades_and_drops_silent_tracks() {
        let incoming = Arc::new(idle_sink(0.0));
        let outgoing = Arc::new(idle_sink(0.3));
        let mut fades = FadeBoard {
            active: Some(incoming.clone()),
            target: 0.3,
            retiring: vec![outgoing.clone()],
        };

        assert_eq!(fade_step(&mut fades, 0.1), 0);
        assert!((incoming.volume() - 0.1).abs() < 1e-6);
        assert!((outgoing.volume() - 0.2).abs() < 1e-6);
        assert_eq!(fades.retiring.len(), 1);

        let mut retired = 0;
        for _ in 0..10 {
            retired += fade_step(&mut fades, 0.1);
        }
        assert_eq!(retired, 1);
        assert!(fades.retiring.is_empty());
        assert_eq!(outgoing.volume(), 0.0);
        assert_eq!(incoming.volume(), 0.3);
    }

    #[test]
    fn test_muted_board_ramps_active_track_to_silence() {
        let active = Arc::new(idle_sink(0.3));
        let mut fades = FadeBoard {
            active: Some(active.clone()),
            target: 0.0,
            retiring: Vec::new(),
        };
        for _ in 0..10 {
            fade_step(&mut fades, 0.1);
        }
        assert_eq!(active.volume(), 0.0);
        // The active track is never dropped, only silenced
        assert!(fades.active.is_some());
    }
}
