use crate::error::{AudioError, AudioResult};
use log::info;
use parking_lot::Mutex;
use rodio::{Decoder, OutputStreamHandle, Sink};
use std::io::Cursor;

/// Plays character intro lines next to the background track.
/// Starting a new line cuts off the previous one.
pub struct IntroPlayer {
    stream_handle: OutputStreamHandle,
    current: Mutex<Option<Sink>>,
}

impl IntroPlayer {
    pub fn new(stream_handle: OutputStreamHandle) -> Self {
        Self {
            stream_handle,
            current: Mutex::new(None),
        }
    }

    /// Decode from memory and start immediately.
    pub fn play(&self, audio: Vec<u8>) -> AudioResult<()> {
        let len = audio.len();
        let source =
            Decoder::new(Cursor::new(audio)).map_err(|e| AudioError::Decode(e.to_string()))?;
        let sink =
            Sink::try_new(&self.stream_handle).map_err(|e| AudioError::Device(e.to_string()))?;
        sink.append(source);

        // Dropping the previous sink stops its line
        *self.current.lock() = Some(sink);
        info!("Playing intro line ({} bytes)", len);
        Ok(())
    }
}
