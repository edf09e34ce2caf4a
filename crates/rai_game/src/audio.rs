//! Background music and the jump sound.
//!
//! Audio never stops the game: a missing device or file is logged once and
//! the game carries on silent.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::level::AudioSection;

pub struct AudioSystem {
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    music: Option<Sink>,
    jump_sfx: Option<Arc<[u8]>>,
}

impl AudioSystem {
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, stream_handle)) => Self {
                _stream: Some(stream),
                stream_handle: Some(stream_handle),
                music: None,
                jump_sfx: None,
            },
            Err(e) => {
                log::warn!("Failed to open audio output: {e}. Running without sound.");
                Self::silent()
            }
        }
    }

    pub fn silent() -> Self {
        Self {
            _stream: None,
            stream_handle: None,
            music: None,
            jump_sfx: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.stream_handle.is_some()
    }

    /// Start the level's music and cache its jump sound.
    pub fn load(&mut self, section: &AudioSection) {
        if !self.is_available() {
            return;
        }
        if let Some(path) = &section.music {
            if let Err(e) = self.play_music_loop(Path::new(path), section.music_volume) {
                log::warn!("{e}");
            }
        }
        if let Some(path) = &section.jump_sfx {
            match std::fs::read(path) {
                Ok(bytes) => self.jump_sfx = Some(Arc::from(bytes)),
                Err(e) => log::warn!("Failed to read sound '{path}': {e}"),
            }
        }
    }

    fn play_music_loop(&mut self, path: &Path, volume: f32) -> Result<(), String> {
        let handle = self
            .stream_handle
            .as_ref()
            .ok_or_else(|| "Audio output is not available".to_string())?;

        let file = File::open(path)
            .map_err(|e| format!("Failed to open music '{}': {e}", path.display()))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| format!("Failed to decode music '{}': {e}", path.display()))?
            .repeat_infinite();

        let sink =
            Sink::try_new(handle).map_err(|e| format!("Failed to create music sink: {e}"))?;
        sink.append(source);
        sink.set_volume(volume.clamp(0.0, 1.0));

        if let Some(old) = self.music.replace(sink) {
            old.stop();
        }
        log::info!("Playing music '{}'", path.display());
        Ok(())
    }

    pub fn play_jump(&self) {
        let (Some(handle), Some(bytes)) = (&self.stream_handle, &self.jump_sfx) else {
            return;
        };
        let source = match Decoder::new(Cursor::new(Arc::clone(bytes))) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Failed to decode jump sound: {e}");
                return;
            }
        };
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(source);
                sink.detach();
            }
            Err(e) => log::warn!("Failed to create sound sink: {e}"),
        }
    }
}

impl Default for AudioSystem {
    fn default() -> Self {
        Self::new()
    }
}
