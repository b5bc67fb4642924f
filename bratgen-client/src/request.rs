//! Generation request model and validation
//!
//! A [`GenerationRequest`] can only be obtained through
//! [`GenerationRequestBuilder::build`], so every request that reaches the
//! network has an audio source, exactly one lyrics source, and a time range.

use crate::api::GenerateRequestBody;
use crate::error::ValidationError;
use bratgen_common::{StyleOptions, TimeRange};

/// Display name used when song or artist is not known
pub const UNKNOWN: &str = "Unknown";

/// Where the render server gets the lyrics from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsSource {
    /// Lyrics chosen from the server's lyrics catalogue
    Sourced { id: String },
    /// Synchronized lyrics entered by the user
    Manual { text: String },
}

/// Validated generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    video_id: String,
    lyrics: LyricsSource,
    song: String,
    artist: String,
    time_range: TimeRange,
    style: StyleOptions,
}

impl GenerationRequest {
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn lyrics(&self) -> &LyricsSource {
        &self.lyrics
    }

    pub fn song(&self) -> &str {
        &self.song
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    /// Wire form for `POST /generate`
    pub fn to_body(&self) -> GenerateRequestBody {
        let (lyrics_id, manual_lrc) = match &self.lyrics {
            LyricsSource::Sourced { id } => (Some(id.clone()), None),
            LyricsSource::Manual { text } => (None, Some(text.clone())),
        };

        GenerateRequestBody {
            song: self.song.clone(),
            artist: self.artist.clone(),
            video_id: self.video_id.clone(),
            lyrics_id,
            manual_lrc,
            start_time: self.time_range.start.clone(),
            end_time: self.time_range.end.clone(),
            lofi: self.style.lofi,
            fontsize: self.style.fontsize,
            bgcolor: self.style.bgcolor.clone(),
            textcolor: self.style.text_color.clone(),
        }
    }
}

/// Collects request fields; validation happens in [`GenerationRequestBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct GenerationRequestBuilder {
    video_id: Option<String>,
    lyrics: Option<LyricsSource>,
    song: Option<String>,
    artist: Option<String>,
    time_range: Option<TimeRange>,
    style: StyleOptions,
}

impl GenerationRequestBuilder {
    pub fn video_id(mut self, video_id: impl Into<String>) -> Self {
        self.video_id = Some(video_id.into());
        self
    }

    pub fn lyrics(mut self, lyrics: LyricsSource) -> Self {
        self.lyrics = Some(lyrics);
        self
    }

    pub fn lyrics_id(self, id: impl Into<String>) -> Self {
        self.lyrics(LyricsSource::Sourced { id: id.into() })
    }

    pub fn manual_lyrics(self, text: impl Into<String>) -> Self {
        self.lyrics(LyricsSource::Manual { text: text.into() })
    }

    pub fn song(mut self, song: impl Into<String>) -> Self {
        self.song = Some(song.into());
        self
    }

    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn style(mut self, style: StyleOptions) -> Self {
        self.style = style;
        self
    }

    pub fn build(self) -> Result<GenerationRequest, ValidationError> {
        let video_id = self
            .video_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingAudioSource)?;

        let lyrics = match self.lyrics.ok_or(ValidationError::MissingLyrics)? {
            LyricsSource::Sourced { id } => {
                let id = id.trim().to_string();
                if id.is_empty() {
                    return Err(ValidationError::EmptyLyricsId);
                }
                LyricsSource::Sourced { id }
            }
            LyricsSource::Manual { text } => {
                if text.trim().is_empty() {
                    return Err(ValidationError::EmptyManualLyrics);
                }
                LyricsSource::Manual { text }
            }
        };

        let time_range = self.time_range.ok_or(ValidationError::MissingTimeRange)?;
        if time_range.start.trim().is_empty() {
            return Err(ValidationError::EmptyTimeField("start"));
        }
        if time_range.end.trim().is_empty() {
            return Err(ValidationError::EmptyTimeField("end"));
        }

        Ok(GenerationRequest {
            video_id,
            lyrics,
            song: display_or_unknown(self.song),
            artist: display_or_unknown(self.artist),
            time_range,
            style: self.style.normalized(),
        })
    }
}

fn display_or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
