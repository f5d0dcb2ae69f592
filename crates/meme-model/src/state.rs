//! Editing session state.
//!
//! [`MemeState`] is an immutable value: every transition consumes the
//! current state and returns the next one. Callers hold exactly one
//! state at a time, so superseded states are simply dropped.

use std::sync::Arc;

use crate::caption::CaptionTone;
use crate::raster::SourceImage;
use crate::saved::SavedMeme;
use crate::style::{CaptionColor, CaptionFont, CaptionPosition, CaptionStyle, StylePreset};

/// The working configuration of one editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct MemeState {
    source: Option<Arc<SourceImage>>,
    caption_tone: CaptionTone,
    captions: Vec<String>,
    selected_caption: Option<String>,
    custom_caption: Option<String>,
    use_custom_caption: bool,
    style: CaptionStyle,
    saved_memes: Vec<SavedMeme>,
}

impl Default for MemeState {
    fn default() -> Self {
        Self {
            source: None,
            caption_tone: CaptionTone::default(),
            captions: Vec::new(),
            selected_caption: None,
            custom_caption: None,
            use_custom_caption: false,
            style: CaptionStyle::default(),
            saved_memes: Vec::new(),
        }
    }
}

impl MemeState {
    pub fn new() -> Self {
        Self::default()
    }

    // --- accessors ---

    pub fn source(&self) -> Option<&Arc<SourceImage>> {
        self.source.as_ref()
    }

    pub fn caption_tone(&self) -> CaptionTone {
        self.caption_tone
    }

    /// The caption list currently offered for selection.
    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    pub fn selected_caption(&self) -> Option<&str> {
        self.selected_caption.as_deref()
    }

    pub fn custom_caption(&self) -> Option<&str> {
        self.custom_caption.as_deref()
    }

    pub fn use_custom_caption(&self) -> bool {
        self.use_custom_caption
    }

    pub fn style(&self) -> CaptionStyle {
        self.style
    }

    pub fn saved_memes(&self) -> &[SavedMeme] {
        &self.saved_memes
    }

    /// The caption to render: the custom text in custom mode, the selected
    /// canned caption otherwise.
    pub fn active_caption(&self) -> Option<&str> {
        if self.use_custom_caption {
            self.custom_caption.as_deref()
        } else {
            self.selected_caption.as_deref()
        }
    }

    // --- image ---

    pub fn with_source(self, source: SourceImage) -> Self {
        Self {
            source: Some(Arc::new(source)),
            ..self
        }
    }

    /// Drop the uploaded image along with the caption chosen for it.
    pub fn without_source(self) -> Self {
        Self {
            source: None,
            selected_caption: None,
            ..self
        }
    }

    // --- captions ---

    /// Load the canned list for the current tone and select its first
    /// entry unless custom mode is on.
    pub fn generate_captions(self) -> Self {
        let tone = self.caption_tone;
        self.with_caption_tone(tone)
    }

    /// Switch tone, replacing the offered captions. Outside custom mode the
    /// first caption of the new list becomes the selection.
    pub fn with_caption_tone(self, tone: CaptionTone) -> Self {
        let captions: Vec<String> = tone.captions().iter().map(|c| c.to_string()).collect();
        let selected_caption = if self.use_custom_caption {
            self.selected_caption
        } else {
            captions.first().cloned().or(self.selected_caption)
        };
        Self {
            caption_tone: tone,
            captions,
            selected_caption,
            ..self
        }
    }

    pub fn select_caption(self, caption: impl Into<String>) -> Self {
        Self {
            selected_caption: Some(caption.into()),
            ..self
        }
    }

    /// Select the offered caption at `index`. Out-of-range indices leave the
    /// state unchanged.
    pub fn select_caption_at(self, index: usize) -> Self {
        match self.captions.get(index).cloned() {
            Some(caption) => self.select_caption(caption),
            None => self,
        }
    }

    pub fn with_custom_caption(self, caption: impl Into<String>) -> Self {
        Self {
            custom_caption: Some(caption.into()),
            ..self
        }
    }

    pub fn with_use_custom_caption(self, enabled: bool) -> Self {
        Self {
            use_custom_caption: enabled,
            ..self
        }
    }

    // --- style ---

    pub fn with_font(self, font: CaptionFont) -> Self {
        Self {
            style: self.style.with_font(font),
            ..self
        }
    }

    pub fn with_color(self, color: CaptionColor) -> Self {
        Self {
            style: self.style.with_color(color),
            ..self
        }
    }

    pub fn with_size(self, size: u32) -> Self {
        Self {
            style: self.style.with_size(size),
            ..self
        }
    }

    pub fn with_position(self, position: CaptionPosition) -> Self {
        Self {
            style: self.style.with_position(position),
            ..self
        }
    }

    pub fn apply_preset(self, preset: &StylePreset) -> Self {
        Self {
            style: self.style.apply_preset(preset),
            ..self
        }
    }

    // --- saved memes ---

    /// Mirror the library's saved list.
    pub fn with_saved_memes(self, saved_memes: Vec<SavedMeme>) -> Self {
        Self {
            saved_memes,
            ..self
        }
    }
}
