use serde::{Deserialize, Serialize};

/// One contiguous run of text sharing a single style, as emitted by the
/// document decoder.
///
/// Coordinates are in page units with the origin at the top-left corner of
/// the page: `y` is the top of the run's box and grows downward.  The page
/// index is 0-based; it is only converted to 1-based when an outline entry
/// is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub page_number: usize,
}

impl Fragment {
    pub fn new(text: impl Into<String>, font_size: f32, page_number: usize) -> Self {
        Fragment {
            text: text.into(),
            font_size,
            bold: false,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            page_number,
        }
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set the box: left edge, top edge and width.
    pub fn at(mut self, x: f32, y: f32, width: f32) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self
    }

    /// Right edge of the fragment's box.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Number of whitespace-delimited words in the trimmed text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Page dimensions in the same units as [`Fragment`] geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// US Letter in PDF points.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        PageSize { width, height }
    }
}
