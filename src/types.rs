//! Common types shared by the editing core and the header facade

use strum_macros::{Display, EnumString};

/// Represents a byte range within one source buffer
/// Edits refer into the buffer instead of copying it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Get the string slice this range represents
    pub fn as_str<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Get the byte slice this range represents
    pub fn as_bytes<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        &source[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Header classes the editing facade understands
///
/// Doubles as the source of the opaque classifier tag recorded on lumps, so
/// a caller walking an edit list can tell which feature queued which edit.
/// Parsing accepts the RFC 3261 compact forms where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum HeaderClass {
    #[strum(to_string = "Via", serialize = "v")]
    Via,
    #[strum(to_string = "Route")]
    Route,
    #[strum(to_string = "Record-Route")]
    RecordRoute,
    #[strum(to_string = "Contact", serialize = "m")]
    Contact,
    #[strum(to_string = "Max-Forwards")]
    MaxForwards,
    #[strum(to_string = "User-Agent")]
    UserAgent,
    #[strum(to_string = "Content-Type", serialize = "c")]
    ContentType,
    #[strum(to_string = "Content-Length", serialize = "l")]
    ContentLength,
    Other,
}

impl HeaderClass {
    /// Classifier tag recorded on lumps created for this header class
    pub fn classifier(&self) -> u32 {
        match self {
            HeaderClass::Via => 1,
            HeaderClass::Route => 2,
            HeaderClass::RecordRoute => 3,
            HeaderClass::Contact => 4,
            HeaderClass::MaxForwards => 5,
            HeaderClass::UserAgent => 6,
            HeaderClass::ContentType => 7,
            HeaderClass::ContentLength => 8,
            HeaderClass::Other => 0,
        }
    }

    /// Classify a header name, falling back to `Other` for names we do not
    /// track individually
    pub fn classify(name: &str) -> Self {
        name.parse().unwrap_or(HeaderClass::Other)
    }
}
