//! Tool records: positioned content elements extracted from a page

use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed taxonomy of content element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolKind {
    #[serde(rename = "tool-text")]
    Text,
    #[serde(rename = "tool-simpletext")]
    SimpleText,
    #[serde(rename = "tool-picture")]
    Picture,
    #[serde(rename = "tool-audio")]
    Audio,
    #[serde(rename = "tool-video")]
    Video,
    #[serde(rename = "tool-shape")]
    Shape,
    #[serde(rename = "tool-pdf")]
    Pdf,
    #[serde(rename = "tool-slideshow")]
    Slideshow,
    #[serde(rename = "tool-embed")]
    Embed,
    #[serde(rename = "tool-iframe")]
    Iframe,
}

impl ToolKind {
    /// All tool kinds, in extraction order
    pub fn all() -> [ToolKind; 10] {
        [
            Self::Text,
            Self::SimpleText,
            Self::Picture,
            Self::Audio,
            Self::Video,
            Self::Shape,
            Self::Pdf,
            Self::Slideshow,
            Self::Embed,
            Self::Iframe,
        ]
    }

    /// The CSS class marking elements of this kind on a page
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Text => "tool-text",
            Self::SimpleText => "tool-simpletext",
            Self::Picture => "tool-picture",
            Self::Audio => "tool-audio",
            Self::Video => "tool-video",
            Self::Shape => "tool-shape",
            Self::Pdf => "tool-pdf",
            Self::Slideshow => "tool-slideshow",
            Self::Embed => "tool-embed",
            Self::Iframe => "tool-iframe",
        }
    }

    /// Returns true for the two text-bearing kinds
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::SimpleText)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

/// An axis-aligned rectangle in page pixels
///
/// Fields are non-negative; serialized as the four-element array
/// `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width * self.height
    }

    /// Area of the axis-aligned intersection with another rectangle
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let x_overlap = (self.right().min(other.right()) - self.x.max(other.x)).max(0);
        let y_overlap = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0);
        x_overlap * y_overlap
    }
}

impl Serialize for Rect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(4))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        seq.serialize_element(&self.width)?;
        seq.serialize_element(&self.height)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Rect {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RectVisitor;

        impl<'de> Visitor<'de> for RectVisitor {
            type Value = Rect;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a [x, y, width, height] array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Rect, A::Error> {
                let mut take = |idx| {
                    seq.next_element::<i64>()?
                        .ok_or_else(|| serde::de::Error::invalid_length(idx, &self))
                };
                Ok(Rect::new(take(0)?, take(1)?, take(2)?, take(3)?))
            }
        }

        deserializer.deserialize_seq(RectVisitor)
    }
}

/// Where a tool sits on its page
///
/// Graphical pages position tools absolutely; block pages place them in a
/// twelve-column grid, recorded as a percentage width plus a row index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Placement {
    Absolute { dimensions: Rect },
    Grid { dimensions: String, row: usize },
}

impl Placement {
    pub fn absolute(rect: Rect) -> Self {
        Self::Absolute { dimensions: rect }
    }

    /// Grid placement from a 12-column span and a row index
    pub fn grid(column_span: u32, row: usize) -> Self {
        let percentage = (column_span as f64 / 12.0) * 100.0;
        Self::Grid {
            dimensions: format!("{}%", percentage),
            row,
        }
    }

    /// The rectangle of an absolutely positioned tool, if any
    pub fn rect(&self) -> Option<&Rect> {
        match self {
            Self::Absolute { dimensions } => Some(dimensions),
            Self::Grid { .. } => None,
        }
    }
}

/// Kind-specific payload of a tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolDetail {
    /// text / simpletext: plain text with scripts and styles stripped
    Text { text: String },

    /// picture / audio / pdf: a single resolved source, when present
    Source {
        #[serde(skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },

    /// video: resolved source plus a poster image reference
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        src: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        poster: Option<String>,
    },

    /// slideshow: the deduplicated sources of all frames
    Slideshow { src: Vec<String> },

    /// shape / embed / iframe: geometry and raw content only
    Plain {},
}

/// A positioned content element extracted from a page
///
/// The shared base (id, placement, raw content, modification stamps) is
/// common to all kinds; `detail` carries the kind-specific fields. The
/// copyright merger fills `copyright_ref` and `attribution` after
/// extraction.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub id: String,

    #[serde(flatten)]
    pub placement: Placement,

    #[serde(rename = "content")]
    pub raw_content: String,

    #[serde(rename = "last-modified-by", skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,

    #[serde(rename = "last-modified-at", skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<i64>,

    #[serde(flatten)]
    pub detail: ToolDetail,

    /// Canonical tool reference from the matching copyright entry
    #[serde(rename = "tool", skip_serializing_if = "Option::is_none")]
    pub copyright_ref: Option<String>,

    /// Attribution attributes merged in from the copyright entry
    #[serde(flatten)]
    pub attribution: BTreeMap<String, String>,
}
