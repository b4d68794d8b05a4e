//! Export options configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PowerPoint presentation (.pptx)
    #[default]
    #[serde(alias = "pptx")]
    Ppt,
    /// Multi-page PDF document
    Pdf,
    /// One PNG file per slide
    Png,
    /// One JPEG file per slide
    #[serde(alias = "jpg")]
    Jpeg,
    /// Keynote import; delivered as a .pptx package
    Keynote,
}

impl ExportFormat {
    /// All formats, in display order.
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Ppt,
        ExportFormat::Pdf,
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Keynote,
    ];

    /// Returns the file extension produced for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Ppt | ExportFormat::Keynote => "pptx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }

    /// Returns the canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Ppt => "ppt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Keynote => "keynote",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ppt" | "pptx" => Ok(ExportFormat::Ppt),
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "keynote" | "key" => Ok(ExportFormat::Keynote),
            other => Err(Error::InvalidOptions(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Capture quality; controls the rasterization scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// 1x scale
    Low,
    /// 2x scale
    #[default]
    Medium,
    /// 3x scale
    High,
}

impl Quality {
    /// Scale factor passed to the rasterizer.
    pub fn scale(&self) -> u32 {
        match self {
            Quality::Low => 1,
            Quality::Medium => 2,
            Quality::High => 3,
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Quality::Low),
            "medium" => Ok(Quality::Medium),
            "high" => Ok(Quality::High),
            other => Err(Error::InvalidOptions(format!("Unknown quality: {}", other))),
        }
    }
}

/// Slide aspect ratio, e.g. 16:9 or 1920x1080.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AspectRatio {
    /// Relative width
    pub width: u32,
    /// Relative height
    pub height: u32,
}

impl AspectRatio {
    /// Create a new aspect ratio.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check that neither side is zero.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidOptions(format!(
                "Invalid aspect ratio {}:{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidOptions(format!("Invalid aspect ratio: {}", s));
        let (w, h) = s
            .split_once(':')
            .or_else(|| s.split_once(['x', 'X']))
            .ok_or_else(invalid)?;
        let ratio = AspectRatio::new(
            w.trim().parse().map_err(|_| invalid())?,
            h.trim().parse().map_err(|_| invalid())?,
        );
        ratio.validate()?;
        Ok(ratio)
    }
}

/// Options for a single export call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Output format
    pub format: ExportFormat,

    /// Capture quality
    #[serde(default)]
    pub quality: Quality,

    /// Base file name; a format-specific default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Restrict the export to these slide ids (empty = all slides)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected_slide_ids: Vec<String>,

    /// Aspect ratio override for the produced deck
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<AspectRatio>,
}

impl ExportOptions {
    /// Create options for the given format with default quality.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Set the capture quality.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Set the base file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Restrict the export to the given slide ids.
    pub fn with_selected_slides<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_slide_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the aspect ratio.
    pub fn with_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        self.aspect_ratio = Some(ratio);
        self
    }

    /// Parse options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidOptions(e.to_string()))
    }

    /// Custom file name, ignoring blank values.
    pub(crate) fn custom_file_name(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
