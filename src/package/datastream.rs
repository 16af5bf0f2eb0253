//! Datastream kinds and per-run selection.
//!
//! A run is configured with a set of requested datastreams. An empty set means
//! "produce everything"; a non-empty set means "produce exactly these".

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A named artifact kind attached to a page or an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Datastream {
    /// Descriptive metadata (`MODS.xml`).
    Mods,
    /// Master image.
    Obj,
    /// Page text (`OCR.txt`).
    Ocr,
    /// JPEG 2000 derivative (`JP2.jp2`).
    Jp2,
    /// Thumbnail (`TN.jpg`).
    Tn,
    /// Preview image (`JPEG.jpg`).
    Jpeg,
}

impl Datastream {
    /// Every kind, in the order the writer produces them.
    pub const ALL: [Self; 6] = [
        Self::Ocr,
        Self::Jp2,
        Self::Tn,
        Self::Jpeg,
        Self::Obj,
        Self::Mods,
    ];

    /// Returns the stable configuration label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mods => "MODS",
            Self::Obj => "OBJ",
            Self::Ocr => "OCR",
            Self::Jp2 => "JP2",
            Self::Tn => "TN",
            Self::Jpeg => "JPEG",
        }
    }

    /// Returns the fixed output filename, when the kind has one.
    ///
    /// OBJ depends on its source and MODS on configuration, so both return `None`.
    #[must_use]
    pub fn fixed_filename(self) -> Option<&'static str> {
        match self {
            Self::Ocr => Some("OCR.txt"),
            Self::Jp2 => Some("JP2.jp2"),
            Self::Tn => Some("TN.jpg"),
            Self::Jpeg => Some("JPEG.jpg"),
            Self::Mods | Self::Obj => None,
        }
    }
}

impl fmt::Display for Datastream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a configured datastream name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown datastream '{0}' (expected one of MODS, OBJ, OCR, JP2, TN, JPEG)")]
pub struct UnknownDatastream(pub String);

impl FromStr for Datastream {
    type Err = UnknownDatastream;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MODS" => Ok(Self::Mods),
            "OBJ" => Ok(Self::Obj),
            "OCR" => Ok(Self::Ocr),
            "JP2" => Ok(Self::Jp2),
            "TN" => Ok(Self::Tn),
            "JPEG" => Ok(Self::Jpeg),
            _ => Err(UnknownDatastream(value.to_string())),
        }
    }
}

/// The configured set of requested datastreams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatastreamSelection {
    requested: BTreeSet<Datastream>,
}

impl DatastreamSelection {
    /// Selection that produces every datastream.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Selection restricted to the given kinds. An empty iterator means "all".
    pub fn from_requested(requested: impl IntoIterator<Item = Datastream>) -> Self {
        Self {
            requested: requested.into_iter().collect(),
        }
    }

    /// Parses configuration labels into a selection.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownDatastream`] for the first label that is not a known kind.
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Result<Self, UnknownDatastream> {
        let requested = labels
            .iter()
            .map(|label| label.as_ref().parse::<Datastream>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { requested })
    }

    /// True when no explicit datastreams were configured.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.requested.is_empty()
    }

    /// Whether `kind` is produced this run.
    #[must_use]
    pub fn is_requested(&self, kind: Datastream) -> bool {
        self.requested.contains(&kind) ^ self.requested.is_empty()
    }
}
