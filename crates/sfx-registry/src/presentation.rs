//! The [`RecentPresentation`] entity.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::path::Path;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chrono::NaiveDateTime;

use crate::error::RegistryError;
use crate::ordering::PathOrder;
use crate::path::normalize_path;

/// Format written to the `openedDateTime` element.
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// Minute precision form, emitted by older writers when seconds are zero.
const DATE_TIME_MINUTES_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A presentation opened recently.
///
/// Identity is the normalized path: two values that only differ by their
/// opened date are equal, hash the same and sort the same.
#[derive(Debug, Clone)]
pub struct RecentPresentation {
    normalized_path: String,
    id: String,
    opened_date_time: Option<NaiveDateTime>,
}

impl RecentPresentation {
    /// Create a recent presentation for `path`.
    ///
    /// The path is normalized and the id derived immediately. A presentation
    /// without `opened_date_time` is never written to a context file.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidArgument` if `path` is empty and
    /// `RegistryError::Io` if the working directory needed to make it
    /// absolute is unavailable.
    pub fn new(
        path: impl AsRef<Path>,
        opened_date_time: Option<NaiveDateTime>,
    ) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "the presentation path can not be empty".to_owned(),
            ));
        }

        let normalized_path = normalize_path(path)?;
        let id = presentation_id(&normalized_path);

        Ok(Self {
            normalized_path,
            id,
            opened_date_time,
        })
    }

    /// Absolute path with forward slashes.
    pub fn normalized_path(&self) -> &str {
        &self.normalized_path
    }

    /// The normalized path as a [`Path`].
    pub fn path(&self) -> &Path {
        Path::new(&self.normalized_path)
    }

    /// Base64 of the normalized path.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn opened_date_time(&self) -> Option<NaiveDateTime> {
        self.opened_date_time
    }

    pub fn set_opened_date_time(&mut self, opened_date_time: Option<NaiveDateTime>) {
        self.opened_date_time = opened_date_time;
    }

    /// Replace the opened date (builder).
    #[must_use]
    pub fn with_opened_date_time(mut self, opened_date_time: NaiveDateTime) -> Self {
        self.opened_date_time = Some(opened_date_time);
        self
    }
}

impl PartialEq for RecentPresentation {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_path == other.normalized_path
    }
}

impl Eq for RecentPresentation {}

impl Hash for RecentPresentation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_path.hash(state);
    }
}

impl PartialOrd for RecentPresentation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecentPresentation {
    fn cmp(&self, other: &Self) -> Ordering {
        PathOrder::compare(self, other)
    }
}

/// Id stored alongside a presentation: the Base64 encoding of its UTF-8 path.
pub fn presentation_id(normalized_path: &str) -> String {
    BASE64_STANDARD.encode(normalized_path.as_bytes())
}

/// Render an opened date for the context file.
pub fn format_opened_date_time(opened_date_time: NaiveDateTime) -> String {
    opened_date_time.format(DATE_TIME_FORMAT).to_string()
}

/// Parse an opened date read from the context file.
///
/// Returns `None` for text that is not a local date-time.
pub fn parse_opened_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATE_TIME_MINUTES_FORMAT))
        .ok()
}
