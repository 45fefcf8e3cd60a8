//! The application's "recently opened" list.
//!
//! [`RecentPresentations`] owns the retention count and decides between
//! saving and updating each time a presentation is opened. A damaged context
//! file never prevents a presentation from opening: reads degrade to an empty
//! list and writes start a new registry. Changing the retention count reports
//! failures to the caller instead.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::error::RegistryError;
use crate::file::ContextFile;
use crate::presentation::RecentPresentation;

pub struct RecentPresentations {
    context_file: ContextFile,
    max: usize,
}

impl RecentPresentations {
    /// Keep at most `max` presentations in `context_file`.
    #[must_use]
    pub fn new(context_file: ContextFile, max: usize) -> Self {
        Self { context_file, max }
    }

    pub fn context_file(&self) -> &ContextFile {
        &self.context_file
    }

    /// Current retention count.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Registered presentations in path order, purged to the retention count.
    pub fn list(&self) -> BTreeSet<RecentPresentation> {
        let presentations = match self.context_file.read_all() {
            Ok(presentations) => presentations,
            Err(e) => {
                tracing::warn!(
                    path = %self.context_file.path().display(),
                    error = %e,
                    "can not read the recent presentations"
                );
                return BTreeSet::new();
            }
        };

        if presentations.len() <= self.max {
            return presentations;
        }

        match self.context_file.purge(self.max) {
            Ok(kept) => kept,
            Err(e) => {
                tracing::warn!(error = %e, "can not purge recent presentations");
                presentations
            }
        }
    }

    /// [`list`](Self::list) restricted to presentations whose file still exists.
    pub fn existing(&self) -> BTreeSet<RecentPresentation> {
        self.list()
            .into_iter()
            .filter(|presentation| presentation.path().exists())
            .collect()
    }

    /// Record that the presentation at `path` has just been opened.
    pub fn record_opened_now(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<RecentPresentation, RegistryError> {
        self.record_opened(path, Local::now().naive_local())
    }

    /// Record that the presentation at `path` was opened at `opened`.
    ///
    /// A new presentation is appended; a known one gets its opened date
    /// refreshed. If the context file can not be parsed, it is recreated with
    /// only this presentation. Afterwards the registry is purged when it
    /// holds more than the retention count.
    pub fn record_opened(
        &self,
        path: impl AsRef<Path>,
        opened: NaiveDateTime,
    ) -> Result<RecentPresentation, RegistryError> {
        let presentation = RecentPresentation::new(path, Some(opened))?;

        match self.register(&presentation) {
            Ok(()) => {}
            Err(RegistryError::MalformedDocument(e)) => {
                tracing::warn!(
                    path = %self.context_file.path().display(),
                    error = %e,
                    "context file is corrupted, recreating it"
                );
                self.context_file.reset()?;
                self.context_file.save(&presentation)?;
            }
            Err(e) => return Err(e),
        }

        if let Err(e) = self.enforce_max() {
            tracing::warn!(error = %e, "can not purge recent presentations");
        }

        Ok(presentation)
    }

    /// Change the retention count and purge right away.
    ///
    /// Returns the presentations still registered.
    pub fn set_max(&mut self, max: usize) -> Result<BTreeSet<RecentPresentation>, RegistryError> {
        self.max = max;
        self.context_file.purge(max)
    }

    fn register(&self, presentation: &RecentPresentation) -> Result<(), RegistryError> {
        if self.context_file.exists(presentation)? {
            tracing::debug!(path = presentation.normalized_path(), "updating recent presentation");
            self.context_file.update(presentation)
        } else {
            tracing::debug!(path = presentation.normalized_path(), "saving recent presentation");
            self.context_file.save(presentation)
        }
    }

    fn enforce_max(&self) -> Result<(), RegistryError> {
        if self.context_file.read_all()?.len() > self.max {
            self.context_file.purge(self.max)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn day(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn recents(tmp: &TempDir, max: usize) -> RecentPresentations {
        RecentPresentations::new(ContextFile::new(tmp.path().join("context.xml")), max)
    }

    fn names(presentations: &BTreeSet<RecentPresentation>) -> Vec<String> {
        presentations
            .iter()
            .map(|p| {
                p.path()
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_record_then_list() {
        let tmp = TempDir::new().unwrap();
        let recents = recents(&tmp, 10);

        recents.record_opened(tmp.path().join("b.sfx"), day(1)).unwrap();
        recents.record_opened(tmp.path().join("a.sfx"), day(2)).unwrap();

        assert_eq!(names(&recents.list()), vec!["a.sfx", "b.sfx"]);
    }

    #[test]
    fn test_record_twice_updates_instead_of_duplicating() {
        let tmp = TempDir::new().unwrap();
        let recents = recents(&tmp, 10);
        let path = tmp.path().join("talk.sfx");

        recents.record_opened(&path, day(1)).unwrap();
        recents.record_opened(&path, day(5)).unwrap();

        let content = fs::read_to_string(recents.context_file().path()).unwrap();
        assert_eq!(content.matches("<recentPresentation>").count(), 1);

        let listed = recents.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.first().unwrap().opened_date_time(), Some(day(5)));
    }

    #[test]
    fn test_record_purges_oldest() {
        let tmp = TempDir::new().unwrap();
        let recents = recents(&tmp, 2);

        recents.record_opened(tmp.path().join("one.sfx"), day(1)).unwrap();
        recents.record_opened(tmp.path().join("two.sfx"), day(2)).unwrap();
        recents.record_opened(tmp.path().join("three.sfx"), day(3)).unwrap();

        assert_eq!(names(&recents.list()), vec!["three.sfx", "two.sfx"]);
    }

    #[test]
    fn test_record_recreates_corrupted_file() {
        let tmp = TempDir::new().unwrap();
        let recents = recents(&tmp, 10);
        fs::write(recents.context_file().path(), "<slideshowfx><recentPresentations>").unwrap();

        assert!(recents.list().is_empty());

        recents.record_opened(tmp.path().join("talk.sfx"), day(1)).unwrap();

        assert_eq!(names(&recents.list()), vec!["talk.sfx"]);
    }

    #[test]
    fn test_record_rejects_empty_path() {
        let tmp = TempDir::new().unwrap();
        let recents = recents(&tmp, 10);

        let err = recents.record_opened("", day(1)).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)), "got {err:?}");
    }

    #[test]
    fn test_list_purges_when_over_max() {
        let tmp = TempDir::new().unwrap();
        let file = ContextFile::new(tmp.path().join("context.xml"));
        for (index, name) in ["a.sfx", "b.sfx", "c.sfx"].iter().enumerate() {
            let opened = day(1) + Duration::hours(i64::try_from(index).unwrap());
            file.save(&RecentPresentation::new(tmp.path().join(name), Some(opened)).unwrap())
                .unwrap();
        }

        let recents = RecentPresentations::new(file, 1);

        assert_eq!(names(&recents.list()), vec!["c.sfx"]);
        assert_eq!(recents.context_file().read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_set_max_purges() {
        let tmp = TempDir::new().unwrap();
        let mut recents = recents(&tmp, 10);
        recents.record_opened(tmp.path().join("old.sfx"), day(1)).unwrap();
        recents.record_opened(tmp.path().join("new.sfx"), day(2)).unwrap();

        let kept = recents.set_max(1).unwrap();

        assert_eq!(recents.max(), 1);
        assert_eq!(names(&kept), vec!["new.sfx"]);
    }

    #[test]
    fn test_set_max_reports_corrupted_file() {
        let tmp = TempDir::new().unwrap();
        let mut recents = recents(&tmp, 10);
        fs::write(recents.context_file().path(), "<slideshowfx>").unwrap();

        let err = recents.set_max(3).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedDocument(_)), "got {err:?}");
    }

    #[test]
    fn test_existing_filters_missing_files() {
        let tmp = TempDir::new().unwrap();
        let recents = recents(&tmp, 10);
        let present = tmp.path().join("present.sfx");
        fs::write(&present, b"slides").unwrap();

        recents.record_opened(&present, day(1)).unwrap();
        recents.record_opened(tmp.path().join("gone.sfx"), day(2)).unwrap();

        assert_eq!(recents.list().len(), 2);
        assert_eq!(names(&recents.existing()), vec!["present.sfx"]);
    }
}
