//! The editable photo list behind a report: uploads, deletions with undo,
//! reordering, and per-photo form entries. Generation only ever sees the
//! final ordered list produced by [`PhotoList::build_records`].

use std::collections::{HashMap, HashSet};

use chrono::{Local, NaiveDate};

use crate::error::Error;
use crate::model::{PhotoRecord, ReportContext};
use crate::photo::load_photo;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedPhoto {
    pub name: String,
    pub data: Vec<u8>,
}

/// Handed out by [`PhotoList::remove`]; restores the photo where it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoToken {
    index: usize,
    name: String,
}

impl UndoToken {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// What the user typed for one photo. Blank fields fall back to the
/// report-wide values.
#[derive(Clone, Debug, Default)]
pub struct PhotoDraft {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct PhotoList {
    files: Vec<UploadedPhoto>,
    deleted: HashMap<String, UploadedPhoto>,
    history: Vec<UndoToken>,
}

impl PhotoList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an upload. Names already listed, or deleted and not yet
    /// restored, are ignored; returns whether the photo was added.
    pub fn add(&mut self, name: &str, data: Vec<u8>) -> bool {
        if self.contains(name) || self.deleted.contains_key(name) {
            return false;
        }
        self.files.push(UploadedPhoto {
            name: name.to_string(),
            data,
        });
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn photos(&self) -> &[UploadedPhoto] {
        &self.files
    }

    pub fn remove(&mut self, name: &str) -> Option<UndoToken> {
        let index = self.files.iter().position(|f| f.name == name)?;
        let photo = self.files.remove(index);
        let token = UndoToken {
            index,
            name: photo.name.clone(),
        };
        self.deleted.insert(photo.name.clone(), photo);
        self.history.push(token.clone());
        Some(token)
    }

    /// Put a removed photo back at its old position, or at the end when the
    /// list has since shrunk below it.
    pub fn undo(&mut self, token: &UndoToken) -> bool {
        let Some(photo) = self.deleted.remove(&token.name) else {
            return false;
        };
        self.history.retain(|t| t != token);
        let index = token.index.min(self.files.len());
        self.files.insert(index, photo);
        true
    }

    pub fn undo_last(&mut self) -> Option<String> {
        let token = self.history.last()?.clone();
        self.undo(&token).then(|| token.name)
    }

    pub fn last_deleted(&self) -> Option<&str> {
        self.history.last().map(|t| t.name.as_str())
    }

    /// Reorder to `new_order`. Unknown names are skipped; listed photos that
    /// `new_order` omits keep their relative order after the named ones.
    pub fn reorder<S: AsRef<str>>(&mut self, new_order: &[S]) {
        let mut remaining = std::mem::take(&mut self.files);
        let mut seen = HashSet::new();
        for name in new_order {
            let name = name.as_ref();
            if !seen.insert(name.to_string()) {
                continue;
            }
            if let Some(pos) = remaining.iter().position(|f| f.name == name) {
                self.files.push(remaining.remove(pos));
            }
        }
        self.files.append(&mut remaining);
    }

    /// Drop photos no longer present among `uploaded` names (the upload
    /// widget was cleared of them).
    pub fn retain_uploaded<S: AsRef<str>>(&mut self, uploaded: &[S]) {
        let keep: HashSet<&str> = uploaded.iter().map(|s| s.as_ref()).collect();
        self.files.retain(|f| keep.contains(f.name.as_str()));
    }

    /// Decode every photo in list order and resolve its fields against
    /// `context`. Numbering follows the list order, starting at `01`.
    pub fn build_records(
        &self,
        context: &ReportContext,
        drafts: &HashMap<String, PhotoDraft>,
    ) -> Result<Vec<PhotoRecord>, Error> {
        let now = Local::now().format("%H:%M").to_string();
        let empty = PhotoDraft::default();
        self.files
            .iter()
            .enumerate()
            .map(|(idx, file)| {
                let draft = drafts.get(&file.name).unwrap_or(&empty);
                let image = load_photo(&file.name, &file.data)?;
                Ok(resolve_record(idx, &file.name, image, draft, context, &now))
            })
            .collect()
    }
}

/// Two-digit, 1-based display number for the photo at `idx`.
pub fn photo_number(idx: usize) -> String {
    format!("{:02}", idx + 1)
}

pub(crate) fn resolve_record(
    idx: usize,
    filename: &str,
    image: image::DynamicImage,
    draft: &PhotoDraft,
    context: &ReportContext,
    default_time: &str,
) -> PhotoRecord {
    let date = draft
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| context.date.clone());
    let time = draft
        .time
        .clone()
        .unwrap_or_else(|| default_time.to_string());
    let location = if draft.location.trim().is_empty() {
        context.location.clone()
    } else {
        draft.location.clone()
    };
    let description = if draft.description.trim().is_empty() {
        &context.description
    } else {
        &draft.description
    };

    PhotoRecord {
        number: photo_number(idx),
        date,
        time,
        location,
        description: description.trim().to_string(),
        image,
        filename: filename.to_string(),
    }
}

/// Parse a `YYYY-MM-DD` date as entered on forms and manifests.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}
