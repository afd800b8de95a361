use regex::{Regex, RegexBuilder};

use crate::model::{LayoutStyle, PhotoRecord, ReportContext, SlotValue};

pub const KEY_SUBJECT: &str = "案由";
pub const KEY_MAKER: &str = "製作人";
pub const KEY_DATE: &str = "日期";
pub const KEY_TIME: &str = "時間";
pub const KEY_LOCATION: &str = "地點";
pub const KEY_NUMBER: &str = "編號";
pub const KEY_DESCRIPTION: &str = "說明";
pub const KEY_PICTURE: &str = "圖片";

/// A bracketed placeholder such as `[圖片 2]` and its compiled matcher.
/// Brackets are literal; matching ignores case.
#[derive(Clone, Debug)]
pub struct Placeholder {
    token: String,
    matcher: Regex,
}

impl Placeholder {
    pub fn new(key: &str) -> Self {
        let token = format!("[{key}]");
        let matcher = RegexBuilder::new(&regex::escape(&token))
            .case_insensitive(true)
            .build()
            .expect("escaped literal is always a valid pattern");
        Self { token, matcher }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_found_in(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    pub fn replace_in(&self, text: &str, with: &str) -> String {
        self.matcher
            .replace_all(text, regex::NoExpand(with))
            .into_owned()
    }
}

/// Ordered placeholder → value mapping for one table. Re-inserting a token
/// replaces its value but keeps its original position.
#[derive(Clone, Debug, Default)]
pub struct TokenMap<'a> {
    entries: Vec<(Placeholder, SlotValue<'a>)>,
}

impl<'a> TokenMap<'a> {
    pub fn insert(&mut self, key: &str, value: SlotValue<'a>) {
        let placeholder = Placeholder::new(key);
        match self
            .entries
            .iter_mut()
            .find(|(p, _)| p.token == placeholder.token)
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((placeholder, value)),
        }
    }

    pub fn get(&self, token: &str) -> Option<&SlotValue<'a>> {
        self.entries
            .iter()
            .find(|(p, _)| p.token == token)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Placeholder, SlotValue<'a>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the mapping for one batch of consecutive photos.
///
/// Layouts with more than one photo per table suffix every per-photo key
/// with its 1-based position (`[日期 2]`) and map the bare `[日期]` to the
/// report date.
pub fn resolve<'a>(
    context: &ReportContext,
    batch: &'a [PhotoRecord],
    style: &LayoutStyle,
) -> TokenMap<'a> {
    let mut map = TokenMap::default();
    map.insert(KEY_SUBJECT, SlotValue::Text(context.subject.clone()));
    map.insert(KEY_MAKER, SlotValue::Text(context.maker.clone()));
    if style.uses_suffix() {
        map.insert(KEY_DATE, SlotValue::Text(context.date.clone()));
    }

    for (idx, photo) in batch.iter().enumerate() {
        let suffix = if style.uses_suffix() {
            format!(" {}", idx + 1)
        } else {
            String::new()
        };
        let text_fields = [
            (KEY_DATE, &photo.date),
            (KEY_TIME, &photo.time),
            (KEY_LOCATION, &photo.location),
            (KEY_NUMBER, &photo.number),
            (KEY_DESCRIPTION, &photo.description),
        ];
        for (key, value) in text_fields {
            map.insert(&format!("{key}{suffix}"), SlotValue::Text(value.clone()));
        }
        map.insert(
            &format!("{KEY_PICTURE}{suffix}"),
            SlotValue::Picture {
                image: &photo.image,
                filename: &photo.filename,
            },
        );
    }
    map
}
