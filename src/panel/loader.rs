use std::collections::HashMap;
use std::fs;
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use log::info;

use crate::config::PanelSettings;
use crate::domain::{ItemId, Respondent};
use crate::errors::DataLoadError;
use crate::panel::likert::decode_likert;

/// The fixed pool of respondents used as the comparison base, loaded once
/// from the survey export and immutable thereafter.
///
/// The export is a CSV table: the header row names each column after its
/// survey question ("Q12_1"), the first data row carries the question
/// prompt text, and every following row is one panel respondent. Question
/// numbers below the demographic cutoff are preference items; the rest are
/// demographics and excluded from the rating vocabulary.
#[derive(Debug)]
pub struct PanelRepository {
    respondents: Vec<Respondent>,
    item_ids: Vec<ItemId>,
    prompts: HashMap<ItemId, String>,
}

impl PanelRepository {
    /// Load the panel from an ISO-8859-1 encoded CSV file.
    pub fn load(path: impl AsRef<Path>, settings: &PanelSettings) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (text, _, _) = WINDOWS_1252.decode(&bytes);
        let panel = Self::from_csv(text.as_ref(), settings)?;
        info!(
            "Loaded panel from {}: {} respondents, {} preference items",
            path.display(),
            panel.len(),
            panel.item_ids.len()
        );
        Ok(panel)
    }

    /// Build the panel from already-decoded CSV text.
    pub fn from_csv(text: &str, settings: &PanelSettings) -> Result<Self, DataLoadError> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let mut item_columns: Vec<(usize, ItemId)> = Vec::new();
        for (idx, name) in headers.iter().enumerate() {
            if is_preference_item(name, settings.demographic_cutoff) {
                item_columns.push((idx, name.to_string()));
            }
        }
        if item_columns.is_empty() {
            return Err(DataLoadError::NoPreferenceColumns);
        }

        let mut records = reader.records();

        // The first data row is the prompt text row, not a respondent.
        let prompt_row = match records.next() {
            Some(row) => row?,
            None => return Err(DataLoadError::NoRespondents),
        };
        let mut prompts = HashMap::new();
        for (idx, item) in &item_columns {
            if let Some(text) = prompt_row.get(*idx) {
                prompts.insert(item.clone(), text.to_string());
            }
        }

        let mut respondents = Vec::new();
        let mut skipped = 0;
        for (offset, row) in records.enumerate() {
            let row = row?;
            let row_id = (offset + 1) as u32;
            if settings.excluded_respondents.contains(&row_id) {
                skipped += 1;
                continue;
            }

            let mut respondent = Respondent::panel(row_id);
            for (idx, item) in &item_columns {
                // Unresolved cell text leaves the item absent, by design.
                if let Some(rating) = row.get(*idx).and_then(decode_likert) {
                    respondent.add_rating(item.clone(), rating);
                }
            }
            respondents.push(respondent);
        }
        if respondents.is_empty() {
            return Err(DataLoadError::NoRespondents);
        }
        if skipped > 0 {
            info!("Excluded {} known-corrupt respondent rows", skipped);
        }

        Ok(Self {
            respondents,
            item_ids: item_columns.into_iter().map(|(_, item)| item).collect(),
            prompts,
        })
    }

    /// Build a panel directly from pre-parsed respondents. The item
    /// vocabulary is the union of their rated items, in first-seen order;
    /// no prompt text is available on this path.
    pub fn from_respondents(respondents: Vec<Respondent>) -> Self {
        let mut item_ids: Vec<ItemId> = Vec::new();
        for respondent in &respondents {
            for item in respondent.items() {
                if !item_ids.contains(item) {
                    item_ids.push(item.clone());
                }
            }
        }
        Self {
            respondents,
            item_ids,
            prompts: HashMap::new(),
        }
    }

    pub fn respondents(&self) -> &[Respondent] {
        &self.respondents
    }

    /// Fetch a panel respondent by position, for demonstration and tests.
    pub fn respondent_at(&self, position: usize) -> Option<&Respondent> {
        self.respondents.get(position)
    }

    /// All preference item ids, in column order.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Question prompt text for an item, as carried in the export.
    pub fn prompt(&self, item: &str) -> Option<&str> {
        self.prompts.get(item).map(String::as_str)
    }

    /// Respondents who have a rating for the given item. Used to restrict
    /// the comparison pool when the target item is known in advance.
    pub fn valid_respondents_for(&self, item: &str) -> Vec<&Respondent> {
        self.respondents
            .iter()
            .filter(|r| r.has_rating(item))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.respondents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.respondents.is_empty()
    }
}

/// Preference columns are those whose question number parses and falls
/// below the demographic cutoff.
fn is_preference_item(column: &str, cutoff: u32) -> bool {
    let token = column.split('_').next().unwrap_or(column);
    token
        .replace('Q', "")
        .parse::<u32>()
        .map(|number| number < cutoff)
        .unwrap_or(false)
}
