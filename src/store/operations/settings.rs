use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DAILY_GOAL, DEFAULT_LANGUAGE, DEFAULT_THEME};
use crate::store::table::{Collection, Record};
use crate::store::{Store, StoreError};
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub theme: String,
    pub language: String,
    pub daily_goal: u32,
    pub notifications: bool,
    pub spaced_repetition: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            id: None,
            theme: DEFAULT_THEME.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            daily_goal: DEFAULT_DAILY_GOAL,
            notifications: true,
            spaced_repetition: true,
        }
    }
}

impl Record for UserSettings {
    const COLLECTION: Collection = Collection::UserSettings;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }
}

impl UserSettings {
    pub fn validate(&self) -> Result<(), String> {
        validation::validate_id(self.id)?;
        validation::validate_non_empty("theme", &self.theme)?;
        validation::validate_non_empty("language", &self.language)?;
        Ok(())
    }
}

impl Store {
    /// The active settings row (lowest id), or defaults when none was saved.
    pub fn get_user_settings(&self) -> Result<UserSettings, StoreError> {
        Ok(self.first_record()?.unwrap_or_default())
    }

    /// Saves over the active row; a row is created only when none exists.
    pub fn save_user_settings(&self, settings: &UserSettings) -> Result<UserSettings, StoreError> {
        settings.validate().map_err(StoreError::Validation)?;
        let mut row = settings.clone();
        let _guard = self.write_guard();
        if row.id.is_none() {
            row.id = self.first_record::<UserSettings>()?.and_then(|s| s.id);
        }
        self.put_record(&row, "save_user_settings")
    }

    pub fn count_user_settings(&self) -> usize {
        self.count_records(Collection::UserSettings)
    }
}
