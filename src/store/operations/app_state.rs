use serde::{Deserialize, Serialize};

use crate::constants::{APP_STATE_KEY, DEFAULT_CURRENT_PAGE, DEFAULT_THEME};
use crate::store::{Store, StoreError};

/// UI state persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppPreferences {
    pub theme: String,
    pub current_page: String,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            current_page: DEFAULT_CURRENT_PAGE.to_string(),
        }
    }
}

impl Store {
    pub fn load_app_preferences(&self) -> Result<AppPreferences, StoreError> {
        match self.app_state.get(APP_STATE_KEY.as_bytes())? {
            Some(raw) => match serde_json::from_slice::<AppPreferences>(&raw) {
                Ok(parsed) => Ok(parsed),
                Err(error) => {
                    tracing::warn!(error = %error, "Discarding unreadable app state");
                    Ok(AppPreferences::default())
                }
            },
            None => Ok(AppPreferences::default()),
        }
    }

    pub fn save_app_preferences(&self, preferences: &AppPreferences) -> Result<(), StoreError> {
        if preferences.theme.trim().is_empty() {
            return Err(StoreError::Validation("theme must not be empty".to_string()));
        }
        self.app_state
            .insert(APP_STATE_KEY.as_bytes(), Self::serialize(preferences)?)?;
        Ok(())
    }
}
