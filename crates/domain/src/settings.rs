use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_CONFIGURATION: &str = "configuration";
pub const KEY_DISABLE_CHECK_UPDATE: &str = "disableCheckUpdate";

/// User-editable options shared with controllers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Desired running state of the proxy, restored at service start.
    #[serde(default)]
    pub enabled: bool,

    /// Upstream DoH configuration identifier, used as the upstream path.
    #[serde(default)]
    pub configuration: String,

    #[serde(default)]
    pub disable_check_update: bool,
}

/// Typed view of a `settings` payload: only the keys the controller sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub configuration: Option<String>,
    pub disable_check_update: Option<bool>,
}

impl SettingsPatch {
    /// Keys match case-insensitively; unknown keys and ill-typed values are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut patch = SettingsPatch::default();
        for (key, value) in map {
            if key.eq_ignore_ascii_case(KEY_ENABLED) {
                patch.enabled = value.as_bool().or(patch.enabled);
            } else if key.eq_ignore_ascii_case(KEY_CONFIGURATION) {
                if let Some(s) = value.as_str() {
                    patch.configuration = Some(s.trim().to_string());
                }
            } else if key.eq_ignore_ascii_case(KEY_DISABLE_CHECK_UPDATE) {
                patch.disable_check_update = value.as_bool().or(patch.disable_check_update);
            }
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.configuration.is_none() && self.disable_check_update.is_none()
    }
}

impl Settings {
    /// Decodes a controller payload; missing keys take their default value.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut settings = Settings::default();
        settings.merge_map(map);
        settings
    }

    /// Overlays the keys present in `map` onto `self`.
    pub fn merge_map(&mut self, map: &Map<String, Value>) {
        self.apply(&SettingsPatch::from_map(map));
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(ref configuration) = patch.configuration {
            self.configuration = configuration.clone();
        }
        if let Some(disable) = patch.disable_check_update {
            self.disable_check_update = disable;
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(KEY_ENABLED.to_string(), Value::Bool(self.enabled));
        map.insert(
            KEY_CONFIGURATION.to_string(),
            Value::String(self.configuration.clone()),
        );
        map.insert(
            KEY_DISABLE_CHECK_UPDATE.to_string(),
            Value::Bool(self.disable_check_update),
        );
        map
    }
}
