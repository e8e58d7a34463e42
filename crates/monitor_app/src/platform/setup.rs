use monitor_core::{update, MonitorState, Msg};
use monitor_engine::{complete_setup, Settings, SettingsStore};
use monitor_logging::{monitor_info, monitor_warn};

use super::effects::EffectRunner;
use super::ui::console::Console;

/// Values given on the command line; `None` keeps what is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub ocr: Option<bool>,
    pub api_key: Option<String>,
}

impl SettingsOverrides {
    fn apply(&self, settings: Settings) -> Settings {
        Settings {
            openai_model: self.model.clone().unwrap_or(settings.openai_model),
            openai_base_url: self.base_url.clone().unwrap_or(settings.openai_base_url),
            ocr_enabled: self.ocr.unwrap_or(settings.ocr_enabled),
            first_launch: settings.first_launch,
        }
    }
}

/// Validates and saves settings, leaving first launch behind. Returns whether the save succeeded.
pub fn run_setup(
    store: &dyn SettingsStore,
    overrides: &SettingsOverrides,
    console: &mut Console,
) -> bool {
    let mut runner = EffectRunner::detached();
    let mut state = MonitorState::new();
    let mut step = |state: MonitorState, msg: Msg, console: &mut Console| {
        let (state, effects) = update(state, msg);
        runner.run(effects, console);
        state
    };

    let current = match store.load_settings() {
        Ok(settings) => {
            state = step(
                state,
                Msg::SettingsLoaded {
                    first_launch: settings.first_launch,
                },
                console,
            );
            settings
        }
        Err(err) => {
            monitor_warn!("Starting from default settings: {}", err);
            state = step(state, Msg::SettingsLoadFailed(err.to_string()), console);
            Settings::default()
        }
    };

    let api_key = match &overrides.api_key {
        Some(key) => key.clone(),
        None => store.load_api_key().ok().flatten().unwrap_or_default(),
    };

    match complete_setup(store, overrides.apply(current), &api_key) {
        Ok(saved) => {
            monitor_info!(
                "Settings saved: model={} base_url={} ocr={}",
                saved.openai_model,
                saved.openai_base_url,
                saved.ocr_enabled
            );
            step(state, Msg::SettingsSaved, console);
            true
        }
        Err(err) => {
            step(state, Msg::SettingsSaveFailed(err.to_string()), console);
            false
        }
    }
}

/// Renders stored settings with the API key masked.
pub fn describe_settings(settings: &Settings, api_key: Option<&str>) -> Vec<String> {
    let key = match api_key {
        Some(key) => mask_key(key),
        None => "(not set)".to_string(),
    };
    vec![
        format!("openai_model    = {}", settings.openai_model),
        format!("openai_base_url = {}", settings.openai_base_url),
        format!("ocr_enabled     = {}", settings.ocr_enabled),
        format!("first_launch    = {}", settings.first_launch),
        format!("api_key         = {key}"),
    ]
}

fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(3).collect();
    format!("{visible}****")
}
