//! User preferences.
//!
//! [`PreferencesStore`] holds the accessibility and navigation options and
//! writes every change straight through to the [`KeyValueStore`] it was
//! constructed with. After any mutating call returns `Ok`, the in-memory value
//! and the persisted value are equal.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{EventBus, PreferenceChange};
use crate::routes::without_indices;
use crate::storage::{KeyValueStore, Value};

/// A backup payload: persisted key name to JSON value.
pub type Snapshot = BTreeMap<String, serde_json::Value>;

/// Text size used throughout the interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSize {
    /// Stored as 0.
    #[default]
    Small,
    /// Stored as 1.
    Medium,
    /// Stored as 2.
    Large,
}

impl TextSize {
    /// All sizes in stored order.
    pub const ALL: [Self; 3] = [Self::Small, Self::Medium, Self::Large];

    /// The persisted integer.
    #[must_use]
    pub fn as_int(self) -> i64 {
        match self {
            Self::Small => 0,
            Self::Medium => 1,
            Self::Large => 2,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
        }
    }
}

impl TryFrom<i64> for TextSize {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::Small),
            1 => Ok(Self::Medium),
            2 => Ok(Self::Large),
            other => Err(Error::invalid_input(
                PreferenceKey::TextSize.as_str(),
                format!("{other} is not 0, 1 or 2"),
            )),
        }
    }
}

impl FromStr for TextSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" | "0" => Ok(Self::Small),
            "medium" | "1" => Ok(Self::Medium),
            "large" | "2" => Ok(Self::Large),
            _ => Err(Error::invalid_input(
                PreferenceKey::TextSize.as_str(),
                format!("'{s}' (expected small, medium or large)"),
            )),
        }
    }
}

/// Which kind of route the user prefers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    /// Stored as 0.
    #[default]
    Shortest,
    /// Stored as 1.
    Easiest,
    /// Wheelchair accessible. Stored as 2.
    Accessible,
}

impl RouteType {
    /// All route types in stored order.
    pub const ALL: [Self; 3] = [Self::Shortest, Self::Easiest, Self::Accessible];

    /// The persisted integer.
    #[must_use]
    pub fn as_int(self) -> i64 {
        match self {
            Self::Shortest => 0,
            Self::Easiest => 1,
            Self::Accessible => 2,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Shortest => "Shortest Path",
            Self::Easiest => "Easiest Path",
            Self::Accessible => "Wheelchair Accessible",
        }
    }
}

impl TryFrom<i64> for RouteType {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::Shortest),
            1 => Ok(Self::Easiest),
            2 => Ok(Self::Accessible),
            other => Err(Error::invalid_input(
                PreferenceKey::PreferredRouteType.as_str(),
                format!("{other} is not 0, 1 or 2"),
            )),
        }
    }
}

impl FromStr for RouteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shortest" | "0" => Ok(Self::Shortest),
            "easiest" | "1" => Ok(Self::Easiest),
            "accessible" | "wheelchair" | "2" => Ok(Self::Accessible),
            _ => Err(Error::invalid_input(
                PreferenceKey::PreferredRouteType.as_str(),
                format!("'{s}' (expected shortest, easiest or accessible)"),
            )),
        }
    }
}

/// Identifies one preference field and its persisted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreferenceKey {
    /// `TextSize`
    TextSize,
    /// `HighContrastMode`
    HighContrastMode,
    /// `HapticFeedback`
    HapticFeedback,
    /// `MuteVoiceGuidance`
    MuteVoiceGuidance,
    /// `PreferredRouteType`
    PreferredRouteType,
    /// `AutoSaveRoutes`
    AutoSaveRoutes,
    /// `FrequentDestinations`
    FrequentDestinations,
    /// `UseAudioAssistance`
    UseAudioAssistance,
    /// `EnableBrailleInput`
    EnableBrailleInput,
}

impl PreferenceKey {
    /// Every preference field.
    pub const ALL: [Self; 9] = [
        Self::TextSize,
        Self::HighContrastMode,
        Self::HapticFeedback,
        Self::MuteVoiceGuidance,
        Self::PreferredRouteType,
        Self::AutoSaveRoutes,
        Self::FrequentDestinations,
        Self::UseAudioAssistance,
        Self::EnableBrailleInput,
    ];

    /// The key this field is persisted under.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextSize => "TextSize",
            Self::HighContrastMode => "HighContrastMode",
            Self::HapticFeedback => "HapticFeedback",
            Self::MuteVoiceGuidance => "MuteVoiceGuidance",
            Self::PreferredRouteType => "PreferredRouteType",
            Self::AutoSaveRoutes => "AutoSaveRoutes",
            Self::FrequentDestinations => "FrequentDestinations",
            Self::UseAudioAssistance => "UseAudioAssistance",
            Self::EnableBrailleInput => "EnableBrailleInput",
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PreferenceKey {
    type Err = Error;

    /// Accepts the persisted key (`TextSize`) or the field name
    /// (`text_size`, `text-size`), case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| Error::invalid_input("preference", format!("unknown field '{s}'")))
    }
}

/// Current values of every preference field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Interface text size.
    pub text_size: TextSize,
    /// High contrast colours.
    pub high_contrast_mode: bool,
    /// Haptic feedback on interactions.
    pub haptic_feedback: bool,
    /// Silence spoken guidance.
    pub mute_voice_guidance: bool,
    /// Preferred kind of route.
    pub preferred_route_type: RouteType,
    /// Save every started route.
    pub auto_save_routes: bool,
    /// User-managed destination labels, in insertion order.
    pub frequent_destinations: Vec<String>,
    /// Speak calibration instructions.
    pub use_audio_assistance: bool,
    /// Announce Braille screen input when editing.
    pub enable_braille_input: bool,
}

impl Preferences {
    /// The value of `key` in its persisted form.
    #[must_use]
    pub fn value_of(&self, key: PreferenceKey) -> Value {
        match key {
            PreferenceKey::TextSize => Value::Int(self.text_size.as_int()),
            PreferenceKey::HighContrastMode => Value::Bool(self.high_contrast_mode),
            PreferenceKey::HapticFeedback => Value::Bool(self.haptic_feedback),
            PreferenceKey::MuteVoiceGuidance => Value::Bool(self.mute_voice_guidance),
            PreferenceKey::PreferredRouteType => Value::Int(self.preferred_route_type.as_int()),
            PreferenceKey::AutoSaveRoutes => Value::Bool(self.auto_save_routes),
            PreferenceKey::FrequentDestinations => {
                Value::Strings(self.frequent_destinations.clone())
            }
            PreferenceKey::UseAudioAssistance => Value::Bool(self.use_audio_assistance),
            PreferenceKey::EnableBrailleInput => Value::Bool(self.enable_braille_input),
        }
    }

    /// Copy the single field `key` from `other`.
    fn copy_field(&mut self, other: &Self, key: PreferenceKey) {
        match key {
            PreferenceKey::TextSize => self.text_size = other.text_size,
            PreferenceKey::HighContrastMode => self.high_contrast_mode = other.high_contrast_mode,
            PreferenceKey::HapticFeedback => self.haptic_feedback = other.haptic_feedback,
            PreferenceKey::MuteVoiceGuidance => {
                self.mute_voice_guidance = other.mute_voice_guidance;
            }
            PreferenceKey::PreferredRouteType => {
                self.preferred_route_type = other.preferred_route_type;
            }
            PreferenceKey::AutoSaveRoutes => self.auto_save_routes = other.auto_save_routes,
            PreferenceKey::FrequentDestinations => {
                self.frequent_destinations.clone_from(&other.frequent_destinations);
            }
            PreferenceKey::UseAudioAssistance => {
                self.use_audio_assistance = other.use_audio_assistance;
            }
            PreferenceKey::EnableBrailleInput => {
                self.enable_braille_input = other.enable_braille_input;
            }
        }
    }
}

/// Write-through store for [`Preferences`].
#[derive(Debug)]
pub struct PreferencesStore {
    backend: Arc<dyn KeyValueStore>,
    values: Preferences,
    events: EventBus<PreferenceChange>,
}

impl PreferencesStore {
    /// Read every field from `backend`, using defaults for absent keys.
    ///
    /// Out-of-range enum integers load as the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Result<Self> {
        let defaults = Preferences::default();

        let text_size = load_enum(
            backend.as_ref(),
            PreferenceKey::TextSize,
            defaults.text_size,
        )?;
        let preferred_route_type = load_enum(
            backend.as_ref(),
            PreferenceKey::PreferredRouteType,
            defaults.preferred_route_type,
        )?;

        let values = Preferences {
            text_size,
            high_contrast_mode: backend.bool_or(PreferenceKey::HighContrastMode.as_str(), false)?,
            haptic_feedback: backend.bool_or(PreferenceKey::HapticFeedback.as_str(), false)?,
            mute_voice_guidance: backend
                .bool_or(PreferenceKey::MuteVoiceGuidance.as_str(), false)?,
            preferred_route_type,
            auto_save_routes: backend.bool_or(PreferenceKey::AutoSaveRoutes.as_str(), false)?,
            frequent_destinations: backend
                .strings_or(PreferenceKey::FrequentDestinations.as_str(), Vec::new())?,
            use_audio_assistance: backend
                .bool_or(PreferenceKey::UseAudioAssistance.as_str(), false)?,
            enable_braille_input: backend
                .bool_or(PreferenceKey::EnableBrailleInput.as_str(), false)?,
        };

        debug!("Loaded preferences: {:?}", values);
        Ok(Self {
            backend,
            values,
            events: EventBus::new(),
        })
    }

    /// Subscribe to field changes.
    pub fn subscribe(&self) -> Receiver<PreferenceChange> {
        self.events.subscribe()
    }

    /// All current values.
    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.values
    }

    /// Interface text size.
    #[must_use]
    pub fn text_size(&self) -> TextSize {
        self.values.text_size
    }

    /// Whether high contrast mode is on.
    #[must_use]
    pub fn high_contrast_mode(&self) -> bool {
        self.values.high_contrast_mode
    }

    /// Whether haptic feedback is on.
    #[must_use]
    pub fn haptic_feedback(&self) -> bool {
        self.values.haptic_feedback
    }

    /// Whether voice guidance is muted.
    #[must_use]
    pub fn mute_voice_guidance(&self) -> bool {
        self.values.mute_voice_guidance
    }

    /// Preferred kind of route.
    #[must_use]
    pub fn preferred_route_type(&self) -> RouteType {
        self.values.preferred_route_type
    }

    /// Whether started routes are saved automatically.
    #[must_use]
    pub fn auto_save_routes(&self) -> bool {
        self.values.auto_save_routes
    }

    /// Frequent destinations in insertion order.
    #[must_use]
    pub fn frequent_destinations(&self) -> &[String] {
        &self.values.frequent_destinations
    }

    /// Whether calibration instructions are spoken.
    #[must_use]
    pub fn use_audio_assistance(&self) -> bool {
        self.values.use_audio_assistance
    }

    /// Whether Braille input is announced.
    #[must_use]
    pub fn enable_braille_input(&self) -> bool {
        self.values.enable_braille_input
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_text_size(&mut self, value: TextSize) -> Result<()> {
        self.write(PreferenceKey::TextSize, |p| p.text_size = value)
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_high_contrast_mode(&mut self, value: bool) -> Result<()> {
        self.write(PreferenceKey::HighContrastMode, |p| {
            p.high_contrast_mode = value;
        })
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_haptic_feedback(&mut self, value: bool) -> Result<()> {
        self.write(PreferenceKey::HapticFeedback, |p| p.haptic_feedback = value)
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_mute_voice_guidance(&mut self, value: bool) -> Result<()> {
        self.write(PreferenceKey::MuteVoiceGuidance, |p| {
            p.mute_voice_guidance = value;
        })
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_preferred_route_type(&mut self, value: RouteType) -> Result<()> {
        self.write(PreferenceKey::PreferredRouteType, |p| {
            p.preferred_route_type = value;
        })
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_auto_save_routes(&mut self, value: bool) -> Result<()> {
        self.write(PreferenceKey::AutoSaveRoutes, |p| p.auto_save_routes = value)
    }

    /// Replace the whole frequent destination list.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_frequent_destinations(&mut self, value: Vec<String>) -> Result<()> {
        self.write(PreferenceKey::FrequentDestinations, |p| {
            p.frequent_destinations = value;
        })
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_use_audio_assistance(&mut self, value: bool) -> Result<()> {
        self.write(PreferenceKey::UseAudioAssistance, |p| {
            p.use_audio_assistance = value;
        })
    }

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    pub fn set_enable_braille_input(&mut self, value: bool) -> Result<()> {
        self.write(PreferenceKey::EnableBrailleInput, |p| {
            p.enable_braille_input = value;
        })
    }

    /// Append a frequent destination.
    ///
    /// The label is stored as given. An empty label is ignored and returns
    /// `Ok(false)`. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn add_frequent_destination(&mut self, label: &str) -> Result<bool> {
        if label.is_empty() {
            return Ok(false);
        }
        let mut list = self.values.frequent_destinations.clone();
        list.push(label.to_owned());
        self.set_frequent_destinations(list)?;
        Ok(true)
    }

    /// Remove the frequent destinations at `indices`, keeping the order of
    /// the rest. Out-of-range indices are ignored.
    ///
    /// Returns how many entries were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn remove_frequent_destinations(
        &mut self,
        indices: impl IntoIterator<Item = usize>,
    ) -> Result<usize> {
        let (kept, removed) = without_indices(&self.values.frequent_destinations, indices);
        if removed > 0 {
            self.set_frequent_destinations(kept)?;
        }
        Ok(removed)
    }

    /// Parse `raw` for `key` and store it.
    ///
    /// Booleans accept `true/false`, `on/off`, `yes/no`, `1/0`; enums accept
    /// their name or stored integer; destinations are comma separated.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` cannot be parsed or persisted.
    pub fn set_parsed(&mut self, key: PreferenceKey, raw: &str) -> Result<()> {
        match key {
            PreferenceKey::TextSize => self.set_text_size(raw.parse()?),
            PreferenceKey::PreferredRouteType => self.set_preferred_route_type(raw.parse()?),
            PreferenceKey::FrequentDestinations => self.set_frequent_destinations(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            PreferenceKey::HighContrastMode
            | PreferenceKey::HapticFeedback
            | PreferenceKey::MuteVoiceGuidance
            | PreferenceKey::AutoSaveRoutes
            | PreferenceKey::UseAudioAssistance
            | PreferenceKey::EnableBrailleInput => {
                let value = parse_bool(key, raw)?;
                self.write(key, |p| set_flag(p, key, value))
            }
        }
    }

    /// Snapshot every field as a generic key → value record.
    #[must_use]
    pub fn backup(&self) -> Snapshot {
        PreferenceKey::ALL
            .into_iter()
            .map(|key| (key.as_str().to_string(), to_json(&self.values.value_of(key))))
            .collect()
    }

    /// Merge `snapshot` into the store.
    ///
    /// Each known key holding a value of the expected type overwrites its
    /// field (persisting and notifying as a setter would). Unknown keys,
    /// absent keys, mistyped values and out-of-range enum integers are
    /// skipped. Returns the number of fields applied.
    ///
    /// # Errors
    ///
    /// Returns an error only if a write to the backend fails.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<usize> {
        let mut applied = 0;

        for key in PreferenceKey::ALL {
            let Some(raw) = snapshot.get(key.as_str()) else {
                continue;
            };
            let Some(update) = restored_field(key, raw) else {
                debug!("Skipping mistyped backup entry {}: {}", key, raw);
                continue;
            };
            self.write(key, |p| p.copy_field(&update, key))?;
            applied += 1;
        }

        info!(
            "Restored {} preference field(s), ignored {} unknown key(s)",
            applied,
            unknown_keys(snapshot)
        );
        Ok(applied)
    }

    /// Remove every preference key from the backend and reset every field to
    /// its default, notifying subscribers for each field.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be removed. Fields cleared before the
    /// failure stay cleared, in memory and in the backend.
    pub fn clear_all_data(&mut self) -> Result<()> {
        let defaults = Preferences::default();
        for key in PreferenceKey::ALL {
            self.backend.remove(key.as_str())?;
            self.values.copy_field(&defaults, key);
            self.events.emit(&PreferenceChange { key });
        }
        info!("Cleared all preference data");
        Ok(())
    }

    /// Persist `key`, then apply `update` in memory, then notify.
    ///
    /// The new value is computed on a scratch copy so a failed write leaves
    /// memory untouched.
    fn write(&mut self, key: PreferenceKey, update: impl FnOnce(&mut Preferences)) -> Result<()> {
        let mut next = self.values.clone();
        update(&mut next);
        let value = next.value_of(key);

        self.backend.set(key.as_str(), &value)?;
        self.values.copy_field(&next, key);
        debug!("Set {} = {:?}", key, value);
        self.events.emit(&PreferenceChange { key });
        Ok(())
    }
}

fn load_enum<T>(backend: &dyn KeyValueStore, key: PreferenceKey, default: T) -> Result<T>
where
    T: TryFrom<i64, Error = Error> + Copy,
{
    let Some(raw) = backend
        .get_or_discard(key.as_str())?
        .and_then(|v| v.as_int())
    else {
        return Ok(default);
    };
    match T::try_from(raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Ignoring persisted {}: {}", key, e);
            Ok(default)
        }
    }
}

fn parse_bool(key: PreferenceKey, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(Error::invalid_input(
            key.as_str(),
            format!("'{raw}' is not a boolean"),
        )),
    }
}

fn set_flag(p: &mut Preferences, key: PreferenceKey, value: bool) {
    match key {
        PreferenceKey::HighContrastMode => p.high_contrast_mode = value,
        PreferenceKey::HapticFeedback => p.haptic_feedback = value,
        PreferenceKey::MuteVoiceGuidance => p.mute_voice_guidance = value,
        PreferenceKey::AutoSaveRoutes => p.auto_save_routes = value,
        PreferenceKey::UseAudioAssistance => p.use_audio_assistance = value,
        PreferenceKey::EnableBrailleInput => p.enable_braille_input = value,
        PreferenceKey::TextSize
        | PreferenceKey::PreferredRouteType
        | PreferenceKey::FrequentDestinations => {}
    }
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::from(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Strings(s) => serde_json::Value::from(s.clone()),
        Value::Data(d) => serde_json::Value::from(d.clone()),
    }
}

/// A `Preferences` carrying the restored value of `key`, or `None` when
/// `raw` is not of the type `key` expects.
/// Entries in `snapshot` whose key is not a persisted preference key.
fn unknown_keys(snapshot: &Snapshot) -> usize {
    snapshot
        .keys()
        .filter(|k| !PreferenceKey::ALL.iter().any(|key| key.as_str() == k.as_str()))
        .count()
}

fn restored_field(key: PreferenceKey, raw: &serde_json::Value) -> Option<Preferences> {
    let mut p = Preferences::default();
    match key {
        PreferenceKey::TextSize => {
            p.text_size = TextSize::try_from(raw.as_i64()?).ok()?;
        }
        PreferenceKey::PreferredRouteType => {
            p.preferred_route_type = RouteType::try_from(raw.as_i64()?).ok()?;
        }
        PreferenceKey::FrequentDestinations => {
            p.frequent_destinations = raw
                .as_array()?
                .iter()
                .map(|v| v.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()?;
        }
        PreferenceKey::HighContrastMode
        | PreferenceKey::HapticFeedback
        | PreferenceKey::MuteVoiceGuidance
        | PreferenceKey::AutoSaveRoutes
        | PreferenceKey::UseAudioAssistance
        | PreferenceKey::EnableBrailleInput => set_flag(&mut p, key, raw.as_bool()?),
    }
    Some(p)
}
