//! Settings business logic - The fixed configuration schema and its persistence.
//!
//! Settings are stored as opaque strings in the `settings` table, but every key
//! the autoresponder interprets is listed in [`SettingKey`]. Values written by
//! operator commands are validated against the typed enums in this module before
//! they ever reach the store, and values read back are parsed leniently with
//! documented fallbacks.

use crate::{
    entities::{Setting, setting},
    errors::Result,
};
use chrono::{DateTime, Duration, Local, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::OnConflict};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Reply body written by a fresh install or `/confirmreset`.
pub const DEFAULT_MESSAGE: &str = "I'm on vacation right now and don't check my messages regularly. If it's important, please call me.";

/// Reply body used when `default_message` is unset or empty.
pub const FALLBACK_MESSAGE: &str = "This is an automated response.";

/// Keys of the configuration schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// Master on/off switch (`"true"` / `"false"`)
    Enabled,
    /// Body of the automatic reply
    DefaultMessage,
    /// Pre-send delay in seconds. Stored only.
    ResponseDelay,
    /// Cool-down symbol, see [`ResponseFrequency`]
    ResponseFrequency,
    /// Audience filter, see [`AudienceFilter`]
    MessageTypes,
    /// Last scheduled activation instant, informational
    ActivationFrom,
    /// Last scheduled deactivation instant, informational
    ActivationUntil,
}

impl SettingKey {
    /// Every known key, in display order.
    pub const ALL: [Self; 7] = [
        Self::Enabled,
        Self::DefaultMessage,
        Self::ResponseDelay,
        Self::ResponseFrequency,
        Self::MessageTypes,
        Self::ActivationFrom,
        Self::ActivationUntil,
    ];

    /// Column value used in the `settings` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::DefaultMessage => "default_message",
            Self::ResponseDelay => "response_delay",
            Self::ResponseFrequency => "response_frequency",
            Self::MessageTypes => "message_types",
            Self::ActivationFrom => "activation_from",
            Self::ActivationUntil => "activation_until",
        }
    }

    /// Built-in default restored by `/confirmreset`.
    #[must_use]
    pub const fn default_value(self) -> &'static str {
        match self {
            Self::Enabled => "false",
            Self::DefaultMessage => DEFAULT_MESSAGE,
            Self::ResponseDelay => "0",
            Self::ResponseFrequency => ResponseFrequency::Weekly.as_str(),
            Self::MessageTypes => AudienceFilter::Personal.as_str(),
            Self::ActivationFrom | Self::ActivationUntil => "",
        }
    }

    /// Looks up a key by its stored name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic rate limits accepted by `/setfrequency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFrequency {
    /// Reply to every qualifying message
    EveryMessage,
    /// At most once per conversation per day
    Daily,
    /// At most once per conversation per week
    Weekly,
    /// At most once per conversation per 30 days
    Monthly,
}

impl ResponseFrequency {
    /// All accepted values, in the order shown to the operator.
    pub const ALL: [Self; 4] = [Self::EveryMessage, Self::Daily, Self::Weekly, Self::Monthly];

    /// Stored and displayed form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EveryMessage => "every message",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Parses a symbol, ignoring case and collapsing inner whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == normalized)
    }

    /// Minimum time between two automatic replies to the same conversation.
    #[must_use]
    pub fn cool_down(self) -> Duration {
        match self {
            Self::EveryMessage => Duration::zero(),
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::days(7),
            Self::Monthly => Duration::days(30),
        }
    }
}

/// Kind of conversation an incoming message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    /// One-to-one conversation
    Personal,
    /// Group or channel conversation
    Group,
}

/// Which conversation kinds are eligible for automatic replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceFilter {
    /// Personal conversations only
    Personal,
    /// Group conversations only
    Group,
    /// Both
    All,
}

impl AudienceFilter {
    /// Stored and displayed form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Group => "group",
            Self::All => "all",
        }
    }

    /// Strict parse used to validate `/types` arguments.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "group" => Some(Self::Group),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// Lenient parse of a stored value; anything unrecognized means personal only.
    #[must_use]
    pub fn from_setting(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::Personal)
    }

    /// Whether a conversation of `kind` passes this filter.
    #[must_use]
    pub const fn allows(self, kind: ConversationKind) -> bool {
        matches!(
            (self, kind),
            (Self::All, _)
                | (Self::Personal, ConversationKind::Personal)
                | (Self::Group, ConversationKind::Group)
        )
    }
}

/// Typed snapshot of everything the policy evaluator reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySettings {
    /// Whether the autoresponder is switched on
    pub enabled: bool,
    /// Reply body
    pub default_message: String,
    /// Minimum gap between replies to one conversation
    pub cool_down: Duration,
    /// Eligible conversation kinds
    pub audience: AudienceFilter,
}

impl PolicySettings {
    /// Builds a snapshot from raw `key -> value` pairs, applying fallbacks:
    /// missing `enabled` means off, a missing or empty message uses
    /// [`FALLBACK_MESSAGE`], an unknown frequency means seven days.
    #[must_use]
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let get = |key: SettingKey| values.get(key.as_str()).map(String::as_str);

        let default_message = get(SettingKey::DefaultMessage)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();

        Self {
            enabled: get(SettingKey::Enabled).is_some_and(|v| v.trim() == "true"),
            default_message,
            cool_down: get(SettingKey::ResponseFrequency)
                .and_then(ResponseFrequency::parse)
                .unwrap_or(ResponseFrequency::Weekly)
                .cool_down(),
            audience: AudienceFilter::from_setting(get(SettingKey::MessageTypes)),
        }
    }
}

/// Renders an instant in local time, as stored in the activation window
/// settings and shown in operator replies.
#[must_use]
pub fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M %:z")
        .to_string()
}

/// Reads a single setting; `Ok(None)` when the key has never been written.
pub async fn get_setting<C>(db: &C, key: SettingKey) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let value = Setting::find_by_id(key.as_str().to_string())
        .one(db)
        .await?
        .map(|model| model.value);
    debug!("Setting {} = {:?}", key, value);
    Ok(value)
}

/// Inserts or replaces a setting value in one statement.
pub async fn set_setting<C>(db: &C, key: SettingKey, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let model = setting::ActiveModel {
        key: Set(key.as_str().to_string()),
        value: Set(value.to_string()),
        updated_at: Set(Utc::now()),
    };

    Setting::insert(model)
        .on_conflict(
            OnConflict::column(setting::Column::Key)
                .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    info!("Set setting: {} = {}", key, value);
    Ok(())
}

/// Returns every stored setting, known or not, ordered by key.
pub async fn get_all_settings<C>(db: &C) -> Result<Vec<setting::Model>>
where
    C: ConnectionTrait,
{
    Setting::find()
        .order_by_asc(setting::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads the typed snapshot the policy evaluator needs.
pub async fn load_policy_settings<C>(db: &C) -> Result<PolicySettings>
where
    C: ConnectionTrait,
{
    let values: HashMap<String, String> = get_all_settings(db)
        .await?
        .into_iter()
        .map(|model| (model.key, model.value))
        .collect();
    Ok(PolicySettings::from_values(&values))
}

/// Overwrites every known key with its built-in default inside one transaction.
/// Unknown keys are left alone.
pub async fn reset_to_defaults<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    for key in SettingKey::ALL {
        set_setting(&txn, key, key.default_value()).await?;
    }
    txn.commit().await?;
    info!("All settings have been reset to default values.");
    Ok(())
}

/// Writes the defaults when the settings table is empty (first boot).
///
/// Returns `true` if defaults were written.
pub async fn ensure_defaults<C>(db: &C) -> Result<bool>
where
    C: ConnectionTrait + TransactionTrait,
{
    if Setting::find().count(db).await? > 0 {
        return Ok(false);
    }
    reset_to_defaults(db).await?;
    info!("Settings table was empty. Default settings have been initialized.");
    Ok(true)
}
