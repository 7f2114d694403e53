//! Command interpreter - The operator's text command language.
//!
//! Parsing and execution are split: [`parse_command`] turns text into a
//! validated [`Command`] through the static [`COMMANDS`] table, and
//! [`CommandInterpreter::execute`] applies it to the configuration store,
//! ledger and scheduler. [`CommandInterpreter::interpret`] combines both and
//! always produces a reply string, turning every error into operator-facing text.

use crate::{
    core::{
        ledger,
        scheduler::{ActivationScheduler, ScheduleOutcome, TransitionKind},
        settings::{AudienceFilter, ResponseFrequency, SettingKey, format_local},
        store::ConfigStore,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{error, info};

/// Naive date/time layouts accepted by `/activate`, interpreted in local time.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// A parsed and validated operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/autoresponder on|off`
    Autoresponder {
        /// Requested state
        enabled: bool,
    },
    /// `/activate from <date/time>`
    ActivateFrom(DateTime<Utc>),
    /// `/activate until <date/time>`
    ActivateUntil(DateTime<Utc>),
    /// `/activate reset`
    ActivateReset,
    /// `/setmessage <message>`
    SetMessage(String),
    /// `/settemplate <name>:<message>`
    SetTemplate {
        /// Template name
        name: String,
        /// Template body
        message: String,
    },
    /// `/usetemplate <name>`
    UseTemplate(String),
    /// `/listtemplates`
    ListTemplates,
    /// `/deletetemplate <name>`
    DeleteTemplate(String),
    /// `/setdelay <seconds>`
    SetDelay(u64),
    /// `/setfrequency <limit>`
    SetFrequency(ResponseFrequency),
    /// `/types personal|group|all`
    Types(AudienceFilter),
    /// `/stats`
    Stats,
    /// `/showconfig`
    ShowConfig,
    /// `/reset`
    Reset,
    /// `/confirmreset`
    ConfirmReset,
    /// `/help`
    Help,
}

/// One row of the command table.
pub struct CommandEntry {
    /// Command name without the leading slash
    pub name: &'static str,
    /// Usage lines shown by `/help`
    pub usage: &'static [&'static str],
    /// One-line description shown by `/help`
    pub summary: &'static str,
    /// Validates the argument text and builds the command
    pub parse: fn(&str) -> Result<Command>,
}

/// Every command the interpreter understands, in `/help` order.
pub static COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "autoresponder",
        usage: &["/autoresponder on|off"],
        summary: "Turn automatic replies on or off",
        parse: parse_autoresponder,
    },
    CommandEntry {
        name: "activate",
        usage: &[
            "/activate from <date/time>",
            "/activate until <date/time>",
            "/activate reset",
        ],
        summary: "Schedule when replies switch on or off, or clear the schedule",
        parse: parse_activate,
    },
    CommandEntry {
        name: "setmessage",
        usage: &["/setmessage <message>"],
        summary: "Set the reply text",
        parse: parse_set_message,
    },
    CommandEntry {
        name: "settemplate",
        usage: &["/settemplate <name>:<message>"],
        summary: "Save a named reply template",
        parse: parse_set_template,
    },
    CommandEntry {
        name: "usetemplate",
        usage: &["/usetemplate <name>"],
        summary: "Use a saved template as the reply text",
        parse: |args| required_arg("usetemplate", "a template name", args).map(Command::UseTemplate),
    },
    CommandEntry {
        name: "listtemplates",
        usage: &["/listtemplates"],
        summary: "List saved templates",
        parse: |args| no_args("listtemplates", args, Command::ListTemplates),
    },
    CommandEntry {
        name: "deletetemplate",
        usage: &["/deletetemplate <name>"],
        summary: "Delete a saved template",
        parse: |args| {
            required_arg("deletetemplate", "a template name", args).map(Command::DeleteTemplate)
        },
    },
    CommandEntry {
        name: "setdelay",
        usage: &["/setdelay <seconds>"],
        summary: "Set the response delay",
        parse: parse_set_delay,
    },
    CommandEntry {
        name: "setfrequency",
        usage: &["/setfrequency every message|daily|weekly|monthly"],
        summary: "Set how often one conversation can get a reply",
        parse: parse_set_frequency,
    },
    CommandEntry {
        name: "types",
        usage: &["/types personal|group|all"],
        summary: "Choose which conversations get replies",
        parse: parse_types,
    },
    CommandEntry {
        name: "stats",
        usage: &["/stats"],
        summary: "Show reply statistics",
        parse: |args| no_args("stats", args, Command::Stats),
    },
    CommandEntry {
        name: "showconfig",
        usage: &["/showconfig"],
        summary: "Show the current configuration",
        parse: |args| no_args("showconfig", args, Command::ShowConfig),
    },
    CommandEntry {
        name: "reset",
        usage: &["/reset"],
        summary: "Reset all settings (asks for confirmation)",
        parse: |args| no_args("reset", args, Command::Reset),
    },
    CommandEntry {
        name: "confirmreset",
        usage: &["/confirmreset"],
        summary: "Confirm a settings reset",
        parse: |args| no_args("confirmreset", args, Command::ConfirmReset),
    },
    CommandEntry {
        name: "help",
        usage: &["/help"],
        summary: "Show this help",
        parse: |_| Ok(Command::Help),
    },
];

/// Splits `text` into a command name and its argument text, then dispatches
/// through [`COMMANDS`]. A leading `/` on the name is optional.
pub fn parse_command(text: &str) -> Result<Command> {
    let text = text.trim();
    let (name, args) = text
        .split_once(char::is_whitespace)
        .map_or((text, ""), |(name, args)| (name, args.trim()));
    let name = name.strip_prefix('/').unwrap_or(name).to_lowercase();

    let entry = COMMANDS
        .iter()
        .find(|entry| entry.name == name)
        .ok_or(Error::UnknownCommand { name })?;
    (entry.parse)(args)
}

fn no_args(name: &str, args: &str, command: Command) -> Result<Command> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(Error::malformed(format!("/{name} takes no arguments.")))
    }
}

fn required_arg(name: &str, what: &str, args: &str) -> Result<String> {
    if args.is_empty() {
        Err(Error::malformed(format!("/{name} needs {what}.")))
    } else {
        Ok(args.to_string())
    }
}

fn parse_autoresponder(args: &str) -> Result<Command> {
    match args.to_lowercase().as_str() {
        "on" => Ok(Command::Autoresponder { enabled: true }),
        "off" => Ok(Command::Autoresponder { enabled: false }),
        _ => Err(Error::malformed("Usage: /autoresponder on|off")),
    }
}

fn parse_activate(args: &str) -> Result<Command> {
    let (sub, rest) = args
        .split_once(char::is_whitespace)
        .map_or((args, ""), |(sub, rest)| (sub, rest.trim()));
    match sub.to_lowercase().as_str() {
        "from" => parse_datetime(rest).map(Command::ActivateFrom),
        "until" => parse_datetime(rest).map(Command::ActivateUntil),
        "reset" if rest.is_empty() => Ok(Command::ActivateReset),
        _ => Err(Error::malformed(
            "Usage: /activate from <date/time>, /activate until <date/time> or /activate reset",
        )),
    }
}

fn parse_set_message(args: &str) -> Result<Command> {
    required_arg("setmessage", "a message", args).map(Command::SetMessage)
}

fn parse_set_template(args: &str) -> Result<Command> {
    let Some((name, message)) = args.split_once(':') else {
        return Err(Error::malformed("Usage: /settemplate <name>:<message>"));
    };
    let (name, message) = (name.trim(), message.trim());
    if name.is_empty() || message.is_empty() {
        return Err(Error::malformed(
            "Both a template name and a message are required: /settemplate <name>:<message>",
        ));
    }
    Ok(Command::SetTemplate {
        name: name.to_string(),
        message: message.to_string(),
    })
}

fn parse_set_delay(args: &str) -> Result<Command> {
    args.parse::<u64>()
        .map(Command::SetDelay)
        .map_err(|_| Error::malformed("Delay must be a non-negative whole number of seconds."))
}

fn parse_set_frequency(args: &str) -> Result<Command> {
    ResponseFrequency::parse(args)
        .map(Command::SetFrequency)
        .ok_or_else(|| {
            Error::malformed("Invalid frequency. Use 'every message', 'daily', 'weekly', or 'monthly'.")
        })
}

fn parse_types(args: &str) -> Result<Command> {
    AudienceFilter::parse(args)
        .map(Command::Types)
        .ok_or_else(|| Error::malformed("Usage: /types personal|group|all"))
}

/// Parses `/activate` instants: RFC 3339 with an explicit offset, or
/// `YYYY-MM-DD HH:MM[:SS]` (space or `T` separated) in the host's local time.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| {
                    Error::malformed(format!("{raw} does not exist in the local time zone."))
                });
        }
    }
    Err(Error::malformed("Invalid date/time format. Use YYYY-MM-DD HH:MM."))
}

/// Static `/help` text generated from [`COMMANDS`].
#[must_use]
pub fn help_text() -> String {
    let mut text = String::from("**Autoresponder Help**\nAvailable commands:\n");
    for entry in COMMANDS {
        writeln!(text, "• {}: {}", entry.usage.join(", "), entry.summary).ok();
    }
    text.push_str("\nDate/time format: YYYY-MM-DD HH:MM (local time) or RFC 3339.");
    text
}

/// Turns a failed command into the text shown to the operator. Store and
/// other internal failures are logged and replaced with a generic message.
#[must_use]
pub fn render_error(error: &Error) -> String {
    match error {
        Error::MalformedCommand { message } => format!("⚠️ {message}"),
        Error::UnknownCommand { .. } => {
            "❓ Unknown command. Enter /help to see available commands.".to_string()
        }
        Error::TemplateNotFound { name } => format!("❌ Template '{name}' not found."),
        other => {
            error!("Command failed: {}", other);
            "❌ An error occurred while processing your command.".to_string()
        }
    }
}

/// Executes operator commands against the store, ledger and scheduler.
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    store: ConfigStore,
    scheduler: Arc<ActivationScheduler>,
}

impl CommandInterpreter {
    /// Creates an interpreter over the given components.
    #[must_use]
    pub const fn new(store: ConfigStore, scheduler: Arc<ActivationScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Parses and executes `text`, always returning a reply.
    pub async fn interpret(&self, text: &str) -> String {
        let result = match parse_command(text) {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };
        let reply = result.unwrap_or_else(|e| render_error(&e));
        info!("Command {:?} -> {:?}", text.trim(), reply);
        reply
    }

    /// Applies a validated command and returns its acknowledgment.
    pub async fn execute(&self, command: Command) -> Result<String> {
        match command {
            Command::Autoresponder { enabled } => {
                let value = if enabled { "true" } else { "false" };
                self.store.set(SettingKey::Enabled, value).await?;
                Ok(format!(
                    "✅ Autoresponder {}.",
                    if enabled { "on" } else { "off" }
                ))
            }
            Command::ActivateFrom(at) => self.schedule(TransitionKind::Activate, at).await,
            Command::ActivateUntil(at) => self.schedule(TransitionKind::Deactivate, at).await,
            Command::ActivateReset => {
                let removed = self.scheduler.clear().await?;
                Ok(format!("🗑️ Cleared {removed} scheduled transition(s)."))
            }
            Command::SetMessage(message) => {
                self.store.set(SettingKey::DefaultMessage, &message).await?;
                Ok(format!("✅ Default response message set to: {message}"))
            }
            Command::SetTemplate { name, message } => {
                self.store.upsert_template(&name, &message).await?;
                Ok(format!("✅ Template \"{name}\" set."))
            }
            Command::UseTemplate(name) => {
                let template = self
                    .store
                    .get_template(&name)
                    .await?
                    .ok_or_else(|| Error::TemplateNotFound { name: name.clone() })?;
                self.store
                    .set(SettingKey::DefaultMessage, &template.message)
                    .await?;
                Ok(format!("✅ Using template '{name}' as the response message."))
            }
            Command::ListTemplates => {
                let names = self.store.template_names().await?;
                if names.is_empty() {
                    return Ok("📋 No templates found.".to_string());
                }
                let mut reply = String::from("📋 Saved templates:");
                for name in names {
                    write!(reply, "\n• {name}").ok();
                }
                Ok(reply)
            }
            Command::DeleteTemplate(name) => {
                self.store.delete_template(&name).await?;
                Ok(format!("🗑️ Template '{name}' deleted."))
            }
            Command::SetDelay(seconds) => {
                self.store
                    .set(SettingKey::ResponseDelay, &seconds.to_string())
                    .await?;
                Ok(format!("✅ Response delay set to {seconds} seconds."))
            }
            Command::SetFrequency(frequency) => {
                self.store
                    .set(SettingKey::ResponseFrequency, frequency.as_str())
                    .await?;
                Ok(format!("✅ Response frequency set to: {}.", frequency.as_str()))
            }
            Command::Types(audience) => {
                self.store
                    .set(SettingKey::MessageTypes, audience.as_str())
                    .await?;
                Ok(format!("✅ Response types set to: {}.", audience.as_str()))
            }
            Command::Stats => self.stats().await,
            Command::ShowConfig => self.show_config().await,
            Command::Reset => Ok(
                "⚠️ Are you sure you want to reset all settings? Reply with /confirmreset to proceed."
                    .to_string(),
            ),
            Command::ConfirmReset => {
                self.scheduler.clear().await?;
                self.store.reset_to_defaults().await?;
                Ok("✅ All settings have been reset to default.".to_string())
            }
            Command::Help => Ok(help_text()),
        }
    }

    async fn schedule(&self, kind: TransitionKind, at: DateTime<Utc>) -> Result<String> {
        let when = format_local(at);
        let verb = if kind.target_enabled() {
            "activate"
        } else {
            "deactivate"
        };
        match self.scheduler.schedule(kind, at).await? {
            ScheduleOutcome::Fired => Ok(format!(
                "✅ {when} has already passed, so the autoresponder was told to {verb} right away."
            )),
            ScheduleOutcome::Pending { .. } => {
                Ok(format!("⏰ Autoresponder scheduled to {verb} at {when}."))
            }
        }
    }

    async fn stats(&self) -> Result<String> {
        let stats = ledger::stats(self.store.database()).await?;
        let mut reply = format!(
            "📊 Total auto-responses sent: {}\nUnique conversations responded to: {}",
            stats.total_responses, stats.unique_conversations
        );
        if let Some(last) = stats.last_sent_at {
            write!(reply, "\nLast auto-response: {}", format_local(last)).ok();
        }
        Ok(reply)
    }

    async fn show_config(&self) -> Result<String> {
        let mut reply = String::from("⚙️ Current configuration:");
        for setting in self.store.all_settings().await? {
            write!(reply, "\n{}: {}", setting.key, setting.value).ok();
        }

        let pending = self.scheduler.pending().await?;
        if !pending.is_empty() {
            reply.push_str("\n\nScheduled transitions:");
            for transition in pending {
                write!(
                    reply,
                    "\n{} at {}",
                    transition.id,
                    format_local(transition.effective_at)
                )
                .ok();
            }
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::settings::{DEFAULT_MESSAGE, SettingKey};
    use crate::test_utils::{at, setup_test_interpreter};
    use sea_orm::ConnectionTrait;

    #[test]
    fn test_parse_command_names_and_slash() {
        assert_eq!(parse_command("/stats").unwrap(), Command::Stats);
        assert_eq!(parse_command("stats").unwrap(), Command::Stats);
        assert_eq!(parse_command("  /HELP  ").unwrap(), Command::Help);
        assert!(matches!(
            parse_command("/frobnicate now"),
            Err(Error::UnknownCommand { name }) if name == "frobnicate"
        ));
        assert!(matches!(parse_command(""), Err(Error::UnknownCommand { .. })));
    }

    #[test]
    fn test_parse_autoresponder_rejects_other_tokens() {
        assert_eq!(
            parse_command("/autoresponder on").unwrap(),
            Command::Autoresponder { enabled: true }
        );
        assert_eq!(
            parse_command("/autoresponder OFF").unwrap(),
            Command::Autoresponder { enabled: false }
        );
        for bad in ["/autoresponder", "/autoresponder yes", "/autoresponder on off"] {
            assert!(
                matches!(parse_command(bad), Err(Error::MalformedCommand { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_activate() {
        assert_eq!(
            parse_command("/activate from 2030-05-01T09:30:00Z").unwrap(),
            Command::ActivateFrom(at("2030-05-01T09:30:00Z"))
        );
        assert_eq!(
            parse_command("/activate until 2030-05-01T18:00:00+02:00").unwrap(),
            Command::ActivateUntil(at("2030-05-01T16:00:00Z"))
        );
        assert!(matches!(
            parse_command("/activate from 2030-05-01 09:30").unwrap(),
            Command::ActivateFrom(_)
        ));
        assert_eq!(parse_command("/activate reset").unwrap(), Command::ActivateReset);
        assert!(parse_command("/activate from tomorrow").is_err());
        assert!(parse_command("/activate at 2030-05-01 09:30").is_err());
        assert!(parse_command("/activate").is_err());
    }

    #[test]
    fn test_parse_datetime_local_formats() {
        let expected = Local
            .from_local_datetime(
                &NaiveDateTime::parse_from_str("2030-05-01 09:30:15", "%Y-%m-%d %H:%M:%S").unwrap(),
            )
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse_datetime("2030-05-01 09:30:15").unwrap(), expected);
        assert_eq!(parse_datetime("2030-05-01T09:30:15").unwrap(), expected);
        assert!(parse_datetime("01/05/2030 09:30").is_err());
    }

    #[test]
    fn test_parse_set_template_splits_at_first_colon() {
        assert_eq!(
            parse_command("/settemplate greet: Hello there").unwrap(),
            Command::SetTemplate {
                name: "greet".to_string(),
                message: "Hello there".to_string()
            }
        );
        assert_eq!(
            parse_command("/settemplate meeting: Back at 14:00").unwrap(),
            Command::SetTemplate {
                name: "meeting".to_string(),
                message: "Back at 14:00".to_string()
            }
        );
        assert!(parse_command("/settemplate no colon here").is_err());
        assert!(parse_command("/settemplate :body").is_err());
        assert!(parse_command("/settemplate name:   ").is_err());
    }

    #[test]
    fn test_parse_argument_validation() {
        assert!(matches!(
            parse_command("/setmessage"),
            Err(Error::MalformedCommand { .. })
        ));
        assert_eq!(parse_command("/setdelay 30").unwrap(), Command::SetDelay(30));
        assert_eq!(parse_command("/setdelay 0").unwrap(), Command::SetDelay(0));
        assert!(parse_command("/setdelay -5").is_err());
        assert!(parse_command("/setdelay soon").is_err());
        assert_eq!(
            parse_command("/setfrequency every message").unwrap(),
            Command::SetFrequency(ResponseFrequency::EveryMessage)
        );
        assert!(parse_command("/setfrequency hourly").is_err());
        assert_eq!(
            parse_command("/types Group").unwrap(),
            Command::Types(AudienceFilter::Group)
        );
        assert!(parse_command("/types channels").is_err());
        assert!(parse_command("/stats now").is_err());
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = help_text();
        for entry in COMMANDS {
            assert!(help.contains(&format!("/{}", entry.name)), "missing {}", entry.name);
        }
    }

    #[tokio::test]
    async fn test_interpret_never_fails() -> Result<()> {
        let (interpreter, _store) = setup_test_interpreter().await?;

        assert!(interpreter.interpret("/nope").await.contains("Unknown command"));
        assert!(interpreter.interpret("/autoresponder maybe").await.starts_with("⚠️"));
        assert!(interpreter.interpret("/setdelay x").await.starts_with("⚠️"));
        Ok(())
    }

    #[tokio::test]
    async fn test_autoresponder_toggle() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;

        let reply = interpreter.interpret("/autoresponder on").await;
        assert_eq!(reply, "✅ Autoresponder on.");
        assert_eq!(store.get(SettingKey::Enabled).await?.as_deref(), Some("true"));

        interpreter.interpret("/autoresponder maybe").await;
        assert_eq!(store.get(SettingKey::Enabled).await?.as_deref(), Some("true"));

        interpreter.interpret("/autoresponder off").await;
        assert_eq!(store.get(SettingKey::Enabled).await?.as_deref(), Some("false"));
        Ok(())
    }

    #[tokio::test]
    async fn test_template_then_showconfig() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;

        interpreter.interpret("/settemplate greet: Hello there").await;
        let reply = interpreter.interpret("/usetemplate greet").await;
        assert!(reply.contains("greet"));
        assert_eq!(
            store.get(SettingKey::DefaultMessage).await?.as_deref(),
            Some("Hello there")
        );

        let config = interpreter.interpret("/showconfig").await;
        assert!(config.contains("default_message: Hello there"), "{config}");
        assert!(config.contains("enabled: false"));
        Ok(())
    }

    #[tokio::test]
    async fn test_usetemplate_missing_leaves_message_unchanged() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;

        let reply = interpreter.interpret("/usetemplate ghost").await;
        assert_eq!(reply, "❌ Template 'ghost' not found.");
        assert_eq!(
            store.get(SettingKey::DefaultMessage).await?.as_deref(),
            Some(DEFAULT_MESSAGE)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_delete_templates() -> Result<()> {
        let (interpreter, _store) = setup_test_interpreter().await?;

        assert_eq!(interpreter.interpret("/listtemplates").await, "📋 No templates found.");
        interpreter.interpret("/settemplate b: second").await;
        interpreter.interpret("/settemplate a: first").await;
        assert_eq!(
            interpreter.interpret("/listtemplates").await,
            "📋 Saved templates:\n• a\n• b"
        );

        assert_eq!(
            interpreter.interpret("/deletetemplate a").await,
            "🗑️ Template 'a' deleted."
        );
        assert_eq!(
            interpreter.interpret("/deletetemplate a").await,
            "❌ Template 'a' not found."
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_setters_store_validated_values() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;

        interpreter.interpret("/setmessage Back on Monday").await;
        interpreter.interpret("/setdelay 45").await;
        interpreter.interpret("/setfrequency Daily").await;
        interpreter.interpret("/types all").await;

        assert_eq!(
            store.get(SettingKey::DefaultMessage).await?.as_deref(),
            Some("Back on Monday")
        );
        assert_eq!(store.get(SettingKey::ResponseDelay).await?.as_deref(), Some("45"));
        assert_eq!(
            store.get(SettingKey::ResponseFrequency).await?.as_deref(),
            Some("daily")
        );
        assert_eq!(store.get(SettingKey::MessageTypes).await?.as_deref(), Some("all"));

        // Rejected input leaves the stored value alone
        interpreter.interpret("/setfrequency fortnightly").await;
        interpreter.interpret("/setmessage").await;
        assert_eq!(
            store.get(SettingKey::ResponseFrequency).await?.as_deref(),
            Some("daily")
        );
        assert_eq!(
            store.get(SettingKey::DefaultMessage).await?.as_deref(),
            Some("Back on Monday")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;
        interpreter.interpret("/autoresponder on").await;
        interpreter.interpret("/setmessage custom").await;
        let before = store.all_settings().await?;

        let reply = interpreter.interpret("/reset").await;
        assert!(reply.contains("/confirmreset"));
        let after_reset = store.all_settings().await?;
        let values = |models: &[crate::entities::SettingModel]| {
            models
                .iter()
                .map(|m| (m.key.clone(), m.value.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(values(&before), values(&after_reset));

        interpreter.interpret("/confirmreset").await;
        for key in SettingKey::ALL {
            assert_eq!(store.get(key).await?.as_deref(), Some(key.default_value()));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_activate_from_past_fires_immediately() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;

        let reply = interpreter
            .interpret("/activate from 2020-01-01T00:00:00Z")
            .await;
        assert!(reply.contains("already passed"), "{reply}");
        assert_eq!(store.get(SettingKey::Enabled).await?.as_deref(), Some("true"));
        Ok(())
    }

    #[tokio::test]
    async fn test_activate_window_shows_in_config_and_resets() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;

        let reply = interpreter
            .interpret("/activate from 2999-01-01T00:00:00Z")
            .await;
        assert!(reply.starts_with("⏰"), "{reply}");
        interpreter
            .interpret("/activate until 2999-02-01T00:00:00Z")
            .await;
        assert_eq!(store.get(SettingKey::Enabled).await?.as_deref(), Some("false"));
        assert!(!store.get(SettingKey::ActivationFrom).await?.unwrap().is_empty());

        let config = interpreter.interpret("/showconfig").await;
        assert!(config.contains("Scheduled transitions:"));
        assert!(config.contains("activate at"));
        assert!(config.contains("deactivate at"));

        let reply = interpreter.interpret("/activate reset").await;
        assert_eq!(reply, "🗑️ Cleared 2 scheduled transition(s).");
        assert_eq!(store.get(SettingKey::ActivationFrom).await?.as_deref(), Some(""));
        assert!(!interpreter.interpret("/showconfig").await.contains("Scheduled transitions:"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_schedule_leaves_window_unset() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;
        store
            .database()
            .execute_unprepared("DROP TABLE scheduled_transitions")
            .await?;

        let reply = interpreter
            .interpret("/activate from 2999-01-01T00:00:00Z")
            .await;
        assert_eq!(reply, "❌ An error occurred while processing your command.");
        assert_eq!(store.get(SettingKey::ActivationFrom).await?.as_deref(), Some(""));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_activate_reset_keeps_pending_transitions() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;
        interpreter
            .interpret("/activate from 2999-01-01T00:00:00Z")
            .await;
        interpreter
            .interpret("/activate until 2999-02-01T00:00:00Z")
            .await;
        store
            .database()
            .execute_unprepared("DROP TABLE settings")
            .await?;

        let reply = interpreter.interpret("/activate reset").await;
        assert_eq!(reply, "❌ An error occurred while processing your command.");
        assert_eq!(interpreter.scheduler.pending().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_reply() -> Result<()> {
        let (interpreter, store) = setup_test_interpreter().await?;
        assert_eq!(
            interpreter.interpret("/stats").await,
            "📊 Total auto-responses sent: 0\nUnique conversations responded to: 0"
        );

        ledger::record_send(store.database(), "a", at("2024-01-01T00:00:00Z")).await?;
        ledger::record_send(store.database(), "a", at("2024-01-09T00:00:00Z")).await?;
        ledger::record_send(store.database(), "b", at("2024-01-02T00:00:00Z")).await?;
        let reply = interpreter.interpret("/stats").await;
        assert!(reply.contains("Total auto-responses sent: 3"));
        assert!(reply.contains("Unique conversations responded to: 2"));
        assert!(reply.contains("Last auto-response:"));
        Ok(())
    }
}
