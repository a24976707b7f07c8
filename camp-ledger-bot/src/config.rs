use crate::channels::router::{BotFilter, CommandScope, RoutingPolicy};
use crate::extractor::SubjectPolicy;
use crate::writer::RenderStyles;
use camp_ledger_types::EmptyStyle;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub update_channel_id: u64,
    pub data_file: String,
    pub subject_policy: SubjectPolicy,
    pub routing: RoutingPolicy,
    pub push_updates: bool,
    pub render_styles: RenderStyles,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str, default: bool| parse_flag(get(key), key, default);

        let discord_token = get("DISCORD_TOKEN").ok_or("DISCORD_TOKEN must be set")?;
        let log_channel_id = channel_id(get("LOG_CHANNEL_ID"), "LOG_CHANNEL_ID")?;
        let update_channel_id = channel_id(get("UPDATE_CHANNEL_ID"), "UPDATE_CHANNEL_ID")?;

        Ok(Self {
            discord_token,
            update_channel_id,
            data_file: get("LEDGER_DATA_FILE").unwrap_or_else(|| "./membersData.json".to_string()),
            subject_policy: SubjectPolicy {
                require_member_id: flag("LEDGER_REQUIRE_MEMBER_ID", false)?,
                first_line_fallback: flag("LEDGER_FIRST_LINE_FALLBACK", true)?,
            },
            routing: RoutingPolicy {
                log_channel_id,
                bot_filter: parsed(get("LEDGER_BOT_FILTER"), BotFilter::OwnMessages)?,
                command_scope: parsed(get("LEDGER_COMMAND_SCOPE"), CommandScope::AnyChannel)?,
                summary_command: flag("LEDGER_SUMMARY_COMMAND", true)?,
            },
            push_updates: flag("LEDGER_PUSH_UPDATES", true)?,
            render_styles: RenderStyles {
                summary: parsed(get("LEDGER_SUMMARY_EMPTY"), EmptyStyle::Sentinel)?,
                update: parsed(get("LEDGER_UPDATE_EMPTY"), EmptyStyle::HeaderOnly)?,
            },
        })
    }
}

fn channel_id(value: Option<String>, key: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("{} must be set", key))?;
    match raw.trim().parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(format!("{} must be a non-zero channel id, got '{}'", key, raw)),
    }
}

fn parse_flag(value: Option<String>, key: &str, default: bool) -> Result<bool, String> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("{} must be true or false, got '{}'", key, raw)),
    }
}

fn parsed<T: FromStr<Err = String>>(value: Option<String>, default: T) -> Result<T, String> {
    match value {
        Some(raw) => raw.parse(),
        None => Ok(default),
    }
}
