//! Turns one camp log message into a subject and a list of field updates.
//!
//! Subject lookup tries the `Discord: @handle` marker first and can fall back
//! to the message's first line. Field detection runs an ordered rule table;
//! every rule is checked on its own, so one message can feed several fields.

use camp_ledger_types::{Extraction, Field, UNKNOWN_SUBJECT, Update};
use once_cell::sync::Lazy;
use regex::Regex;

/// `Discord: @handle`
static MEMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Discord:\s*@(\S+)").unwrap());

/// `Discord: @handle 123456` (member id of at least 5 digits)
static MEMBER_WITH_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Discord:\s*@(\S+)\s+\d{5,}").unwrap());

/// A `$<number>` amount.
static DOLLAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\s?([\d.,]+)").unwrap());

/// First line of a clan-level message, which names no member.
const CLAN_HEADER_PREFIX: &str = "Clan Name:";

/// Where a rule's amount comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    /// The rule's first capture group.
    Captured,
    /// The rule only triggers; the amount is the first `$<number>` after the
    /// keyword, or failing that the first one in the text.
    FirstDollar,
    /// Each matching message counts once.
    Count,
}

/// One row of the rule table.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub field: Field,
    pattern: Regex,
    amount: AmountSource,
}

impl ExtractionRule {
    pub fn new(field: Field, pattern: &str, amount: AmountSource) -> Result<Self, String> {
        let pattern = Regex::new(pattern)
            .map_err(|e| format!("Invalid pattern for {:?}: {}", field, e))?;
        Ok(Self {
            field,
            pattern,
            amount,
        })
    }

    /// Evaluate the rule against a whole message.
    fn evaluate(&self, text: &str) -> Option<Update> {
        let caps = self.pattern.captures(text)?;
        let amount = match self.amount {
            AmountSource::Captured => match caps.get(1) {
                Some(m) => parse_amount(m.as_str()),
                None => {
                    log::warn!(
                        "Extractor: rule for {:?} matched without an amount group",
                        self.field
                    );
                    0.0
                }
            },
            AmountSource::FirstDollar => {
                // Prefer the amount after the keyword so an earlier phrase's amount isn't reused.
                let after = &text[caps.get(0).map_or(0, |m| m.end())..];
                let dollar = DOLLAR_PATTERN
                    .captures(after)
                    .or_else(|| DOLLAR_PATTERN.captures(text))?;
                parse_amount(&dollar[1])
            }
            AmountSource::Count => 1.0,
        };
        Some(Update::new(self.field, amount))
    }
}

/// How the subject of a message is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectPolicy {
    /// Only accept `Discord: @handle` when a member id follows it.
    pub require_member_id: bool,
    /// Use the first line as the subject when the marker is missing.
    pub first_line_fallback: bool,
}

impl Default for SubjectPolicy {
    fn default() -> Self {
        Self {
            require_member_id: false,
            first_line_fallback: true,
        }
    }
}

/// The built-in rule table for camp log messages.
pub fn default_rules() -> Vec<ExtractionRule> {
    let table: [(Field, &str, AmountSource); 5] = [
        (
            Field::MaterialsContributed,
            r"Materials added:\s*([\d.,]+)",
            AmountSource::Captured,
        ),
        (
            Field::AmountWithdrawn,
            r"Withdrew from clan ledger,\s*\$([\d.,]+)",
            AmountSource::Captured,
        ),
        (
            Field::AmountDeposited,
            r"(?i)\bdeposit(?:ed)?\b",
            AmountSource::FirstDollar,
        ),
        (
            Field::DeliveryRevenue,
            r"Made a Sale Of [\d,]+ Of Stock For \$([\d.,]+)",
            AmountSource::Captured,
        ),
        (
            Field::SupplyMissionCount,
            r"(?i)\bsupply missions?\b",
            AmountSource::Count,
        ),
    ];

    table
        .into_iter()
        .filter_map(|(field, pattern, amount)| match ExtractionRule::new(field, pattern, amount) {
            Ok(rule) => Some(rule),
            Err(e) => {
                log::error!("Extractor: {}", e);
                None
            }
        })
        .collect()
}

/// Subject lookup plus the rule table.
#[derive(Debug, Clone)]
pub struct Extractor {
    policy: SubjectPolicy,
    rules: Vec<ExtractionRule>,
}

impl Extractor {
    pub fn new(policy: SubjectPolicy) -> Self {
        Self::with_rules(policy, default_rules())
    }

    pub fn with_rules(policy: SubjectPolicy, rules: Vec<ExtractionRule>) -> Self {
        Self { policy, rules }
    }

    /// Fields the rule table can produce, in rule order.
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if !fields.contains(&rule.field) {
                fields.push(rule.field);
            }
        }
        fields
    }

    /// Parse a message. `None` means there is nothing to record.
    pub fn extract(&self, text: &str) -> Option<Extraction> {
        let subject = find_subject(text, &self.policy)?;

        let updates: Vec<Update> = self
            .rules
            .iter()
            .filter_map(|rule| rule.evaluate(text))
            .collect();

        if updates.is_empty() {
            log::debug!("Extractor: no rule matched for subject {}", subject);
            return None;
        }

        Some(Extraction { subject, updates })
    }
}

/// Find the member a message is about.
pub fn find_subject(text: &str, policy: &SubjectPolicy) -> Option<String> {
    let marker = if policy.require_member_id {
        &*MEMBER_WITH_ID_PATTERN
    } else {
        &*MEMBER_PATTERN
    };
    if let Some(caps) = marker.captures(text) {
        return Some(caps[1].to_string());
    }

    if !policy.first_line_fallback {
        return None;
    }

    let first_line = text.lines().next()?.trim();
    if first_line.is_empty() {
        return None;
    }
    if first_line.starts_with(CLAN_HEADER_PREFIX) {
        return Some(UNKNOWN_SUBJECT.to_string());
    }
    // A marker line that failed the id check names no usable subject.
    if MEMBER_PATTERN.is_match(first_line) {
        return None;
    }
    Some(first_line.to_string())
}

/// Parse a captured numeral. Thousands separators are dropped; anything that
/// still isn't a number counts as zero.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_end_matches(['.', ','])
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            log::warn!("Extractor: could not parse amount '{}', counting it as 0", raw);
            0.0
        }
    }
}
