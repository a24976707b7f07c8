//! Renders the ledger as a Discord message.

use camp_ledger_types::{EmptyStyle, Field, Ledger, LedgerRecord};

/// Discord's per-message character limit
pub const DISCORD_MAX_MESSAGE_LEN: usize = 2000;

pub const REPORT_HEADER: &str = "**Camp Update:**";

pub const NO_DATA_MESSAGE: &str = "No ledger data recorded yet.";

const CONTINUATION_MARKER: &str = "...";

/// Renders ledgers for the fields a rule table tracks.
#[derive(Debug, Clone)]
pub struct SummaryFormatter {
    fields: Vec<Field>,
}

impl SummaryFormatter {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Header, then one block per member, cut to fit in one message.
    pub fn render(&self, ledger: &Ledger, empty: EmptyStyle) -> String {
        if ledger.is_empty() {
            return match empty {
                EmptyStyle::Sentinel => NO_DATA_MESSAGE.to_string(),
                EmptyStyle::HeaderOnly => REPORT_HEADER.to_string(),
            };
        }

        let blocks: Vec<String> = ledger
            .iter()
            .map(|(member, record)| self.render_member(member, record))
            .collect();

        let report = format!("{}\n\n{}", REPORT_HEADER, blocks.join("\n\n"));
        truncate_message(&report, DISCORD_MAX_MESSAGE_LEN)
    }

    fn render_member(&self, member: &str, record: &LedgerRecord) -> String {
        let mut block = format!("@{}", member);
        for field in &self.fields {
            block.push('\n');
            block.push_str("  ");
            block.push_str(field.label());
            block.push_str(": ");
            block.push_str(&format_value(*field, record.get(*field)));
        }
        block
    }
}

fn format_value(field: Field, value: f64) -> String {
    if field.is_count() {
        format!("{}", value as u64)
    } else if field.is_monetary() {
        format!("${:.2}", value)
    } else {
        format!("{}", value)
    }
}

/// Cut `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(CONTINUATION_MARKER.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(CONTINUATION_MARKER);
    truncated
}
