//! Shared types for the camp ledger bot and anything reading its data file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =====================================================
// Ledger Types
// =====================================================

/// Sentinel subject used when a message starts with a clan header instead of a member.
pub const UNKNOWN_SUBJECT: &str = "Unknown";

/// One running total tracked per member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    MaterialsContributed,
    AmountWithdrawn,
    AmountDeposited,
    DeliveryRevenue,
    SupplyMissionCount,
}

impl Field {
    /// Label used in the rendered report.
    pub fn label(&self) -> &'static str {
        match self {
            Field::MaterialsContributed => "Materials",
            Field::AmountWithdrawn => "Withdrawn",
            Field::AmountDeposited => "Deposited",
            Field::DeliveryRevenue => "Delivery",
            Field::SupplyMissionCount => "Supply Missions",
        }
    }

    pub fn is_monetary(&self) -> bool {
        matches!(
            self,
            Field::AmountWithdrawn | Field::AmountDeposited | Field::DeliveryRevenue
        )
    }

    pub fn is_count(&self) -> bool {
        matches!(self, Field::SupplyMissionCount)
    }
}

/// Accumulated totals for one member. Every field starts at zero.
///
/// The aliases accept data files written with the older short field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    #[serde(default, alias = "materials")]
    pub materials_contributed: f64,
    #[serde(default, alias = "withdrawn")]
    pub amount_withdrawn: f64,
    #[serde(default, alias = "deposited")]
    pub amount_deposited: f64,
    #[serde(default, alias = "delivery")]
    pub delivery_revenue: f64,
    #[serde(default, alias = "supplyMissions")]
    pub supply_mission_count: u64,
}

impl LedgerRecord {
    /// Current value of a field, with counts widened to `f64`.
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::MaterialsContributed => self.materials_contributed,
            Field::AmountWithdrawn => self.amount_withdrawn,
            Field::AmountDeposited => self.amount_deposited,
            Field::DeliveryRevenue => self.delivery_revenue,
            Field::SupplyMissionCount => self.supply_mission_count as f64,
        }
    }

    /// Add an update to a field. Count fields always advance by one.
    pub fn add(&mut self, field: Field, amount: f64) {
        match field {
            Field::MaterialsContributed => self.materials_contributed += amount,
            Field::AmountWithdrawn => self.amount_withdrawn += amount,
            Field::AmountDeposited => self.amount_deposited += amount,
            Field::DeliveryRevenue => self.delivery_revenue += amount,
            Field::SupplyMissionCount => self.supply_mission_count += 1,
        }
    }
}

/// Member identifier to running totals, ordered by identifier.
pub type Ledger = BTreeMap<String, LedgerRecord>;

/// A single `(field, amount)` delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    pub field: Field,
    pub amount: f64,
}

impl Update {
    pub fn new(field: Field, amount: f64) -> Self {
        Self { field, amount }
    }
}

/// Everything pulled out of one log message.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub subject: String,
    pub updates: Vec<Update>,
}

// =====================================================
// Rendering Options
// =====================================================

/// What an empty ledger renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyStyle {
    /// A fixed "no data" line.
    Sentinel,
    /// The report header with no member blocks.
    HeaderOnly,
}

impl std::str::FromStr for EmptyStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sentinel" | "no_data" => Ok(EmptyStyle::Sentinel),
            "header" | "header_only" => Ok(EmptyStyle::HeaderOnly),
            other => Err(format!("Unknown empty style: {}", other)),
        }
    }
}
