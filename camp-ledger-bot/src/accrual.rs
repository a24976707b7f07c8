//! Applies extracted updates to the in-memory ledger.

use camp_ledger_types::{Ledger, Update};

/// Add `updates` to `subject`'s record, creating a zeroed record on first sight.
///
/// There is no message deduplication: applying the same updates twice counts
/// them twice.
pub fn apply(ledger: &mut Ledger, subject: &str, updates: &[Update]) {
    let record = ledger.entry(subject.to_string()).or_insert_with(|| {
        log::info!("Ledger: new member {}", subject);
        Default::default()
    });

    for update in updates {
        record.add(update.field, update.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camp_ledger_types::Field;

    #[test]
    fn test_first_sight_creates_zero_record() {
        let mut ledger = Ledger::new();
        apply(&mut ledger, "Rowan", &[Update::new(Field::MaterialsContributed, 12.5)]);

        let record = &ledger["Rowan"];
        assert_eq!(record.materials_contributed, 12.5);
        assert_eq!(record.amount_withdrawn, 0.0);
        assert_eq!(record.amount_deposited, 0.0);
        assert_eq!(record.delivery_revenue, 0.0);
        assert_eq!(record.supply_mission_count, 0);
    }

    #[test]
    fn test_materials_accumulate() {
        let mut ledger = Ledger::new();
        apply(&mut ledger, "Rowan", &[Update::new(Field::MaterialsContributed, 5.0)]);
        apply(&mut ledger, "Rowan", &[Update::new(Field::MaterialsContributed, 3.5)]);
        assert_eq!(ledger["Rowan"].materials_contributed, 8.5);
    }

    #[test]
    fn test_withdrawal_adds_to_existing() {
        let mut ledger = Ledger::new();
        apply(&mut ledger, "Mara", &[Update::new(Field::AmountWithdrawn, 100.0)]);
        apply(&mut ledger, "Mara", &[Update::new(Field::AmountWithdrawn, 400.0)]);
        assert_eq!(ledger["Mara"].amount_withdrawn, 500.0);
    }

    #[test]
    fn test_counts_add_one() {
        let mut ledger = Ledger::new();
        apply(&mut ledger, "Jo", &[Update::new(Field::SupplyMissionCount, 1.0)]);
        apply(&mut ledger, "Jo", &[Update::new(Field::SupplyMissionCount, 7.0)]);
        assert_eq!(ledger["Jo"].supply_mission_count, 2);
    }

    #[test]
    fn test_subjects_are_case_sensitive() {
        let mut ledger = Ledger::new();
        apply(&mut ledger, "rowan", &[Update::new(Field::MaterialsContributed, 1.0)]);
        apply(&mut ledger, "Rowan", &[Update::new(Field::MaterialsContributed, 1.0)]);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_same_message_twice_double_counts() {
        let mut ledger = Ledger::new();
        let updates = [
            Update::new(Field::DeliveryRevenue, 10.0),
            Update::new(Field::MaterialsContributed, 2.0),
        ];
        apply(&mut ledger, "Jo", &updates);
        apply(&mut ledger, "Jo", &updates);
        assert_eq!(ledger["Jo"].delivery_revenue, 20.0);
        assert_eq!(ledger["Jo"].materials_contributed, 4.0);
    }
}
