use super::Amount;
use crate::error::PayoutError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleEntry {
    pub cycle: i64,
    pub balance: Amount,
    pub share_percentage: f64,
    pub roll_inclusion: Amount,
    pub gross_payout: Amount,
    pub fee: Amount,
    pub net_payout: Amount,
}

impl CycleEntry {
    pub fn new(cycle: i64, balance: Amount) -> Self {
        Self {
            cycle,
            balance,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegatorRecord {
    pub address: String,
    pub is_delegate: bool,
    pub accumulated_fee: Amount,
    pub total_payout: Amount,
    pub cycle_entries: Vec<CycleEntry>,
}

impl DelegatorRecord {
    pub fn delegator(address: impl Into<String>) -> Self {
        Self::with_role(address.into(), false)
    }

    pub fn delegate(address: impl Into<String>) -> Self {
        Self::with_role(address.into(), true)
    }

    fn with_role(address: String, is_delegate: bool) -> Self {
        Self {
            address,
            is_delegate,
            accumulated_fee: 0.0,
            total_payout: 0.0,
            cycle_entries: Vec::new(),
        }
    }

    pub fn entry(&self, cycle: i64) -> Option<&CycleEntry> {
        self.cycle_entries.iter().find(|entry| entry.cycle == cycle)
    }

    pub fn has_entry(&self, cycle: i64) -> bool {
        self.entry(cycle).is_some()
    }

    /// Appends a finished entry and books its fee. Each cycle is accepted once.
    pub fn push_entry(&mut self, entry: CycleEntry) -> Result<(), PayoutError> {
        if self.has_entry(entry.cycle) {
            return Err(PayoutError::DuplicateEntry {
                address: self.address.clone(),
                cycle: entry.cycle,
            });
        }
        self.accumulated_fee += entry.fee;
        self.cycle_entries.push(entry);
        Ok(())
    }

    pub fn net_payout_sum(&self) -> Amount {
        self.cycle_entries.iter().map(|entry| entry.net_payout).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_entry_books_fee() {
        let mut record = DelegatorRecord::delegator("tz1a");
        let mut entry = CycleEntry::new(10, 500.0);
        entry.fee = 1.5;
        record.push_entry(entry).unwrap();
        assert_eq!(record.accumulated_fee, 1.5);
        assert!(record.has_entry(10));
        assert!(!record.has_entry(11));
    }

    #[test]
    fn test_duplicate_cycle_rejected() {
        let mut record = DelegatorRecord::delegator("tz1a");
        let mut entry = CycleEntry::new(10, 500.0);
        entry.fee = 2.0;
        record.push_entry(entry.clone()).unwrap();

        let err = record.push_entry(entry).unwrap_err();
        assert!(matches!(err, PayoutError::DuplicateEntry { cycle: 10, .. }));
        assert_eq!(record.cycle_entries.len(), 1);
        assert_eq!(record.accumulated_fee, 2.0);
    }
}
