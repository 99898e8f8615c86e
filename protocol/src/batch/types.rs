//! Plan data: instructions, warnings and the totalled plan.

use std::fmt;

use crate::address::Address;
use crate::amount::RawAmount;

/// One validated `(destination, amount)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentInstruction {
    destination: Address,
    amount: RawAmount,
    line: usize,
}

impl PaymentInstruction {
    pub fn new(destination: Address, amount: RawAmount, line: usize) -> Self {
        Self {
            destination,
            amount,
            line,
        }
    }

    pub fn destination(&self) -> &Address {
        &self.destination
    }

    pub fn amount(&self) -> &RawAmount {
        &self.amount
    }

    /// 1-based line in the batch source.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Something odd about a plan that does not stop it from running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlanWarning {
    /// The destination is `0x000…000`; tokens sent there are gone.
    ZeroAddress { line: usize },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::ZeroAddress { line } => write!(f, "Warning: zero address (line {line})"),
        }
    }
}

/// An ordered list of instructions and their total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchPlan {
    instructions: Vec<PaymentInstruction>,
    total_amount: RawAmount,
    warnings: Vec<PlanWarning>,
}

impl BatchPlan {
    /// Builds a plan whose total is the sum of `instructions`.
    pub fn from_instructions(instructions: Vec<PaymentInstruction>, warnings: Vec<PlanWarning>) -> Self {
        let total_amount = instructions.iter().map(PaymentInstruction::amount).sum();
        Self {
            instructions,
            total_amount,
            warnings,
        }
    }

    pub fn instructions(&self) -> &[PaymentInstruction] {
        &self.instructions
    }

    pub fn total_amount(&self) -> &RawAmount {
        &self.total_amount
    }

    pub fn warnings(&self) -> &[PlanWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PaymentInstruction> {
        self.instructions.iter()
    }
}

impl<'a> IntoIterator for &'a BatchPlan {
    type Item = &'a PaymentInstruction;
    type IntoIter = std::slice::Iter<'a, PaymentInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(byte: u8, amount: u64, line: usize) -> PaymentInstruction {
        PaymentInstruction::new(Address::from_bytes([byte; 20]), RawAmount::from(amount), line)
    }

    #[test]
    fn total_is_the_sum_of_instructions() {
        let plan = BatchPlan::from_instructions(vec![instruction(1, 150, 1), instruction(2, 250, 2)], Vec::new());
        assert_eq!(plan.total_amount(), &RawAmount::from(400u64));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.instructions()[1].line(), 2);
    }

    #[test]
    fn empty_plan_totals_zero() {
        let plan = BatchPlan::from_instructions(Vec::new(), Vec::new());
        assert!(plan.is_empty());
        assert!(plan.total_amount().is_zero());
    }

    #[test]
    fn large_plans_total_exactly() {
        let instructions: Vec<_> = (0..10_000).map(|i| instruction(7, 3, i + 1)).collect();
        let plan = BatchPlan::from_instructions(instructions, vec![PlanWarning::ZeroAddress { line: 9 }]);
        assert_eq!(plan.total_amount(), &RawAmount::from(30_000u64));
        assert_eq!(plan.warnings(), &[PlanWarning::ZeroAddress { line: 9 }]);
    }

    #[test]
    fn warning_text_mentions_line() {
        assert_eq!(
            PlanWarning::ZeroAddress { line: 3 }.to_string(),
            "Warning: zero address (line 3)"
        );
    }
}
