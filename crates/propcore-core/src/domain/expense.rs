// ============================================================================
// Propcore Core - Expense/Purchase Request Entity
// File: crates/propcore-core/src/domain/expense.rs
// Description: Submitted -> Approved/Rejected -> Paid approval workflow
// ============================================================================

use chrono::{DateTime, Utc};
use propcore_shared::constants::CURRENCY_SCALE;
use propcore_shared::{AuditFields, EntityId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::DomainError;

/// Expense request status. Rejected and Paid are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    Submitted,
    Approved,
    Rejected,
    Paid,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Submitted => "submitted",
            ExpenseStatus::Approved => "approved",
            ExpenseStatus::Rejected => "rejected",
            ExpenseStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ExpenseStatus::Submitted),
            "approved" => Some(ExpenseStatus::Approved),
            "rejected" => Some(ExpenseStatus::Rejected),
            "paid" => Some(ExpenseStatus::Paid),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExpenseStatus::Rejected | ExpenseStatus::Paid)
    }
}

/// Approver verdict on a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// Stage a receipt reference belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    Purchase,
    Request,
    Payment,
}

/// Reference to an uploaded attachment. Only the reference is recorded;
/// file handling lives outside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptRef {
    pub kind: ReceiptKind,
    pub reference: String,
    pub attached_at: DateTime<Utc>,
}

/// Inbound expense details supplied at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExpenseDraft {
    #[validate(length(min = 1, max = 500))]
    pub description: String,

    pub property_id: Option<EntityId>,
    pub amount_without_tax: Decimal,
    pub tax_rate: Decimal,
}

/// A purchase/expense request raised by an employee, optionally against a
/// property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRequest {
    pub id: EntityId,
    pub requester_id: EntityId,
    pub property_id: Option<EntityId>,
    pub description: String,
    pub amount_without_tax: Decimal,
    pub tax_rate: Decimal,

    /// Always recomputed from amount and tax rate, never trusted from input.
    pub total_amount: Decimal,

    pub status: ExpenseStatus,
    pub approver_id: Option<EntityId>,
    pub decided_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub receipts: Vec<ReceiptRef>,

    #[serde(flatten)]
    pub audit: AuditFields,
}

impl ExpenseRequest {
    pub fn new(requester_id: EntityId, draft: &ExpenseDraft) -> Result<Self, DomainError> {
        super::check_valid(draft)?;
        let total_amount = compute_total(draft.amount_without_tax, draft.tax_rate)?;

        Ok(Self {
            id: Uuid::new_v4(),
            requester_id,
            property_id: draft.property_id,
            description: draft.description.clone(),
            amount_without_tax: draft.amount_without_tax,
            tax_rate: draft.tax_rate,
            total_amount,
            status: ExpenseStatus::Submitted,
            approver_id: None,
            decided_at: None,
            paid_at: None,
            receipts: Vec::new(),
            audit: AuditFields::new(Some(requester_id)),
        })
    }

    /// Submitted -> Approved/Rejected, recording the approver and timestamp.
    /// The requester may not decide their own request.
    pub fn decide(
        &mut self,
        decision: ApprovalDecision,
        approver_id: Uuid,
    ) -> Result<(), DomainError> {
        if self.status != ExpenseStatus::Submitted {
            let to = match decision {
                ApprovalDecision::Approved => ExpenseStatus::Approved,
                ApprovalDecision::Rejected => ExpenseStatus::Rejected,
            };
            return Err(self.transition_err(to));
        }
        if approver_id == self.requester_id {
            return Err(DomainError::ConflictOfInterest {
                request_id: self.id,
                approver_id,
            });
        }

        self.status = match decision {
            ApprovalDecision::Approved => ExpenseStatus::Approved,
            ApprovalDecision::Rejected => ExpenseStatus::Rejected,
        };
        self.approver_id = Some(approver_id);
        self.decided_at = Some(Utc::now());
        self.audit.touch(approver_id);
        Ok(())
    }

    /// Approved -> Paid, attaching the payment receipt reference.
    pub fn record_payment(&mut self, receipt: &str, paid_by: Uuid) -> Result<(), DomainError> {
        if self.status != ExpenseStatus::Approved {
            return Err(self.transition_err(ExpenseStatus::Paid));
        }
        self.attach_receipt(ReceiptKind::Payment, receipt);
        self.status = ExpenseStatus::Paid;
        self.paid_at = Some(Utc::now());
        self.audit.touch(paid_by);
        Ok(())
    }

    pub fn attach_receipt(&mut self, kind: ReceiptKind, reference: &str) {
        self.receipts.push(ReceiptRef {
            kind,
            reference: reference.to_string(),
            attached_at: Utc::now(),
        });
    }

    fn transition_err(&self, to: ExpenseStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: "expense_request",
            id: self.id,
            from: self.status.as_str(),
            to: to.as_str(),
        }
    }
}

/// total = amount x (1 + rate), rounded to currency precision. Negative
/// amounts and a tax rate outside [0, 1] are invalid.
pub fn compute_total(amount_without_tax: Decimal, tax_rate: Decimal) -> Result<Decimal, DomainError> {
    if amount_without_tax < Decimal::ZERO {
        return Err(DomainError::InvalidAmount(format!(
            "amount must not be negative, got {amount_without_tax}"
        )));
    }
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
        return Err(DomainError::InvalidAmount(format!(
            "tax rate must be within [0, 1], got {tax_rate}"
        )));
    }
    Ok((amount_without_tax * (Decimal::ONE + tax_rate)).round_dp(CURRENCY_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(amount: Decimal, rate: Decimal) -> ExpenseDraft {
        ExpenseDraft {
            description: "AC maintenance parts".into(),
            property_id: None,
            amount_without_tax: amount,
            tax_rate: rate,
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_total_amount_exact() {
        let request = ExpenseRequest::new(Uuid::new_v4(), &draft(dec("1000"), dec("0.15"))).unwrap();
        assert_eq!(request.total_amount, dec("1150.00"));
    }

    #[test]
    fn test_zero_tax_rate() {
        let request = ExpenseRequest::new(Uuid::new_v4(), &draft(dec("250.50"), dec("0"))).unwrap();
        assert_eq!(request.total_amount, dec("250.50"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let result = ExpenseRequest::new(Uuid::new_v4(), &draft(dec("-10"), dec("0.1")));
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        assert!(ExpenseRequest::new(Uuid::new_v4(), &draft(dec("10"), dec("1.01"))).is_err());
        assert!(ExpenseRequest::new(Uuid::new_v4(), &draft(dec("10"), dec("-0.01"))).is_err());
    }

    #[test]
    fn test_approve_then_pay() {
        let mut request = ExpenseRequest::new(Uuid::new_v4(), &draft(dec("100"), dec("0.1"))).unwrap();
        let approver = Uuid::new_v4();
        request.decide(ApprovalDecision::Approved, approver).unwrap();
        assert_eq!(request.status, ExpenseStatus::Approved);
        assert_eq!(request.approver_id, Some(approver));
        assert!(request.decided_at.is_some());

        request.record_payment("receipts/2026/0042.pdf", Uuid::new_v4()).unwrap();
        assert_eq!(request.status, ExpenseStatus::Paid);
        assert!(request.receipts.iter().any(|r| r.kind == ReceiptKind::Payment));
    }

    #[test]
    fn test_pay_before_approval_fails() {
        let mut request = ExpenseRequest::new(Uuid::new_v4(), &draft(dec("100"), dec("0.1"))).unwrap();
        let result = request.record_payment("receipts/0001.pdf", Uuid::new_v4());
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition { from: "submitted", to: "paid", .. })
        ));
        assert_eq!(request.status, ExpenseStatus::Submitted);
    }

    #[test]
    fn test_self_approval_blocked() {
        let requester = Uuid::new_v4();
        let mut request = ExpenseRequest::new(requester, &draft(dec("100"), dec("0.1"))).unwrap();
        let result = request.decide(ApprovalDecision::Approved, requester);
        assert!(matches!(result, Err(DomainError::ConflictOfInterest { .. })));
        assert_eq!(request.status, ExpenseStatus::Submitted);
    }

    #[test]
    fn test_double_decision_fails() {
        let mut request = ExpenseRequest::new(Uuid::new_v4(), &draft(dec("100"), dec("0.1"))).unwrap();
        request.decide(ApprovalDecision::Rejected, Uuid::new_v4()).unwrap();
        let result = request.decide(ApprovalDecision::Approved, Uuid::new_v4());
        assert!(result.is_err());
        assert_eq!(request.status, ExpenseStatus::Rejected);
    }
}
