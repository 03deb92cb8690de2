// ============================================================================
// Propcore Core - Expense Approval Service
// File: crates/propcore-core/src/services/expense_service.rs
// Description: Submitted -> Approved/Rejected -> Paid workflow
// ============================================================================

use std::sync::Arc;

use propcore_policy::{tokens, Actor, PolicyEngine};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::activity_event::snapshot;
use crate::domain::{
    actions, entities, ActivityEvent, ApprovalDecision, ExpenseDraft, ExpenseRequest, ReceiptKind,
};
use crate::error::DomainError;
use crate::repositories::TenancyStore;

/// Drives purchase/expense requests through the approval workflow. The tax
/// total is always recomputed at submission; decisions and payments re-read
/// the request under a row lock so two approvers cannot both win.
pub struct ExpenseService<S: TenancyStore> {
    store: Arc<S>,
    policy: PolicyEngine,
}

impl<S: TenancyStore> ExpenseService<S> {
    pub fn new(store: Arc<S>, policy: PolicyEngine) -> Self {
        Self { store, policy }
    }

    /// Submits a new request. Scoped roles may only raise requests against
    /// properties assigned to them.
    pub async fn submit(&self, actor: &Actor, draft: ExpenseDraft) -> Result<ExpenseRequest, DomainError> {
        super::authorize(&self.policy, actor, tokens::EXPENSES_CREATE)?;
        if let Some(property_id) = &draft.property_id {
            if !actor.can_access_property(property_id) {
                warn!(actor_id = %actor.id, %property_id, "expense submission outside property scope");
                return Err(DomainError::Unauthorized {
                    actor_id: actor.id,
                    capability: tokens::EXPENSES_CREATE.to_string(),
                });
            }
        }

        let request = ExpenseRequest::new(actor.id, &draft)?;

        let mut tx = self.store.begin().await?;
        if let Some(property_id) = &request.property_id {
            tx.property_by_id(property_id)
                .await?
                .ok_or(DomainError::NotFound { entity: "property", id: *property_id })?;
        }
        tx.insert_expense(&request).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::EXPENSE_SUBMITTED,
            entities::EXPENSE_REQUEST,
            request.id,
            None,
            Some(snapshot(&request)?),
        ))
        .await?;
        tx.commit().await?;

        info!(request_id = %request.id, total = %request.total_amount, "expense submitted");
        Ok(request)
    }

    /// Approves or rejects a submitted request, recording the approver and
    /// decision timestamp. Requesters cannot decide their own submissions.
    pub async fn decide(
        &self,
        actor: &Actor,
        request_id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<ExpenseRequest, DomainError> {
        super::authorize(&self.policy, actor, tokens::EXPENSES_APPROVE)?;

        let mut tx = self.store.begin().await?;
        let mut request = tx
            .expense_by_id(&request_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "expense_request", id: request_id })?;

        let before = snapshot(&request)?;
        request.decide(decision, actor.id)?;
        tx.update_expense(&request).await?;

        let action = match decision {
            ApprovalDecision::Approved => actions::EXPENSE_APPROVED,
            ApprovalDecision::Rejected => actions::EXPENSE_REJECTED,
        };
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            action,
            entities::EXPENSE_REQUEST,
            request.id,
            Some(before),
            Some(snapshot(&request)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%request_id, action, "expense decided");
        Ok(request)
    }

    /// Records the payment of an approved request, attaching the payment
    /// receipt reference and moving it to Paid.
    pub async fn record_payment(
        &self,
        actor: &Actor,
        request_id: Uuid,
        receipt_ref: &str,
    ) -> Result<ExpenseRequest, DomainError> {
        super::authorize(&self.policy, actor, tokens::EXPENSES_PAY)?;

        let mut tx = self.store.begin().await?;
        let mut request = tx
            .expense_by_id(&request_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "expense_request", id: request_id })?;

        let before = snapshot(&request)?;
        request.record_payment(receipt_ref, actor.id)?;
        tx.update_expense(&request).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::EXPENSE_PAID,
            entities::EXPENSE_REQUEST,
            request.id,
            Some(before),
            Some(snapshot(&request)?),
        ))
        .await?;
        tx.commit().await?;

        info!(%request_id, receipt_ref, "expense paid");
        Ok(request)
    }

    /// Attaches a purchase or request stage receipt to a live request.
    pub async fn attach_receipt(
        &self,
        actor: &Actor,
        request_id: Uuid,
        kind: ReceiptKind,
        receipt_ref: &str,
    ) -> Result<ExpenseRequest, DomainError> {
        super::authorize(&self.policy, actor, tokens::EXPENSES_CREATE)?;

        let mut tx = self.store.begin().await?;
        let mut request = tx
            .expense_by_id(&request_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "expense_request", id: request_id })?;

        if request.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                entity: "expense_request",
                id: request_id,
                from: request.status.as_str(),
                to: request.status.as_str(),
            });
        }
        request.attach_receipt(kind, receipt_ref);
        tx.update_expense(&request).await?;
        tx.commit().await?;

        Ok(request)
    }

    /// Reads one request, enforcing property scope for scoped roles.
    pub async fn request_by_id(&self, actor: &Actor, request_id: Uuid) -> Result<ExpenseRequest, DomainError> {
        super::authorize(&self.policy, actor, tokens::EXPENSES_READ)?;

        let request = self
            .store
            .expense_by_id(&request_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "expense_request", id: request_id })?;

        if let Some(property_id) = &request.property_id {
            if !actor.can_access_property(property_id) {
                return Err(DomainError::Unauthorized {
                    actor_id: actor.id,
                    capability: tokens::EXPENSES_READ.to_string(),
                });
            }
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventFilter, ExpenseStatus};
    use crate::repositories::AuditLog;
    use crate::store::InMemoryStore;
    use propcore_policy::Role;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn draft() -> ExpenseDraft {
        ExpenseDraft {
            description: "Elevator service contract".into(),
            property_id: None,
            amount_without_tax: dec("1000"),
            tax_rate: dec("0.15"),
        }
    }

    fn service() -> (Arc<InMemoryStore>, ExpenseService<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let service = ExpenseService::new(store.clone(), PolicyEngine::new());
        (store, service)
    }

    #[tokio::test]
    async fn test_submit_recomputes_total() {
        let (_, service) = service();
        let requester = Actor::new(Uuid::new_v4(), Role::Maintenance);
        let request = service.submit(&requester, draft()).await.unwrap();
        assert_eq!(request.total_amount, dec("1150.00"));
        assert_eq!(request.status, ExpenseStatus::Submitted);
    }

    #[tokio::test]
    async fn test_submit_approve_pay_round_trip() {
        let (store, service) = service();
        let requester = Actor::new(Uuid::new_v4(), Role::Maintenance);
        let approver = Actor::new(Uuid::new_v4(), Role::Manager);
        let payer = Actor::new(Uuid::new_v4(), Role::Accountant);

        let request = service.submit(&requester, draft()).await.unwrap();
        let approved = service
            .decide(&approver, request.id, ApprovalDecision::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ExpenseStatus::Approved);
        assert_eq!(approved.approver_id, Some(approver.id));

        let paid = service
            .record_payment(&payer, request.id, "receipts/2026/0042.pdf")
            .await
            .unwrap();
        assert_eq!(paid.status, ExpenseStatus::Paid);

        let events = store
            .events(&EventFilter::for_entity(entities::EXPENSE_REQUEST, request.id))
            .await
            .unwrap();
        let recorded: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(
            recorded,
            vec![actions::EXPENSE_SUBMITTED, actions::EXPENSE_APPROVED, actions::EXPENSE_PAID]
        );
    }

    #[tokio::test]
    async fn test_pay_before_approval_fails_without_mutation() {
        let (store, service) = service();
        let requester = Actor::new(Uuid::new_v4(), Role::Maintenance);
        let payer = Actor::new(Uuid::new_v4(), Role::Accountant);

        let request = service.submit(&requester, draft()).await.unwrap();
        let result = service.record_payment(&payer, request.id, "receipts/0001.pdf").await;
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));

        let unchanged = store.expense_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ExpenseStatus::Submitted);
        assert!(unchanged.receipts.is_empty());
    }

    #[tokio::test]
    async fn test_self_approval_rejected() {
        let (_, service) = service();
        // Managers hold both expenses:create and expenses:approve.
        let manager = Actor::new(Uuid::new_v4(), Role::Manager);
        let request = service.submit(&manager, draft()).await.unwrap();

        let result = service.decide(&manager, request.id, ApprovalDecision::Approved).await;
        assert!(matches!(result, Err(DomainError::ConflictOfInterest { .. })));
    }

    #[tokio::test]
    async fn test_unauthorized_decision_leaves_no_event() {
        let (store, service) = service();
        let requester = Actor::new(Uuid::new_v4(), Role::Maintenance);
        let request = service.submit(&requester, draft()).await.unwrap();
        let events_before = store.event_count().await;

        let result = service
            .decide(&requester, request.id, ApprovalDecision::Approved)
            .await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
        assert_eq!(store.event_count().await, events_before);
    }

    #[tokio::test]
    async fn test_scoped_submission_requires_assignment() {
        let (store, service) = service();
        let property = crate::domain::Property::new("Marina Towers".into(), "12 Corniche Rd".into(), None)
            .unwrap();
        let property_id = property.id;
        store.seed_property(property).await;

        let mut d = draft();
        d.property_id = Some(property_id);

        let outsider = Actor::with_scopes(Uuid::new_v4(), Role::Maintenance, vec![Uuid::new_v4()]);
        let result = service.submit(&outsider, d.clone()).await;
        assert!(matches!(result, Err(DomainError::Unauthorized { .. })));

        let insider = Actor::with_scopes(Uuid::new_v4(), Role::Maintenance, vec![property_id]);
        assert!(service.submit(&insider, d).await.is_ok());
    }

    #[tokio::test]
    async fn test_receipt_attachment_on_live_request_only() {
        let (_, service) = service();
        let requester = Actor::new(Uuid::new_v4(), Role::Maintenance);
        let approver = Actor::new(Uuid::new_v4(), Role::Manager);

        let request = service.submit(&requester, draft()).await.unwrap();
        let updated = service
            .attach_receipt(&requester, request.id, ReceiptKind::Purchase, "receipts/po-91.pdf")
            .await
            .unwrap();
        assert_eq!(updated.receipts.len(), 1);

        service
            .decide(&approver, request.id, ApprovalDecision::Rejected)
            .await
            .unwrap();
        let result = service
            .attach_receipt(&requester, request.id, ReceiptKind::Purchase, "receipts/po-92.pdf")
            .await;
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }
}
