//! Property, unit, and tenant registry service

use std::sync::Arc;

use propcore_policy::{tokens, Actor, PolicyEngine};
use tracing::info;
use uuid::Uuid;

use crate::domain::activity_event::snapshot;
use crate::domain::{actions, entities, ActivityEvent, Property, Tenant, Unit};
use crate::error::DomainError;
use crate::repositories::TenancyStore;

/// Manages the reference registers the tenancy engine builds on:
/// properties, their units, and tenants.
pub struct RegistryService<S: TenancyStore> {
    store: Arc<S>,
    policy: PolicyEngine,
}

impl<S: TenancyStore> RegistryService<S> {
    pub fn new(store: Arc<S>, policy: PolicyEngine) -> Self {
        Self { store, policy }
    }

    pub async fn create_property(
        &self,
        actor: &Actor,
        name: String,
        address: String,
    ) -> Result<Property, DomainError> {
        super::authorize(&self.policy, actor, tokens::PROPERTIES_MANAGE)?;

        let property = Property::new(name, address, Some(actor.id))?;
        let mut tx = self.store.begin().await?;
        tx.insert_property(&property).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::PROPERTY_CREATED,
            entities::PROPERTY,
            property.id,
            None,
            Some(snapshot(&property)?),
        ))
        .await?;
        tx.commit().await?;

        info!(property_id = %property.id, "property created");
        Ok(property)
    }

    pub async fn add_unit(
        &self,
        actor: &Actor,
        property_id: Uuid,
        label: String,
    ) -> Result<Unit, DomainError> {
        super::authorize(&self.policy, actor, tokens::UNITS_MANAGE)?;

        let mut tx = self.store.begin().await?;
        tx.property_by_id(&property_id)
            .await?
            .ok_or(DomainError::NotFound { entity: "property", id: property_id })?;

        let unit = Unit::new(property_id, label, Some(actor.id))?;
        tx.insert_unit(&unit).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::UNIT_CREATED,
            entities::UNIT,
            unit.id,
            None,
            Some(snapshot(&unit)?),
        ))
        .await?;
        tx.commit().await?;

        info!(unit_id = %unit.id, %property_id, "unit added");
        Ok(unit)
    }

    pub async fn register_tenant(
        &self,
        actor: &Actor,
        full_name: String,
        email: Option<String>,
    ) -> Result<Tenant, DomainError> {
        super::authorize(&self.policy, actor, tokens::TENANTS_MANAGE)?;

        let tenant = Tenant::new(full_name, email, Some(actor.id))?;
        let mut tx = self.store.begin().await?;
        tx.insert_tenant(&tenant).await?;
        tx.record_event(&ActivityEvent::new(
            Some(actor.id),
            actions::TENANT_REGISTERED,
            entities::TENANT,
            tenant.id,
            None,
            Some(snapshot(&tenant)?),
        ))
        .await?;
        tx.commit().await?;

        info!(tenant_id = %tenant.id, "tenant registered");
        Ok(tenant)
    }
}
