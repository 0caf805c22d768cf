//! Infrastructure wiring: event store, bus, price catalog, requisition
//! projection and the workflow service on top of them.

use std::sync::Arc;

use anyhow::Context;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use procura_core::{Aggregate, TenantId};
use procura_events::{EventBus, EventEnvelope, InMemoryEventBus};
use procura_infra::{
    catalog::{InMemoryPriceCatalog, PostgresPriceCatalog, PriceCatalog},
    event_store::{EventStore, InMemoryEventStore, PostgresEventStore, PublishingEventStore},
    projections::{RequisitionSummary, RequisitionsProjection},
    read_model::InMemoryTenantStore,
    workflow::ProcurementService,
};
use procura_procurement::{Requisition, RequisitionId};

use crate::config::AppConfig;

type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

pub type RequisitionsReadModel =
    RequisitionsProjection<Arc<InMemoryTenantStore<RequisitionId, RequisitionSummary>>>;

#[derive(Clone)]
pub struct AppServices {
    pub procurement: ProcurementService,
    requisitions: Arc<RequisitionsReadModel>,
}

impl AppServices {
    /// Requisition list of a tenant from the read model, newest first.
    pub fn requisitions_list(&self, tenant_id: TenantId) -> Vec<RequisitionSummary> {
        self.requisitions.list(tenant_id)
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.database_url {
        Some(url) => build_persistent_services(config, url).await,
        None => build_in_memory_services(config).await,
    }
}

async fn build_in_memory_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    tracing::info!("using in-memory event store and price catalog");
    wire(
        config,
        InMemoryEventStore::new(),
        Arc::new(InMemoryPriceCatalog::new()),
    )
    .await
}

async fn build_persistent_services(config: &AppConfig, url: &str) -> anyhow::Result<AppServices> {
    let pool = PgPool::connect(url)
        .await
        .context("failed to connect to Postgres")?;

    let store = PostgresEventStore::new(pool.clone());
    store.migrate().await.context("event store migration failed")?;

    let catalog = PostgresPriceCatalog::new(pool);
    catalog.migrate().await.context("price catalog migration failed")?;

    tracing::info!("using Postgres event store and price catalog");
    wire(config, store, Arc::new(catalog)).await
}

async fn wire<S>(
    config: &AppConfig,
    store: S,
    catalog: Arc<dyn PriceCatalog>,
) -> anyhow::Result<AppServices>
where
    S: EventStore + 'static,
{
    let requisitions: Arc<RequisitionsReadModel> =
        Arc::new(RequisitionsProjection::new(Arc::new(InMemoryTenantStore::new())));

    // Replay what is already stored before live envelopes arrive.
    let history = store
        .load_by_aggregate_type(Requisition::AGGREGATE_TYPE)
        .await
        .context("failed to load requisition history")?;
    let replayed = history.len();
    requisitions
        .rebuild_from_scratch(history.iter().map(|e| e.to_envelope()))
        .context("failed to rebuild requisition read model")?;
    tracing::info!(events = replayed, "requisition read model rebuilt");

    let bus: Bus = Arc::new(InMemoryEventBus::new());
    spawn_projection_worker(&bus, requisitions.clone());

    let store: Arc<dyn EventStore> = Arc::new(PublishingEventStore::new(store, bus));
    let procurement =
        ProcurementService::new(store, catalog).with_max_attempts(config.commit_max_attempts);

    Ok(AppServices {
        procurement,
        requisitions,
    })
}

fn spawn_projection_worker(bus: &Bus, requisitions: Arc<RequisitionsReadModel>) {
    let sub = bus.subscribe();
    std::thread::spawn(move || {
        while let Ok(env) = sub.recv() {
            if let Err(e) = requisitions.apply_envelope(&env) {
                tracing::warn!(
                    error = %e,
                    aggregate_id = %env.aggregate_id(),
                    sequence_number = env.sequence_number(),
                    "failed to apply envelope to requisition read model"
                );
            }
        }
        tracing::debug!("projection worker stopped: bus closed");
    });
}
