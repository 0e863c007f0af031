//! Audit events. Every observable engine outcome is logged here.
//!
//! RULE: Events are append-only. Variants are added, never removed
//! or reordered; stored payloads must stay readable.

use crate::{
    error::SimResult,
    risk_profile::RiskProfileTag,
    types::{ClientId, ProductId, SimulationId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    CatalogSeeded {
        product_count: usize,
    },
    SimulationRecorded {
        simulation_id: SimulationId,
        client_id: ClientId,
        product_id: ProductId,
        effective_rate: f64,
        final_value: f64,
        synthetic_index_rate: bool,
    },
    RiskProfileComputed {
        client_id: ClientId,
        profile: RiskProfileTag,
        score: u8,
    },
}

impl SimEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            SimEvent::CatalogSeeded { .. } => "catalog_seeded",
            SimEvent::SimulationRecorded { .. } => "simulation_recorded",
            SimEvent::RiskProfileComputed { .. } => "risk_profile_computed",
        }
    }

    /// Component that emitted the event.
    pub fn component(&self) -> &'static str {
        match self {
            SimEvent::CatalogSeeded { .. } => "catalog",
            SimEvent::SimulationRecorded { .. } => "orchestrator",
            SimEvent::RiskProfileComputed { .. } => "risk_profile",
        }
    }
}

/// Destination for audit events outside a store transaction.
pub trait EventSink {
    fn record(&self, event: &SimEvent) -> SimResult<()>;
}

/// A persisted event row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub component: String,
    pub event_type: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

impl EventLogEntry {
    pub fn from_event(event: &SimEvent, created_at: DateTime<Utc>) -> serde_json::Result<Self> {
        Ok(Self {
            id: None,
            component: event.component().to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
            created_at,
        })
    }

    pub fn decode(&self) -> serde_json::Result<SimEvent> {
        serde_json::from_str(&self.payload)
    }
}
