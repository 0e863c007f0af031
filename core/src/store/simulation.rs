use super::{append_event_on, bool_column, term_column, timestamp_column, SimStore};
use crate::{
    error::SimResult,
    event::SimEvent,
    history::{SimulationRecord, SimulationRepository},
    types::ProductId,
};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

pub(super) const SIMULATION_COLUMNS: &str = "simulation_id, client_id, product_id, product_name,
     invested_amount, term_months, term_days, term_years, final_value, effective_rate,
     yield_amount, scenario_description, synthetic_index_rate, simulated_at";

pub(super) fn simulation_from_row(row: &Row<'_>) -> rusqlite::Result<SimulationRecord> {
    Ok(SimulationRecord {
        id: Some(row.get(0)?),
        client_id: row.get(1)?,
        product_id: row.get(2)?,
        product_name: row.get(3)?,
        invested_amount: row.get(4)?,
        term_months: term_column(row, 5)?,
        term_days: term_column(row, 6)?,
        term_years: term_column(row, 7)?,
        final_value: row.get(8)?,
        effective_rate: row.get(9)?,
        yield_amount: row.get(10)?,
        scenario_description: row.get(11)?,
        synthetic_index_rate: bool_column(row, 12)?,
        simulated_at: timestamp_column(row, 13)?,
    })
}

/// Simulations of one product on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProductSummary {
    pub product_id: ProductId,
    pub product_name: String,
    pub day: String,
    pub simulation_count: i64,
    pub average_final_value: f64,
}

impl SimStore {
    // ── Simulation ────────────────────────────────────────────────

    pub fn all_simulations(&self) -> SimResult<Vec<SimulationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SIMULATION_COLUMNS} FROM simulation ORDER BY simulation_id ASC"
        ))?;
        let rows = stmt.query_map([], simulation_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn simulation_count(&self) -> SimResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM simulation", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn simulations_per_product_per_day(&self) -> SimResult<Vec<DailyProductSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT product_id, product_name, substr(simulated_at, 1, 10) AS day,
                    COUNT(*), AVG(final_value)
             FROM simulation
             GROUP BY product_id, product_name, day
             ORDER BY day ASC, product_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DailyProductSummary {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                day: row.get(2)?,
                simulation_count: row.get(3)?,
                average_final_value: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl SimulationRepository for SimStore {
    /// Record row and audit event commit together or not at all.
    fn save(&self, record: SimulationRecord) -> SimResult<SimulationRecord> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO simulation (
                client_id, product_id, product_name, invested_amount,
                term_months, term_days, term_years, final_value, effective_rate,
                yield_amount, scenario_description, synthetic_index_rate, simulated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.client_id,
                record.product_id,
                &record.product_name,
                record.invested_amount,
                record.term_months.map(|v| v as i64),
                record.term_days.map(|v| v as i64),
                record.term_years.map(|v| v as i64),
                record.final_value,
                record.effective_rate,
                record.yield_amount,
                &record.scenario_description,
                if record.synthetic_index_rate { 1i64 } else { 0i64 },
                record.simulated_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        append_event_on(
            &tx,
            &SimEvent::SimulationRecorded {
                simulation_id: id,
                client_id: record.client_id,
                product_id: record.product_id,
                effective_rate: record.effective_rate,
                final_value: record.final_value,
                synthetic_index_rate: record.synthetic_index_rate,
            },
        )?;
        tx.commit()?;

        log::debug!(
            "store: simulation {id} saved for client {} product {}",
            record.client_id,
            record.product_id
        );
        Ok(SimulationRecord {
            id: Some(id),
            ..record
        })
    }
}
