use super::{
    bool_column, date_column, enum_column,
    simulation::{simulation_from_row, SIMULATION_COLUMNS},
    SimStore, DATE_FORMAT,
};
use crate::{
    error::SimResult,
    history::{ClientHistory, Investment, ProductSnapshot, SimulationRecord},
    types::ClientId,
};
use rusqlite::{params, OptionalExtension, Row};

fn investment_from_row(row: &Row<'_>) -> rusqlite::Result<Investment> {
    Ok(Investment {
        id: Some(row.get(0)?),
        client_id: row.get(1)?,
        product_id: row.get(2)?,
        amount: row.get(3)?,
        invested_on: date_column(row, 4)?,
        snapshot: ProductSnapshot {
            product_type: enum_column(row, 5)?,
            rate_type: enum_column(row, 6)?,
            base_rate: row.get(7)?,
            rate_period: enum_column(row, 8)?,
            benchmark_index: enum_column(row, 9)?,
            liquidity_days: row.get(10)?,
            minimum_investment_days: row.get(11)?,
            fgc_protected: bool_column(row, 12)?,
        },
    })
}

impl SimStore {
    // ── Investment ────────────────────────────────────────────────

    /// Persist a holding and return its assigned id.
    pub fn insert_investment(&self, inv: &Investment) -> SimResult<i64> {
        let s = &inv.snapshot;
        self.conn.execute(
            "INSERT INTO investment (
                client_id, product_id, amount, invested_on,
                product_type, rate_type, base_rate, rate_period, benchmark_index,
                liquidity_days, minimum_investment_days, fgc_protected
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                inv.client_id,
                inv.product_id,
                inv.amount,
                inv.invested_on.format(DATE_FORMAT).to_string(),
                s.product_type.as_str(),
                s.rate_type.as_str(),
                s.base_rate,
                s.rate_period.as_str(),
                s.benchmark_index.as_str(),
                s.liquidity_days,
                s.minimum_investment_days,
                if s.fgc_protected { 1i64 } else { 0i64 },
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl ClientHistory for SimStore {
    fn investments_by_client(&self, client_id: ClientId) -> SimResult<Vec<Investment>> {
        let mut stmt = self.conn.prepare(
            "SELECT investment_id, client_id, product_id, amount, invested_on,
                    product_type, rate_type, base_rate, rate_period, benchmark_index,
                    liquidity_days, minimum_investment_days, fgc_protected
             FROM investment WHERE client_id = ?1
             ORDER BY invested_on ASC, investment_id ASC",
        )?;
        let rows = stmt.query_map(params![client_id], investment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn simulations_by_client(&self, client_id: ClientId) -> SimResult<Vec<SimulationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SIMULATION_COLUMNS} FROM simulation WHERE client_id = ?1
             ORDER BY simulation_id ASC"
        ))?;
        let rows = stmt.query_map(params![client_id], simulation_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn investment_count(&self, client_id: ClientId) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM investment WHERE client_id = ?1",
            params![client_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn total_invested(&self, client_id: ClientId) -> SimResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM investment WHERE client_id = ?1",
            params![client_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn last_simulation(&self, client_id: ClientId) -> SimResult<Option<SimulationRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SIMULATION_COLUMNS} FROM simulation WHERE client_id = ?1
             ORDER BY simulation_id DESC LIMIT 1"
        ))?;
        let record = stmt
            .query_row(params![client_id], simulation_from_row)
            .optional()?;
        Ok(record)
    }
}
