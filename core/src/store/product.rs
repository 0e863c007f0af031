use super::{bool_column, enum_column, SimStore};
use crate::{
    catalog::{ProductCatalog, ProductFilter},
    error::SimResult,
    event::SimEvent,
    product::Product,
    types::ProductId,
};
use rusqlite::{params, OptionalExtension, Row};

const PRODUCT_COLUMNS: &str = "product_id, name, product_type, rate_type, base_rate, rate_period,
     benchmark_index, liquidity_days, minimum_investment_days, fgc_protected, risk_level";

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        product_type: enum_column(row, 2)?,
        rate_type: enum_column(row, 3)?,
        base_rate: row.get(4)?,
        rate_period: enum_column(row, 5)?,
        benchmark_index: enum_column(row, 6)?,
        liquidity_days: row.get(7)?,
        minimum_investment_days: row.get(8)?,
        fgc_protected: bool_column(row, 9)?,
        risk_level: enum_column(row, 10)?,
    })
}

impl SimStore {
    // ── Product ───────────────────────────────────────────────────

    /// Insert or replace the product with the same id.
    pub fn insert_product(&self, p: &Product) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO product (
                product_id, name, product_type, rate_type, base_rate, rate_period,
                benchmark_index, liquidity_days, minimum_investment_days, fgc_protected, risk_level
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (product_id) DO UPDATE SET
                name = excluded.name,
                product_type = excluded.product_type,
                rate_type = excluded.rate_type,
                base_rate = excluded.base_rate,
                rate_period = excluded.rate_period,
                benchmark_index = excluded.benchmark_index,
                liquidity_days = excluded.liquidity_days,
                minimum_investment_days = excluded.minimum_investment_days,
                fgc_protected = excluded.fgc_protected,
                risk_level = excluded.risk_level",
            params![
                p.id,
                &p.name,
                p.product_type.as_str(),
                p.rate_type.as_str(),
                p.base_rate,
                p.rate_period.as_str(),
                p.benchmark_index.as_str(),
                p.liquidity_days,
                p.minimum_investment_days,
                if p.fgc_protected { 1i64 } else { 0i64 },
                p.risk_level.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Upsert the whole catalog in one transaction. Investments keep
    /// pointing at the same product ids.
    pub fn seed_catalog(&self, products: &[Product]) -> SimResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for p in products {
            self.insert_product(p)?;
        }
        super::append_event_on(
            &tx,
            &SimEvent::CatalogSeeded {
                product_count: products.len(),
            },
        )?;
        tx.commit()?;
        log::info!("catalog: seeded {} products", products.len());
        Ok(products.len())
    }

    pub fn product_count(&self) -> SimResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl ProductCatalog for SimStore {
    fn list_all(&self) -> SimResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY product_id ASC"
        ))?;
        let rows = stmt.query_map([], product_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn find_by_id(&self, id: ProductId) -> SimResult<Option<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE product_id = ?1"
        ))?;
        let product = stmt
            .query_row(params![id], product_from_row)
            .optional()?;
        Ok(product)
    }

    fn find_by_name(&self, name: &str) -> SimResult<Option<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE name = ?1 COLLATE NOCASE"
        ))?;
        let product = stmt
            .query_row(params![name], product_from_row)
            .optional()?;
        Ok(product)
    }

    fn find_by_filter(&self, filter: &ProductFilter) -> SimResult<Vec<Product>> {
        // Equality filters go to SQL; the liquidity bound stays in
        // ProductFilter::matches so both paths share one definition.
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE (?1 IS NULL OR product_type = ?1)
               AND (?2 IS NULL OR rate_type = ?2)
               AND (?3 IS NULL OR benchmark_index = ?3)
               AND (?4 IS NULL OR fgc_protected = ?4)
             ORDER BY product_id ASC"
        ))?;
        let rows = stmt.query_map(
            params![
                filter.product_type.map(|t| t.as_str()),
                filter.rate_type.map(|r| r.as_str()),
                filter.benchmark_index.map(|i| i.as_str()),
                filter.fgc_protected.map(|f| if f { 1i64 } else { 0i64 }),
            ],
            product_from_row,
        )?;
        let products = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(products.into_iter().filter(|p| filter.matches(p)).collect())
    }
}
