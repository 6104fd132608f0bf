use super::SimStore;
use crate::{budget_subsystem::FinancialRecord, error::SimResult, types::Tick};
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// One yearly evaluation as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub city_time: u64,
    pub score: i32,
    pub delta_score: i32,
    pub population: i64,
    pub class: u8,
    pub approval: u32,
}

impl SimStore {
    // ── Financial history ──────────────────────────────────────────

    pub fn insert_financial_record(
        &self,
        run_id: &str,
        tick: Tick,
        r: &FinancialRecord,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO financial_history (
                run_id, tick, city_time, tax_income, operating_expenses, cash_flow, total_funds
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                tick as i64,
                r.city_time as i64,
                r.tax_income,
                r.operating_expenses,
                r.tax_income - r.operating_expenses,
                r.total_funds,
            ],
        )?;
        Ok(())
    }

    /// Yearly records, oldest first.
    pub fn financial_history(&self, run_id: &str) -> SimResult<Vec<FinancialRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_time, tax_income, operating_expenses, total_funds
             FROM financial_history WHERE run_id = ?1
             ORDER BY city_time ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(FinancialRecord {
                    city_time: row.get::<_, i64>(0)? as u64,
                    tax_income: row.get(1)?,
                    operating_expenses: row.get(2)?,
                    total_funds: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Evaluation history ─────────────────────────────────────────

    pub fn insert_evaluation_record(
        &self,
        run_id: &str,
        tick: Tick,
        r: &EvaluationRecord,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO evaluation_history (
                run_id, tick, city_time, score, delta_score, population, class, approval
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run_id,
                tick as i64,
                r.city_time as i64,
                r.score,
                r.delta_score,
                r.population,
                r.class,
                r.approval,
            ],
        )?;
        Ok(())
    }

    pub fn evaluation_history(&self, run_id: &str) -> SimResult<Vec<EvaluationRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT city_time, score, delta_score, population, class, approval
             FROM evaluation_history WHERE run_id = ?1
             ORDER BY city_time ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok(EvaluationRecord {
                    city_time: row.get::<_, i64>(0)? as u64,
                    score: row.get(1)?,
                    delta_score: row.get(2)?,
                    population: row.get(3)?,
                    class: row.get(4)?,
                    approval: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Test helper methods ───────────────────────────────────────

    pub fn financial_record_count(&self, run_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM financial_history WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    pub fn evaluation_record_count(&self, run_id: &str) -> SimResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM evaluation_history WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}
