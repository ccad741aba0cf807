use super::RunStore;
use crate::{
    aggregate::{AggregatedReport, ReportRow},
    error::GenResult,
    labeler::PersonLabelAttributes,
};
use rusqlite::params;

impl RunStore {
    // ── Report ─────────────────────────────────────────────────

    pub fn insert_report(&mut self, run_id: &str, report: &AggregatedReport) -> GenResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO report_row (run_id, row_index, attrs_key, impressions, reach)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (index, row) in report.rows.iter().enumerate() {
                let key = row.attrs.as_ref().map(|a| a.canonical_key()).transpose()?;
                stmt.execute(params![
                    run_id,
                    index as i64,
                    key,
                    row.impressions as i64,
                    row.reach as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Rebuild a stored report, labels decoded from their canonical keys.
    pub fn report_for_run(&self, run_id: &str) -> GenResult<AggregatedReport> {
        let mut stmt = self.conn.prepare(
            "SELECT attrs_key, impressions, reach FROM report_row
             WHERE run_id = ?1 ORDER BY row_index",
        )?;
        let raw = stmt
            .query_map(params![run_id], |r| {
                Ok((
                    r.get::<_, Option<String>>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let rows = raw
            .into_iter()
            .map(|(key, impressions, reach)| -> GenResult<ReportRow> {
                Ok(ReportRow {
                    attrs: key
                        .as_deref()
                        .map(PersonLabelAttributes::from_canonical_key)
                        .transpose()?,
                    impressions: impressions as u64,
                    reach: reach as u64,
                })
            })
            .collect::<GenResult<Vec<_>>>()?;
        Ok(AggregatedReport { rows })
    }
}
