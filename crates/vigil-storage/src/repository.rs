//! RunRepository: persists one health-check run plus its triggered rules
//! in a single transaction.

use std::sync::Arc;

use rusqlite::Connection;

use vigil_core::errors::VigilResult;
use vigil_core::models::HealthCheckRun;
use vigil_core::SubmissionRequest;
use vigil_crypto::{EncryptedPayload, EncryptionGateway};

use crate::queries::{company_ops, run_insert, run_read, triggered_rules};
use crate::to_storage_err;

/// Persists submissions. Owns the encryption gateway; extraction is pure
/// and stateless, so the repository itself carries no other state and is
/// shared freely between backends and workers.
pub struct RunRepository {
    gateway: Arc<EncryptionGateway>,
}

impl RunRepository {
    pub fn new(gateway: Arc<EncryptionGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &EncryptionGateway {
        &self.gateway
    }

    /// Insert one run and its triggered rules, all-or-nothing.
    ///
    /// Ordered steps inside one transaction: resolve company, extract
    /// metadata and rules, encrypt findings, insert the run row, insert
    /// the triggered rules (individually skippable), commit. Any error
    /// before commit rolls the whole transaction back.
    pub fn insert(&self, conn: &Connection, req: &SubmissionRequest) -> VigilResult<i64> {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("insert run begin: {e}")))?;

        match self.insert_inner(&tx, req) {
            Ok(run_id) => {
                tx.commit()
                    .map_err(|e| to_storage_err(format!("insert run commit: {e}")))?;
                Ok(run_id)
            }
            Err(e) => {
                let _ = tx.rollback();
                Err(e)
            }
        }
    }

    fn insert_inner(&self, conn: &Connection, req: &SubmissionRequest) -> VigilResult<i64> {
        let company_id = company_ops::get_or_create_company(conn, &req.target_info.company_name)?;

        let meta = vigil_extract::metadata::extract(&req.structured_findings);
        let rules = vigil_extract::rule_findings::extract(&req.analysis_results);
        let health_score = vigil_extract::health_score::resolve(&req.analysis_results);

        let payload = self.gateway.encrypt(&req.findings_json)?;

        let run_id = run_insert::insert_run(conn, req, company_id, &meta, &payload, health_score)?;
        let inserted = triggered_rules::insert_triggered_rules(conn, run_id, &rules);

        tracing::info!(
            run_id,
            company_id,
            db_type = %req.target_info.db_type,
            mode = %payload.mode,
            rules_extracted = rules.len(),
            rules_inserted = inserted,
            health_score,
            "health check run persisted"
        );
        Ok(run_id)
    }

    /// Fetch a stored run.
    pub fn get_run(&self, conn: &Connection, id: i64) -> VigilResult<Option<HealthCheckRun>> {
        run_read::get_run(conn, id)
    }

    /// Decrypt a stored run's findings using its persisted mode tag.
    pub fn decrypt_findings(&self, run: &HealthCheckRun) -> VigilResult<String> {
        let payload = EncryptedPayload {
            mode: run.encryption_mode,
            ciphertext: run.findings_ciphertext.clone(),
            wrapped_data_key: run.wrapped_data_key.clone(),
        };
        self.gateway.decrypt(&payload)
    }
}
