// ==========================================
// 整车配置规划 - 概率场景仓储
// ==========================================

use crate::domain::derivation::ClassProbabilities;
use crate::domain::version::ProbabilityScenario;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_column;
use crate::repository::version_repo::parse_timestamp;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

fn map_scenario(row: &Row<'_>) -> rusqlite::Result<ProbabilityScenario> {
    Ok(ProbabilityScenario {
        id: row.get(0)?,
        name: row.get(1)?,
        product_id: row.get(2)?,
        region_id: row.get(3)?,
        input_probabilities: json_column::decode(row, 4)?,
        created_at: parse_timestamp(row, 5)?,
    })
}

pub struct ProbabilityScenarioRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProbabilityScenarioRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存场景 (分配新 uuid)
    pub fn save(
        &self,
        name: &str,
        product_id: Option<&str>,
        region_id: &str,
        inputs: &ClassProbabilities,
    ) -> RepositoryResult<ProbabilityScenario> {
        let scenario = ProbabilityScenario {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            product_id: product_id.map(str::to_string),
            region_id: region_id.to_string(),
            input_probabilities: inputs.clone(),
            created_at: Utc::now(),
        };

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO probability_scenario (
                id, name, product_id, region_id, input_probabilities, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                scenario.id,
                scenario.name,
                scenario.product_id,
                scenario.region_id,
                json_column::encode(&scenario.input_probabilities)?,
                scenario.created_at.to_rfc3339(),
            ],
        )?;
        Ok(scenario)
    }

    pub fn list(&self) -> RepositoryResult<Vec<ProbabilityScenario>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, product_id, region_id, input_probabilities, created_at
             FROM probability_scenario ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], map_scenario)?;
        let scenarios = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(scenarios)
    }

    pub fn delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        if conn.execute("DELETE FROM probability_scenario WHERE id = ?1", params![id])? == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProbabilityScenario".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
