use rusqlite::{OptionalExtension, params};
use ulid::Ulid;

use crate::ledger::{Bank, Organization};
use crate::store::{SqliteStore, now_timestamp};
use crate::{ClientError, ClientResult};

impl SqliteStore {
    pub fn create_organization(&self, name: &str) -> ClientResult<Organization> {
        let organization = Organization {
            organization_id: format!("org_{}", Ulid::new()),
            name: name.to_string(),
            created_at: now_timestamp(),
        };
        self.connection
            .execute(
                "INSERT INTO organizations (organization_id, name, created_at)
                 VALUES (?1, ?2, ?3)",
                params![
                    &organization.organization_id,
                    &organization.name,
                    &organization.created_at
                ],
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        Ok(organization)
    }

    pub fn list_organizations(&self) -> ClientResult<Vec<Organization>> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT organization_id, name, created_at
                 FROM organizations
                 ORDER BY created_at ASC, organization_id ASC",
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        let rows = statement
            .query_map([], |row| {
                Ok(Organization {
                    organization_id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))
    }

    /// Every scoped command starts here; unknown owners never reach the engine.
    pub fn require_organization(&self, organization_id: &str) -> ClientResult<Organization> {
        self.connection
            .query_row(
                "SELECT organization_id, name, created_at
                 FROM organizations
                 WHERE organization_id = ?1",
                params![organization_id],
                |row| {
                    Ok(Organization {
                        organization_id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?
            .ok_or_else(|| ClientError::organization_not_found(organization_id))
    }

    pub fn create_bank(&self, organization_id: &str, name: &str) -> ClientResult<Bank> {
        let bank = Bank {
            bank_id: format!("bank_{}", Ulid::new()),
            organization_id: organization_id.to_string(),
            name: name.to_string(),
        };
        self.connection
            .execute(
                "INSERT INTO banks (bank_id, organization_id, name, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![&bank.bank_id, &bank.organization_id, &bank.name, now_timestamp()],
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        Ok(bank)
    }

    pub fn list_banks(&self, organization_id: &str) -> ClientResult<Vec<Bank>> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT bank_id, organization_id, name
                 FROM banks
                 WHERE organization_id = ?1
                 ORDER BY name ASC, bank_id ASC",
            )
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;
        let rows = statement
            .query_map(params![organization_id], |row| {
                Ok(Bank {
                    bank_id: row.get(0)?,
                    organization_id: row.get(1)?,
                    name: row.get(2)?,
                })
            })
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|error| ClientError::from_sqlite(&self.db_path, &error))
    }

    pub fn require_bank(&self, organization_id: &str, bank_id: &str) -> ClientResult<Bank> {
        self.list_banks(organization_id)?
            .into_iter()
            .find(|bank| bank.bank_id == bank_id)
            .ok_or_else(|| ClientError::bank_not_found(bank_id))
    }
}
