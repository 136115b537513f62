//! In-memory agreement store for tests and demos

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AgreementStore, columns};
use crate::error::{Result, StoreError};
use crate::model::{ConsumptionRecord, CustomerRecord, FieldActivity, Table};

/// Agreement data held in vectors, with the same joins as the SQL store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    customers: Vec<CustomerRecord>,
    consumption: Vec<ConsumptionRecord>,
    activities: Vec<FieldActivity>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(
        mut self,
        agreement_id: impl Into<String>,
        customer_name: impl Into<String>,
        service_point_id: impl Into<String>,
    ) -> Self {
        self.customers.push(CustomerRecord {
            agreement_id: agreement_id.into(),
            customer_name: customer_name.into(),
            service_point_id: service_point_id.into(),
        });
        self
    }

    pub fn with_consumption(mut self, agreement_id: impl Into<String>, date: NaiveDate, kwh: f64) -> Self {
        self.consumption.push(ConsumptionRecord {
            agreement_id: agreement_id.into(),
            date,
            kwh,
        });
        self
    }

    pub fn with_activity(
        mut self,
        service_point_id: impl Into<String>,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        self.activities.push(FieldActivity {
            service_point_id: service_point_id.into(),
            description: description.into(),
            date,
        });
        self
    }

    /// Every lookup fails as if the backing store were unreachable
    pub const fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    fn customer(&self, agreement_id: &str) -> Option<&CustomerRecord> {
        self.customers.iter().find(|c| c.agreement_id == agreement_id)
    }
}

#[async_trait]
impl AgreementStore for MemoryStore {
    async fn customer_master(&self, agreement_id: &str) -> Result<Table> {
        self.ensure_online()?;
        let mut table = Table::new(columns::MASTER);
        if let Some(customer) = self.customer(agreement_id) {
            table.push_row(vec![
                customer.agreement_id.as_str().into(),
                customer.customer_name.as_str().into(),
                customer.service_point_id.as_str().into(),
            ]);
        }
        Ok(table)
    }

    async fn consumption_records(&self, agreement_id: &str) -> Result<Table> {
        self.ensure_online()?;
        let mut table = Table::new(columns::CONSUMPTION);
        let Some(customer) = self.customer(agreement_id) else {
            return Ok(table);
        };

        let mut records: Vec<&ConsumptionRecord> = self
            .consumption
            .iter()
            .filter(|r| r.agreement_id == agreement_id)
            .collect();
        records.sort_by_key(|r| r.date);
        for record in records {
            table.push_row(vec![
                customer.customer_name.as_str().into(),
                record.date.into(),
                record.kwh.into(),
            ]);
        }
        Ok(table)
    }

    async fn field_activities(&self, agreement_id: &str) -> Result<Table> {
        self.ensure_online()?;
        let mut table = Table::new(columns::ACTIVITIES);
        let Some(customer) = self.customer(agreement_id) else {
            return Ok(table);
        };

        let mut activities: Vec<&FieldActivity> = self
            .activities
            .iter()
            .filter(|a| a.service_point_id == customer.service_point_id)
            .collect();
        activities.sort_by_key(|a| a.date);
        for activity in activities {
            table.push_row(vec![
                customer.customer_name.as_str().into(),
                activity.description.as_str().into(),
                activity.date.into(),
            ]);
        }
        Ok(table)
    }

    async fn health_check(&self) -> bool {
        !self.offline
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_customer("A100", "Ana Ruiz", "PS-1")
            .with_consumption("A100", date(2024, 2, 29), 410.0)
            .with_consumption("A100", date(2024, 1, 31), 350.5)
            .with_consumption("ORPHAN", date(2024, 1, 31), 1.0)
            .with_activity("PS-1", "Cambio de medidor", date(2024, 3, 10))
    }

    #[tokio::test]
    async fn test_joins_follow_sql_store() {
        let store = store();

        let master = store.customer_master("A100").await.unwrap();
        assert_eq!(master.columns, columns::MASTER);
        assert_eq!(master.len(), 1);

        let consumption = store.consumption_records("A100").await.unwrap();
        assert_eq!(consumption.rows[0][1], Cell::from("2024-01-31"));
        assert_eq!(consumption.rows[1][2], Cell::Real(410.0));

        let activities = store.field_activities("A100").await.unwrap();
        assert_eq!(activities.rows[0][0], Cell::from("Ana Ruiz"));
    }

    #[tokio::test]
    async fn test_consumption_without_master_row_is_dropped() {
        let store = store();
        assert!(store.consumption_records("ORPHAN").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline() {
        let store = store().offline();
        assert!(!store.health_check().await);
        assert!(matches!(
            store.customer_master("A100").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
