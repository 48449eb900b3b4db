// src/warehouse/bigquery.rs

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use google_cloud_bigquery::{
    client::{Client, ClientConfig},
    http::{
        job::{
            get::GetJobRequest, CreateDisposition, Job, JobConfiguration, JobConfigurationLoad,
            JobReference, JobState, JobType, WriteDisposition,
        },
        table::{SourceFormat, TableReference},
    },
};
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::{TableRef, Warehouse};
use crate::storage::ObjectStore;

/// BigQuery warehouse. Load jobs read their CSV from a staging object that
/// is written just before the job and removed right after it.
pub struct BigQueryWarehouse {
    client: Client,
    store: Arc<dyn ObjectStore>,
    bucket: String,
    staging_prefix: String,
    poll_interval: Duration,
}

impl BigQueryWarehouse {
    pub async fn new(
        store: Arc<dyn ObjectStore>,
        bucket: &str,
        staging_prefix: &str,
        poll_interval: Duration,
    ) -> Result<Self> {
        let (config, _project) = ClientConfig::new_with_auth()
            .await
            .context("authenticating BigQuery client")?;
        let client = Client::new(config)
            .await
            .context("creating BigQuery client")?;

        Ok(Self {
            client,
            store,
            bucket: bucket.to_string(),
            staging_prefix: staging_prefix.trim_end_matches('/').to_string(),
            poll_interval,
        })
    }

    fn staging_object(&self, table: &TableRef, stamp: &str) -> String {
        format!(
            "{}/{}_{}_{}.csv",
            self.staging_prefix, table.dataset, table.table, stamp
        )
    }

    async fn run_load_job(&self, table: &TableRef, job_id: &str, staged: &str) -> Result<()> {
        let job = Job {
            job_reference: JobReference {
                project_id: table.project.clone(),
                job_id: job_id.to_string(),
                location: None,
            },
            configuration: JobConfiguration {
                job: JobType::Load(JobConfigurationLoad {
                    source_uris: vec![format!("gs://{}/{}", self.bucket, staged)],
                    source_format: Some(SourceFormat::Csv),
                    destination_table: TableReference {
                        project_id: table.project.clone(),
                        dataset_id: table.dataset.clone(),
                        table_id: table.table.clone(),
                    },
                    create_disposition: Some(CreateDisposition::CreateNever),
                    write_disposition: Some(WriteDisposition::WriteAppend),
                    skip_leading_rows: Some(1),
                    allow_quoted_newlines: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let created = self
            .client
            .job()
            .create(&job)
            .await
            .with_context(|| format!("submitting load job for {}", table))?;
        let request = GetJobRequest {
            location: created.job_reference.location.clone(),
        };
        debug!(job_id, "load job submitted");

        loop {
            let current = self
                .client
                .job()
                .get(&table.project, job_id, &request)
                .await
                .with_context(|| format!("polling load job {}", job_id))?;

            if matches!(current.status.state, JobState::Done) {
                if let Some(err) = current.status.error_result {
                    bail!("load job {} into {} failed: {:?}", job_id, table, err);
                }
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn schema(&self, table: &TableRef) -> Result<Vec<String>> {
        let meta = self
            .client
            .table()
            .get(&table.project, &table.dataset, &table.table)
            .await
            .with_context(|| format!("fetching table {}", table))?;

        let fields = meta
            .schema
            .ok_or_else(|| anyhow!("table {} has no schema", table))?
            .fields;
        Ok(fields.into_iter().map(|f| f.name).collect())
    }

    #[instrument(level = "info", skip(self, csv), fields(table = %table, bytes = csv.len()))]
    async fn load_append(&self, table: &TableRef, csv: Vec<u8>) -> Result<()> {
        let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
        let staged = self.staging_object(table, &stamp);
        let job_id = format!("ventas_{}_{}", table.table, stamp);

        self.store
            .put(&self.bucket, &staged, csv)
            .await
            .context("staging CSV for load job")?;

        let outcome = self.run_load_job(table, &job_id, &staged).await;

        if let Err(e) = self.store.delete(&self.bucket, &staged).await {
            warn!(object = %staged, error = %e, "could not remove staged CSV");
        }
        if outcome.is_ok() {
            info!(job_id, "load job done");
        }
        outcome
    }
}
