//! Label print orchestration: render a template, submit the job, record it
//! in the local print log.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use labeldesk_core::{PrintJobId, StorageError};
use labeldesk_print::{LabelData, PrintError, PrintLogEntry, PrintLogStore, PrintTemplate};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::services::dto::{PrintJobReceipt, PrintJobRequest};

pub const MAX_COPIES: u32 = 500;

#[derive(Debug, Error)]
pub enum PrintJobError {
    #[error(transparent)]
    Label(#[from] PrintError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("job {job_id} was submitted but could not be logged: {source}")]
    Log {
        job_id: PrintJobId,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Clone)]
pub struct PrintService {
    client: ApiClient,
    log: Arc<PrintLogStore>,
    printer: Option<String>,
}

impl PrintService {
    pub fn new(client: ApiClient, log: Arc<PrintLogStore>) -> Self {
        Self {
            client,
            log,
            printer: None,
        }
    }

    /// Route jobs to a named printer instead of the backend default.
    pub fn with_printer(mut self, printer: impl Into<String>) -> Self {
        self.printer = Some(printer.into());
        self
    }

    pub async fn print(
        &self,
        template: PrintTemplate,
        data: &LabelData,
        copies: u32,
    ) -> Result<PrintJobReceipt, PrintJobError> {
        if !(1..=MAX_COPIES).contains(&copies) {
            return Err(PrintError::InvalidCopies {
                got: copies,
                max: MAX_COPIES,
            }
            .into());
        }
        let layout = template.render(data)?;

        let request = PrintJobRequest {
            job_id: PrintJobId::new(),
            template,
            layout,
            copies,
            printer: self.printer.clone(),
        };
        let receipt: PrintJobReceipt = self.client.post("/print/jobs", &request).await?;
        tracing::info!(job = %receipt.job_id, ?template, copies, "print job submitted");

        let operator = self
            .client
            .session()
            .user_profile()
            .map(|p| p.username.unwrap_or(p.user_id));
        let entry = PrintLogEntry {
            id: receipt.job_id,
            template,
            barcode: request.layout.code.clone(),
            copies,
            operator,
            printed_at: Utc::now(),
        };
        self.log.record(entry).map_err(|source| PrintJobError::Log {
            job_id: receipt.job_id,
            source,
        })?;

        Ok(receipt)
    }

    pub fn history(&self) -> Vec<PrintLogEntry> {
        self.log.entries()
    }
}
