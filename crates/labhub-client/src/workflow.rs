//! Order submission: transmit, then fetch the requisition on a best-effort basis.

use labhub_config::SiteOptions;
use labhub_core::{HubError, LabOrder, Result};
use tracing::{info, warn};

use crate::order::OrderTransmitter;
use crate::requisition::RequisitionFetcher;
use crate::retry::{RetryOutcome, RetryPolicy, retry_with_backoff};

/// What happened to the requisition after the order went through.
#[derive(Debug)]
pub enum RequisitionStatus {
    /// Download disabled by site options.
    Skipped,
    Saved { file: String },
    Failed { attempts: u32, last_error: HubError },
}

#[derive(Debug)]
pub struct SubmissionOutcome {
    /// Raw hub response to the order transmission
    pub response: String,
    pub requisition: RequisitionStatus,
}

/// Hook for hosts that wire order submission into their own event system.
#[derive(Debug, Clone)]
pub struct LabOrderWorkflow {
    transmitter: OrderTransmitter,
    fetcher: RequisitionFetcher,
    policy: RetryPolicy,
    site: SiteOptions,
}

impl LabOrderWorkflow {
    pub fn new(
        transmitter: OrderTransmitter,
        fetcher: RequisitionFetcher,
        policy: RetryPolicy,
        site: SiteOptions,
    ) -> Self {
        Self {
            transmitter,
            fetcher,
            policy,
            site,
        }
    }

    /// Transmits the order. A transmission failure is returned as an error;
    /// a requisition failure is reported in the outcome only.
    pub async fn submit(&self, order: &LabOrder) -> Result<SubmissionOutcome> {
        let order_id = order.order_id();
        let response = self.transmitter.transmit(&order.hl7).await?;

        if !self.site.download_requisition {
            info!(order_id, "Requisition download disabled, skipping");
            return Ok(SubmissionOutcome {
                response,
                requisition: RequisitionStatus::Skipped,
            });
        }

        let outcome = retry_with_backoff(&self.policy, "requisition", |_| self.fetcher.fetch(order)).await;
        let requisition = match outcome {
            RetryOutcome::Succeeded { value, .. } => RequisitionStatus::Saved {
                file: value.file_name,
            },
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                warn!(order_id, attempts, error = %last_error, "Requisition could not be retrieved");
                RequisitionStatus::Failed {
                    attempts,
                    last_error,
                }
            }
        };

        Ok(SubmissionOutcome {
            response,
            requisition,
        })
    }
}
