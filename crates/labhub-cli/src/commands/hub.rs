use std::sync::Arc;

use anyhow::{Context, Result};
use labhub_client::{
    HttpGateway, LabOrderWorkflow, OrderTransmitter, RequisitionFetcher, RequisitionStatus,
    ResultsRetriever, RetryOutcome, RetryPolicy, TokenProvider, retry_with_backoff,
};
use labhub_config::AppConfig;
use labhub_core::{AbnRequirement, BillingType, LabOrder, OrderMetadata};
use labhub_storage::DynQuestionLookup;

use crate::cli::OrderArgs;
use crate::output::{format_time, print_field, print_success, print_warning};

pub async fn token(config: &AppConfig, show: bool) -> Result<()> {
    let provider = TokenProvider::new(&config.hub, config.hub_mode())?;
    let token = provider.get_token().await.context("Token request failed")?;

    print_success("Access token acquired");
    print_field("Endpoint", provider.token_url());
    print_field("Issued", &format_time(token.issued_at));
    print_field(
        "Expires",
        &token
            .expires_at()
            .map(format_time)
            .unwrap_or_else(|| "(not reported)".to_string()),
    );
    if show {
        println!("{}", token.access_token);
    }
    Ok(())
}

pub async fn transmit(
    config: &AppConfig,
    gateway: Arc<HttpGateway>,
    questions: DynQuestionLookup,
    args: &OrderArgs,
) -> Result<()> {
    let order = read_order(args).await?;
    let workflow = LabOrderWorkflow::new(
        OrderTransmitter::new(gateway.clone()),
        RequisitionFetcher::new(gateway, questions, config.requisition.directory.clone()),
        RetryPolicy::from_settings(&config.requisition),
        config.site,
    );

    let outcome = workflow
        .submit(&order)
        .await
        .with_context(|| format!("Order {} was not transmitted", args.order_id))?;
    print_success(&format!("Order {} transmitted", args.order_id));
    println!("{}", outcome.response);

    match outcome.requisition {
        RequisitionStatus::Skipped => {}
        RequisitionStatus::Saved { file } => print_success(&format!("Requisition saved: {file}")),
        RequisitionStatus::Failed {
            attempts,
            last_error,
        } => print_warning(&format!(
            "Requisition not retrieved after {attempts} attempt(s): {last_error}"
        )),
    }
    Ok(())
}

pub async fn requisition(
    config: &AppConfig,
    gateway: Arc<HttpGateway>,
    questions: DynQuestionLookup,
    args: &OrderArgs,
) -> Result<()> {
    let order = read_order(args).await?;
    let fetcher = RequisitionFetcher::new(gateway, questions, config.requisition.directory.clone());
    let policy = RetryPolicy::from_settings(&config.requisition);

    match retry_with_backoff(&policy, "requisition", |_| fetcher.fetch(&order)).await {
        RetryOutcome::Succeeded { value, attempts } => {
            print_success(&format!(
                "Saved {} ({} bytes, {})",
                value.path.display(),
                value.pdf.len(),
                attempt_count(attempts)
            ));
            Ok(())
        }
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => Err(anyhow::Error::new(last_error).context(format!(
            "Requisition for order {} not retrieved after {}",
            args.order_id,
            attempt_count(attempts)
        ))),
    }
}

pub async fn results(gateway: Arc<HttpGateway>) -> Result<()> {
    let body = ResultsRetriever::new(gateway)
        .retrieve_hl7()
        .await
        .context("Results retrieval failed")?;
    println!("{body}");
    Ok(())
}

async fn read_order(args: &OrderArgs) -> Result<LabOrder> {
    let hl7 = tokio::fs::read(&args.hl7)
        .await
        .with_context(|| format!("Failed to read {}", args.hl7.display()))?;
    Ok(LabOrder::new(
        hl7,
        OrderMetadata {
            order_id: args.order_id,
            patient_id: args.patient_id,
            billing_type: BillingType::from_code(&args.billing_type),
            abn: AbnRequirement::from_flag(&args.abn),
        },
    ))
}

fn attempt_count(attempts: u32) -> String {
    if attempts == 1 {
        "1 attempt".to_string()
    } else {
        format!("{attempts} attempts")
    }
}
