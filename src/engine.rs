//! The provisioning engine collaborator. CloudFormation owns ordering,
//! diffing, rollback, and all waiting (including holding the stack until
//! a DNS-validated certificate reaches ISSUED); this module only submits
//! the template and watches for a terminal status.

use std::collections::HashMap;

use aws_sdk_cloudformation::types::{Capability, OnFailure, Stack, StackStatus};
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::stack::SavedTemplate;

/// Zone id reported instead of a live lookup when running in dry-run mode.
pub const PLACEHOLDER_ZONE_ID: &str = "Z000000";

const POLL_INTERVAL_MS: u64 = 700;

/// Create or update the stack and block until CloudFormation reports a
/// terminal status. Returns the stack outputs on success. Engine failures
/// are propagated unmodified; nothing here retries.
pub async fn deploy(
    client: &aws_sdk_cloudformation::Client,
    stack_name: &str,
    template: &SavedTemplate,
) -> Result<HashMap<String, String>> {
    let template_body = template.to_pretty_json()?;
    create_or_update_stack(client, stack_name, &template_body).await?;
    wait_for_outputs(client, stack_name).await
}

pub async fn does_stack_exist(
    client: &aws_sdk_cloudformation::Client,
    name: &str,
) -> Result<bool> {
    match client.describe_stacks().stack_name(name).send().await {
        Ok(_) => Ok(true),
        Err(e) => {
            let e_str = format!("{:#?}", e);
            if e_str.contains("does not exist") {
                return Ok(false);
            }
            Err(Error::Engine(e_str))
        }
    }
}

/// `Ok(Some(stack))` once the stack reaches a successful terminal status,
/// `Ok(None)` while work is still in progress, `Err` on a failed status.
pub async fn describe_stack(
    client: &aws_sdk_cloudformation::Client,
    name: &str,
) -> Result<Option<Stack>> {
    let resp = client
        .describe_stacks()
        .stack_name(name)
        .send()
        .await
        .map_err(|e| Error::Engine(format!("{:#?}", e)))?;
    let stack = resp
        .stacks()
        .and_then(|stacks| stacks.first())
        .ok_or_else(|| Error::Engine(format!("Stack {name} not found")))?;
    match stack.stack_status() {
        Some(status) => match status {
            // done:
            StackStatus::DeleteComplete
            | StackStatus::CreateComplete
            | StackStatus::UpdateComplete
            | StackStatus::UpdateRollbackComplete
            | StackStatus::ImportComplete
            | StackStatus::ImportRollbackComplete => Ok(Some(stack.clone())),

            // keep waiting:
            StackStatus::CreateInProgress
            | StackStatus::DeleteInProgress
            | StackStatus::ImportInProgress
            | StackStatus::ImportRollbackInProgress
            | StackStatus::ReviewInProgress
            | StackStatus::RollbackInProgress
            | StackStatus::UpdateCompleteCleanupInProgress
            | StackStatus::UpdateInProgress
            | StackStatus::UpdateRollbackCompleteCleanupInProgress
            | StackStatus::UpdateRollbackInProgress => Ok(None),

            _ => Err(Error::Engine(
                stack
                    .stack_status_reason()
                    .unwrap_or("Failed to get stack failure reason")
                    .to_string(),
            )),
        },
        None => Err(Error::Engine(format!("Stack {name} not found"))),
    }
}

pub async fn wait_for_outputs(
    client: &aws_sdk_cloudformation::Client,
    name: &str,
) -> Result<HashMap<String, String>> {
    loop {
        let dur = tokio::time::Duration::from_millis(POLL_INTERVAL_MS);
        tokio::time::sleep(dur).await;
        match describe_stack(client, name).await? {
            Some(stack) => {
                let mut out = HashMap::new();
                for output in stack.outputs().unwrap_or_default() {
                    if let (Some(key), Some(val)) = (output.output_key(), output.output_value()) {
                        out.insert(key.to_string(), val.to_string());
                    }
                }
                info!(stack = name, "stack reached a terminal status");
                return Ok(out);
            }
            None => {
                debug!(stack = name, "still waiting on CloudFormation");
            }
        }
    }
}

pub async fn create_or_update_stack(
    client: &aws_sdk_cloudformation::Client,
    name: &str,
    body: &str,
) -> Result<()> {
    if does_stack_exist(client, name).await? {
        info!(stack = name, "updating existing stack");
        match client
            .update_stack()
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await
        {
            Ok(_) => {}
            Err(e) => {
                let e_str = format!("{:#?}", e);
                if e_str.contains("No updates are to be performed") {
                    info!(stack = name, "no changes to apply");
                    return Ok(());
                }
                return Err(Error::Engine(e_str));
            }
        }
    } else {
        info!(stack = name, "creating stack");
        client
            .create_stack()
            .on_failure(OnFailure::Delete)
            .capabilities(Capability::CapabilityNamedIam)
            .capabilities(Capability::CapabilityIam)
            .stack_name(name)
            .template_body(body)
            .send()
            .await
            .map_err(|e| Error::Engine(format!("{:#?}", e)))?;
    }
    Ok(())
}

/// Find the hosted zone whose name matches the (zone-canonical) parent
/// domain. Route53 returns ids with a `/hostedzone/` prefix, which
/// templates don't want.
pub async fn lookup_hosted_zone(
    client: &aws_sdk_route53::Client,
    zone_name: &str,
) -> Result<String> {
    // Route53 reports zone names with a trailing dot
    let canonical = if zone_name.ends_with('.') {
        zone_name.to_string()
    } else {
        format!("{zone_name}.")
    };
    let resp = client
        .list_hosted_zones_by_name()
        .dns_name(&canonical)
        .send()
        .await
        .map_err(|e| Error::Engine(format!("{:#?}", e)))?;
    let zone = resp
        .hosted_zones()
        .and_then(|zones| {
            zones
                .iter()
                .find(|z| z.name() == Some(canonical.as_str()))
        })
        .ok_or_else(|| Error::Engine(format!("no hosted zone found for {zone_name}")))?;
    let id = zone
        .id()
        .ok_or_else(|| Error::Engine(format!("hosted zone for {zone_name} has no id")))?;
    Ok(id.trim_start_matches("/hostedzone/").to_string())
}
