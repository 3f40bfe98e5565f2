use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sitestack::config::SiteConfig;
use sitestack::domain::split_domain;
use sitestack::engine::{self, PLACEHOLDER_ZONE_ID};
use sitestack::site::{self, build_template};
use sitestack::stack::validate_stack_name;
use sitestack::sync::{sync_assets, AssetAcl};

/// Provision an S3 static website, optionally behind CloudFront with an
/// ACM certificate and Route53 aliases.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to a TOML config file (defaults to ./Site.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefix for the stack name and logical resource ids
    #[arg(long)]
    project_name: Option<String>,

    /// Local directory holding the built site assets
    #[arg(long)]
    path: Option<String>,

    #[arg(long)]
    index_document: Option<String>,

    #[arg(long)]
    error_document: Option<String>,

    /// Custom domain to serve the site at, or "staging" for a plain
    /// public bucket website
    #[arg(long)]
    target_domain: Option<String>,

    /// Use this existing certificate instead of creating one
    #[arg(long)]
    certificate_arn: Option<String>,

    /// Also cover and alias www.<target-domain>
    #[arg(long)]
    include_www: bool,

    /// Upload the asset directory into the content bucket after deploying
    #[arg(long)]
    sync_assets_to_bucket: bool,

    #[arg(long)]
    stack_name: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Print the rendered template instead of deploying. No AWS calls are
    /// made; the hosted zone lookup returns a placeholder id.
    #[arg(long)]
    dry_run: bool,
}

fn load_config(args: &Args) -> anyhow::Result<SiteConfig> {
    let mut config = match &args.config {
        Some(path) => SiteConfig::from_toml_file(path)?,
        None => {
            let default_path = Path::new("Site.toml");
            if default_path.exists() {
                SiteConfig::from_toml_file(default_path)?
            } else {
                SiteConfig::default()
            }
        }
    };

    if let Some(v) = &args.project_name {
        config.project_name = v.clone();
    }
    if let Some(v) = &args.path {
        config.path = v.clone();
    }
    if let Some(v) = &args.index_document {
        config.index_document = v.clone();
    }
    if let Some(v) = &args.error_document {
        config.error_document = v.clone();
    }
    if let Some(v) = &args.target_domain {
        config.target_domain = v.clone();
    }
    if let Some(v) = &args.certificate_arn {
        config.certificate_arn = Some(v.clone());
    }
    if args.include_www {
        config.include_www = true;
    }
    if args.sync_assets_to_bucket {
        config.sync_assets_to_bucket = true;
    }
    if let Some(v) = &args.stack_name {
        config.stack_name = v.clone();
    }
    if let Some(v) = &args.region {
        config.region = v.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    config.validate()?;
    let stack_name = validate_stack_name(&config.project_name, &config.stack_name)?;

    // a hosted zone id is only needed when a certificate will be declared
    let needs_zone = !config.is_staging() && config.certificate_arn.is_none();
    if !config.is_staging() {
        // fail on malformed domains before any AWS call
        split_domain(&config.target_domain)?;
    }

    let sdk_config = aws_config::from_env()
        .region(aws_sdk_cloudformation::config::Region::new(
            config.region.clone(),
        ))
        .load()
        .await;

    let hosted_zone_id = if !needs_zone {
        None
    } else if args.dry_run {
        Some(PLACEHOLDER_ZONE_ID.to_string())
    } else {
        let parts = split_domain(&config.target_domain)?;
        let route53 = aws_sdk_route53::Client::new(&sdk_config);
        let id = engine::lookup_hosted_zone(&route53, &parts.parent_domain).await?;
        info!(zone = %parts.parent_domain, id = %id, "resolved hosted zone");
        Some(id)
    };

    let template = build_template(&config, hosted_zone_id.as_deref())?;

    if args.dry_run {
        println!("{}", template.to_pretty_json()?);
        return Ok(());
    }

    let cloudformation = aws_sdk_cloudformation::Client::new(&sdk_config);
    info!(stack = %stack_name, "deploying");
    let outputs = engine::deploy(&cloudformation, &stack_name, &template).await?;
    let mut keys: Vec<_> = outputs.keys().collect();
    keys.sort();
    for key in keys {
        println!("{key} = {}", outputs[key]);
    }

    if config.sync_assets_to_bucket {
        let bucket = outputs
            .get(site::outputs::CONTENT_BUCKET_NAME)
            .context("stack did not report a content bucket name")?;
        let acl = if config.is_staging() {
            AssetAcl::PublicRead
        } else {
            AssetAcl::Private
        };
        let s3 = aws_sdk_s3::Client::new(&sdk_config);
        let uploaded = sync_assets(&s3, bucket, Path::new(&config.path), acl).await?;
        info!(uploaded, bucket = %bucket, "assets synced");
    }

    Ok(())
}
