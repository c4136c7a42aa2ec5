//! Doc Publisher CLI
//!
//! Publishes generated document collections to object storage and an SFTP host

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_publisher::core::config::{PublisherConfig, PublisherSettings};
use doc_publisher::core::config_loader::{CONFIG_FILENAME, ConfigLoadOptions, ConfigLoader};
use doc_publisher::{
    ArtifactId, ArtifactRepository, BatchPublishOptions, BatchPublisher, FsCleanupAgent,
    JsonArtifactStore, MailRelayDispatcher, NotificationDispatcher, ObjectStoreSyncer,
    PreconditionValidator, PublishCoordinator, PublishError, PublishReport, RepositoryError,
    S3cmdSync, SafeCommandExecutor, SecureFileTransfer, SingleFlight, Ssh2Connector,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Document collection publisher
#[derive(Parser)]
#[command(name = "doc-publisher")]
#[command(version)]
#[command(about = "Publishes generated document collections", long_about = None)]
struct Cli {
    /// Config file (defaults to ./.doc-publisher.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one or more artifacts
    Publish {
        /// Artifact ids
        #[arg(value_name = "ID", required = true)]
        ids: Vec<ArtifactId>,

        /// Maximum concurrent publishes when several ids are given
        #[arg(long, default_value = "3")]
        max_concurrency: usize,
    },

    /// Check if an artifact is ready to publish (no network access)
    Check {
        #[arg(value_name = "ID")]
        id: ArtifactId,
    },

    /// Show an artifact's publish state
    Status {
        #[arg(value_name = "ID")]
        id: ArtifactId,
    },

    /// Initialize doc-publisher configuration
    Init {
        /// Project path (defaults to current directory)
        #[arg(value_name = "PROJECT_PATH")]
        project_path: Option<PathBuf>,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            if let Some(publish_error) = e.downcast_ref::<PublishError>() {
                print_suggestions(publish_error);
            }
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Publish {
            ids,
            max_concurrency,
        } => publish_command(cli.config, ids, max_concurrency).await,
        Commands::Check { id } => check_command(cli.config, id).await,
        Commands::Status { id } => status_command(cli.config, id).await,
        Commands::Init {
            project_path,
            force,
        } => {
            let path = project_path.unwrap_or_else(|| PathBuf::from("."));
            init_command(&path, force).await
        }
    }
}

async fn load_config(config_file: Option<PathBuf>) -> Result<PublisherConfig> {
    let env: HashMap<String, String> = std::env::vars().collect();

    let config = ConfigLoader::load(ConfigLoadOptions {
        project_path: PathBuf::from("."),
        config_file,
        skip_global: false,
        env,
    })
    .await?;

    Ok(config)
}

fn build_coordinator(
    settings: &PublisherSettings,
    store: Arc<JsonArtifactStore>,
) -> Result<PublishCoordinator> {
    let working_dir = std::env::current_dir().context("Failed to read current directory")?;
    let mut executor = SafeCommandExecutor::new(working_dir)?;
    if let Some(timeout) = settings.storage.timeout {
        executor.set_timeout(timeout);
    }

    let primitive = S3cmdSync::new(
        executor,
        settings.storage.sync_command.clone(),
        settings.storage.credentials.clone(),
    );
    let syncer = ObjectStoreSyncer::new(
        Arc::new(primitive),
        settings.storage.bucket.clone(),
        settings.sync_attempts,
    );

    let transfer = SecureFileTransfer::new(
        Arc::new(Ssh2Connector::default()),
        settings.sftp.credentials.clone(),
        settings.sftp.publish_dir.clone(),
        settings.transfer_attempts,
    );

    let notifier = settings.notifications.as_ref().map(|n| {
        Arc::new(MailRelayDispatcher::new(
            n.endpoint.clone(),
            n.sender.clone(),
            Arc::clone(&store),
        )) as Arc<dyn NotificationDispatcher>
    });

    Ok(PublishCoordinator::new(
        store,
        syncer,
        transfer,
        Arc::new(FsCleanupAgent::new()),
        SingleFlight::new(),
    )
    .with_notifier(notifier)
    .with_environment(settings.environment))
}

async fn publish_command(
    config_file: Option<PathBuf>,
    ids: Vec<ArtifactId>,
    max_concurrency: usize,
) -> Result<i32> {
    let config = load_config(config_file).await?;
    let settings = ConfigLoader::resolve(&config)?;
    let store = Arc::new(JsonArtifactStore::open(&settings.store_path));
    let coordinator = Arc::new(build_coordinator(&settings, store)?);

    if let [id] = ids.as_slice() {
        println!("\n🚀 Publishing artifact {}...\n", id);
        let report = coordinator.publish_with_report(*id).await?;
        print_report(&report);
        return Ok(0);
    }

    println!("\n📦 Batch publishing {} artifacts\n", ids.len());
    let result = BatchPublisher::new(coordinator)
        .publish_all(ids, BatchPublishOptions { max_concurrency })
        .await?;

    println!("\n{}", "=".repeat(60));
    println!("📊 Batch Publish Summary");
    println!("{}", "=".repeat(60));

    println!("\n✅ Succeeded: {}", result.succeeded.len());
    for (id, report) in &result.succeeded {
        println!(
            "   - {} {} ({}ms)",
            id,
            report.artifact.name,
            report.duration.as_millis()
        );
    }

    println!("\n❌ Failed: {}", result.failed.len());
    for (id, error) in &result.failed {
        println!("   - {}: {}", id, error);
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "Overall Status: {}",
        if result.success() { "✅ SUCCESS" } else { "❌ FAILED" }
    );
    println!("{}\n", "=".repeat(60));

    Ok(if result.success() { 0 } else { 1 })
}

async fn check_command(config_file: Option<PathBuf>, id: ArtifactId) -> Result<i32> {
    println!("\n🔍 Artifact Check\n");

    let config = load_config(config_file).await?;
    let validation = ConfigLoader::validate(&config);
    println!("{}\n", ConfigLoader::format_validation_result(&validation));

    let store = JsonArtifactStore::open(config.store_path());
    let artifact = store.find(id).await.map_err(|e| match e {
        RepositoryError::NotFound(id) => PublishError::NotFound { id },
        other => PublishError::Repository(other),
    })?;

    match PreconditionValidator::new().validate(&artifact).await {
        Ok(()) => {
            println!("✅ {} ({}) is ready to publish", artifact.name, artifact.id);
            Ok(if validation.valid { 0 } else { 1 })
        }
        Err(e) => {
            println!("❌ {}", e);
            print_suggestions(&e);
            Ok(1)
        }
    }
}

async fn status_command(config_file: Option<PathBuf>, id: ArtifactId) -> Result<i32> {
    let config = load_config(config_file).await?;
    let store = JsonArtifactStore::open(config.store_path());

    let artifact = match store.find(id).await {
        Ok(artifact) => artifact,
        Err(RepositoryError::NotFound(_)) => {
            println!("⚠️  Artifact {} not found in {}", id, store.path().display());
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };
    let subscriptions = store.subscriptions_for(id).await?;

    println!("\n📄 {} ({})", artifact.name, artifact.id);
    println!("   Generation: {:?}", artifact.generation_state);
    println!("   Local path: {}", artifact.local_path.display());
    println!("   Archive:    {}", artifact.archive_path.display());
    match artifact.uploaded_at {
        Some(at) => println!("   Published:  {}", at.to_rfc3339()),
        None => println!("   Published:  not yet"),
    }
    println!("   Pending notifications: {}\n", subscriptions.len());

    Ok(0)
}

async fn init_command(project_path: &Path, force: bool) -> Result<i32> {
    println!("\n🎯 Initialize doc-publisher\n");

    let config_path = project_path.join(CONFIG_FILENAME);
    if config_path.exists() && !force {
        eprintln!(
            "⚠️  {} already exists (use --force to overwrite)",
            config_path.display()
        );
        return Ok(1);
    }

    let yaml = serde_yaml::to_string(&PublisherConfig::template())?;
    tokio::fs::write(&config_path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("✅ Created {}", config_path.display());
    println!("Set AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and DOC_PUBLISHER_SFTP_PASSWORD before publishing.\n");
    Ok(0)
}

fn print_report(report: &PublishReport) {
    println!("✅ {} published in {}ms", report.artifact.name, report.duration.as_millis());
    println!("   Sync attempts:     {}", report.sync_attempts);
    println!("   Transfer attempts: {}", report.transfer_attempts);
    println!("   Remote archive:    {}", report.remote_archive);
    if let Some(at) = report.artifact.uploaded_at {
        println!("   Uploaded at:       {}", at.to_rfc3339());
    }
    println!("   Cleanup:           {}", report.cleanup);
    println!("   Notification:      {}\n", report.notification);
}

fn print_suggestions(error: &PublishError) {
    eprintln!("\nError code: {}", error.code());
    eprintln!("\n💡 Suggested actions:");
    for action in error.suggested_actions() {
        eprintln!("   - {}", action);
    }
}
