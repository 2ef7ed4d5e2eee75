use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vetrec_client::HttpResourceClient;
use vetrec_core::{
    ConsentWorkflow, LegalTextCatalogue, ResourceClient, SignatureArtifact, WorkflowRequest,
};

mod settings;
mod submission;

use settings::{LegalTextPolicy, Settings};
use submission::prepare_request;

#[derive(Parser)]
#[command(name = "vetrec")]
#[command(about = "Veterinary consent signing client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the action if needed and submit a signed consent for it
    Submit {
        /// Path to the workflow request JSON
        request: PathBuf,
        /// Signature image to use instead of the one in the request file
        #[arg(long)]
        signature: Option<PathBuf>,
    },
    /// List the current legal texts
    LegalTexts,
}

/// Entry point for the `vetrec` command-line client.
///
/// # Environment Variables
/// - `VETREC_API_URL`: clinic API base URL (default: "http://localhost:8080/api")
/// - `VETREC_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
/// - `VETREC_API_TOKEN`: bearer token for the signed-in user
/// - `VETREC_USER_NAME`: signed-in user's display name (required)
/// - `VETREC_USER_ROLE`: `owner`, `veterinarian` or `staff` (default: "owner")
/// - `VETREC_LEGAL_TEXT_POLICY`: `required` or `optional` (default: "required")
#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("vetrec=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let session = Arc::new(settings.session());
    let client = HttpResourceClient::new(Arc::new(settings.client.clone()), session)?;

    tracing::info!(
        api = %client.config().api_base_url(),
        user = %settings.identity.name,
        role = %settings.identity.role,
        "++ vetrec client ready"
    );

    match cli.command {
        Commands::LegalTexts => {
            let catalogue = client
                .get_legal_texts()
                .await
                .context("failed to fetch legal texts")?;
            if catalogue.is_empty() {
                println!("No legal texts published.");
            }
            for text in catalogue.iter() {
                println!(
                    "{:<16} {:<12} {}",
                    text.kind.as_str(),
                    text.version.as_str(),
                    text.title
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Submit { request, signature } => {
            submit(&settings, client, request, signature).await
        }
    }
}

async fn submit(
    settings: &Settings,
    client: HttpResourceClient,
    request_path: PathBuf,
    signature_path: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let raw = tokio::fs::read_to_string(&request_path)
        .await
        .with_context(|| format!("failed to read {}", request_path.display()))?;
    let request: WorkflowRequest = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid workflow request", request_path.display()))?;

    let signature = match signature_path {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read signature {}", path.display()))?;
            Some(SignatureArtifact::new(bytes))
        }
        None => None,
    };

    let catalogue = fetch_legal_texts(&client, settings.legal_text_policy).await?;
    let request = prepare_request(request, &settings.identity, catalogue.as_ref(), signature);

    let workflow = ConsentWorkflow::new(client);
    let mut states = workflow.subscribe();
    let state_logger = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            tracing::info!(state = %state, "workflow state changed");
        }
    });

    let result = workflow.run(request).await;
    drop(workflow);
    state_logger.await.ok();

    println!("{}", result.user_message());
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.is_failed() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Fetches legal texts ahead of the workflow, applying the configured policy on failure.
async fn fetch_legal_texts(
    client: &HttpResourceClient,
    policy: LegalTextPolicy,
) -> anyhow::Result<Option<LegalTextCatalogue>> {
    match client.get_legal_texts().await {
        Ok(catalogue) => Ok(Some(catalogue)),
        Err(err) => match policy {
            LegalTextPolicy::Required => {
                Err(anyhow::Error::new(err).context("legal texts are required but unavailable"))
            }
            LegalTextPolicy::Optional => {
                tracing::warn!(error = %err, "legal texts unavailable, using request version");
                Ok(None)
            }
        },
    }
}
