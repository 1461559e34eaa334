use clap::{Parser, Subcommand};
use shop_assistant_core::{
    Assistant, AssistantReply, CatalogStore, ConversationClient, DEFAULT_BLOB_BASE_URL,
    DataApiStore, LanguageServiceClient, OpenAiChatClient, entity_summary, ingest_folder,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "shop-assistant", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Catalog data API base URL
    #[arg(long, env = "DATA_API_URL", default_value = "http://localhost:8080")]
    data_api_url: String,

    /// Catalog data API key
    #[arg(long, env = "DATA_API_KEY", default_value = "")]
    data_api_key: String,

    /// Catalog data source (cluster) name
    #[arg(long, env = "DATA_API_SOURCE", default_value = "Cluster0")]
    data_source: String,

    /// Catalog database name
    #[arg(long, default_value = "ordenadores_db")]
    database: String,

    /// Catalog collection name
    #[arg(long, default_value = "ordenadores")]
    collection: String,

    /// Language service endpoint (entity recognition + conversation analysis)
    #[arg(long, env = "LANGUAGE_SERVICE_ENDPOINT", default_value = "http://localhost:5000")]
    language_url: String,

    /// Language service key
    #[arg(long, env = "LANGUAGE_SERVICE_KEY", default_value = "")]
    language_key: String,

    /// Chat completion endpoint
    #[arg(long, env = "OPENAI_ENDPOINT", default_value = "http://localhost:5001")]
    openai_url: String,

    /// Chat completion key
    #[arg(long, env = "OPENAI_KEY", default_value = "")]
    openai_key: String,

    /// Chat completion deployment name
    #[arg(long, env = "DEPLOYMENT_NAME", default_value = "gpt-4o-mini")]
    openai_deployment: String,

    /// Base URL for spec-sheet links
    #[arg(long, default_value = DEFAULT_BLOB_BASE_URL)]
    blob_base_url: String,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a folder of spec-sheet PDFs into the catalog.
    Ingest {
        /// Folder that contains PDFs, searched recursively.
        #[arg(long)]
        folder: String,
    },
    /// Ask the assistant a free-text question.
    Ask {
        /// The question or request.
        #[arg(long)]
        text: String,
    },
    /// Extract and show the specs of one spec-sheet PDF.
    Describe {
        /// Path to the PDF.
        #[arg(long)]
        pdf: String,
    },
    /// Show the distinct entity values the catalog knows about.
    Summary,
}

fn store_from(cli: &Cli) -> DataApiStore {
    DataApiStore::new(&cli.data_api_url, &cli.data_api_key, &cli.data_source)
        .with_collection(&cli.database, &cli.collection)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "shop-assistant boot");

    match &cli.command {
        Command::Ingest { folder } => {
            let recognizer = LanguageServiceClient::new(&cli.language_url, &cli.language_key);
            let store = store_from(&cli);

            let report = ingest_folder(Path::new(folder), &recognizer, &store)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for skipped in &report.skipped {
                warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
            }
            println!(
                "{} fichas ingeridas, {} omitidas ({})",
                report.ingested.len(),
                report.skipped.len(),
                report.finished_at.to_rfc3339()
            );
        }
        Command::Ask { text } => {
            let assistant = Assistant::new(
                ConversationClient::new(&cli.language_url, &cli.language_key),
                OpenAiChatClient::new(&cli.openai_url, &cli.openai_key, &cli.openai_deployment),
                store_from(&cli),
                &cli.blob_base_url,
            );

            let reply = assistant
                .handle_utterance(text)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            render_reply(&reply);
        }
        Command::Describe { pdf } => {
            let assistant = Assistant::new(
                ConversationClient::new(&cli.language_url, &cli.language_key),
                OpenAiChatClient::new(&cli.openai_url, &cli.openai_key, &cli.openai_deployment),
                store_from(&cli),
                &cli.blob_base_url,
            );
            let recognizer = LanguageServiceClient::new(&cli.language_url, &cli.language_key);

            let bytes = tokio::fs::read(pdf).await?;
            let reply = assistant
                .handle_document(&bytes, &recognizer)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("{}", reply.specs);
            println!("{}", serde_json::to_string_pretty(&reply.entities)?);
        }
        Command::Summary => {
            let store = store_from(&cli);
            let records = store
                .all()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for (category, values) in entity_summary(&records) {
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                println!("{category}: {}", values.join(", "));
            }
        }
    }

    Ok(())
}

fn render_reply(reply: &AssistantReply) {
    match reply {
        AssistantReply::Recommendations { items, similar } => {
            if *similar {
                println!("No hay coincidencia exacta; te recomendamos estas alternativas:");
            } else {
                println!("Te recomendamos estos ordenadores:");
            }
            for item in items {
                println!("\n{}", item.specs);
                println!("Ficha completa: {}", item.link);
                println!("Comprar: --record-id {}", item.record_id);
            }
        }
        AssistantReply::NotFound { unsatisfied } => {
            println!("No se encontraron ordenadores con esas características.");
            if !unsatisfied.is_empty() {
                let categories: Vec<&str> = unsatisfied.iter().map(String::as_str).collect();
                println!("Sin coincidencias para: {}", categories.join(", "));
            }
        }
        AssistantReply::Answer(answer) => println!("{answer}"),
        AssistantReply::OffTopic => {
            println!("No puedo responder preguntas que no sean sobre ordenadores.");
        }
        AssistantReply::Unsupported => println!("No puedo responderte eso ahora mismo."),
    }
}
