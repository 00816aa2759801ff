//! Trading intent agent CLI
//!
//! Chat with the reasoner, or call the local functions directly.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trading_intent_agent::config::Secrets;
use trading_intent_agent::functions::FunctionCall;
use trading_intent_agent::reasoner::ChatMessage;
use trading_intent_agent::runner::{AgentRunner, ChatSession};
use trading_intent_agent::{Config, Error, Result};

#[derive(Parser)]
#[command(name = "intent-agent")]
#[command(about = "Conversational trading assistant backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Answer analytics queries from synthetic data
    #[arg(long, global = true)]
    synthetic: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Routing context sent with every exchange
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Resolve a single message
    Ask {
        message: String,

        #[arg(short, long)]
        project: Option<String>,
    },

    /// Invoke a local function directly
    Call {
        /// Registered function name, e.g. get_trader_overview
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Fetch a trader's aggregated detail
    Detail {
        address: String,

        /// Look-back window in days
        #[arg(short, long, default_value_t = 7)]
        duration: u32,

        /// UTC or CST
        #[arg(short, long, default_value = "UTC")]
        timezone: String,
    },

    /// List the functions advertised to the reasoner
    Functions,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    // Logs go to stderr so command output stays pipeable
    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    let config = Config::load(cli.config.as_deref())?;
    let runner = AgentRunner::new(config, cli.synthetic);

    match cli.command {
        Commands::Chat { project } => {
            let dispatcher = runner.build(Secrets::from_env())?;
            let project = project.unwrap_or_else(|| runner.config().reasoner.default_project.clone());
            println!("Chatting in '{}'. Type 'exit' to quit.", project);

            let mut session = ChatSession::new(&dispatcher, project);
            session
                .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
                .await?;
        }
        Commands::Ask { message, project } => {
            let dispatcher = runner.build(Secrets::from_env())?;
            let envelope = dispatcher
                .resolve(&[ChatMessage::user(message)], project.as_deref().unwrap_or(""))
                .await?;
            println!("{}", envelope.render());
        }
        Commands::Call { name, args } => {
            let dispatcher = runner.build(Secrets::from_env())?;
            let result = dispatcher.call(&FunctionCall::new(name, args)).await?;
            print_json(&result)?;
        }
        Commands::Detail {
            address,
            duration,
            timezone,
        } => {
            let dispatcher = runner.build(Secrets::from_env())?;
            let args = serde_json::json!({
                "address": address,
                "duration": duration,
                "timezone": timezone,
            });
            let result = dispatcher
                .call(&FunctionCall::new("get_trader_detail", args.to_string()))
                .await?;
            print_json(&result)?;
        }
        Commands::Functions => {
            let registry = trading_intent_agent::functions::registry();
            print_json(&registry.list())?;
            println!("fingerprint: {}", registry.fingerprint());
        }
        Commands::Config => {
            print_json(runner.config())?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(Error::Json)?;
    println!("{}", rendered);
    Ok(())
}
