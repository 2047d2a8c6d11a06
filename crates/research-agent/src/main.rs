//! Runs the research agent in the terminal.

#[macro_use]
extern crate tracing;

use std::error::Error;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use research_agent::ResearchAgentBuilder;
use research_agent::config::{LoadOptions, load_tool_servers};
use research_agent::core::AgentInput;
use research_agent_config::{DEFAULT_CONFIG_PATH, Materializer, ServerConfig};
use research_agent_model::ModelMessage;
use research_agent_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use research_agent_search::{TavilyClient, TavilyConfigBuilder};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, Lines};

const BAR_CHAR: &str = "▎";
const TOOL_OUTPUT_PREVIEW: usize = 160;

/// An expert researcher that searches the web and writes polished reports.
#[derive(Debug, Parser)]
#[command(name = "research-agent", version)]
struct Cli {
    /// Tool-server configuration file. `${VAR}` placeholders are replaced
    /// with environment values.
    #[arg(long, env = "MCP_CONFIG")]
    mcp_config: Option<PathBuf>,

    /// Chat model to use.
    #[arg(long, env = "OPENAI_MODEL", default_value = "glm-4.6")]
    model: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// API key of the chat model.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// API key of the Tavily search service.
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    tavily_api_key: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = 0.0)]
    temperature: f32,

    /// Timeout of each model request, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Retries of a failed model request.
    #[arg(long, default_value_t = 2)]
    max_retries: u32,

    /// Maximum number of model turns per query.
    #[arg(long, default_value_t = 25)]
    max_steps: usize,

    /// Use the proxy configured through the environment.
    #[arg(long)]
    allow_proxy: bool,

    /// Fail if a placeholder in the configuration has no value.
    #[arg(long)]
    strict_env: bool,

    /// Run this query and exit instead of starting an interactive session.
    query: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("{} {err}", "error:".bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let (path, explicit) = match &cli.mcp_config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    let options = LoadOptions {
        explicit,
        strict_env: cli.strict_env,
    };
    let tool_servers =
        load_tool_servers(&path, options, &Materializer::from_process_env())?;
    for (name, server) in tool_servers.servers() {
        let kind = match server {
            ServerConfig::Stdio(_) => "stdio",
            ServerConfig::Remote(_) => "remote",
        };
        warn!("skipping {kind} tool server `{name}`, no transport is available");
    }

    let no_proxy = !cli.allow_proxy;
    let mut model_config = OpenAIConfigBuilder::with_api_key(&cli.api_key)
        .with_model(&cli.model)
        .with_temperature(cli.temperature)
        .with_max_retries(cli.max_retries)
        .with_no_proxy(no_proxy);
    if let Some(base_url) = &cli.base_url {
        model_config = model_config.with_base_url(base_url);
    }
    if let Some(secs) = cli.timeout_secs {
        model_config = model_config.with_timeout(Duration::from_secs(secs));
    }
    let model_provider = OpenAIProvider::new(model_config.build())?;

    let search_config = TavilyConfigBuilder::with_api_key(&cli.tavily_api_key)
        .with_no_proxy(no_proxy)
        .build();
    let search_backend = TavilyClient::new(search_config)?;

    let agent = ResearchAgentBuilder::new(model_provider, search_backend)
        .with_max_steps(cli.max_steps)
        .build()
        .await?;

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")?
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let printer = Printer { progress_style };

    if let Some(query) = cli.query {
        let result = printer.run_query(&agent, query.into()).await;
        agent.shutdown().await;
        return result.map(|_| ());
    }

    // Each turn continues the conversation so far.
    let mut history: Vec<ModelMessage> = vec![];
    let mut input = io::BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = next_line(&mut input).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut messages = history.clone();
        messages.push(ModelMessage::user(line));
        match printer.run_query(&agent, messages.into()).await {
            Ok(messages) => history = messages,
            Err(err) => eprintln!("{} {err}", "error:".bright_red().bold()),
        }
    }

    agent.shutdown().await;
    Ok(())
}

struct Printer {
    progress_style: ProgressStyle,
}

impl Printer {
    /// Streams a query, printing every new message. Returns the final
    /// conversation.
    async fn run_query(
        &self,
        agent: &research_agent::ResearchAgent,
        input: AgentInput,
    ) -> Result<Vec<ModelMessage>, Box<dyn Error>> {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(self.progress_style.clone());
        progress_bar.set_message("🤔 Researching...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let mut stream = agent.stream(input);
        let mut printed = None;
        let mut messages = vec![];
        while let Some(state) = stream.next().await {
            let state = match state {
                Ok(state) => state,
                Err(err) => {
                    progress_bar.finish_and_clear();
                    return Err(err.into());
                }
            };
            // The first snapshot only holds the input.
            let start = *printed.get_or_insert(state.messages.len());
            progress_bar.suspend(|| {
                for msg in &state.messages[start..] {
                    print_message(msg);
                }
            });
            printed = Some(state.messages.len());
            messages = state.messages;
        }
        progress_bar.finish_and_clear();
        Ok(messages)
    }
}

fn print_message(msg: &ModelMessage) {
    match msg {
        ModelMessage::Assistant(msg) => {
            if !msg.content.is_empty() {
                println!(
                    "{}🤖 {}",
                    BAR_CHAR.bright_cyan(),
                    msg.content.bright_white()
                );
            }
            for call in &msg.tool_calls {
                println!(
                    "{}🔎 {} {}",
                    BAR_CHAR.bright_yellow(),
                    call.name.bold(),
                    call.arguments.dimmed()
                );
            }
        }
        ModelMessage::Tool(result) => {
            let preview = result
                .content
                .chars()
                .take(TOOL_OUTPUT_PREVIEW)
                .collect::<String>();
            let ellipsis = if preview.len() < result.content.len() {
                "…"
            } else {
                ""
            };
            println!("{}{preview}{ellipsis}", BAR_CHAR.dimmed());
        }
        ModelMessage::System { .. } | ModelMessage::User { .. } => {}
    }
}

async fn next_line<R>(lines: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
