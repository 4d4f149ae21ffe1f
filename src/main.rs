use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use commet_agent::bridge::{self, BackgroundHost, BridgeRequest, DEFAULT_REPLY_TIMEOUT};
use commet_agent::core::{BrowserTrait, Config, PageTrait};
use commet_agent::orchestrator::{EventRecorder, Orchestrator, RunReport};
use commet_agent::utils::poll_until;
use commet_agent::{logging, ChromeBrowser, PlanningClient, TabId, TabRegistry, TabStateStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Planner-driven browser automation.
#[derive(Parser)]
#[command(name = "commet")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Planning service base URL
    #[arg(long, global = true, env = "COMMET_PLANNER_URL")]
    planner: Option<String>,

    /// Page to open before starting
    #[arg(long, global = true)]
    url: Option<String>,

    /// Show the browser window
    #[arg(long, global = true)]
    headed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one automation and print its report
    Run {
        /// What to do
        #[arg(short, long)]
        prompt: String,

        /// Action budget
        #[arg(long)]
        max_actions: Option<usize>,
    },

    /// Summarize the page
    Summarize {
        #[arg(short, long)]
        task: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.common.config.as_deref()).context("loading configuration")?;
    if let Some(planner) = &cli.common.planner {
        config.planner.base_url = planner.clone();
    }
    if cli.common.headed {
        config.browser.headless = false;
    }
    if let Commands::Run {
        max_actions: Some(n),
        ..
    } = &cli.command
    {
        config.automation.max_actions = *n;
    }

    logging::init(&config.logging.level);

    let mut browser = ChromeBrowser::new();
    browser
        .launch(&config.browser)
        .await
        .context("launching chrome")?;
    let (tab, page) = browser.new_page().await.context("opening a tab")?;
    let page: Arc<dyn PageTrait> = Arc::new(page);

    if let Some(url) = &cli.common.url {
        open(page.as_ref(), url, &config).await?;
    }

    let tabs = TabRegistry::new();
    tabs.insert(tab.clone(), Arc::clone(&page));
    let store = TabStateStore::new();
    let client = PlanningClient::new(&config.planner).context("configuring the planning client")?;
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        tabs,
        Arc::new(client.clone()),
        config.automation.clone(),
    ));

    let outcome = match cli.command {
        Commands::Run { prompt, .. } => run(&orchestrator, &tab, &prompt).await,
        Commands::Summarize { task } => summarize(orchestrator, client, &tab, task).await,
    };

    browser.close().await.context("closing chrome")?;
    outcome
}

async fn open(page: &dyn PageTrait, url: &str, config: &Config) -> anyhow::Result<()> {
    info!(%url, "opening start page");
    page.set_location(url)
        .await
        .with_context(|| format!("navigating to {}", url))?;
    let loaded = poll_until(
        config.automation.navigation_settle_timeout(),
        config.automation.poll_interval(),
        move || async move { Ok(page.ready_state().await.map(|s| s == "complete").unwrap_or(false)) },
    )
    .await?;
    if !loaded {
        info!(%url, "start page still loading, continuing");
    }
    Ok(())
}

async fn run(orchestrator: &Arc<Orchestrator>, tab: &TabId, prompt: &str) -> anyhow::Result<()> {
    let recorder = EventRecorder::spawn(Arc::clone(orchestrator.store()), orchestrator.subscribe());
    let mut events = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            if let Some(line) = envelope.event.describe() {
                info!(tab = %envelope.tab, kind = envelope.event.class(), "{}", line);
            }
        }
    });

    let report = orchestrator.run(tab, prompt).await;
    printer.abort();
    recorder.abort();

    println!("{}", serde_json::to_string_pretty(&report)?);
    match report {
        RunReport::Finished(_) => Ok(()),
        RunReport::NotStarted { failure } => {
            error!(%failure, "automation did not start");
            bail!("automation did not start: {}", failure)
        }
        RunReport::AlreadyRunning => bail!("an automation is already running in this tab"),
    }
}

async fn summarize(
    orchestrator: Arc<Orchestrator>,
    client: PlanningClient,
    tab: &TabId,
    task: Option<String>,
) -> anyhow::Result<()> {
    let host = BackgroundHost::new(orchestrator, client);
    let (panel, rx) = bridge::channel(DEFAULT_REPLY_TIMEOUT);
    let server = host.serve(rx);

    let reply = panel
        .request(tab, BridgeRequest::Summarize { task })
        .await
        .context("summarize request")?;
    drop(panel);
    server.await.context("bridge host")?;

    if !reply.ok {
        bail!("summarize failed: {}", reply.error.unwrap_or_default());
    }
    let summary = reply
        .get("summary")
        .and_then(|s| s.as_str())
        .unwrap_or_default();
    println!("{}", summary);
    Ok(())
}
