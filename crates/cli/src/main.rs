use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finassist_core::config::Settings;
use finassist_core::domain::profile::UserProfile;
use finassist_core::llm::GeminiClient;
use finassist_core::market::FmpClient;
use finassist_core::recommend::ThreadRngSampler;
use finassist_core::router::QueryRouter;
use finassist_core::storage::ConversationLog;

#[derive(Debug, Parser)]
#[command(name = "finassist", about = "Ask the financial assistant from a terminal")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Route a free-text message exactly like `POST /api/chat` does.
    Ask {
        message: String,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Credential for the generative-language fallback.
        #[arg(long, env = "GEMINI_API_KEY")]
        api_key: Option<String>,

        /// Do not append the exchange to the conversation log.
        #[arg(long)]
        no_log: bool,
    },

    /// Quote, profile and recent news for one ticker.
    Stock { ticker: String },

    /// Ranked picks for an investor profile.
    Recommend {
        #[arg(long)]
        age: u32,

        /// low, medium or high; anything else is treated as medium.
        #[arg(long)]
        risk: String,

        #[arg(long)]
        horizon: Option<String>,
    },

    /// Print one day of the conversation log.
    Logs {
        /// Day to print (YYYY-MM-DD). Defaults to today, local time.
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Debug, clap::Args)]
struct ProfileArgs {
    #[arg(long)]
    age: Option<u32>,

    /// low, medium or high; anything else is treated as medium.
    #[arg(long)]
    risk: Option<String>,

    #[arg(long)]
    horizon: Option<String>,
}

impl ProfileArgs {
    fn into_profile(self) -> Option<UserProfile> {
        let profile = UserProfile {
            age: self.age,
            risk: self.risk,
            horizon: self.horizon,
        };
        (!profile.is_empty()).then_some(profile)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args.command, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "command failed");
        return Err(err);
    }
    Ok(())
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Command::Ask {
            message,
            profile,
            api_key,
            no_log,
        } => {
            let router = build_router(settings)?;
            let profile = profile.into_profile();
            let response = router
                .respond(&message, profile.as_ref(), api_key.as_deref())
                .await;
            println!("{response}");

            if !no_log {
                let log = ConversationLog::from_settings(settings);
                if let Err(err) = log.append(&message, &response).await {
                    tracing::warn!(error = %err, "failed to write conversation log");
                }
            }
        }
        Command::Stock { ticker } => {
            let router = build_router(settings)?;
            println!("{}", router.lookup_stock(&ticker.trim().to_uppercase()).await);
        }
        Command::Recommend { age, risk, horizon } => {
            let router = build_router(settings)?;
            let profile = UserProfile {
                age: Some(age),
                risk: Some(risk),
                horizon,
            };
            println!("{}", router.recommend(&profile).await);
        }
        Command::Logs { date } => {
            let date = match date.as_deref() {
                Some(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .with_context(|| format!("invalid --date {s:?}, expected YYYY-MM-DD"))?,
                None => chrono::Local::now().date_naive(),
            };
            let log = ConversationLog::from_settings(settings);
            let entries = log.read_day(date).await?;
            if entries.is_empty() {
                tracing::info!(%date, path = %log.path_for(date).display(), "no conversation log entries");
            }
            for entry in entries {
                println!("[{}] user: {}", entry.timestamp, entry.user_message);
                println!("{}\n", entry.bot_response);
            }
        }
    }
    Ok(())
}

fn build_router(settings: &Settings) -> anyhow::Result<QueryRouter> {
    let market = FmpClient::from_settings(settings)?;
    let llm = GeminiClient::from_settings(settings)?;
    Ok(QueryRouter::new(
        Arc::new(market),
        Arc::new(llm),
        Arc::new(ThreadRngSampler),
    ))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
