use chrono::Utc;
use clap::Subcommand;
use serde_json::json;
use studify_core::{Config, Database, RestClient};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's focus totals (UTC day)
    Today {
        /// User to report on (defaults to account.user_id)
        #[arg(long)]
        user: Option<String>,
    },
    /// All-time focus totals
    All {
        #[arg(long)]
        user: Option<String>,
    },
    /// Most recent logged sessions
    Recent {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Totals from the hosted stats service
    Remote {
        #[arg(long)]
        user: Option<String>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let resolve = |user: Option<String>| user.unwrap_or_else(|| config.account.user_id.clone());

    match action {
        StatsAction::Today { user } => {
            let user = resolve(user);
            let today = Utc::now().date_naive();
            let stats = Database::open()?.focus_stats(&user, today)?;
            let out = json!({
                "user_id": user,
                "date": today.to_string(),
                "pomodoros": stats.today_pomodoros,
                "focus_mins": stats.today_focus_mins,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StatsAction::All { user } => {
            let user = resolve(user);
            let stats = Database::open()?.focus_stats(&user, Utc::now().date_naive())?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { user, limit } => {
            let user = resolve(user);
            let sessions = Database::open()?.recent_sessions(&user, limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        StatsAction::Remote { user } => {
            let user = resolve(user);
            let backend = &config.backend;
            let client = RestClient::new(
                backend.supabase_url.as_deref(),
                &backend.stats_url,
                backend.anon_key.clone().unwrap_or_default(),
                backend.resolved_access_token(),
            )?;
            let runtime = tokio::runtime::Runtime::new()?;
            let stats = runtime.block_on(client.fetch_stats(&user))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
