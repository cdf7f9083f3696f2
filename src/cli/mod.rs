use clap::Parser;
use std::future::Future;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use selfdash::config::{Config, DEFAULT_API_BASE_URL};
use selfdash::services::SnapshotService;
use selfdash::types::UserResult;

mod report;

/// Users compared side by side; extra names are ignored
pub const MAX_USERS: usize = 3;

/// Compare GitHub activity for up to three users
#[derive(Parser, Debug)]
#[command(name = "selfdash")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Usernames, comma- or space-separated (first three are used)
    #[arg(value_name = "USERNAMES", required = true, num_args = 1..)]
    usernames: Vec<String>,

    /// API token (anonymous calls get a much lower rate limit)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API root
    #[arg(long, env = "SELFDASH_API_URL", default_value = DEFAULT_API_BASE_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Retries for connection failures and timeouts
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Refresh every SECS seconds until interrupted
    #[arg(long, value_name = "SECS")]
    watch: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        init_tracing(self.verbose);

        let usernames = parse_usernames(&self.usernames);
        if usernames.is_empty() {
            anyhow::bail!("no usernames given");
        }

        let service = SnapshotService::from_config(&self.config())?;

        let Some(secs) = self.watch else {
            let results = service.get_snapshot_bundle(&usernames).await;
            return self.print(&results);
        };

        let (service, usernames, cli) = (&service, &usernames, &self);
        watch_loop(
            Duration::from_secs(secs.max(1)),
            tokio::signal::ctrl_c(),
            move || async move {
                let results = service.get_snapshot_bundle(usernames).await;
                cli.print(&results)
            },
        )
        .await
    }

    fn config(&self) -> Config {
        Config {
            request_timeout_secs: self.timeout,
            max_retries: self.retries,
            ..Config::default()
        }
        .with_api_base_url(self.api_url.clone())
        .with_token(self.token.clone())
    }

    fn print(&self, results: &[UserResult]) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(results)?);
        } else {
            print!("{}", report::render(results));
        }
        Ok(())
    }
}

/// Run `refresh` every `period` until `shutdown` resolves. Shutdown also
/// interrupts a refresh that is still running.
async fn watch_loop<S, F, Fut>(period: Duration, shutdown: S, mut refresh: F) -> anyhow::Result<()>
where
    S: Future,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            refreshed = refresh() => refreshed?,
        }
    }
}

/// Split on commas, trim, drop blanks, keep the first [`MAX_USERS`].
pub fn parse_usernames(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .take(MAX_USERS)
        .map(String::from)
        .collect()
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ========== parse_usernames tests ==========

    #[test]
    fn test_parse_usernames_comma_separated() {
        let names = parse_usernames(&args(&["alice, bob ,carol"]));
        assert_eq!(names, args(&["alice", "bob", "carol"]));
    }

    #[test]
    fn test_parse_usernames_caps_at_three() {
        let names = parse_usernames(&args(&["a,b", "c", "d,e"]));
        assert_eq!(names, args(&["a", "b", "c"]));
    }

    #[test]
    fn test_parse_usernames_drops_blanks() {
        let names = parse_usernames(&args(&[" , alice,,", ""]));
        assert_eq!(names, args(&["alice"]));
    }

    // ========== argument parsing tests ==========

    #[test]
    fn test_cli_requires_usernames() {
        assert!(Cli::try_parse_from(["selfdash"]).is_err());
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["selfdash", "octocat"]).unwrap();

        assert_eq!(cli.usernames, args(&["octocat"]));
        assert_eq!(cli.timeout, 10);
        assert_eq!(cli.retries, 0);
        assert!(!cli.json);
        assert!(cli.watch.is_none());
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::try_parse_from([
            "selfdash",
            "--json",
            "--watch",
            "60",
            "--token",
            "abc",
            "--api-url",
            "http://localhost:9999",
            "alice,bob",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.watch, Some(60));

        let config = cli.config();
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.api_base_url, "http://localhost:9999");
        assert_eq!(config.cache_ttl_secs, 300);
    }

    // ========== watch_loop tests ==========

    #[tokio::test]
    async fn test_watch_loop_stops_during_a_refresh() {
        let (stop, stopped) = oneshot::channel::<()>();
        let stop = Mutex::new(Some(stop));
        let refreshes = AtomicUsize::new(0);

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            watch_loop(Duration::from_secs(1), stopped, || {
                refreshes.fetch_add(1, Ordering::SeqCst);
                if let Some(stop) = stop.lock().unwrap().take() {
                    let _ = stop.send(());
                }
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            }),
        )
        .await;

        assert!(matches!(outcome, Ok(Ok(()))));
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_loop_repeats_until_stopped() {
        let (stop, stopped) = oneshot::channel::<()>();
        let stop = Mutex::new(Some(stop));
        let refreshes = AtomicUsize::new(0);

        watch_loop(Duration::from_millis(10), stopped, || {
            if refreshes.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                if let Some(stop) = stop.lock().unwrap().take() {
                    let _ = stop.send(());
                }
            }
            async { Ok(()) }
        })
        .await
        .unwrap();

        assert!(refreshes.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_watch_loop_propagates_refresh_error() {
        let (_stop, stopped) = oneshot::channel::<()>();

        let result = watch_loop(Duration::from_millis(10), stopped, || async {
            Err(anyhow::anyhow!("stdout closed"))
        })
        .await;

        assert!(result.is_err());
    }
}
