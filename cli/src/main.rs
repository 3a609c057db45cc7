use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use lumi::config::{AUTH_URL_VAR, ENDPOINTS_FILE_VAR, POSTS_URL_VAR, STATE_DIR_VAR};
use lumi::flows::Outcome;
use lumi::types::{FeedQuery, Registration};
use lumi::{ApiError, App, ClientConfig, ConfigError, DraftError, Notification, StoreError};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup: {0}")]
    Api(#[from] ApiError),
    #[error("draft: {0}")]
    Draft(#[from] DraftError),
    #[error("session store: {0}")]
    Store(#[from] StoreError),
    #[error("not signed in; run `lumi auth login` first")]
    NotSignedIn,
    #[error("{0}")]
    Failed(Notification),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "lumi", about = "Lumi+ feed client")]
struct Cli {
    /// Function-map JSON naming the auth and posts URLs.
    #[arg(long)]
    endpoints_file: Option<PathBuf>,

    #[arg(long)]
    auth_url: Option<String>,

    #[arg(long)]
    posts_url: Option<String>,

    /// Where the session is kept between runs.
    #[arg(long)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Auth(AuthCommand),
    Posts(PostsCommand),
}

#[derive(Args, Debug)]
struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
enum AuthSubcommand {
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, env = "LUMI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "LUMI_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Verify,
    Logout,
    Whoami,
}

#[derive(Args, Debug)]
struct PostsCommand {
    #[command(subcommand)]
    command: PostsSubcommand,
}

#[derive(Subcommand, Debug)]
enum PostsSubcommand {
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long)]
        user_id: Option<i64>,
    },
    Create {
        #[arg(long, default_value = "")]
        caption: String,
        #[arg(long, default_value = "")]
        location: String,
        /// Up to ten image or video files.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    Like {
        post_id: i64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Failed(notice)) => {
            eprintln!("{notice}");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let mut app = App::from_config(&config)?;

    match cli.command {
        Command::Auth(auth) => run_auth(&mut app, auth).await,
        Command::Posts(posts) => run_posts(&mut app, posts).await,
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    load_config_with(cli, |name| std::env::var(name).ok())
}

/// Flags win over the environment. URL flags also shadow an endpoints file
/// that only comes from the environment.
fn load_config_with(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<ClientConfig, CliError> {
    let urls_from_flags = cli.auth_url.is_some() || cli.posts_url.is_some();
    let config = ClientConfig::from_lookup(|name| {
        let flag = match name {
            ENDPOINTS_FILE_VAR => cli.endpoints_file.as_ref().map(|p| p.display().to_string()),
            AUTH_URL_VAR => cli.auth_url.clone(),
            POSTS_URL_VAR => cli.posts_url.clone(),
            STATE_DIR_VAR => cli.state_dir.as_ref().map(|p| p.display().to_string()),
            _ => None,
        };
        if flag.is_none() && name == ENDPOINTS_FILE_VAR && urls_from_flags {
            return None;
        }
        flag.or_else(|| env(name))
    })?;
    Ok(config)
}

async fn run_auth(app: &mut App, auth: AuthCommand) -> Result<(), CliError> {
    match auth.command {
        AuthSubcommand::Register { username, email, full_name, password } => {
            let form = Registration { username, email, password, full_name };
            let user = finish(app.register(form).await)?;
            print_json(&user)
        }
        AuthSubcommand::Login { email, password } => {
            let user = finish(app.login(&email, &password).await)?;
            print_json(&user)
        }
        AuthSubcommand::Verify => {
            let user = finish(app.verify().await)?;
            print_json(&user)
        }
        AuthSubcommand::Logout => {
            let notice = app.logout();
            if notice.is_error() {
                return Err(CliError::Failed(notice));
            }
            eprintln!("{notice}");
            Ok(())
        }
        AuthSubcommand::Whoami => {
            let session = app.session().load()?;
            let user = session.user.filter(|_| session.token.is_some()).ok_or(CliError::NotSignedIn)?;
            print_json(&user)
        }
    }
}

async fn run_posts(app: &mut App, posts: PostsCommand) -> Result<(), CliError> {
    match posts.command {
        PostsSubcommand::List { limit, offset, user_id } => {
            app.feed.set_query(FeedQuery { limit, offset, user_id });
            finish(app.refresh_feed().await)?;
            print_json(&app.feed.posts())
        }
        PostsSubcommand::Create { caption, location, files } => {
            for file in &files {
                app.compose.add_file(file)?;
            }
            app.compose.caption = caption;
            app.compose.location = location;
            let created = finish(app.publish().await)?;
            print_json(&created)
        }
        PostsSubcommand::Like { post_id } => {
            let outcome = finish(app.like(post_id).await)?;
            print_json(&outcome)
        }
    }
}

/// Print the notification and unwrap the value, or turn the failure into an error.
fn finish<T>(outcome: Outcome<T>) -> Result<T, CliError> {
    match outcome.value {
        Some(value) => {
            eprintln!("{}", outcome.notification);
            Ok(value)
        }
        None => Err(CliError::Failed(outcome.notification)),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
