use std::env;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::{LevelFilter, debug, info};
use serde::Serialize;
use serde_json::json;

use edusync::auth::decode_credential;
use edusync::config::{
    APP_NAME, AppConfig, load_or_init_config, resolve_config_file, write_default_config,
};
use edusync::issuer::HttpIssuer;
use edusync::login::{LoginFlow, LoginForm};
use edusync::nav::{MenuItem, NavComposer};
use edusync::resource::ResourceClient;
use edusync::routes::{Navigation, Navigator, Outcome};
use edusync::session::{FileSessionStore, SessionManager, SessionState};

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn async_main(ctx: RuntimeContext, command: Command) -> Result<()> {
    match command {
        Command::Login(cmd) => handle_login(&ctx, cmd).await,
        Command::Fetch { path } => handle_fetch(&ctx, &path).await,
        Command::Dashboard => handle_dashboard(&ctx).await,
        Command::Schedule => handle_schedule(&ctx).await,
        other => Err(anyhow!("{other:?} is not an async command")),
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("config file: {}", ctx.config_file.display());

    match cli.command {
        Command::Logout => handle_logout(&ctx),
        Command::Whoami => handle_whoami(&ctx),
        Command::Navigate { path } => handle_navigate(&ctx, &path),
        Command::Menu(cmd) => handle_menu(&ctx, cmd),
        Command::Decode { token } => handle_decode(&ctx, &token),
        Command::Config { command } => handle_config(&ctx, command),
        Command::Completions { shell } => handle_completions(shell),
        command => async_main(ctx, command),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "EduSync - session and navigation client for the EduSync LMS.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    debug: bool,
    /// Enable trace logging (overrides other levels)
    #[arg(long, global = true)]
    trace: bool,
    /// Output machine readable JSON
    #[arg(long, global = true, conflicts_with = "yaml")]
    json: bool,
    /// Output machine readable YAML
    #[arg(long, global = true)]
    yaml: bool,
    /// Disable ANSI colors in output
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    /// Control color output (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
    /// Do not change anything on disk
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    /// Emit additional diagnostics for troubleshooting
    #[arg(long = "diagnostics", global = true)]
    diagnostics: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and land on the role's home (or the remembered destination)
    Login(LoginCommand),
    /// End the current session
    Logout,
    /// Show the current session
    Whoami,
    /// Navigate to a path and report where the guard lets you end up
    Navigate {
        /// Requested path, e.g. /admin/users
        path: String,
    },
    /// Show the navigation menu for the current session
    Menu(MenuCommand),
    /// Decode a credential and show the derived role
    Decode {
        /// Signed credential (header.payload.signature)
        token: String,
    },
    /// GET a resource API path with the session credential
    Fetch {
        /// API path, e.g. /api/dashboard/7
        path: String,
    },
    /// Show the student dashboard summary
    Dashboard,
    /// Show the student course schedule
    Schedule,
    /// Inspect and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Args)]
struct LoginCommand {
    /// Account email
    #[arg(short, long)]
    email: String,
    /// Account password (read from stdin when omitted)
    #[arg(short, long, env = "EDUSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Path that was requested before logging in
    #[arg(long, value_name = "PATH")]
    from: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct MenuCommand {
    /// Location to render the menu for (defaults to the role's home)
    #[arg(long, value_name = "PATH")]
    path: Option<String>,
    /// Expand a group by label (repeatable)
    #[arg(long = "open", value_name = "GROUP")]
    open: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration
    Show,
    /// Print the resolved config file path
    Path,
    /// Regenerate the default configuration file
    Reset,
}

#[derive(Debug)]
struct RuntimeContext {
    common: CommonOpts,
    config_file: PathBuf,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let config_file = resolve_config_file(common.config.clone())?;
        let config = load_or_init_config(&config_file, common.dry_run)?;
        Ok(Self {
            common,
            config_file,
            config,
        })
    }

    fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let level = match self.effective_log_level() {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        };

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{APP_NAME}={level}")));

        // stdout carries command output; logs go to stderr
        if self.common.json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
                .try_init()
                .ok();
        } else {
            let force_color = matches!(self.common.color, ColorOption::Always)
                || env::var_os("FORCE_COLOR").is_some();
            let disable_color = self.common.no_color
                || matches!(self.common.color, ColorOption::Never)
                || env::var_os("NO_COLOR").is_some()
                || (!force_color && !io::stderr().is_terminal());

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(io::stderr)
                        .with_ansi(!disable_color)
                        .with_target(self.common.diagnostics)
                        .with_file(self.common.diagnostics)
                        .with_line_number(self.common.diagnostics),
                )
                .try_init()
                .ok();
        }

        // Also init env_logger for compatibility with log crate users
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
        builder.filter_level(self.effective_log_level());
        builder.try_init().ok();

        Ok(())
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => self
                    .config
                    .logging
                    .level
                    .parse()
                    .unwrap_or(LevelFilter::Info),
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    /// Session manager backed by the state directory, restored from disk.
    fn sessions(&self) -> Result<Arc<SessionManager>> {
        let state_dir = self.config.state_dir()?;
        let store = FileSessionStore::new(&state_dir, &self.config.session.key);
        debug!("session store: {}", store.path().display());

        let sessions = Arc::new(SessionManager::new(Arc::new(store)));
        sessions
            .restore()
            .context("restoring persisted session")?;
        Ok(sessions)
    }

    fn navigator(&self, sessions: Arc<SessionManager>) -> Navigator {
        Navigator::new(
            sessions,
            self.config.routes.paths(),
            self.config.routes.remember_destination,
        )
    }

    fn resources(&self, sessions: Arc<SessionManager>) -> Result<ResourceClient> {
        ResourceClient::new(
            self.config.issuer.base_url.as_str(),
            self.config.issuer.timeout(),
            sessions,
        )
        .context("building resource API client")
    }

    /// Print `value` as JSON/YAML when requested, otherwise run `human`.
    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.common.json {
            println!(
                "{}",
                serde_json::to_string_pretty(value).context("serializing output to JSON")?
            );
        } else if self.common.yaml {
            println!(
                "{}",
                serde_yaml::to_string(value).context("serializing output to YAML")?
            );
        } else {
            human();
        }
        Ok(())
    }
}

fn read_password() -> Result<String> {
    if io::stdin().is_terminal() {
        eprint!("Password: ");
        io::stderr().flush().ok();
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn handle_login(ctx: &RuntimeContext, cmd: LoginCommand) -> Result<()> {
    let sessions = ctx.sessions()?;
    let mut navigator = ctx.navigator(sessions.clone());
    if let Some(ref from) = cmd.from {
        navigator.navigate(from);
    }

    let password = match cmd.password {
        Some(password) => password,
        None => read_password()?,
    };

    let issuer = HttpIssuer::new(
        ctx.config.issuer.base_url.as_str(),
        ctx.config.issuer.login_path.as_str(),
        ctx.config.issuer.timeout(),
    )
    .context("building issuer client")?;
    let flow = LoginFlow::new(Arc::new(issuer), sessions);

    let identity = flow.submit(&LoginForm::new(cmd.email, password)).await?;
    let landing = navigator.landing_after_login();
    let navigation = navigator.navigate(&landing);
    info!("{} logged in as {}", identity.name, identity.role);

    let output = json!({
        "name": identity.name,
        "role": identity.role,
        "userId": identity.user_id(),
        "navigation": navigation,
    });
    ctx.emit(&output, || {
        println!("Logged in as {} ({})", identity.name, identity.role);
        print_navigation(&navigation);
    })
}

fn handle_logout(ctx: &RuntimeContext) -> Result<()> {
    let sessions = ctx.sessions()?;
    let was_authenticated = sessions.is_authenticated();
    if ctx.common.dry_run {
        info!("dry-run: would end the current session");
        return Ok(());
    }
    sessions.logout().context("clearing stored session")?;

    let output = json!({ "loggedOut": was_authenticated });
    ctx.emit(&output, || {
        if was_authenticated {
            println!("Logged out");
        } else {
            println!("Not logged in");
        }
    })
}

fn handle_whoami(ctx: &RuntimeContext) -> Result<()> {
    let sessions = ctx.sessions()?;
    let output = match sessions.current_user() {
        Some(identity) => {
            let expires_at = decode_credential(&identity.credential)
                .ok()
                .and_then(|claims| claims.expires_at());
            json!({
                "authenticated": true,
                "name": identity.name,
                "role": identity.role,
                "userId": identity.user_id(),
                "email": identity.account.as_ref().map(|account| account.email.clone()),
                "expiresAt": expires_at,
            })
        }
        None => json!({ "authenticated": false }),
    };

    let state = sessions.state();
    ctx.emit(&output, || match state {
        SessionState::Authenticated(identity) => {
            println!("{} ({})", identity.name, identity.role);
            if let Some(account) = identity.account {
                println!("  id:    {}", account.id);
                println!("  email: {}", account.email);
            }
        }
        SessionState::Anonymous => println!("Not logged in"),
    })
}

fn handle_navigate(ctx: &RuntimeContext, path: &str) -> Result<()> {
    let sessions = ctx.sessions()?;
    let mut navigator = ctx.navigator(sessions);
    let navigation = navigator.navigate(path);
    ctx.emit(&navigation, || print_navigation(&navigation))
}

fn print_navigation(navigation: &Navigation) {
    for hop in &navigation.hops {
        println!("  {} -> {} ({:?})", hop.from, hop.to, hop.reason);
    }
    match navigation.outcome {
        Outcome::Render { view } => println!("{}  {}", navigation.location, view.title()),
        Outcome::NotFound => println!("{}  404 Not Found", navigation.location),
        Outcome::RedirectLoop => println!(
            "{}  redirect loop, check the [routes] config",
            navigation.location
        ),
    }
}

fn handle_menu(ctx: &RuntimeContext, cmd: MenuCommand) -> Result<()> {
    let sessions = ctx.sessions()?;
    let state = sessions.state();
    let mut composer = NavComposer::new();

    if let Some(role) = state.role() {
        let paths = ctx.config.routes.paths();
        let location = cmd.path.as_deref().unwrap_or(paths.home_for(role));
        composer.set_location(role, location);
        for group in &cmd.open {
            if !composer.is_open(group) {
                composer.toggle(group);
            }
        }
    }

    let items = composer.compose_for(&state);
    ctx.emit(&items, || {
        if items.is_empty() {
            println!("No menu (not logged in)");
        }
        print_menu(&items, 0);
    })
}

fn print_menu(items: &[MenuItem], depth: usize) {
    for item in items {
        let marker = if item.active { "*" } else { " " };
        let fold = match item.expanded {
            Some(true) => "[-] ",
            Some(false) => "[+] ",
            None => "",
        };
        let path = item.path.as_deref().unwrap_or("");
        println!(
            "{marker} {indent}{fold}{label:<24} {path}",
            indent = "  ".repeat(depth),
            label = item.label,
        );
        if item.expanded == Some(true) {
            print_menu(&item.children, depth + 1);
        }
    }
}

fn handle_decode(ctx: &RuntimeContext, token: &str) -> Result<()> {
    let claims = decode_credential(token.trim())?;
    let output = json!({
        "role": claims.role(),
        "subject": claims.subject(),
        "expiresAt": claims.expires_at(),
        "claims": claims.raw(),
    });
    ctx.emit(&output, || {
        println!("role:    {}", claims.role());
        if let Some(subject) = claims.subject() {
            println!("subject: {subject}");
        }
        if let Some(expires_at) = claims.expires_at() {
            println!("expires: {}", expires_at.to_rfc3339());
        }
    })
}

async fn handle_fetch(ctx: &RuntimeContext, path: &str) -> Result<()> {
    let resources = ctx.resources(ctx.sessions()?)?;
    let body: serde_json::Value = resources.get_json(path).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&body).context("serializing response")?
    );
    Ok(())
}

async fn handle_dashboard(ctx: &RuntimeContext) -> Result<()> {
    let resources = ctx.resources(ctx.sessions()?)?;
    let dashboard = resources.dashboard().await?;
    ctx.emit(&dashboard, || {
        println!("{}", dashboard.full_name);
        println!(
            "  GPA {:.2}  courses {}  pending assignments {}",
            dashboard.gpa, dashboard.total_courses, dashboard.pending_assignments
        );
        if !dashboard.todays_classes.is_empty() {
            println!("Today");
            for class in &dashboard.todays_classes {
                println!("  {:<8} {} ({})", class.time, class.subject, class.doctor);
            }
        }
        if !dashboard.upcoming_assignments.is_empty() {
            println!("Upcoming");
            for assignment in &dashboard.upcoming_assignments {
                println!("  {} due {}", assignment.title, assignment.due);
            }
        }
        if !dashboard.announcements.is_empty() {
            println!("Announcements");
            for announcement in &dashboard.announcements {
                println!("  {} {}", announcement.date, announcement.title);
            }
        }
    })
}

async fn handle_schedule(ctx: &RuntimeContext) -> Result<()> {
    let resources = ctx.resources(ctx.sessions()?)?;
    let entries = resources.course_schedule().await?;
    ctx.emit(&entries, || {
        if entries.is_empty() {
            println!("No scheduled classes");
        }
        for entry in &entries {
            println!(
                "{} {:<9} {:<8} {:<28} {:<8} {}",
                entry.date, entry.day, entry.time, entry.subject, entry.room, entry.doctor
            );
        }
    })
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if ctx.common.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ctx.config)
                        .context("serializing config to JSON")?
                );
            } else if ctx.common.yaml {
                println!(
                    "{}",
                    serde_yaml::to_string(&ctx.config).context("serializing config to YAML")?
                );
            } else {
                println!("{:#?}", ctx.config);
            }
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.config_file.display());
            Ok(())
        }
        ConfigCommand::Reset => {
            if ctx.common.dry_run {
                info!(
                    "dry-run: would reset config at {}",
                    ctx.config_file.display()
                );
                return Ok(());
            }
            write_default_config(&ctx.config_file)
        }
    }
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}
