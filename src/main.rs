use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ecl::cloud::CloudClient;
use ecl::config::Config;
use ecl::error::format_error;
use ecl::resource::{self, extract_json_value, ColumnDef};
use ecl::service_filter::Interface;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command line client for the Enterprise Cloud APIs
#[derive(Parser, Debug)]
#[command(name = "ecl", version, about, long_about = None)]
struct Args {
    /// Region to use (overrides OS_REGION_NAME and the config file)
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Endpoint interface to use: public, internal or admin
    #[arg(short, long, global = true)]
    interface: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every declared service and the version it resolves to
    Services,
    /// Resolve the version path of one service
    Resolve {
        /// Service key, e.g. identity
        service: String,
        /// Requested version, e.g. v2.0
        #[arg(long)]
        version: Option<String>,
    },
    /// List resources of a kind, e.g. identity-users
    List {
        resource: String,
        /// Base path parameter, e.g. instance_id=abc
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        /// Query parameter, e.g. name=db01
        #[arg(short, long = "query", value_parser = parse_key_val)]
        query: Vec<(String, String)>,
    },
    /// Show one resource by id
    Show {
        resource: String,
        id: String,
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Find one resource by id or name
    Find {
        resource: String,
        name_or_id: String,
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Delete one resource by id
    Delete {
        resource: String,
        id: String,
        #[arg(short, long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        /// Fail when the resource does not exist
        #[arg(long)]
        strict: bool,
    },
    /// Save connection settings to the config file
    Configure {
        #[arg(long)]
        auth_url: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        user_domain_id: Option<String>,
        #[arg(long)]
        project_id: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ecl {} started with log level: {:?}", env!("CARGO_PKG_VERSION"), level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ecl").join("ecl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ecl").join("ecl.log");
    }
    PathBuf::from("ecl.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = Config::load();

    match run(&args, config).await {
        Ok(()) => Ok(()),
        Err(err) => {
            // Library errors get a short user-facing message, the rest go out as-is
            match err.downcast_ref::<ecl::Error>() {
                Some(sdk_err) => {
                    tracing::error!("{:?}", err);
                    eprintln!("Error: {}", format_error(sdk_err));
                    std::process::exit(1);
                }
                None => Err(err),
            }
        }
    }
}

async fn run(args: &Args, mut config: Config) -> Result<()> {
    match &args.command {
        Command::Services => {
            println!(
                "{:<16} {:<10} {:<9} {:<8} {:<24} {}",
                "SERVICE", "TYPE", "INTERFACE", "PATH", "MODULE", "SERVICE MODULE"
            );
            for key in resource::get_all_service_keys() {
                let mut filter = resource::service_filter(key)?;
                let path = filter.resolve_path(None);
                println!(
                    "{:<16} {:<10} {:<9} {:<8} {:<24} {}",
                    key,
                    filter.service_type(),
                    filter.interface(),
                    path,
                    filter.module_path(),
                    filter.service_module()
                );
            }
        }
        Command::Resolve { service, version } => {
            let mut filter = resource::service_filter(service)?;
            let path = filter.resolve_path(version.as_deref());
            println!("filter:         {}", filter);
            println!("path:           {}", path);
            println!("module:         {}", filter.module_path());
            println!("service module: {}", filter.service_module());
            println!(
                "filter view:    {}",
                serde_json::to_string(&filter.filter_view())?
            );
        }
        Command::List {
            resource: key,
            params,
            query,
        } => {
            let client = connect(args, &config)?;
            let def = resource::require_resource(key)?;
            let params = borrow_pairs(params);
            let items = resource::list(&client, def, &params, query)
                .await
                .with_context(|| format!("Failed to list {}", def.display_name))?;
            print_table(&def.columns, &items);
        }
        Command::Show {
            resource: key,
            id,
            params,
        } => {
            let client = connect(args, &config)?;
            let def = resource::require_resource(key)?;
            let item = resource::get(&client, def, &borrow_pairs(params), id).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Command::Find {
            resource: key,
            name_or_id,
            params,
        } => {
            let client = connect(args, &config)?;
            let def = resource::require_resource(key)?;
            match resource::find(&client, def, &borrow_pairs(params), name_or_id, true).await? {
                Some(item) => println!("{}", serde_json::to_string_pretty(&item)?),
                None => println!("No {} matches '{}'", def.display_name, name_or_id),
            }
        }
        Command::Delete {
            resource: key,
            id,
            params,
            strict,
        } => {
            let client = connect(args, &config)?;
            let def = resource::require_resource(key)?;
            resource::delete(&client, def, &borrow_pairs(params), id, !strict).await?;
            println!("Deleted {} {}", def.display_name, id);
        }
        Command::Configure {
            auth_url,
            username,
            user_domain_id,
            project_id,
        } => {
            if auth_url.is_some() {
                config.auth_url = auth_url.clone();
            }
            if username.is_some() {
                config.username = username.clone();
            }
            if user_domain_id.is_some() {
                config.user_domain_id = user_domain_id.clone();
            }
            if project_id.is_some() {
                config.project_id = project_id.clone();
            }
            if args.region.is_some() {
                config.region = args.region.clone();
            }
            if let Some(interface) = &args.interface {
                config.interface = Some(interface.parse()?);
            }
            config.save().context("Failed to save configuration")?;
            match Config::config_path() {
                Some(path) => println!("Saved {:?}", path),
                None => println!("No config directory available, nothing saved"),
            }
        }
    }

    Ok(())
}

/// Build a client from flags, environment and config (in that order)
fn connect(args: &Args, config: &Config) -> Result<CloudClient> {
    let region = args.region.clone().or_else(|| config.effective_region());
    let interface: Option<Interface> = match &args.interface {
        Some(value) => Some(value.parse()?),
        None => config.effective_interface()?,
    };

    tracing::info!(
        "Using region: {}, interface: {}",
        region.as_deref().unwrap_or("any"),
        interface.map(|i| i.as_str()).unwrap_or("default")
    );

    let client = CloudClient::new(config.auth_method()?)?
        .with_region(region)
        .with_interface(interface);
    Ok(client)
}

fn borrow_pairs(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
    pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn print_table(columns: &[ColumnDef], items: &[serde_json::Value]) {
    if columns.is_empty() {
        for item in items {
            println!("{}", item);
        }
        return;
    }

    let header: Vec<String> = columns
        .iter()
        .map(|c| format!("{:<width$}", c.header.to_uppercase(), width = c.width as usize))
        .collect();
    println!("{}", header.join(" ").trim_end());

    for item in items {
        let row: Vec<String> = columns
            .iter()
            .map(|c| {
                let width = c.width as usize;
                let value = extract_json_value(item, &c.json_path);
                let value = if value.chars().count() > width {
                    let cut: String = value.chars().take(width.saturating_sub(1)).collect();
                    format!("{}~", cut)
                } else {
                    value
                };
                format!("{:<width$}", value, width = width)
            })
            .collect();
        println!("{}", row.join(" ").trim_end());
    }
}
