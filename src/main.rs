use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rmqform::config::ProviderConfig;
use rmqform::error::ProviderError;
use rmqform::rabbitmq::client::ManagementClient;
use rmqform::rabbitmq::http::format_api_error;
use rmqform::resource::{dispatch, registry, PlannedAction, ResourceData};
use rmqform::state::{InstanceState, StateFile, DEFAULT_STATE_FILE};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Declarative RabbitMQ provisioning
#[derive(Parser, Debug)]
#[command(name = "rmqform", version = rmqform::VERSION, about, long_about = None)]
struct Args {
    /// State file
    #[arg(long, global = true, default_value = DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Management API endpoint, e.g. http://localhost:15672
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[arg(long, global = true)]
    username: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Converge the server to a manifest
    Apply { manifest: PathBuf },
    /// Show what apply would do, without contacting the server
    Plan { manifest: PathBuf },
    /// Re-read every managed instance from the server
    Refresh,
    /// Delete every managed instance
    Destroy,
    /// Adopt an existing entity into state
    Import {
        #[arg(value_name = "TYPE")]
        type_name: String,
        label: String,
        id: String,
    },
    /// Print state, with sensitive values masked
    Show,
    /// Describe resource types
    Schema {
        #[arg(value_name = "TYPE")]
        type_name: Option<String>,
    },
    /// Persist connection settings given as flags
    Configure {
        /// Accept invalid TLS certificates
        #[arg(long)]
        insecure: Option<bool>,
        /// Extra PEM root certificate
        #[arg(long)]
        cacert_file: Option<PathBuf>,
        #[arg(long)]
        proxy: Option<String>,
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
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// `RMQFORM_LOG` overrides `--log-level` with a full filter directive
fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match EnvFilter::try_from_env("RMQFORM_LOG") {
        Ok(filter) => filter,
        Err(_) if matches!(level, LogLevel::Off) => return Ok(None),
        Err(_) => EnvFilter::new(level.as_filter()),
    };

    let (writer, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("rmqform {} started with log level: {:?}", rmqform::VERSION, level);

    Ok(Some(guard))
}

/// One manifest entry
#[derive(Debug, Clone, Deserialize)]
struct Declaration {
    #[serde(rename = "type")]
    type_name: String,
    label: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

impl Declaration {
    fn address(&self) -> String {
        format!("{}.{}", self.type_name, self.label)
    }
}

/// YAML (or JSON) manifest
#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    resources: Vec<Declaration>,
    #[serde(default)]
    data: Vec<Declaration>,
}

impl Manifest {
    fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read manifest {:?}", path))?;
        let manifest: Manifest =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse manifest {:?}", path))?;

        for (i, decl) in manifest.resources.iter().enumerate() {
            if manifest.resources[..i]
                .iter()
                .any(|d| d.type_name == decl.type_name && d.label == decl.label)
            {
                anyhow::bail!("{} is declared twice", decl.address());
            }
        }

        Ok(manifest)
    }

    fn declares(&self, instance: &InstanceState) -> bool {
        self.resources
            .iter()
            .any(|d| d.type_name == instance.type_name && d.label == instance.label)
    }
}

fn provider_config(args: &Args) -> ProviderConfig {
    let mut config = ProviderConfig::load().with_env_overrides();
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    config
}

fn connect(args: &Args) -> Result<ManagementClient> {
    let config = provider_config(args);
    tracing::debug!("Provider configuration: {:?}", config);
    Ok(ManagementClient::new(&config)?)
}

/// Bag for a declaration, carrying its state when it is already managed
fn resource_data(decl: &Declaration, state: &StateFile) -> ResourceData {
    let data = ResourceData::new(&decl.type_name, decl.attributes.clone());
    match state.find(&decl.type_name, &decl.label) {
        Some(instance) => data.with_prior(&instance.id, instance.attributes.clone()),
        None => data,
    }
}

/// Bag holding an instance's recorded state
fn state_data(instance: &InstanceState) -> ResourceData {
    let mut data = ResourceData::new(&instance.type_name, instance.attributes.clone());
    data.set_id(&instance.id);
    data
}

fn record(state: &mut StateFile, type_name: &str, label: &str, data: ResourceData) {
    let (id, attributes) = data.into_parts();
    if id.is_empty() {
        state.remove(type_name, label);
    } else {
        state.upsert(InstanceState::new(type_name, label, &id, attributes));
    }
}

async fn apply(client: &ManagementClient, manifest: &Manifest, state_path: &Path) -> Result<()> {
    let mut state = StateFile::load(state_path)?;

    for decl in &manifest.data {
        let mut data = ResourceData::new(&decl.type_name, decl.attributes.clone());
        dispatch::read_data_source(client, &mut data)
            .await
            .with_context(|| format!("Failed to read data source {}", decl.address()))?;

        if data.id().is_empty() {
            println!("data.{}: not found", decl.address());
        } else {
            println!("data.{}: {}", decl.address(), data.id());
        }
    }

    for decl in &manifest.resources {
        let mut data = resource_data(decl, &state);
        let action = dispatch::plan(&data).with_context(|| format!("Failed to plan {}", decl.address()))?;

        let result = match &action {
            PlannedAction::NoOp => continue,
            PlannedAction::Create => dispatch::create(client, &mut data).await,
            PlannedAction::Update(_) => dispatch::update(client, &mut data).await,
            PlannedAction::Replace(_) => {
                let mut old = resource_data(decl, &state);
                match dispatch::delete(client, &mut old).await {
                    Ok(()) => {
                        state.remove(&decl.type_name, &decl.label);
                        data = ResourceData::new(&decl.type_name, decl.attributes.clone());
                        dispatch::create(client, &mut data).await
                    }
                    Err(e) => Err(e),
                }
            }
        };

        if let Err(e) = result {
            state.save(state_path)?;
            return Err(e).with_context(|| format!("Failed to apply {}", decl.address()));
        }

        println!("{} {}", action.symbol(), decl.address());
        record(&mut state, &decl.type_name, &decl.label, data);
        state.save(state_path)?;
    }

    let orphans: Vec<InstanceState> = state
        .instances
        .iter()
        .rev()
        .filter(|i| !manifest.declares(i))
        .cloned()
        .collect();

    for instance in orphans {
        let mut data = state_data(&instance);
        dispatch::delete(client, &mut data)
            .await
            .with_context(|| format!("Failed to delete {}", instance.address()))?;

        println!("- {}", instance.address());
        state.remove(&instance.type_name, &instance.label);
        state.save(state_path)?;
    }

    state.save(state_path)
}

fn plan(manifest: &Manifest, state_path: &Path) -> Result<()> {
    let state = StateFile::load(state_path)?;

    for decl in &manifest.resources {
        let data = resource_data(decl, &state);
        let action = dispatch::plan(&data).with_context(|| format!("Failed to plan {}", decl.address()))?;

        match &action {
            PlannedAction::Update(paths) | PlannedAction::Replace(paths) => {
                println!("{} {} ({})", action.symbol(), decl.address(), paths.join(", "));
            }
            _ => println!("{} {}", action.symbol(), decl.address()),
        }
    }

    for instance in state.instances.iter().filter(|i| !manifest.declares(i)) {
        println!("- {}", instance.address());
    }

    Ok(())
}

async fn refresh(client: &ManagementClient, state_path: &Path) -> Result<()> {
    let mut state = StateFile::load(state_path)?;

    for instance in state.instances.clone() {
        let mut data = state_data(&instance);
        dispatch::read(client, &mut data)
            .await
            .with_context(|| format!("Failed to refresh {}", instance.address()))?;

        if data.id().is_empty() {
            println!("{}: gone, dropped from state", instance.address());
        }
        record(&mut state, &instance.type_name, &instance.label, data);
    }

    state.save(state_path)
}

async fn destroy(client: &ManagementClient, state_path: &Path) -> Result<()> {
    let mut state = StateFile::load(state_path)?;

    for instance in state.instances.clone().into_iter().rev() {
        let mut data = state_data(&instance);
        dispatch::delete(client, &mut data)
            .await
            .with_context(|| format!("Failed to delete {}", instance.address()))?;

        println!("- {}", instance.address());
        state.remove(&instance.type_name, &instance.label);
        state.save(state_path)?;
    }

    Ok(())
}

async fn import(client: &ManagementClient, state_path: &Path, type_name: &str, label: &str, id: &str) -> Result<()> {
    let mut state = StateFile::load(state_path)?;
    if state.find(type_name, label).is_some() {
        anyhow::bail!("{}.{} is already managed", type_name, label);
    }

    let mut data = ResourceData::new(type_name, Map::new());
    data.set_id(id);
    dispatch::read(client, &mut data)
        .await
        .with_context(|| format!("Failed to import {} {}", type_name, id))?;

    if data.id().is_empty() {
        anyhow::bail!("No {} with id {}", type_name, id);
    }

    record(&mut state, type_name, label, data);
    state.save(state_path)?;
    println!("Imported {}.{} ({})", type_name, label, id);
    Ok(())
}

fn show(state_path: &Path) -> Result<()> {
    let state = StateFile::load(state_path)?;

    for instance in &state.instances {
        let attributes = match registry::get_schema(&instance.type_name) {
            Some(schema) => registry::redact(schema, &instance.attributes),
            None => instance.attributes.clone(),
        };

        println!("# {} ({})", instance.address(), instance.id);
        println!("{}", serde_json::to_string_pretty(&attributes)?);
    }

    Ok(())
}

fn describe_attributes(attributes: &std::collections::BTreeMap<String, registry::AttributeDef>, indent: usize) {
    for (name, def) in attributes {
        let mut flags = Vec::new();
        if def.required {
            flags.push("required".to_string());
        }
        if def.computed {
            flags.push("computed".to_string());
        }
        if def.force_new {
            flags.push("forces replacement".to_string());
        }
        if def.sensitive {
            flags.push("sensitive".to_string());
        }
        if let Some(default) = &def.default {
            flags.push(format!("default {}", default));
        }
        if def.deprecated.is_some() {
            flags.push("deprecated".to_string());
        }

        println!(
            "{:indent$}{} ({:?}{}{}) {}",
            "",
            name,
            def.kind,
            if flags.is_empty() { "" } else { ", " },
            flags.join(", "),
            def.description,
            indent = indent
        );
        describe_attributes(&def.attributes, indent + 2);
    }
}

fn schema(type_name: Option<&str>) -> Result<()> {
    let Some(type_name) = type_name else {
        for name in registry::get_all_type_names() {
            let description = registry::get_schema(name).map(|s| s.description.as_str()).unwrap_or_default();
            println!("{:32} {}", name, description);
        }
        return Ok(());
    };

    let schema = registry::get_schema(type_name)
        .with_context(|| format!("Unknown resource type `{}`", type_name))?;
    println!("{}: {}", type_name, schema.description);
    describe_attributes(&schema.attributes, 2);

    if let Some(data_source) = registry::get_data_source_schema(type_name) {
        println!("\ndata source {}: {}", type_name, data_source.description);
        describe_attributes(&data_source.attributes, 2);
    }

    Ok(())
}

fn configure(args: &Args, insecure: Option<bool>, cacert_file: Option<PathBuf>, proxy: Option<String>) -> Result<()> {
    let mut config = ProviderConfig::load();
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(username) = &args.username {
        config.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.password = password.clone();
    }
    if let Some(insecure) = insecure {
        config.insecure = insecure;
    }
    if cacert_file.is_some() {
        config.cacert_file = cacert_file;
    }
    if proxy.is_some() {
        config.proxy = proxy;
    }

    config.endpoint_url()?;
    let path = config.save()?;
    println!("Configuration saved to {:?}", path);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    match &args.command {
        Command::Apply { manifest } => {
            let manifest = Manifest::load(manifest)?;
            let client = connect(&args)?;
            apply(&client, &manifest, &args.state).await
        }
        Command::Plan { manifest } => plan(&Manifest::load(manifest)?, &args.state),
        Command::Refresh => refresh(&connect(&args)?, &args.state).await,
        Command::Destroy => destroy(&connect(&args)?, &args.state).await,
        Command::Import { type_name, label, id } => {
            import(&connect(&args)?, &args.state, type_name, label, id).await
        }
        Command::Show => show(&args.state),
        Command::Schema { type_name } => schema(type_name.as_deref()),
        Command::Configure {
            insecure,
            cacert_file,
            proxy,
        } => configure(&args, *insecure, cacert_file.clone(), proxy.clone()),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_guard = match setup_logging(args.log_level, args.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(2);
        }
    };

    let result = run(args).await;
    // Flush buffered log lines before exiting
    drop(log_guard);

    if let Err(err) = result {
        match err.downcast_ref::<ProviderError>() {
            Some(provider_error) => eprintln!("Error: {}: {}", err, format_api_error(provider_error)),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}
