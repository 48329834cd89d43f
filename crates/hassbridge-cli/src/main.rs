//! Command-line interface for the Home Assistant REST bridge.

mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hassbridge_core::config::env_vars;
use hassbridge_core::{ConnectionConfig, HassClient, OperationKind};
use hassbridge_rpc::RpcRouter;
use hassbridge_tools::{ToolRegistryBuilder, format_for_llm};
use serde_json::{Map, Value, json};

/// Environment variable that switches logs to JSON lines.
const LOG_JSON_ENV: &str = "HASSBRIDGE_LOG_JSON";

/// Home Assistant REST bridge - query states, call services, serve tools and RPC.
#[derive(Parser, Debug)]
#[command(name = "hassbridge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Home Assistant base URL.
    #[arg(long, global = true, env = env_vars::URL)]
    url: Option<String>,

    /// Long-lived access token.
    #[arg(long, global = true, env = env_vars::TOKEN, hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in milliseconds.
    #[arg(
        long,
        global = true,
        env = env_vars::TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_ms: Option<u64>,

    /// Print the raw result envelope as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the API is running.
    Status,
    /// Show the server configuration.
    Config,
    /// List loaded integrations.
    Components,
    /// List entity states.
    States {
        /// Only entities of this domain (e.g. light).
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Show one entity state.
    State {
        /// Entity ID (e.g. light.living_room).
        entity_id: String,
    },
    /// Create or update an entity state.
    SetState {
        entity_id: String,
        state: String,
        /// Attributes as a JSON object.
        #[arg(short, long)]
        attributes: Option<String>,
    },
    /// Remove an entity state.
    DeleteState { entity_id: String },
    /// List event types and listener counts.
    Events,
    /// Fire an event.
    FireEvent {
        event_type: String,
        /// Event data as a JSON object.
        #[arg(short, long)]
        data: Option<String>,
    },
    /// List services per domain.
    Services {
        /// Only services of this domain.
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Call a service (e.g. `call light turn_on --data '{"entity_id":"light.kitchen"}'`).
    Call {
        domain: String,
        service: String,
        /// Service data as a JSON object.
        #[arg(short, long)]
        data: Option<String>,
        /// Ask the service to return its response data.
        #[arg(long)]
        return_response: bool,
    },
    /// Show state history.
    History {
        /// Entity to include (repeatable).
        #[arg(short, long = "entity")]
        entities: Vec<String>,
        /// Start of the window (ISO 8601).
        #[arg(long, conflicts_with = "hours")]
        start: Option<String>,
        /// Start the window this many hours ago.
        #[arg(long, value_parser = parse_hours)]
        hours: Option<f64>,
        /// End of the window (ISO 8601).
        #[arg(long)]
        end: Option<String>,
        /// Minimal response for intermediate states.
        #[arg(long)]
        minimal: bool,
        /// Skip attributes.
        #[arg(long)]
        no_attributes: bool,
        /// Only significant changes.
        #[arg(long)]
        significant_only: bool,
    },
    /// Show logbook entries.
    Logbook {
        /// Only entries for this entity.
        #[arg(short, long)]
        entity: Option<String>,
        /// Start of the window (ISO 8601).
        #[arg(long, conflicts_with = "hours")]
        start: Option<String>,
        /// Start the window this many hours ago.
        #[arg(long, value_parser = parse_hours)]
        hours: Option<f64>,
        /// End of the window (ISO 8601).
        #[arg(long)]
        end: Option<String>,
    },
    /// Print the error log.
    ErrorLog,
    /// List calendars.
    Calendars,
    /// List events of one calendar.
    CalendarEvents {
        /// Calendar entity ID (e.g. calendar.family).
        calendar_id: String,
        /// Start (ISO 8601). Defaults to now.
        #[arg(long)]
        start: Option<String>,
        /// End (ISO 8601). Defaults to seven days from now.
        #[arg(long)]
        end: Option<String>,
    },
    /// Render a template.
    Template {
        /// Jinja2 template text.
        template: String,
    },
    /// Validate the configuration files.
    CheckConfig,
    /// Handle an intent.
    Intent {
        name: String,
        /// Slot data as a JSON object.
        #[arg(short, long)]
        data: Option<String>,
    },
    /// List the agent tool definitions.
    Tools {
        /// Only tools whose name or description contains this keyword.
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Serve JSON-RPC 2.0 over stdin/stdout, one request per line.
    Rpc,
}

impl Command {
    /// Operation and its JSON arguments, for the commands that map to one.
    fn operation(self) -> Option<(OperationKind, Value)> {
        let mut args = Map::new();
        let kind = match self {
            Command::Status => OperationKind::Status,
            Command::Config => OperationKind::GetConfig,
            Command::Components => OperationKind::ListComponents,
            Command::States { domain } => {
                put(&mut args, "domain", domain);
                OperationKind::ListStates
            }
            Command::State { entity_id } => {
                put(&mut args, "entity_id", Some(entity_id));
                OperationKind::GetState
            }
            Command::SetState {
                entity_id,
                state,
                attributes,
            } => {
                put(&mut args, "entity_id", Some(entity_id));
                put(&mut args, "state", Some(state));
                put(&mut args, "attributes", attributes);
                OperationKind::SetState
            }
            Command::DeleteState { entity_id } => {
                put(&mut args, "entity_id", Some(entity_id));
                OperationKind::DeleteState
            }
            Command::Events => OperationKind::ListEvents,
            Command::FireEvent { event_type, data } => {
                put(&mut args, "event_type", Some(event_type));
                put(&mut args, "data", data);
                OperationKind::FireEvent
            }
            Command::Services { domain } => {
                put(&mut args, "domain", domain);
                OperationKind::ListServices
            }
            Command::Call {
                domain,
                service,
                data,
                return_response,
            } => {
                put(&mut args, "domain", Some(domain));
                put(&mut args, "service", Some(service));
                put(&mut args, "data", data);
                args.insert("return_response".to_string(), json!(return_response));
                OperationKind::CallService
            }
            Command::History {
                entities,
                start,
                hours,
                end,
                minimal,
                no_attributes,
                significant_only,
            } => {
                args.insert("entity_ids".to_string(), json!(entities));
                put(&mut args, "start_time", start);
                put(&mut args, "end_time", end);
                if let Some(hours) = hours {
                    args.insert("hours".to_string(), json!(hours));
                }
                args.insert("minimal_response".to_string(), json!(minimal));
                args.insert("no_attributes".to_string(), json!(no_attributes));
                args.insert(
                    "significant_changes_only".to_string(),
                    json!(significant_only),
                );
                OperationKind::GetHistory
            }
            Command::Logbook {
                entity,
                start,
                hours,
                end,
            } => {
                put(&mut args, "entity_id", entity);
                put(&mut args, "start_time", start);
                put(&mut args, "end_time", end);
                if let Some(hours) = hours {
                    args.insert("hours".to_string(), json!(hours));
                }
                OperationKind::GetLogbook
            }
            Command::ErrorLog => OperationKind::GetErrorLog,
            Command::Calendars => OperationKind::ListCalendars,
            Command::CalendarEvents {
                calendar_id,
                start,
                end,
            } => {
                put(&mut args, "calendar_id", Some(calendar_id));
                put(&mut args, "start", start);
                put(&mut args, "end", end);
                OperationKind::GetCalendarEvents
            }
            Command::Template { template } => {
                put(&mut args, "template", Some(template));
                OperationKind::RenderTemplate
            }
            Command::CheckConfig => OperationKind::CheckConfig,
            Command::Intent { name, data } => {
                put(&mut args, "name", Some(name));
                put(&mut args, "data", data);
                OperationKind::HandleIntent
            }
            Command::Tools { .. } | Command::Rpc => return None,
        };
        Some((kind, Value::Object(args)))
    }
}

/// Positive, finite hours that still yield a valid timestamp.
fn parse_hours(text: &str) -> std::result::Result<f64, String> {
    let hours: f64 = text
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", text))?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err("hours must be a positive number".to_string());
    }
    if hassbridge_core::query::since_hours(hours).is_none() {
        return Err("hours is out of range".to_string());
    }
    Ok(hours)
}

fn put(args: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        args.insert(key.to_string(), Value::String(value));
    }
}

/// Client from the global flags. Without both URL and token, settings are
/// resolved from the environment on every call.
fn build_client(args: &Args) -> HassClient {
    let url = args.url.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let token = args.token.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match (url, token) {
        (Some(url), Some(token)) => {
            let mut config = ConnectionConfig::new(url, token);
            if let Some(timeout_ms) = args.timeout_ms {
                config = config.with_timeout_ms(timeout_ms);
            }
            HassClient::with_config(config)
        }
        _ => HassClient::from_env(),
    }
}

fn init_logging(verbose: bool) {
    let json_logging = std::env::var(LOG_JSON_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_directive = if verbose {
        "hassbridge=debug"
    } else {
        "hassbridge=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    // Logs go to stderr so stdout stays parseable.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let client = build_client(&args);
    tracing::debug!(?client, "Client ready");

    let json_output = args.json;
    match args.command {
        Command::Tools { filter } => {
            let registry = ToolRegistryBuilder::new().with_hass_tools(client).build();
            match (filter.as_deref(), json_output) {
                (None, true) => {
                    println!("{}", serde_json::to_string_pretty(&registry.definitions_json()?)?);
                }
                (None, false) => print!("{}", format_for_llm(&registry.definitions())),
                (Some(keyword), true) => {
                    let tools = serde_json::to_value(registry.search(keyword))?;
                    println!("{}", serde_json::to_string_pretty(&json!({ "tools": tools }))?);
                }
                (Some(keyword), false) => print!("{}", format_for_llm(&registry.search(keyword))),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Rpc => {
            tracing::info!("Serving JSON-RPC on stdio");
            RpcRouter::new(client)
                .serve_lines(tokio::io::stdin(), tokio::io::stdout())
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        command => {
            let Some((kind, op_args)) = command.operation() else {
                return Ok(ExitCode::SUCCESS);
            };
            let envelope = client.invoke(kind, &op_args).await;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&envelope.to_json())?);
            } else if envelope.ok {
                println!("{}", output::render(kind, &envelope));
            } else {
                eprintln!("{}", output::render(kind, &envelope));
            }

            Ok(if envelope.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
