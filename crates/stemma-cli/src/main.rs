use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use stemma::{
    FamilyGraph, LayoutConfig, Person, Relationship, ValidationError, Warning, generate_layout,
    plausibility_warnings, validate_graph,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Layout(stemma::Error),
    Config(stemma::LayoutError),
    /// `validate` found blocking problems; the report has already been printed.
    Invalid(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Invalid(count) => write!(f, "{count} validation error(s)"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<stemma::Error> for CliError {
    fn from(value: stemma::Error) -> Self {
        Self::Layout(value)
    }
}

impl From<stemma::LayoutError> for CliError {
    fn from(value: stemma::LayoutError) -> Self {
        Self::Config(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Layout,
    Validate,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    pretty: bool,
    verbose: bool,
}

/// Input document: the records plus an optional partial config.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyInput {
    #[serde(default)]
    people: Vec<Person>,
    #[serde(default)]
    relationships: Vec<Relationship>,
    #[serde(default)]
    config: Option<Value>,
}

#[derive(Serialize)]
struct ValidateOut<'a> {
    errors: &'a [ValidationError],
    warnings: &'a [Warning],
}

fn usage() -> &'static str {
    "stemma-cli\n\
\n\
USAGE:\n\
  stemma-cli [layout] [--pretty] [--verbose] [--config <path>] [<path>|-]\n\
  stemma-cli validate [--pretty] [--verbose] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a JSON object with `people`, `relationships` and an optional `config`.\n\
  - --config overlays a JSON config file on top of the input's `config`.\n\
  - validate prints {\"errors\": [...], \"warnings\": [...]} and exits with 3 on errors.\n\
  - --verbose logs pipeline stages to stderr; RUST_LOG overrides it.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "validate" => args.command = Command::Validate,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn resolve_config(input: &FamilyInput, config_path: Option<&str>) -> Result<LayoutConfig, CliError> {
    let mut config = match &input.config {
        Some(value) => LayoutConfig::from_value(value)?,
        None => LayoutConfig::default(),
    };
    if let Some(path) = config_path {
        let patch: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config = config.overlay(&patch)?;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let input: FamilyInput = serde_json::from_str(&text)?;
    tracing::debug!(
        people = input.people.len(),
        relationships = input.relationships.len(),
        "input read"
    );

    match args.command {
        Command::Layout => {
            let config = resolve_config(&input, args.config.as_deref())?;
            let layout = generate_layout(&input.people, &input.relationships, &config)?;
            write_json(&layout, args.pretty)
        }
        Command::Validate => {
            let errors = validate_graph(&input.people, &input.relationships).err().unwrap_or_default();
            let mut warnings = plausibility_warnings(&input.people, &input.relationships);
            warnings.extend(
                FamilyGraph::build(&input.people, &input.relationships)
                    .anomalies()
                    .iter()
                    .cloned(),
            );

            write_json(
                &ValidateOut {
                    errors: &errors,
                    warnings: &warnings,
                },
                args.pretty,
            )?;
            if errors.is_empty() {
                Ok(())
            } else {
                Err(CliError::Invalid(errors.len()))
            }
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(err @ CliError::Invalid(_)) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
