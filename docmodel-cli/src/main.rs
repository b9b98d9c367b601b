use clap::{Parser, Subcommand, ValueEnum};
use docmodel::{parse_schema, Document, Lookup, RecordId, SerializeOptions};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process;

/// docmodel: inspect schemas and render documents from the command line
#[derive(Parser)]
#[command(name = "docmodel", version, about)]
struct Cli {
    /// Path to the schema declaration file
    #[arg(long, default_value = "schema.yaml")]
    schema: PathBuf,

    /// Class to work with
    #[arg(long)]
    class: String,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List the flattened field paths of the class
    Paths,

    /// Build a document from a JSON file and print its projection
    Render {
        /// JSON file holding the document data
        #[arg(long)]
        data: PathBuf,
        /// Treat the data as already persisted (nothing is modified)
        #[arg(long)]
        persisted: bool,
        /// Extra values applied after loading (e.g. --set address.city=Praha)
        #[arg(long = "set", value_parser = parse_key_value)]
        sets: Vec<(String, String)>,
        #[command(flatten)]
        projection: ProjectionArgs,
    },

    /// Resolve a dotted path in a document
    Get {
        /// JSON file holding the document data
        #[arg(long)]
        data: PathBuf,
        /// Dotted path (e.g. images.0.title)
        #[arg(long)]
        path: String,
    },
}

#[derive(clap::Args)]
struct ProjectionArgs {
    /// Include the record identifier field
    #[arg(long)]
    record_id: bool,
    /// Include the record identifier under a different key
    #[arg(long, conflicts_with = "record_id")]
    record_id_as: Option<String>,
    /// Only fields that are modified or still hold their default
    #[arg(long)]
    modified: bool,
    /// Include virtual fields
    #[arg(long)]
    virtuals: bool,
    /// Include metadata fields
    #[arg(long)]
    metadata: bool,
    /// Print the in-memory projection instead of the wire projection
    #[arg(long)]
    object: bool,
}

impl ProjectionArgs {
    fn options(&self) -> SerializeOptions<'static> {
        let record_id = match (&self.record_id_as, self.record_id) {
            (Some(key), _) => RecordId::Rename(key.clone()),
            (None, true) => RecordId::Include,
            (None, false) => RecordId::Omit,
        };
        SerializeOptions {
            virtuals: self.virtuals,
            metadata: self.metadata,
            modified: self.modified,
            record_id,
            exclude: None,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid key=value pair: no '=' found in '{s}'"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let schemas = parse_schema(&cli.schema)?;
    let schema = schemas.require(&cli.class)?;
    log::debug!("loaded {} classes from {}", schemas.len(), cli.schema.display());

    match cli.command {
        Command::Paths => {
            let mut paths = Map::new();
            schema.each_path(|path, descriptor| {
                let kind = format!("{:?}", descriptor.field_type.kind());
                paths.insert(path.to_string(), Value::String(kind));
            });
            print_output(&Value::Object(paths), &cli.format)?;
        }

        Command::Render {
            data,
            persisted,
            sets,
            projection,
        } => {
            let data = read_data(&data)?;
            let mut doc = if persisted {
                Document::from_persisted(schema, &data)
            } else {
                Document::new(schema, &data)
            };
            for (path, raw) in &sets {
                let outcome = doc.set(path, parse_value(raw), false);
                log::debug!("set {path}: {outcome:?}");
            }

            let opts = projection.options();
            let rendered = if projection.object {
                doc.to_object(&opts)
            } else {
                doc.to_json(&opts)
            };
            print_output(&Value::Object(rendered), &cli.format)?;
        }

        Command::Get { data, path } => {
            let data = read_data(&data)?;
            let doc = Document::new(schema, &data);
            match doc.get(&path) {
                Lookup::Absent => return Err(format!("path '{path}' not found").into()),
                found => print_output(&found.to_value().unwrap_or(Value::Null), &cli.format)?,
            }
        }
    }

    Ok(())
}

fn read_data(path: &Path) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read data file '{}': {e}", path.display()))?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        _ => Err(format!("'{}' must hold a JSON object", path.display()).into()),
    }
}

fn parse_value(raw: &str) -> Value {
    // Try to parse as JSON value (for numbers, booleans, arrays, objects)
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_output(value: &Value, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
