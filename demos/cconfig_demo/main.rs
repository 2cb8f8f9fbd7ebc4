//! # cconfig demo application
//!
//! A sample CLI that exercises the cconfig library against real directories.
//! It exists to demonstrate and manually verify behaviour, not as a tool.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example cconfig_demo -- bound
//! cargo run --example cconfig_demo -- from-schema
//! cargo run --example cconfig_demo -- --path /tmp/obj list
//! ```
//!
//! | Feature                | How to exercise it                                                   |
//! |------------------------|----------------------------------------------------------------------|
//! | Live view + scopes     | `cargo run --example cconfig_demo -- bound`                          |
//! | Empty value, to_dir    | `cargo run --example cconfig_demo -- from-schema --write`            |
//! | Listing a directory    | `cargo run --example cconfig_demo -- --path DIR list`                |
//! | Single value           | `cargo run --example cconfig_demo -- --path DIR get explorer/state`  |
//! | Schema description     | `cargo run --example cconfig_demo -- describe`                       |
//! | Custom schema          | `--schema schema.json` or `--schema schema.toml`                     |
//! | Strict unknown keys    | `--strict`                                                           |
//! | Debug logging          | `--verbose` or `RUST_LOG=cconfig=trace`                              |

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cconfig::{
    BoundDict, Cconfig, CconfigBuilder, CconfigError, ConfigAction, ConfigValue, Object, Schema,
    SchemaDefinition, SchemaEntry, TypeTag, UnknownKeyPolicy,
};

/// cconfig demo: map configuration values to directory trees.
#[derive(Parser, Debug)]
#[command(name = "cconfig-demo")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(long, global = true)]
    verbose: bool,

    /// Schema declaration file (.json or .toml). Defaults to a built-in
    /// object schema.
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Config directory. Defaults to a fresh temporary directory.
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Fail on directory entries the schema does not declare.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bind a value to a directory, mutate it, sync, and use a scope.
    Bound,
    /// Print the empty value for the schema, optionally writing it out.
    FromSchema {
        #[arg(long)]
        write: bool,
    },
    /// List every value in the directory.
    List,
    /// Print one value by slash-separated path.
    Get { key: String },
    /// Print every declared path with its type.
    Describe,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        if let CconfigError::UnknownKeys(errors) = &e {
            for err in errors {
                eprintln!("  {err}");
            }
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "cconfig=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CconfigError> {
    let schema = match &cli.schema {
        Some(file) => load_schema(file)?,
        None => Schema::new(&object_definition())?,
    };
    let _tmp;
    let path = match cli.path {
        Some(path) => path,
        None => {
            let dir = tempfile::tempdir().map_err(|e| CconfigError::IoError {
                path: std::env::temp_dir(),
                source: e,
            })?;
            let path = dir.path().to_path_buf();
            _tmp = dir;
            path
        }
    };
    let policy = if cli.strict {
        UnknownKeyPolicy::Strict
    } else {
        UnknownKeyPolicy::Permissive
    };
    let builder = || {
        Cconfig::builder()
            .schema(schema.clone())
            .path(&path)
            .unknown_keys(policy)
    };

    match cli.command {
        Commands::Bound => run_bound(builder()),
        Commands::FromSchema { write } => {
            let obj = builder().empty()?;
            print_json(&obj);
            if write {
                builder().save(&obj)?;
                println!("written to {}", path.display());
            }
            Ok(())
        }
        Commands::List => builder().handle_and_print(&ConfigAction::List),
        Commands::Get { key } => builder().handle_and_print(&ConfigAction::Get { key }),
        Commands::Describe => builder().handle_and_print(&ConfigAction::Describe),
    }
}

/// The object layout used when no `--schema` is given.
fn object_definition() -> SchemaDefinition {
    SchemaDefinition::from(vec![
        SchemaEntry::new("changed", TypeTag::Boolean),
        SchemaEntry::new("code-remote", TypeTag::String),
        SchemaEntry::new("source", TypeTag::String),
        SchemaEntry::nested("explorer", TypeTag::Dict, vec![("state", TypeTag::String)]),
        SchemaEntry::nested("parameter", TypeTag::Dict, vec![("state", TypeTag::String)]),
        SchemaEntry::new("state", TypeTag::String),
    ])
}

fn load_schema(file: &Path) -> Result<Schema, CconfigError> {
    let text = std::fs::read_to_string(file).map_err(|e| CconfigError::IoError {
        path: file.to_path_buf(),
        source: e,
    })?;
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Schema::from_toml_str(&text),
        _ => Schema::from_json_str(&text),
    }
}

fn run_bound(builder: CconfigBuilder) -> Result<(), CconfigError> {
    let mut obj: BoundDict = builder.open()?;
    println!("path: {}", obj.path().display());
    print_json(obj.value());

    obj.set("changed", true);
    obj.set("code-remote", "whatever");
    obj.set("source", "/path/to/source");
    obj.set("explorer", state("absent"));
    obj.set("parameter", state("present"));
    obj.set("state", "done");
    println!("dirty: {}", obj.dirty_keys().collect::<Vec<_>>().join(", "));
    obj.sync()?;
    print_json(obj.value());

    {
        let mut scope = obj.scope()?;
        scope.set("state", "not-like-before");
        scope.close()?;
    }
    print_json(obj.value());
    Ok(())
}

fn state(value: &str) -> Object {
    let mut obj = Object::new();
    obj.insert("state".into(), ConfigValue::from(value));
    obj
}

fn print_json(obj: &Object) {
    match serde_json::to_string_pretty(obj) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot render value: {e}"),
    }
}
