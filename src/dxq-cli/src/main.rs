use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process;

use anyhow::Context;
use clap::CommandFactory;
use clap_complete::generate;
use dxq_filter::{compile_filter, DataMap};
use dxq_parser::{canonicalize, tokenize, FilterParser};
use dxq_shared::Result;
use serde::Serialize;

use dxq_cli::build_info;
use dxq_cli::cli::{parse_args, CliConfig, Commands, ConfigCommands, FilterSource};
use dxq_cli::config::{create_default_config_file, validate_config, Config};

fn main() {
    if std::env::args().any(|arg| arg == "--version" || arg == "-V") {
        print_version();
        return;
    }

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn print_version() {
    println!("{}", build_info());
}

fn run() -> Result<()> {
    let args = parse_args();
    let cli_config = CliConfig::from(&args);

    // Load configuration
    let mut config = Config::load()?;
    if let Some(config_path) = &cli_config.config_file {
        config.merge_file(config_path)?;
    }
    config.apply_cli(&cli_config)?;
    validate_config(&config)?;

    setup_logging(&config);

    match args.command {
        Commands::Convert {
            source,
            data,
            data_json,
            ..
        } => {
            let filter = read_filter(&source)?;
            let data = load_data(data.as_deref(), data_json.as_deref())?;
            let compiled = compile_filter(&filter, &config.to_filter_options())?;
            log::info!("filter refers to {:?}", compiled.variables());
            let output = compiled.convert_to_json(&data)?;
            print_json(&output, &config)
        }
        Commands::Parse { source, .. } => {
            let filter = read_filter(&source)?;
            let parser = FilterParser::with_options(config.to_filter_options().parse_options());
            let canonical = canonicalize(&filter);
            let parsed = parser.parse_with_variables(&canonical.normalized, &canonical.variables)?;
            print_json(&parsed, &config)
        }
        Commands::Tokens { source, .. } => {
            let filter = read_filter(&source)?;
            let tokens = tokenize(&filter)?;
            log::debug!("{} tokens", tokens.len());
            print_json(&tokens, &config)
        }
        Commands::Canonicalize { source, .. } => {
            let filter = read_filter(&source)?;
            print_json(&canonicalize(&filter), &config)
        }
        Commands::Completions { shell } => generate_completions(shell),
        Commands::Config { command } => handle_config_command(command, &config),
    }
}

fn handle_config_command(command: ConfigCommands, config: &Config) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let yaml = serde_yaml::to_string(config)
                .map_err(|e| anyhow::anyhow!(format!("Failed to serialize config: {}", e)))?;
            println!("{}", yaml);
            Ok(())
        }
        ConfigCommands::Init { path, force } => {
            if path.exists() && !force {
                return Err(anyhow::anyhow!(
                    "Config file {} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            create_default_config_file(&path)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }
        ConfigCommands::Check { path } => {
            let config = Config::load_from_file(&path)?;
            validate_config(&config)?;
            println!("Configuration file {} is valid", path.display());
            Ok(())
        }
    }
}

fn generate_completions(shell: clap_complete::Shell) -> Result<()> {
    let mut cmd = dxq_cli::cli::Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

/// Filter text from the argument, a file, or stdin
fn read_filter(source: &FilterSource) -> Result<String> {
    if let Some(filter) = &source.filter {
        return Ok(filter.clone());
    }

    if let Some(path) = &source.filter_file {
        return read_filter_file(path);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read filter from stdin")?;
    Ok(buffer.trim().to_string())
}

fn read_filter_file(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| {
        let suggestion = if e.kind() == io::ErrorKind::NotFound {
            format!(
                "\n\nFilter file '{}' not found.\n\n\
                Try one of:\n  \
                - Check the file path is correct\n  \
                - Pass the filter directly: dxq convert 'A = {{X.Y}}'",
                path.display()
            )
        } else {
            String::new()
        };
        anyhow::anyhow!(format!(
            "Failed to read filter file {}: {}{}",
            path.display(),
            e,
            suggestion
        ))
    })?;
    Ok(content.trim().to_string())
}

fn load_data(path: Option<&Path>, inline: Option<&str>) -> Result<DataMap> {
    match (path, inline) {
        (Some(path), _) => DataMap::from_path(path)
            .with_context(|| format!("Failed to load data map from {}", path.display())),
        (None, Some(json)) => DataMap::from_json_str(json).context("Invalid --data-json"),
        (None, None) => Ok(DataMap::new()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, config: &Config) -> Result<()> {
    let text = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

fn setup_logging(config: &Config) {
    let log_level = match config.debug.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new().filter_level(log_level).init();
}
