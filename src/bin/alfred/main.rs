use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use alfred::cache::{self, CacheError, CachePaths};
use alfred::commands::definition::CommandDefinition;
use alfred::commands::schema::SchemaError;
use alfred::exec::{self, ExecConfig};
use alfred::registrar::RegistrarError;
use alfred::{completion, picker, registrar, resolve_command_set};

/// Exit code for command-definition validation failures
const SCHEMA_FAILURE_EXIT: u8 = 22;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let paths = CachePaths::resolve()?;
    let args: Vec<OsString> = std::env::args_os().collect();

    // Reserved maintenance flags must work before (and without) a valid
    // command cache, so they are handled ahead of clap parsing. Only the
    // first argument counts; the same token after a subcommand belongs to
    // that subcommand's parse.
    match reserved_flag(&args) {
        Some(ReservedFlag::Init) => {
            cache::interactive_init(&paths)?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(ReservedFlag::ClearCache) => {
            cache::clear(&paths)?;
            println!("Local cache cleared.");
            return Ok(ExitCode::SUCCESS);
        }
        None => {}
    }

    let raw = match cache::load_raw_commands(&paths) {
        Ok(raw) => raw,
        Err(CacheError::NotInitialized(_)) => {
            if cache::interactive_init(&paths)? {
                cache::load_raw_commands(&paths)?
            } else {
                return Ok(ExitCode::SUCCESS);
            }
        }
        Err(e) => return Err(e.into()),
    };

    let definitions = match resolve_command_set(raw) {
        Ok(definitions) => definitions,
        Err(err) => {
            if let Some(schema_err) = err.schema_error() {
                return Ok(report_schema_failure(schema_err));
            }
            return Err(err.into());
        }
    };

    let root = build_root(&definitions)?;

    // Zero-argument invocation: pick interactively, then re-dispatch the
    // chosen name through the normal parsing path
    let argv: Vec<OsString> = if args.len() <= 1 {
        let program = args
            .first()
            .cloned()
            .unwrap_or_else(|| OsString::from("alfred"));
        match picker::pick(&definitions)? {
            Some(name) => vec![program, name.into()],
            None => return Ok(ExitCode::SUCCESS),
        }
    } else {
        args
    };

    let matches = match root.try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
            err.print()?;
            return Ok(code);
        }
    };

    match matches.subcommand() {
        Some(("completion", sub)) => {
            let command = sub.get_one::<String>("command").map(String::as_str);
            for line in completion::candidates(&definitions, command) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Some((name, sub)) => run_definition(&definitions, name, sub, &paths).await,
        None => {
            build_root(&definitions)?.print_help()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReservedFlag {
    Init,
    ClearCache,
}

fn reserved_flag(args: &[OsString]) -> Option<ReservedFlag> {
    match args.get(1) {
        Some(arg) if arg == "--init" => Some(ReservedFlag::Init),
        Some(arg) if arg == "--clear-cache" => Some(ReservedFlag::ClearCache),
        _ => None,
    }
}

fn build_root(definitions: &[CommandDefinition]) -> Result<Command, RegistrarError> {
    let root = Command::new("alfred")
        .about("Personal command runner")
        .version(env!("CARGO_PKG_VERSION"))
        // Both maintenance flags are acted on before parsing (see
        // reserved_flag); registering them here surfaces them in --help
        .arg(
            Arg::new("init")
                .long("init")
                .action(ArgAction::SetTrue)
                .help("Initialize the local cache with example commands"),
        )
        .arg(
            Arg::new("clear-cache")
                .long("clear-cache")
                .action(ArgAction::SetTrue)
                .help("Remove the cached command list and settings"),
        )
        .subcommand(
            Command::new("completion")
                .about("Print completion candidates for shell integration")
                .arg(Arg::new("command").help("Print flag candidates for this command")),
        );
    registrar::register(root, definitions)
}

async fn run_definition(
    definitions: &[CommandDefinition],
    name: &str,
    matches: &ArgMatches,
    paths: &CachePaths,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Subcommands are registered from this same list, so the lookup
    // cannot miss unless dispatch itself is broken
    let Some(definition) = definitions.iter().find(|def| def.name == name) else {
        return Err(format!("unknown command: {name}").into());
    };

    println!("{}", definition.name);

    if definition.needs_confirmation() {
        let confirmed =
            inquire::Confirm::new(&format!("Are you sure you want to run this command? {name}"))
                .with_default(false)
                .prompt()?;
        if !confirmed {
            println!("Command canceled");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let values = registrar::collect_values(definition, matches);
    let settings = cache::load_settings(paths)?;
    let config = ExecConfig::from(&settings);

    let outcomes = exec::run_all(&definition.command, &values, &config).await;
    for outcome in &outcomes {
        match outcome {
            Ok(outcome) => exec::report(outcome),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn report_schema_failure(err: &SchemaError) -> ExitCode {
    eprintln!("Invalid command definitions:");
    for issue in &err.0 {
        eprintln!("  [{}] {}: {}", issue.code, issue.path, issue.message);
    }
    ExitCode::from(SCHEMA_FAILURE_EXIT)
}
