// Command-line interface for reqdoc
//
// Reads a JSON dump of requirement records and writes it out as documents through the
// reqdoc-babel converters.
//
// Usage:
//  reqdoc <input.json> --to <format> [--output <dir>]   - Convert records (stdout without --output)
//  reqdoc --list-formats                                - List available output formats
//
// Settings come from the built-in defaults, then ./reqdoc.toml when present, then the file
// given with --config, then the flags on the command line.

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use reqdoc_babel::publish::{publish_with, PublishArtifact, PublishSpec};
use reqdoc_babel::{ConverterRegistry, RecordSet, SerializedDocument};
use reqdoc_config::{Loader, ReqdocConfig};
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn build_cli() -> Command {
    Command::new("reqdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert requirement records into documents")
        .long_about(
            "reqdoc turns a JSON dump of requirement records into plain text, Markdown,\n\
            reStructuredText or WordprocessingML documents.\n\n\
            By default every source file becomes one document. With --single-document\n\
            all records go into one document under a top-level heading.\n\n\
            Examples:\n  \
            reqdoc records.json --to markdown               # One document, printed to stdout\n  \
            reqdoc records.json --to rst -o docs            # One .rst file per source file\n  \
            reqdoc records.json --to docx -o out --single-document --name reqs.docx",
        )
        .arg_required_else_help(true)
        .arg(
            Arg::new("input")
                .help("JSON file holding the records")
                .required_unless_present("list-formats")
                .index(1)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .short('t')
                .value_name("FORMAT")
                .help("Output format (see --list-formats)")
                .required_unless_present("list-formats")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("DIR")
                .help("Directory the documents are written to (stdout if omitted)")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a reqdoc.toml configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("render-config")
                .long("render-config")
                .value_name("PATH")
                .help("JSON rule document selecting the format of attributes")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("single-document")
                .long("single-document")
                .help("Write all source files into one document")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("top-level")
                .long("top-level")
                .value_name("TITLE")
                .help("Top-level heading of the single document"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("FILE")
                .help("File name of the single document"),
        )
        .arg(
            Arg::new("empty")
                .long("empty")
                .value_name("TEXT")
                .help("Text written for attributes without a value"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .value_name("PATH")
                .help("Skip source files under this path (repeatable)")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::AnyPath),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .value_name("STYLES")
                .help("styles.xml part used by the docx format")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log progress to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available output formats")
                .action(ArgAction::SetTrue),
        )
}

fn main() {
    let matches = build_cli().get_matches();

    init_logging(matches.get_flag("verbose"));

    let registry = ConverterRegistry::with_defaults();

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&registry);
        return;
    }

    let mut config = load_cli_config(matches.get_one::<PathBuf>("config"));
    apply_config_overrides(&mut config, &matches);

    // Both are required unless --list-formats, which returned above
    let (Some(input), Some(format)) = (
        matches.get_one::<String>("input"),
        matches.get_one::<String>("to"),
    ) else {
        eprintln!("Error: an input file and --to are required");
        std::process::exit(1);
    };

    handle_convert_command(
        &registry,
        &config,
        input,
        format,
        matches.get_one::<PathBuf>("output"),
    );
}

/// Logs go to stderr so stdout stays clean for documents.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_convert_command(
    registry: &ConverterRegistry,
    config: &ReqdocConfig,
    input: &str,
    format: &str,
    output: Option<&PathBuf>,
) {
    if let Err(e) = registry.get(format) {
        eprintln!("Error: {e}");
        eprintln!("Use --list-formats to see the available formats");
        std::process::exit(1);
    }

    let options = config.convert_options().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading file '{input}': {e}");
        std::process::exit(1);
    });

    let records = RecordSet::from_json(&source).unwrap_or_else(|e| {
        eprintln!("Error reading records from '{input}': {e}");
        std::process::exit(1);
    });
    debug!(input, files = records.files.len(), "loaded records");

    let mut spec = PublishSpec::new(&records, format).with_options(options);
    if let Some(dir) = output {
        spec = spec.with_output_dir(dir);
    }

    let result = publish_with(registry, spec).unwrap_or_else(|e| {
        eprintln!("Conversion error: {e}");
        std::process::exit(1);
    });

    let in_memory: Vec<_> = result
        .artifacts
        .iter()
        .filter_map(|artifact| match artifact {
            PublishArtifact::InMemory(output) => Some(output),
            PublishArtifact::File(_) => None,
        })
        .collect();

    if in_memory.len() > 1 {
        eprintln!(
            "{} documents were generated. Use -o <dir> to write them, or --single-document.",
            in_memory.len()
        );
        std::process::exit(1);
    }
    if let Some(output) = in_memory.first() {
        match &output.content {
            SerializedDocument::Text(text) => print!("{text}"),
            SerializedDocument::Binary(_) => {
                eprintln!("Binary formats (like docx) require an output directory. Use -o <dir>.");
                std::process::exit(1);
            }
        }
    }
}

fn handle_list_formats_command(registry: &ConverterRegistry) {
    println!("Available formats:\n");
    for name in registry.list_converters() {
        if let Ok(converter) = registry.get(&name) {
            println!(
                "  {:<10} {} (.{})",
                name,
                converter.description(),
                converter.file_extension()
            );
        }
    }
}

fn load_cli_config(explicit_path: Option<&PathBuf>) -> ReqdocConfig {
    let loader = Loader::new().with_optional_file("reqdoc.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

/// Flags given on the command line win over every configuration file.
fn apply_config_overrides(config: &mut ReqdocConfig, matches: &ArgMatches) {
    let convert = &mut config.convert;

    if matches.get_flag("single-document") {
        convert.single_document = true;
    }
    if let Some(title) = matches.get_one::<String>("top-level") {
        convert.top_level = title.clone();
    }
    if let Some(name) = matches.get_one::<String>("name") {
        convert.document_name = Some(name.clone());
    }
    if let Some(text) = matches.get_one::<String>("empty") {
        convert.empty_placeholder = text.clone();
    }
    if let Some(paths) = matches.get_many::<PathBuf>("exclude") {
        convert.excluded_paths.extend(paths.cloned());
    }
    if let Some(path) = matches.get_one::<PathBuf>("render-config") {
        convert.render_config = Some(path.clone());
    }
    if let Some(path) = matches.get_one::<PathBuf>("template") {
        convert.docx.template = Some(path.clone());
    }
}
