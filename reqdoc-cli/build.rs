use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the names registered by ConverterRegistry::with_defaults
// Build scripts can't reach the library, so they are repeated here
const FORMATS: &[&str] = &["docx", "markdown", "plain", "rst"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("reqdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert requirement records into documents")
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
                .help("Output format")
                .required_unless_present("list-formats")
                .value_parser(clap::builder::PossibleValuesParser::new(FORMATS)),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Directory the documents are written to")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a reqdoc.toml configuration file")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("render-config")
                .long("render-config")
                .help("JSON rule document selecting the format of attributes")
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
                .help("Top-level heading of the single document"),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .help("File name of the single document"),
        )
        .arg(
            Arg::new("empty")
                .long("empty")
                .help("Text written for attributes without a value"),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .help("Skip source files under this path")
                .action(ArgAction::Append)
                .value_hint(ValueHint::AnyPath),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .help("styles.xml part used by the docx format")
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
        );

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "reqdoc", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "reqdoc", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "reqdoc", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
