use clap::{Arg, ArgMatches, Command};
use opencc_fmm16::{Config, OpenCC};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Read, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("opencc-conv")
        .about("OpenCC FMM16: Command Line Open Chinese Converter")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("convert")
                .about("Convert plain text between Chinese scripts")
                .args(common_args()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("convert", sub)) => handle_convert(sub),
        _ => unreachable!(),
    }
}

fn common_args() -> Vec<Arg> {
    vec![
        Arg::new("input")
            .short('i')
            .long("input")
            .value_name("file")
            .help("Input file (use stdin if omitted)"),
        Arg::new("output")
            .short('o')
            .long("output")
            .value_name("file")
            .help("Output file (use stdout if omitted)"),
        Arg::new("config")
            .short('c')
            .long("config")
            .required(true)
            .value_parser(Config::all_names())
            .help("Conversion configuration"),
        Arg::new("punct")
            .short('p')
            .long("punct")
            .action(clap::ArgAction::SetTrue)
            .help("Enable punctuation conversion"),
    ]
}

fn handle_convert(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let input_file = matches.get_one::<String>("input");
    let output_file = matches.get_one::<String>("output");
    let config = matches.get_one::<String>("config").ok_or("missing config")?;
    let punctuation = matches.get_flag("punct");

    let mut input: Box<dyn Read> = match input_file {
        Some(file_name) => Box::new(BufReader::new(File::open(file_name)?)),
        None => {
            if io::stdin().is_terminal() {
                println!("Input text to convert, <ctrl-z/d> to submit:");
            }
            Box::new(BufReader::new(io::stdin().lock()))
        }
    };

    let mut input_str = String::new();
    input.read_to_string(&mut input_str)?;

    let output_str = OpenCC::new().convert(&input_str, config, punctuation);

    let is_console_output = output_file.is_none();
    let mut output: Box<dyn Write> = match output_file {
        Some(file_name) => Box::new(BufWriter::new(File::create(file_name)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let final_output = if is_console_output && !output_str.ends_with('\n') {
        format!("{output_str}\n")
    } else {
        output_str
    };

    write!(output, "{}", final_output)?;
    output.flush()?;

    Ok(())
}
