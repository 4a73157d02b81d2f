mod json_io;

use crate::json_io::DictionarySetSerde;
use clap::{Arg, Command};
use opencc_fmm16::dictionary_lib::DictionarySet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const BLUE: &str = "\x1B[1;34m"; // Bold Blue
    const RESET: &str = "\x1B[0m"; // Reset color

    let matches = Command::new("Dictionary Generator")
        .about(format!(
            "{BLUE}Dict Generator: Command Line Dictionary Generator{RESET}"
        ))
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("format")
                .default_value("zstd")
                .help("Dictionary format: [zstd|cbor|json]"),
        )
        .arg(
            Arg::new("base_dir")
                .short('b')
                .long("base-dir")
                .value_name("dir")
                .default_value("dicts")
                .help("Directory holding the 18 lexicon text files"),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .action(clap::ArgAction::SetTrue)
                .help("Pretty-print JSON when --format json"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("filename")
                .help("Write generated dictionary to <filename>. If not specified, a default filename is used."),
        )
        .get_matches();

    let base_dir = matches
        .get_one::<String>("base_dir")
        .map(String::as_str)
        .unwrap_or("dicts");
    let dict_format = matches.get_one::<String>("format").map(String::as_str);
    let pretty_json = matches.get_flag("pretty"); // default compact if false

    let default_output = match dict_format {
        Some("zstd") => "dictionary_set.zstd",
        Some("cbor") => "dictionary_set.cbor",
        Some("json") => "dictionary_set.json",
        _ => "dictionary_set.unknown",
    };

    let output_file = matches
        .get_one::<String>("output")
        .map(|s| s.as_str())
        .unwrap_or(default_output);

    match dict_format {
        Some("zstd") => {
            let dictionary = DictionarySet::from_dicts_dir(base_dir)?;
            dictionary.save_compressed(output_file)?;
            eprintln!("{BLUE}Dictionary saved in ZSTD format at: {output_file}{RESET}");
        }
        Some("cbor") => {
            let dictionary = DictionarySet::from_dicts_dir(base_dir)?;
            dictionary.serialize_to_cbor(output_file)?;
            eprintln!("{BLUE}Dictionary saved in CBOR format at: {output_file}{RESET}");
        }
        Some("json") => {
            let dictionary = DictionarySet::from_dicts_dir(base_dir)?;
            // IMPORTANT: use the DTO for JSON so keys are Strings
            write_reference_json(&dictionary, output_file, /* pretty = */ pretty_json)?;
            let style = if pretty_json { "pretty" } else { "compact" };
            eprintln!("{BLUE}Dictionary saved in JSON ({style}) at: {output_file}{RESET}");
        }
        other => {
            let format_str = other.unwrap_or("unknown");
            eprintln!("{BLUE}Unsupported format: {format_str}{RESET}");
            std::process::exit(2);
        }
    }

    Ok(())
}

pub fn write_reference_json(
    dicts: &DictionarySet,
    path: impl AsRef<Path>,
    pretty: bool,
) -> io::Result<()> {
    let dto: DictionarySetSerde = dicts.into();
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut w, &dto).map_err(to_io)?;
    } else {
        serde_json::to_writer(&mut w, &dto).map_err(to_io)?;
        // newline for POSIX-y tools
        w.write_all(b"\n")?;
    }
    w.flush()
}

// Small adapter so we can stay in io::Result
fn to_io<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
