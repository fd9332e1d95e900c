use std::io::Write;

use anyhow::{Context, Result};
use clap::ArgMatches;

use d2s::io::create_writer;
use d2s::logging::LogHandle;
use d2s::{distance_from_paths, encode_file};

use crate::cli::parse_d2s_options;

mod cli;

fn output_to<F>(output_fn: F, output: Option<&str>) -> Result<()>
where
    F: Fn(&mut dyn Write) -> Result<()>,
{
    let mut out = create_writer(output).context(format!(
        "unable to create '{}'",
        output.unwrap_or("stdout")
    ))?;
    output_fn(&mut out)?;
    out.finish()?;
    Ok(())
}

fn init_logger(log: LogHandle) {
    env_logger::Builder::new()
        .filter_level(log.level())
        .format(|buf, record| {
            writeln!(
                buf,
                "#{} :: {} :: {}",
                record.level(),
                buf.timestamp(),
                record.args()
            )
        })
        .init();
}

fn run() -> Result<()> {
    let matches = cli::build_cli().get_matches();

    match matches.subcommand() {
        ("encode", Some(matches)) => {
            let log = LogHandle::from_debug_flag(matches.is_present("debug"));
            init_logger(log);
            let output = matches
                .value_of("out_kmers")
                .context("an output file is required")?;
            encode_file(matches.value_of("in_kmers"), output, log)
                .context(format!("unable to encode kmers into '{}'", output))?;
        }
        _ => distance_command(&matches)?,
    };

    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, key: &str) -> Result<&'a str> {
    matches
        .value_of(key)
        .with_context(|| format!("--{} is required", key))
}

fn distance_command(matches: &ArgMatches) -> Result<()> {
    let log = LogHandle::from_debug_flag(matches.is_present("debug"));
    init_logger(log);
    if log.debug() {
        log::debug!("{:?}", matches);
    }

    let params = parse_d2s_options(matches)?;
    let distance = distance_from_paths(
        required(matches, "kmerset1")?,
        required(matches, "kmerset1_freq")?,
        required(matches, "kmerset2")?,
        required(matches, "kmerset2_freq")?,
        &params,
        log,
    )?;

    output_to(
        |writer| {
            if matches.is_present("json") {
                serde_json::to_writer(&mut *writer, &distance)?;
                writeln!(writer)?;
            } else {
                writer.write_all(distance.to_line().as_bytes())?;
            }
            Ok(())
        },
        matches.value_of("D2S_out"),
    )
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}
