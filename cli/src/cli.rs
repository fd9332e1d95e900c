use anyhow::{anyhow, Result};
use clap::{crate_authors, crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use d2s::merge::DEFAULT_REPORT_INTERVAL;
use d2s::params::D2sParams;
use std::str::FromStr;

pub fn build_cli() -> App<'static, 'static> {
    App::new("d2s")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Calculate the D2S distance between two kmer sets")
        .setting(AppSettings::VersionlessSubcommands)
        .setting(AppSettings::ArgRequiredElseHelp)
        .setting(AppSettings::SubcommandsNegateReqs)
        .arg(
            Arg::with_name("kmerset1")
                .long("kmerset1")
                .value_name("KmerSet1.21mers.gz")
                .help("Kmers for dataset 1, can be gzipped")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("kmerset1_freq")
                .long("kmerset1_freq")
                .value_name("KmerSet1.21mers.charFreq")
                .help("Character frequency for dataset 1, can be gzipped")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("kmerset2")
                .long("kmerset2")
                .value_name("KmerSet2.21mers.gz")
                .help("Kmers for dataset 2, can be gzipped")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("kmerset2_freq")
                .long("kmerset2_freq")
                .value_name("KmerSet2.21mers.charFreq")
                .help("Character frequency for dataset 2, can be gzipped")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("D2S_out")
                .long("D2S_out")
                .value_name("D2S.txt")
                .help("Output for the D2S distance, gzipped if it ends in .gz (default: stdout)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Write the distance and raw scores as JSON"),
        )
        .arg(
            Arg::with_name("no_order_check")
                .long("no-order-check")
                .help("Trust that the kmer files are sorted instead of checking each key"),
        )
        .arg(
            Arg::with_name("serial")
                .long("serial")
                .help("Compute the cross and self scores one after another"),
        )
        .arg(
            Arg::with_name("report_interval")
                .long("report-interval")
                .takes_value(true)
                .help("Log progress every this many merge steps (0 to disable)"),
        )
        .arg(debug_arg())
        .subcommand(encode_command())
}

fn encode_command() -> App<'static, 'static> {
    SubCommand::with_name("encode")
        .about("Convert a sorted kmer count file (kmer<TAB>count) into numeric kmer records")
        .arg(
            Arg::with_name("in_kmers")
                .short("i")
                .long("in_kmers")
                .value_name("input.txt")
                .help("Input kmer count file (sorted), can be gzipped (default: stdin)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("out_kmers")
                .short("o")
                .long("out_kmers")
                .value_name("output.txt")
                .help("Output kmer file, gzipped if it ends in .gz")
                .takes_value(true)
                .required(true),
        )
        .arg(debug_arg())
}

fn debug_arg() -> Arg<'static, 'static> {
    Arg::with_name("debug")
        .long("debug")
        .help("Print DEBUG info")
}

pub fn get_int_arg<T: FromStr>(matches: &ArgMatches, key: &str) -> Result<T> {
    let display_key = key.replace('_', "-");
    matches
        .value_of(key)
        .ok_or_else(|| anyhow!("Bad {}", display_key))?
        .parse::<T>()
        .map_err(|_| anyhow!("{} must be a positive integer", display_key))
}

pub fn parse_d2s_options(matches: &ArgMatches) -> Result<D2sParams> {
    Ok(D2sParams {
        check_order: !matches.is_present("no_order_check"),
        parallel: !matches.is_present("serial"),
        report_interval: if matches.is_present("report_interval") {
            get_int_arg(matches, "report_interval")?
        } else {
            DEFAULT_REPORT_INTERVAL
        },
    })
}
