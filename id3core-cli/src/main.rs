#![forbid(unsafe_code)]

mod edit;
mod show;
mod stdout;

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use id3core::id3v2::frames::FrameError;
use id3core::id3v2::SaveError;
use log::LevelFilter;
use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::process;
use stdout::PedanticLogger;

fn main() {
    let matches = App::new("id3core")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Print every decision made while reading and writing tags"),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Show the tags of files")
                .arg(
                    Arg::with_name("tags")
                        .short("t")
                        .long("tags")
                        .takes_value(true)
                        .use_delimiter(true)
                        .multiple(true)
                        .help("Only show these tags, by name or as ^ID"),
                )
                .arg(Arg::with_name("paths").required(true).multiple(true)),
        )
        .subcommand(
            SubCommand::with_name("set")
                .about("Set fields in the tag of a file, creating the tag if needed")
                .arg(
                    Arg::with_name("fields")
                        .short("f")
                        .long("field")
                        .takes_value(true)
                        .number_of_values(1)
                        .multiple(true)
                        .required(true)
                        .help("A field=value pair. An empty value removes the field"),
                )
                .arg(Arg::with_name("path").required(true)),
        )
        .subcommand(
            SubCommand::with_name("strip")
                .about("Remove the tag from files")
                .arg(Arg::with_name("paths").required(true).multiple(true)),
        )
        .subcommand(
            SubCommand::with_name("convert")
                .about("Convert the tag of a file to another ID3v2 version")
                .arg(
                    Arg::with_name("to")
                        .long("to")
                        .takes_value(true)
                        .possible_values(&["3", "4"])
                        .required(true),
                )
                .arg(Arg::with_name("path").required(true)),
        )
        .get_matches();

    let level = if matches.is_present("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    PedanticLogger::setup(level);

    if !run(&matches) {
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> bool {
    let result = match matches.subcommand() {
        ("show", Some(args)) => {
            return match args.values_of("paths") {
                Some(paths) => show::show(paths, args.values_of("tags")),
                None => false,
            }
        }

        ("strip", Some(args)) => {
            return match args.values_of("paths") {
                Some(paths) => edit::strip(paths),
                None => false,
            }
        }

        ("set", Some(args)) => match (args.value_of("path"), args.values_of("fields")) {
            (Some(path), Some(fields)) => with_path(path, edit::set(path, fields)),
            _ => return false,
        },

        ("convert", Some(args)) => match (args.value_of("path"), args.value_of("to")) {
            (Some(path), Some(to)) => with_path(path, edit::convert(path, to)),
            _ => return false,
        },

        _ => return false,
    };

    if let Err(err) = result {
        crate::errorln!("{}", err);
        return false;
    }

    true
}

fn with_path(path: &str, result: Result<(), CliError>) -> Result<(), String> {
    result.map_err(|err| format!["{}: {}", path, err])
}

#[derive(Debug)]
pub enum CliError {
    IoError(io::Error),
    NoMetadata,
    BadArgument(String),
    Frame(FrameError),
    Save(SaveError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::IoError(err) => write![f, "{}", err],
            Self::NoMetadata => write![f, "no metadata found"],
            Self::BadArgument(arg) => write![f, "invalid argument {:?}", arg],
            Self::Frame(err) => write![f, "{}", err],
            Self::Save(err) => write![f, "could not write tag: {}", err],
        }
    }
}

impl error::Error for CliError {
    // Nothing to implement
}

impl From<io::Error> for CliError {
    fn from(other: io::Error) -> Self {
        Self::IoError(other)
    }
}

impl From<FrameError> for CliError {
    fn from(other: FrameError) -> Self {
        Self::Frame(other)
    }
}

impl From<SaveError> for CliError {
    fn from(other: SaveError) -> Self {
        Self::Save(other)
    }
}
