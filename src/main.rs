use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use scriptorium::build::{build_site, load_index};
use scriptorium::config::Config;
use scriptorium::query;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn main() {
    init_logging();

    let project = Arg::with_name("project")
        .long("project")
        .value_name("DIR")
        .takes_value(true)
        .help("Directory to search for scriptorium.yaml (defaults to the current directory)");

    let matches = App::new("scriptorium")
        .version(crate_version!())
        .about("Builds a static blog from a directory of Markdown posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site into the output directory")
                .arg(project.clone())
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .value_name("DIR")
                        .takes_value(true)
                        .help("Output directory (defaults to _site beside scriptorium.yaml)"),
                )
                .arg(
                    Arg::with_name("threads")
                        .long("threads")
                        .value_name("N")
                        .takes_value(true)
                        .help("Number of worker threads"),
                ),
        )
        .subcommand(
            SubCommand::with_name("query")
                .about("Prints the result of a named query as JSON")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("all-posts")
                        .about("Every post, newest first")
                        .arg(project.clone()),
                )
                .subcommand(
                    SubCommand::with_name("tags")
                        .about("Every tag with its post count")
                        .arg(project.clone()),
                )
                .subcommand(
                    SubCommand::with_name("post")
                        .about("The post at a path")
                        .arg(Arg::with_name("PATH").required(true).index(1))
                        .arg(project),
                ),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        eprintln!("error: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("build", Some(matches)) => {
            if let Some(threads) = matches.value_of("threads") {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads.parse::<usize>()?)
                    .build_global()?;
            }
            let config = config(matches, matches.value_of("output").map(Path::new))?;
            build_site(&config)?;
            Ok(())
        }
        ("query", Some(matches)) => match matches.subcommand() {
            ("all-posts", Some(matches)) => {
                let index = load_index(&config(matches, None)?)?;
                print_json(&query::all_posts(&index))
            }
            ("tags", Some(matches)) => {
                let index = load_index(&config(matches, None)?)?;
                print_json(&query::tag_groups(&index))
            }
            ("post", Some(matches)) => {
                let index = load_index(&config(matches, None)?)?;
                let path = matches.value_of("PATH").unwrap_or_default();
                match query::post_by_path(&index, path) {
                    Some(post) => print_json(&post),
                    None => Err(format!("no post has the path `{}`", path).into()),
                }
            }
            _ => unreachable!("clap requires a query subcommand"),
        },
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn config(matches: &ArgMatches, output: Option<&Path>) -> Result<Config> {
    let dir = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    Ok(Config::from_directory(&dir, output)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// Logs go to stderr so they never mix with query output. `RUST_LOG` overrides
// the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
