use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use shlink::helpers::{self, LinkOptions};
use shlink::{Lnk, ShowCommand};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Parser)]
#[clap(name = "shlink", author, version, about = "Tool for reading and creating .lnk files", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    action: Option<Action>,

    #[clap(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand)]
enum Action {
    /// Read a lnk file
    #[clap(alias = "p")]
    Parse {
        /// Path of the lnk file to read
        filename: PathBuf,

        /// Dotted property paths to print instead of the whole link,
        /// e.g. `path` or `link_info.volume_label`
        props: Vec<String>,

        /// Print the parsed structure as JSON
        #[clap(long)]
        json: bool,
    },

    /// Create a new lnk file
    #[clap(alias = "c")]
    Create {
        /// Target path, local (`C:\...`) or UNC (`\\server\share\...`)
        target: String,

        /// Name of the lnk file to create
        name: PathBuf,

        /// Additional arguments passed to the target
        #[clap(short, long)]
        arguments: Option<String>,

        /// Description of the link
        #[clap(short, long)]
        description: Option<String>,

        /// Icon filename
        #[clap(short, long)]
        icon: Option<String>,

        /// Icon index within the icon file
        #[clap(long, default_value_t = 0)]
        icon_index: i32,

        /// Working directory
        #[clap(short, long)]
        workdir: Option<String>,

        /// Window mode
        #[clap(short, long, value_parser = parse_mode)]
        mode: Option<ShowCommand>,

        /// Treat the target as a file (default: guessed by a dot in the
        /// leaf name)
        #[clap(long, conflicts_with = "directory")]
        file: bool,

        /// Treat the target as a directory
        #[clap(long)]
        directory: bool,
    },

    /// Read a lnk file and write it back to a new file
    #[clap(alias = "d")]
    Duplicate {
        /// Path of the lnk file to read
        filename: PathBuf,

        /// Path to write the duplicate to
        new_filename: PathBuf,
    },
}

fn parse_mode(s: &str) -> Result<ShowCommand, String> {
    s.parse()
        .map_err(|_| format!("valid modes are Normal, Maximized and Minimized, not {s}"))
}

fn get_prop(lnk: &Lnk, prop: &str) -> anyhow::Result<String> {
    let mut parts = prop.split('.');
    let head = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();
    let or_empty = |v: Option<&str>| v.unwrap_or_default().to_string();
    Ok(match head {
        "path" => lnk.path(),
        "description" => or_empty(lnk.description()),
        "relative_path" => or_empty(lnk.relative_path()),
        "work_dir" | "working_dir" => or_empty(lnk.work_dir()),
        "arguments" => or_empty(lnk.arguments()),
        "icon" => or_empty(lnk.icon()),
        "window_mode" | "show_command" => lnk.window_mode().to_string(),
        "hot_key" => lnk.hot_key().unwrap_or_default(),
        "file_size" => lnk.header().file_size().to_string(),
        "icon_index" => lnk.header().icon_index().to_string(),
        "creation_time" => lnk.header().creation_time().datetime().to_string(),
        "access_time" => lnk.header().access_time().datetime().to_string(),
        "modification_time" => lnk.header().write_time().datetime().to_string(),
        "link_flags" => format!("{:?}", lnk.header().link_flags()),
        "file_flags" | "file_attributes" => format!("{:?}", lnk.header().file_attributes()),
        "extra_data" => lnk
            .extra_data()
            .map(ToString::to_string)
            .unwrap_or_default(),
        "shell_item_id_list" => {
            let list = lnk
                .shell_item_id_list()
                .context("the link has no target ID list")?;
            match rest.as_slice() {
                [] => list.to_string(),
                ["path"] => list.get_path(),
                other => bail!("unknown ID list property: {}", other.join(".")),
            }
        }
        "link_info" => {
            let info = lnk.link_info().context("the link has no link info")?;
            match rest.as_slice() {
                [] => info.to_string(),
                ["path"] => info.path(),
                ["network_share_name"] => info.network_share_name().to_string(),
                ["base_name"] => info.base_name().to_string(),
                ["volume_label"] => info.volume_label().to_string(),
                ["local_base_path"] => info.local_base_path().to_string(),
                ["drive_serial"] => info.drive_serial().to_string(),
                ["drive_type"] => format!("{:?}", info.drive_type()),
                other => bail!("unknown link info property: {}", other.join(".")),
            }
        }
        other => bail!("unknown property: {other}"),
    })
}

fn run(action: Action) -> anyhow::Result<()> {
    match action {
        Action::Parse {
            filename,
            props,
            json,
        } => {
            let lnk = Lnk::open(&filename)
                .with_context(|| format!("cannot parse {}", filename.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&lnk)?);
            } else if props.is_empty() {
                println!("{lnk}");
            } else {
                for prop in &props {
                    println!("{}", get_prop(&lnk, prop)?);
                }
            }
        }
        Action::Create {
            target,
            name,
            arguments,
            description,
            icon,
            icon_index,
            workdir,
            mode,
            file,
            directory,
        } => {
            let is_file = if file {
                Some(true)
            } else if directory {
                Some(false)
            } else {
                None
            };
            let options = LinkOptions {
                arguments: arguments.as_deref(),
                description: description.as_deref(),
                icon_file: icon.as_deref(),
                icon_index,
                work_dir: workdir.as_deref(),
                window_mode: mode,
                is_file,
            };
            helpers::for_file(&target, Some(&name), &options)
                .with_context(|| format!("cannot create a link to {target}"))?;
        }
        Action::Duplicate {
            filename,
            new_filename,
        } => {
            let lnk = Lnk::open(&filename)
                .with_context(|| format!("cannot parse {}", filename.display()))?;
            println!("{lnk}");
            lnk.save(&new_filename)?;
            println!("saved");
        }
    }
    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help output and usage errors both exit nonzero
            let _ = e.print();
            std::process::exit(1);
        }
    };
    let _ = TermLogger::init(
        cli.verbose.log_level_filter(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let Some(action) = cli.action else {
        let _ = Cli::command().print_help();
        std::process::exit(1);
    };
    if let Err(e) = run(action) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
