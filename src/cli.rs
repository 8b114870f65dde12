use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use vlesslinker::Target;

#[derive(Parser)]
#[command(name = "vlesslinker")]
#[command(version, disable_version_flag = true)]
#[command(about = "VLESS <-> JSON converter (with vpn:// support)", long_about = None)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Print detection and decoding details to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single input and print the result
    #[command(visible_aliases = ["conv", "c"])]
    Convert {
        /// vless:// URL, vpn:// URL, JSON text, path to a .json file, or '-' for stdin
        input: String,

        /// Output format (defaults to json for vless:// input, vless otherwise)
        #[arg(short, long, value_enum)]
        to: Option<Format>,

        /// Connection name written into the vless:// fragment
        #[arg(short, long, env = "VLESSLINKER_REMARK")]
        remark: Option<String>,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Prompt for inputs until 'exit' (default when no command is given)
    #[command(visible_aliases = ["i", "repl"])]
    Interactive,

    /// Print shell completions to stdout
    Completions {
        /// Shell to generate completions for (auto-detected if omitted)
        #[arg(short = 's', long = "shell")]
        shell: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// vless:// share link
    Vless,
    /// Xray JSON config
    Json,
}

impl From<Format> for Target {
    fn from(format: Format) -> Self {
        match format {
            Format::Vless => Target::Vless,
            Format::Json => Target::Json,
        }
    }
}
