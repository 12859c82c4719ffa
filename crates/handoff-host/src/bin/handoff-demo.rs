// Purpose: command-line driver that exercises every export of the handoff boundary.

use std::ffi::CString;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use handoff_core::HandoffConfig;
use handoff_host::{boundary, HandoffStatus, ManagedCString, OwnedString, Transform};
use tracing::debug;

/// Pass strings and scalars across the handoff C ABI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file installed before the command runs
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sum a u8, a u16 and a u32
    Scalar {
        /// 8-bit operand
        a: u8,
        /// 16-bit operand
        b: u16,
        /// 32-bit operand
        c: u32,
    },

    /// Send a string through one of the null-terminated transforms
    Echo {
        /// Input text
        text: String,

        /// Which transform variant to call
        #[arg(long, value_enum, default_value_t = Mode::StrToString)]
        mode: Mode,
    },

    /// Send a string through the raw-parts transform
    RawParts {
        /// Input text
        text: String,
    },

    /// Show the transformed prefix without any native allocation
    View {
        /// Input text
        text: String,
    },

    /// Print the native library version
    Version,

    /// Print the configuration in effect as JSON
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    StrToString,
    StringToString,
    StrToStr,
}

impl From<Mode> for Transform {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::StrToString => Transform::StrToString,
            Mode::StringToString => Transform::StringToString,
            Mode::StrToStr => Transform::StrToStr,
        }
    }
}

fn install(config: Option<&PathBuf>) -> Result<()> {
    let status = match config {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            HandoffConfig::from_toml_str(&source)
                .with_context(|| format!("validating {}", path.display()))?;
            let source = CString::new(source).context("configuration contains a zero byte")?;
            boundary::init(Some(&source))
        }
        None => boundary::init(None),
    };

    if status != HandoffStatus::Success {
        bail!("native side rejected the configuration: {:?}", status);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    install(cli.config.as_ref())?;

    match cli.command {
        Command::Scalar { a, b, c } => {
            println!("{}", boundary::scalar_sum(a, b, c));
        }
        Command::Echo { text, mode } => {
            let transform = Transform::from(mode);
            let input = ManagedCString::new(&text)?;
            let output = transform
                .apply(&input)
                .with_context(|| format!("{} returned a null handle", transform))?;
            debug!(%transform, origin = %output.origin(), "received output");
            println!("{}", output.to_str()?);
        }
        Command::RawParts { text } => {
            let input = ManagedCString::new(&text)?;
            let output = boundary::string_to_raw_parts(&input)
                .context("string_to_raw_parts returned absent parts")?;
            println!(
                "len={} cap={} content={}",
                output.len(),
                output.capacity(),
                output.to_str()?
            );
        }
        Command::View { text } => {
            let input = ManagedCString::new(&text)?;
            let view = boundary::str_view(&input).context("str_view returned an absent view")?;
            println!("{}", view);
        }
        Command::Version => {
            let version = boundary::version().context("version returned a null handle")?;
            println!("{}", version.to_str()?);
        }
        Command::Config => {
            let json = boundary::describe_config().context("describe_config returned a null handle")?;
            println!("{}", json.to_str()?);
        }
    }

    Ok(())
}
