use std::fs;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::WrapErr, Result};
use tracing_subscriber::EnvFilter;

use alaio::{ABI, ByteStream, Name};

#[derive(Parser)]
#[command(
    name = "alaioconv",
    version = alaio::config::VERSION,
    about = "Utility to convert JSON to/from hex data according to an ABI",
    arg_required_else_help(true),
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}


#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a JSON value to its hex representation
    ToHex {
        /// File containing the ABI (JSON form) to resolve the type with
        #[arg(short, long)]
        abi: String,

        typename: String,

        json: String,

        /// Accept struct fields in any order
        #[arg(short, long)]
        reorderable: bool,
    },

    /// Parse hex data as a JSON value
    FromHex {
        /// File containing the ABI (JSON form) to resolve the type with
        #[arg(short, long)]
        abi: String,

        typename: String,

        hex: String,
    },

    /// Print the numeric value of an account name
    Name {
        name: String,
    },
}

fn get_abi(abi: &str) -> Result<ABI> {
    let abi_str = fs::read_to_string(abi)
        .wrap_err_with(|| format!("Could not read file '{}'", abi))?;

    Ok(ABI::from_str(&abi_str)?)
}

pub fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ToHex { abi, typename, json, reorderable } => {
            let abi = get_abi(&abi)?;

            let value: serde_json::Value = json.parse()?;
            let bin = match reorderable {
                false => abi.variant_to_binary(&typename, &value)?,
                true => abi.variant_to_binary_reorderable(&typename, &value)?,
            };

            println!("{}", hex::encode(bin));
        }

        Commands::FromHex { abi, typename, hex } => {
            let abi = get_abi(&abi)?;

            let mut bin = ByteStream::from_hex(&hex)?;
            let value = abi.decode_variant(&mut bin, &typename)?;
            if !bin.leftover().is_empty() {
                color_eyre::eyre::bail!("extra data after deserialized value");
            }

            println!("{}", alaio::json::to_string(&value)?);
        }

        Commands::Name { name } => {
            let name: Name = name.parse()?;
            println!("{}", name.as_u64());
        }
    }

    Ok(())
}
