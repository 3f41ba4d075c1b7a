#![deny(warnings)]
#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

mod config;

use clap::{Parser, Subcommand};
use config::Config;
use krb524::proto::{EncTicket, LegacyTicket, LifetimeCode, TicketConverter};
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, clap::Parser)]
#[clap(about = "Kerberos 5 to Kerberos 4 ticket conversion")]
struct OptParser {
    #[clap(subcommand)]
    command: Opt,
}

#[derive(Debug, Subcommand)]
enum Opt {
    /// Convert a DER encoded Kerberos 5 ticket into a Kerberos 4 ticket.
    Convert {
        config: PathBuf,
        ticket: PathBuf,
        /// The address the client presents the ticket from.
        address: Ipv4Addr,
        /// Write the raw ticket here instead of printing it as hex.
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Decrypt a Kerberos 4 ticket with the destination key and show its content.
    Inspect { config: PathBuf, ticket: PathBuf },
    /// Show the Kerberos 4 lifetime code for a remaining lifetime in seconds.
    Lifetime { seconds: u64 },
}

fn init_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

fn load_config(path: &Path) -> Result<Config, ()> {
    match Config::parse(path) {
        Ok(cfg) => {
            init_logging(cfg.debug);
            Ok(cfg)
        }
        Err(e) => {
            init_logging(false);
            error!("Could not parse config file {:?}: {:?}", path, e);
            Err(())
        }
    }
}

fn convert_run(
    cfg: &Config,
    ticket: &Path,
    address: Ipv4Addr,
    output: Option<&Path>,
) -> io::Result<()> {
    let source_key = cfg.source_key.service_key().map_err(|err| {
        error!(?err, "Invalid source_key");
        io::Error::new(io::ErrorKind::InvalidInput, "source_key")
    })?;
    let dest_key = cfg.dest_key.service_key().map_err(|err| {
        error!(?err, "Invalid dest_key");
        io::Error::new(io::ErrorKind::InvalidInput, "dest_key")
    })?;

    let der_bytes = fs::read(ticket)?;
    let enc_ticket = EncTicket::from_der(&der_bytes).map_err(|err| {
        error!(?err, "Unable to decode ticket");
        io::Error::new(io::ErrorKind::InvalidData, "ticket")
    })?;
    debug!(service = %enc_ticket.service(), etype = enc_ticket.enc_part().etype());

    let converter = TicketConverter::new(cfg.context());
    let legacy_ticket = converter
        .convert_ticket(&enc_ticket, &dest_key, &source_key, address)
        .map_err(|err| {
            error!(?err, code = ?err.krb_error_code(), "Ticket conversion failed");
            io::Error::other("conversion")
        })?;

    info!(len = legacy_ticket.len(), kvno = ?legacy_ticket.kvno(), "Issued legacy ticket");

    match output {
        Some(path) => fs::write(path, legacy_ticket.as_bytes()),
        None => {
            println!("{}", hex::encode(legacy_ticket.as_bytes()));
            Ok(())
        }
    }
}

fn inspect_run(cfg: &Config, ticket: &Path) -> io::Result<()> {
    let dest_key = cfg.dest_key.service_key().map_err(|err| {
        error!(?err, "Invalid dest_key");
        io::Error::new(io::ErrorKind::InvalidInput, "dest_key")
    })?;

    let data = fs::read(ticket)?;
    // Accept both the raw ticket and the hex printed by convert.
    let decoded = std::str::from_utf8(&data)
        .ok()
        .and_then(|s| hex::decode(s.trim()).ok());
    let data = decoded.unwrap_or(data);

    let part = LegacyTicket::from_bytes(data, dest_key.kvno())
        .and_then(|legacy_ticket| legacy_ticket.decrypt(&dest_key))
        .map_err(|err| {
            error!(?err, "Unable to open legacy ticket");
            io::Error::new(io::ErrorKind::InvalidData, "ticket")
        })?;

    println!(
        "client:      {}.{}@{}",
        part.client_name, part.client_instance, part.client_realm
    );
    println!("service:     {}.{}", part.service_name, part.service_instance);
    println!("address:     {}", part.address);
    println!("byte order:  {:?}", part.byte_order);
    println!("flags:       {:#04x}", part.flags);
    println!(
        "lifetime:    {} ({}s)",
        part.lifetime.as_byte(),
        part.lifetime.duration().as_secs()
    );
    println!("issue time:  {}", part.issue_time);

    Ok(())
}

fn lifetime_run(seconds: u64) {
    let code = LifetimeCode::from_remaining(Duration::from_secs(seconds));
    println!("{} ({}s)", code.as_byte(), code.duration().as_secs());
}

fn main() -> Result<(), ()> {
    let opt = OptParser::parse();

    match opt.command {
        Opt::Convert {
            config,
            ticket,
            address,
            output,
        } => {
            let cfg = load_config(&config)?;
            convert_run(&cfg, &ticket, address, output.as_deref()).map_err(|e| {
                error!("Could not convert ticket {:?}: {:?}", ticket, e);
            })?
        }
        Opt::Inspect { config, ticket } => {
            let cfg = load_config(&config)?;
            inspect_run(&cfg, &ticket).map_err(|e| {
                error!("Could not inspect ticket {:?}: {:?}", ticket, e);
            })?
        }
        Opt::Lifetime { seconds } => {
            init_logging(false);
            lifetime_run(seconds)
        }
    }

    Ok(())
}
