//! CLI entry point for `wwivnet`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use tracing::{info, warn};

use wwivnet::config::{Config, NetworkConfig};
use wwivnet::datetime::{daten_to_datetime, datetime_to_daten};
use wwivnet::fido::{
    export_packet, import_packet, FidoAddress, FidoPacket, FidoPacketHeader, FidoPacketWriter,
};
use wwivnet::model::types::main_type_name;
use wwivnet::packet::{routing_hops, write_wwivnet_packet, NetMailFile, NetPacket};

#[derive(Parser)]
#[command(
    name = "wwivnet",
    version,
    about = "Inspect, route and gate WWIVnet and FidoNet packet files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the local system number
    #[arg(long, global = true, value_name = "NUM")]
    system: Option<u16>,

    /// Override the network name
    #[arg(long, global = true, value_name = "NAME")]
    network: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the packets in a WWIVnet packet file
    Dump {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List the messages in a FidoNet packet
    Fido {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Convert a FidoNet packet into WWIVnet packets
    Import {
        path: PathBuf,
        /// WWIVnet file to append to
        #[arg(short, long)]
        output: PathBuf,
        /// Expected packet password, overriding the configured one
        #[arg(long)]
        password: Option<String>,
    },
    /// Convert WWIVnet posts and email into a FidoNet packet
    Export {
        path: PathBuf,
        /// FidoNet packet to create
        #[arg(short, long)]
        output: PathBuf,
        /// Address of the receiving FidoNet node
        #[arg(long)]
        dest: String,
        /// Packet password
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Copy a WWIVnet file, recording a hop through this system
    Route {
        path: PathBuf,
        /// WWIVnet file to append to
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = wwivnet::config::load_config();
    if let Some(system) = cli.system {
        config.network.system_number = system;
    }
    if let Some(name) = cli.network {
        config.network.name = name;
    }

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let net = &config.network;
    match cli.command {
        Commands::Dump { path, json } => cmd_dump(&net.resolve(path), json),
        Commands::Fido { path, json } => cmd_fido(&net.resolve(path), json),
        Commands::Import {
            path,
            output,
            password,
        } => cmd_import(net, &net.resolve(path), &net.resolve(output), password),
        Commands::Export {
            path,
            output,
            dest,
            password,
        } => cmd_export(net, &net.resolve(path), &net.resolve(output), &dest, &password),
        Commands::Route { path, output } => cmd_route(net, &net.resolve(path), &net.resolve(output)),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = wwivnet::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "wwivnet.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "wwivnet", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// List the packets of a WWIVnet file.
fn cmd_dump(path: &Path, json: bool) -> anyhow::Result<()> {
    let mut file = NetMailFile::open(path)?;
    let mut packets = Vec::new();
    while let Some(packet) = file.next_packet()? {
        packets.push(packet);
    }

    if json {
        print_packets_json(&packets, file.was_truncated())?;
    } else {
        print_packets_table(path, &packets);
        if file.was_truncated() {
            println!("  File ends with a truncated packet.");
            println!();
        }
    }
    Ok(())
}

/// List the messages of a FidoNet packet.
fn cmd_fido(path: &Path, json: bool) -> anyhow::Result<()> {
    let mut packet = FidoPacket::open(path)?;
    let header = packet.header().clone();
    let mut messages = Vec::new();
    while let Some(msg) = packet.read()? {
        messages.push(msg);
    }

    if json {
        let output = serde_json::json!({
            "header": header,
            "orig": header.orig_address().to_string(),
            "dest": header.dest_address().to_string(),
            "message_count": messages.len(),
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {:<12} {}", "File", path.display());
    println!("  {:<12} {}", "From", header.orig_address());
    println!("  {:<12} {}", "To", header.dest_address());
    if let Some(created) = header.created() {
        println!("  {:<12} {}", "Created", created.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  {:<12} {}", "Messages", messages.len());
    println!();
    if messages.is_empty() {
        return Ok(());
    }

    println!(
        "  {:<4} {:<20} {:<20} {:<20} {:<30}",
        "#", "Date", "From", "To", "Subject"
    );
    println!("  {}", "-".repeat(98));
    for (i, msg) in messages.iter().enumerate() {
        println!(
            "  {:<4} {:<20} {:<20} {:<20} {:<30}",
            i + 1,
            msg.date_time,
            truncate(&msg.from_user_name.to_text(), 19),
            truncate(&msg.to_user_name.to_text(), 19),
            truncate(&msg.subject.to_text(), 29)
        );
    }
    println!();
    Ok(())
}

/// Convert every message of a FidoNet packet and append it to `output`.
fn cmd_import(
    net: &NetworkConfig,
    path: &Path,
    output: &Path,
    password: Option<String>,
) -> anyhow::Result<()> {
    let mut packet = FidoPacket::open(path)?;
    let orig = packet.header().orig_address();
    let mut options = net.import_options(&orig, datetime_to_daten(chrono::Utc::now()));
    if let Some(password) = password {
        options.packet_password = password;
    }

    let imported = import_packet(&mut packet, &options)?;
    for converted in &imported {
        write_wwivnet_packet(output, converted)?;
    }
    let count = imported.len();
    info!(path = %path.display(), orig = %orig, count, "Imported FidoNet packet");
    println!("  Imported {} message(s) into {}", count, output.display());
    Ok(())
}

/// Convert the exportable packets of a WWIVnet file into one FidoNet packet.
fn cmd_export(
    net: &NetworkConfig,
    path: &Path,
    output: &Path,
    dest: &str,
    password: &str,
) -> anyhow::Result<()> {
    let dest: FidoAddress = dest.parse()?;
    let options = net.export_options(dest.clone())?;
    let header = FidoPacketHeader::new(&options.from, &dest, chrono::Utc::now(), password);

    let mut writer = FidoPacketWriter::create(output, &header)?;
    let mut skipped = 0usize;
    for packet in NetMailFile::open(path)? {
        match export_packet(&packet, &options) {
            Ok(msg) => writer.write_message(&msg)?,
            Err(e) => {
                warn!(error = %e, "Skipping packet");
                skipped += 1;
            }
        }
    }
    let count = writer.finish()?;
    println!(
        "  Exported {} message(s) to {} ({} skipped)",
        count,
        output.display(),
        skipped
    );
    Ok(())
}

/// Copy packets from `path` to `output`, adding a routing hop to each.
fn cmd_route(net: &NetworkConfig, path: &Path, output: &Path) -> anyhow::Result<()> {
    let network = net.to_network();
    let mut routed = 0usize;
    let mut copied = 0usize;
    for mut packet in NetMailFile::open(path)? {
        if packet.update_routing(&network) {
            routed += 1;
        }
        write_wwivnet_packet(output, &packet)?;
        copied += 1;
    }
    println!(
        "  Copied {} packet(s) to {}, {} routed through {}",
        copied,
        output.display(),
        routed,
        network.system_number
    );
    Ok(())
}

/// Print packets in a human-readable table.
fn print_packets_table(path: &Path, packets: &[NetPacket]) {
    println!();
    println!("  {:<12} {}", "File", path.display());
    println!("  {:<12} {}", "Packets", packets.len());
    println!();
    if packets.is_empty() {
        return;
    }

    println!(
        "  {:<4} {:<20} {:<11} {:<11} {:>7} {:<17} {:<25}",
        "#", "Type", "From", "To", "Bytes", "Date", "Title"
    );
    println!("  {}", "-".repeat(98));
    for (i, packet) in packets.iter().enumerate() {
        let h = packet.header();
        let parsed = packet.parsed_text();
        println!(
            "  {:<4} {:<20} {:<11} {:<11} {:>7} {:<17} {:<25}",
            i + 1,
            truncate(&main_type_name(h.main_type), 19),
            format!("{}@{}", h.from_user, h.from_system),
            format!("{}@{}", h.to_user, h.to_system),
            h.length,
            daten_to_datetime(h.daten).format("%Y-%m-%d %H:%M").to_string(),
            truncate(&parsed.title.to_text(), 24)
        );
    }
    println!();
}

/// Print packets as JSON.
fn print_packets_json(packets: &[NetPacket], truncated: bool) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = packets
        .iter()
        .map(|p| {
            serde_json::json!({
                "header": p.header(),
                "type": main_type_name(p.header().main_type),
                "list": p.list(),
                "text": p.parsed_text(),
                "routing": routing_hops(p),
            })
        })
        .collect();

    let output = serde_json::json!({
        "packet_count": packets.len(),
        "truncated": truncated,
        "packets": items,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
