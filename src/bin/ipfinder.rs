//! ipfinder: CLI tool for querying and building IP location databases.

use clap::{Parser, Subcommand};
use ipfinder::text::{self, TextParser};
use ipfinder::{DatabaseConfig, DatabaseWriter, Encoding};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipfinder")]
#[command(version)]
#[command(about = "Look up IPv4 locations in a range database", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults to IPFINDER_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file
    #[arg(short, long, global = true)]
    db: Option<PathBuf>,

    /// String encoding of the database (gbk, utf8)
    #[arg(short, long, global = true)]
    encoding: Option<Encoding>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up one or more IPv4 addresses
    Lookup {
        /// Dotted-quad addresses
        #[arg(required = true)]
        ips: Vec<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Show database summary
    Info {
        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Check index ordering and every record
    Verify,

    /// Write all records as text
    Dump {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a database from a text dump
    Build {
        /// Input text file
        #[arg(short, long)]
        input: PathBuf,

        /// Output database file
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = resolve_config(&cli).and_then(|config| match &cli.command {
        Commands::Lookup { ips, json } => lookup(&config, ips, *json),
        Commands::Info { json } => info(&config, *json),
        Commands::Verify => verify(&config),
        Commands::Dump { output } => dump(&config, output.as_ref()),
        Commands::Build {
            input,
            output,
            verbose,
        } => build(&config, input, output, *verbose),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> CliResult<DatabaseConfig> {
    let mut config = match &cli.config {
        Some(path) => DatabaseConfig::load(path)?,
        None => DatabaseConfig::from_env()?,
    };
    if let Some(db) = &cli.db {
        config.path = db.clone();
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = encoding;
    }
    Ok(config)
}

fn lookup(config: &DatabaseConfig, ips: &[String], json: bool) -> CliResult<()> {
    let db = config.open()?;
    let mut failed = 0;

    for ip in ips {
        match db.lookup(ip.trim()) {
            Ok(location) => {
                let decoded = location.decode_lossy(config.encoding);
                if json {
                    let (province, city) = decoded.province_city();
                    let value = serde_json::json!({
                        "ip": ip,
                        "country": decoded.country,
                        "area": decoded.area,
                        "province": province,
                        "city": city,
                    });
                    println!("{}", value);
                } else {
                    println!("{}\t{}", ip, decoded);
                }
            }
            Err(e) => {
                log::warn!("{}: {}", ip, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} lookups failed", failed, ips.len()).into());
    }
    Ok(())
}

fn info(config: &DatabaseConfig, json: bool) -> CliResult<()> {
    let db = config.open()?;
    let info = db.info();
    let version = info
        .version
        .as_ref()
        .map(|v| v.as_location().decode_lossy(config.encoding));

    if json {
        let value = serde_json::json!({
            "path": config.path,
            "records": info.record_count,
            "index_begin": info.index_begin,
            "index_end": info.index_end,
            "size": info.size,
            "version": version,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Path:    {:?}", config.path);
        println!("Records: {}", info.record_count);
        println!("Index:   {}..={}", info.index_begin, info.index_end);
        println!("Size:    {} bytes", info.size);
        if let Some(version) = version {
            println!("Version: {}", version);
        }
    }
    Ok(())
}

fn verify(config: &DatabaseConfig) -> CliResult<()> {
    let db = config.open()?;
    db.verify()?;
    println!("{:?}: {} records OK", config.path, db.record_count());
    Ok(())
}

fn dump(config: &DatabaseConfig, output: Option<&PathBuf>) -> CliResult<()> {
    let db = config.open()?;
    let count = match output {
        Some(path) => {
            let mut out = BufWriter::new(fs::File::create(path)?);
            let count = text::dump(&db, config.encoding, &mut out)?;
            out.flush()?;
            count
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let count = text::dump(&db, config.encoding, &mut out)?;
            out.flush()?;
            count
        }
    };
    log::info!("Dumped {} records", count);
    Ok(())
}

fn build(config: &DatabaseConfig, input: &PathBuf, output: &PathBuf, verbose: bool) -> CliResult<()> {
    if verbose {
        println!("Reading input file: {:?}", input);
    }

    let mut writer = DatabaseWriter::new();
    let count = TextParser::parse_into(fs::File::open(input)?, config.encoding, &mut writer)?;

    if verbose {
        println!("Parsed {} ranges", count);
    }

    let data = writer.build()?;

    if verbose {
        println!("Writing output file: {:?} ({} bytes)", output, data.len());
    }

    fs::write(output, &data)?;

    println!("Successfully built {:?} -> {:?}", input, output);
    Ok(())
}
