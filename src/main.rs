use dbal::config::load_config;
use dbal::{ConnectOptions, Dbal, Result, StatementType};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: dbal <database-or-config.toml> [SQL]";

/// Filter used when neither RUST_LOG nor the config file sets one
const DEFAULT_LOG_LEVEL: &str = "warn";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(target) = args.first() else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    let (options, log_level) = match resolve_target(target) {
        Ok(resolved) => resolved,
        Err(e) => {
            init_logging(None);
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    init_logging(log_level.as_deref());

    let sql = args[1..].join(" ");
    if let Err(e) = run(options, sql.trim()) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

/// A `.toml` argument is a config file; anything else is a database path.
fn resolve_target(target: &str) -> Result<(ConnectOptions, Option<String>)> {
    if target.ends_with(".toml") {
        let config = load_config(target)?;
        let level = config.log_level().map(str::to_string);
        Ok((config.database.to_options(), level))
    } else {
        Ok((ConnectOptions::new("", "", target), None))
    }
}

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_LEVEL)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(options: ConnectOptions, sql: &str) -> Result<()> {
    info!(dsn = %options.dsn(), "starting dbal");
    let mut dbal = Dbal::connect(options)?;

    if sql.is_empty() {
        for table in dbal.get_tables()? {
            println!("{}", table);
        }
        return Ok(());
    }

    if StatementType::from_sql(sql).returns_rows() {
        let set = dbal.query(sql, ())?;
        for row in &set {
            println!("{}", serde_json::to_string(row)?);
        }
    } else {
        let execution = dbal.execute(sql, ())?;
        println!("ok: {} row(s) affected", execution.affected_rows);
    }
    Ok(())
}
