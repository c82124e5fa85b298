//! Entry point for the P9 Engine binary.
//!
//! Running this binary reads a bulk P9 request as JSON from standard
//! input, generates one card per employee and writes the summary as JSON
//! to standard output.  The directory containing tax year JSON files may
//! be specified via the `P9_TAX_YEAR_DIR` environment variable; if unset
//! the binary looks for a `tax_years` folder relative to the current
//! working directory, and falls back to the built-in 2024 figures when no
//! configuration is found.  Logs go to standard error, filtered by
//! `RUST_LOG`.

use anyhow::Context;
use p9_engine::bulk::{generate_bulk, BulkP9Request};
use p9_engine::config::{load_tax_years_from_dir, TaxYearConfig, TaxYearRegistry};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let tax_dir = std::env::var("P9_TAX_YEAR_DIR").unwrap_or_else(|_| "tax_years".to_string());
    let tax_dir_path = PathBuf::from(tax_dir);
    let mut registry = TaxYearRegistry::from_configs(
        load_tax_years_from_dir(&tax_dir_path)
            .with_context(|| format!("reading tax years from {}", tax_dir_path.display()))?,
    );
    if registry.is_empty() {
        info!("no tax year configuration found, using built-in 2024 figures");
        registry.insert(TaxYearConfig::kenya_2024());
    }

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading request from stdin")?;
    let request: BulkP9Request = serde_json::from_str(&input).context("parsing bulk P9 request")?;

    let summary = generate_bulk(request, &registry)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
