mod config;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::Style;
use model_pricing_core::{
    cost::{BadgeKind, CostSummary},
    currency::{self, RateTable},
    format::format_amount_with,
    model::parse_catalog,
    reference::{self, ReferenceTable},
    report::{validate_catalog, ModelReport},
    units::{to_per_million_with, unit_multiplier, NoCorrection, VendorScaleRepair},
    userdata,
    validate::{Confidence, ValidationVerdict},
    PricingContext,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{load_config, Config};

// ── Palette ──────────────────────────────────────────────────────────

fn s_header() -> Style { Style::new().color256(252).bold() }  // bright gray, bold
fn s_dim() -> Style    { Style::new().color256(248) }         // light gray
fn s_tree() -> Style   { Style::new().color256(245) }         // mid gray
fn s_hint() -> Style   { Style::new().color256(243) }         // soft gray
fn s_ok() -> Style     { Style::new().color256(114) }         // green
fn s_warn() -> Style   { Style::new().color256(214) }         // amber
fn s_err() -> Style    { Style::new().color256(167) }         // red
fn s_price() -> Style  { Style::new().color256(109) }         // teal
fn s_bold() -> Style   { Style::new().bold() }

fn sep(width: usize) -> String {
    s_tree().apply_to("\u{2500}".repeat(width)).to_string()
}

fn badge_color(kind: BadgeKind) -> Color {
    match kind {
        BadgeKind::Free | BadgeKind::Local => Color::AnsiValue(114),
        BadgeKind::Hardware => Color::AnsiValue(139),
        BadgeKind::Api => Color::AnsiValue(109),
        BadgeKind::Subscription => Color::AnsiValue(146),
        BadgeKind::Placeholder => Color::AnsiValue(243),
    }
}

fn confidence_str(v: &ValidationVerdict) -> String {
    let label = if v.is_valid {
        v.confidence.to_string()
    } else {
        format!("invalid ({})", v.confidence)
    };
    match (v.is_valid, v.confidence) {
        (false, _) | (_, Confidence::Low) => s_err().apply_to(label).to_string(),
        (_, Confidence::Medium) => s_warn().apply_to(label).to_string(),
        (_, Confidence::High) => s_ok().apply_to(label).to_string(),
    }
}

// ── CLI Args ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "model-pricing",
    about = "Normalize, convert, summarize and sanity-check AI model pricing",
    version,
    after_help = "examples:\n  \
        model-pricing describe catalog.json\n  \
        model-pricing describe catalog.json --currency EUR\n  \
        model-pricing validate catalog.json --json\n  \
        model-pricing convert 20 EUR USD\n  \
        model-pricing normalize 0.002 \"per 1K tokens\"\n  \
        model-pricing rates"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Rate table TOML to use instead of the bundled one.
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    /// Reference price TOML to use instead of the bundled one.
    #[arg(long, global = true)]
    reference: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price badges and summaries for every model in a catalog.
    Describe {
        /// JSON array of models.
        catalog: PathBuf,
        /// Display currency (default: config, then USD).
        #[arg(long, short)]
        currency: Option<String>,
        /// Leave validation warnings out of the summaries.
        #[arg(long)]
        no_validation: bool,
        #[arg(long, short)]
        json: bool,
    },
    /// Heuristic and reference checks for every model in a catalog.
    Validate {
        catalog: PathBuf,
        #[arg(long, short)]
        json: bool,
    },
    /// Convert an amount between currencies.
    Convert {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        from: String,
        to: String,
    },
    /// Per-million figure for a vendor price and unit.
    Normalize {
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        unit: Option<String>,
        /// Skip the vendor scale repair.
        #[arg(long)]
        raw: bool,
    },
    /// List the active exchange rates.
    Rates,
}

struct Tables {
    rates: RateTable,
    reference: ReferenceTable,
}

fn load_tables(cli: &Cli, config: &Config) -> anyhow::Result<Tables> {
    let rates = match cli.rates.as_ref().or(config.rates.as_ref()) {
        Some(path) => currency::load_rates(path)
            .with_context(|| format!("loading rates from {}", path.display()))?,
        None => userdata::load_rates_user_or_bundled()?,
    };
    let reference = match cli.reference.as_ref().or(config.reference.as_ref()) {
        Some(path) => reference::load_reference(path)
            .with_context(|| format!("loading reference prices from {}", path.display()))?,
        None => userdata::load_reference_user_or_bundled()?,
    };
    Ok(Tables { rates, reference })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config();
    let tables = load_tables(&cli, &config)?;

    match &cli.command {
        Commands::Describe {
            catalog,
            currency: display_currency,
            no_validation,
            json,
        } => {
            let target = display_currency
                .clone()
                .or_else(|| config.currency.clone())
                .unwrap_or_else(|| currency::BASE_CURRENCY.to_string());
            let show_validation = !no_validation && config.show_validation.unwrap_or(true);
            let ctx = PricingContext::new(&tables.rates, &target)
                .with_reference(&tables.reference)
                .with_validation(show_validation);
            cmd_describe(catalog, &ctx, *json)?;
        }
        Commands::Validate { catalog, json } => {
            let target = config
                .currency
                .clone()
                .unwrap_or_else(|| currency::BASE_CURRENCY.to_string());
            let ctx = PricingContext::new(&tables.rates, &target).with_reference(&tables.reference);
            cmd_validate(catalog, &ctx, *json)?;
        }
        Commands::Convert { amount, from, to } => {
            cmd_convert(&tables.rates, *amount, from, to)?;
        }
        Commands::Normalize { amount, unit, raw } => {
            cmd_normalize(*amount, unit.as_deref(), *raw);
        }
        Commands::Rates => {
            cmd_rates(&tables.rates);
        }
    }
    Ok(())
}

fn read_reports(catalog: &Path, ctx: &PricingContext<'_>) -> anyhow::Result<Vec<ModelReport>> {
    let data = std::fs::read_to_string(catalog)
        .with_context(|| format!("reading {}", catalog.display()))?;
    let models = parse_catalog(&data).with_context(|| format!("parsing {}", catalog.display()))?;
    Ok(validate_catalog(&models, ctx))
}

// ── Describe ─────────────────────────────────────────────────────────

fn price_cell(summary: &CostSummary) -> Cell {
    // comfy-table colors whole cells; use the first priced badge's color.
    let color = summary
        .badges
        .iter()
        .map(|b| b.kind)
        .find(|k| matches!(k, BadgeKind::Api | BadgeKind::Subscription))
        .or_else(|| summary.badges.first().map(|b| b.kind))
        .map(badge_color)
        .unwrap_or(Color::AnsiValue(243));
    let labels: Vec<&str> = summary.labels();
    Cell::new(labels.join("  ")).fg(color)
}

fn cmd_describe(catalog: &Path, ctx: &PricingContext<'_>, json: bool) -> anyhow::Result<()> {
    let reports = read_reports(catalog, ctx)?;

    if json {
        let out: Vec<_> = reports
            .iter()
            .map(|r| serde_json::json!({ "name": r.name, "summary": r.summary }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "{}  {}",
        s_header().apply_to("pricing"),
        s_hint().apply_to(format!("({} models, shown in {})", reports.len(), ctx.target_currency))
    );
    println!("{}", sep(72));

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("  Model").fg(Color::AnsiValue(243)),
        Cell::new("Price").fg(Color::AnsiValue(243)),
        Cell::new("Details").fg(Color::AnsiValue(243)),
    ]);
    for r in &reports {
        let name_color = if r.summary.has_validation_issues {
            Color::AnsiValue(214)
        } else {
            Color::AnsiValue(252)
        };
        table.add_row(vec![
            Cell::new(format!("  {}", r.name)).fg(name_color),
            price_cell(&r.summary),
            Cell::new(&r.summary.tooltip).fg(Color::AnsiValue(248)),
        ]);
    }
    println!("{table}");
    println!("{}", sep(72));

    let flagged = reports.iter().filter(|r| r.summary.has_validation_issues).count();
    if flagged > 0 {
        println!(
            "  {}",
            s_warn().apply_to(format!(
                "{flagged} model(s) with questionable pricing; run `model-pricing validate`"
            ))
        );
    }
    println!();
    Ok(())
}

// ── Validate ─────────────────────────────────────────────────────────

fn print_verdict(label: &str, v: &ValidationVerdict) {
    println!("    {:<10} {}", s_dim().apply_to(label), confidence_str(v));
    for issue in &v.issues {
        println!("      {} {}", s_tree().apply_to("\u{2514}"), s_hint().apply_to(issue));
    }
}

fn cmd_validate(catalog: &Path, ctx: &PricingContext<'_>, json: bool) -> anyhow::Result<()> {
    let reports = read_reports(catalog, ctx)?;

    if json {
        let out: Vec<_> = reports
            .iter()
            .map(|r| serde_json::json!({ "name": r.name, "verdicts": r.verdicts }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", s_header().apply_to("validation"));
    println!("{}", sep(64));
    for r in &reports {
        let marker = if r.has_problems() {
            s_err().apply_to("\u{2717}")
        } else {
            s_ok().apply_to("\u{2713}")
        };
        println!("  {marker} {}", s_bold().apply_to(&r.name));
        match &r.verdicts {
            None => println!("    {}", s_hint().apply_to("no pricing to check")),
            Some(v) => {
                print_verdict("heuristic", &v.heuristic);
                if let Some(fc) = &v.fact_check {
                    print_verdict("reference", fc);
                }
            }
        }
    }
    println!("{}", sep(64));
    let flagged = reports.iter().filter(|r| r.has_problems()).count();
    let summary = format!("{flagged} of {} models flagged", reports.len());
    if flagged > 0 {
        println!("  {}", s_warn().apply_to(summary));
    } else {
        println!("  {}", s_ok().apply_to(summary));
    }
    println!();
    Ok(())
}

// ── Convert / normalize / rates ──────────────────────────────────────

fn cmd_convert(rates: &RateTable, amount: f64, from: &str, to: &str) -> anyhow::Result<()> {
    let converted = rates.convert(amount, from, to)?;
    println!(
        "  {} {} {}",
        s_dim().apply_to(format_amount_with(amount, from, 4)),
        s_tree().apply_to("\u{2192}"),
        s_price().apply_to(format_amount_with(converted, to, 4)),
    );
    Ok(())
}

fn cmd_normalize(amount: f64, unit: Option<&str>, raw: bool) {
    let value = if raw {
        to_per_million_with(amount, unit, &NoCorrection)
    } else {
        to_per_million_with(amount, unit, &VendorScaleRepair)
    };
    let scaled = amount * unit_multiplier(unit);
    println!("  {} {}", s_price().apply_to(format!("{value}")), s_dim().apply_to("per 1M"));
    if !raw && amount != 0.0 && scaled != value {
        println!(
            "  {}",
            s_hint().apply_to(format!("scale-corrected from {scaled} (heuristic, may be wrong)"))
        );
    }
}

fn cmd_rates(rates: &RateTable) {
    println!();
    println!(
        "{}  {}",
        s_header().apply_to("exchange rates"),
        s_hint().apply_to(format!("(per 1 {})", rates.base()))
    );
    println!("{}", sep(32));
    for (code, rate) in rates.iter() {
        println!("  {:<6} {}", s_bold().apply_to(code), s_price().apply_to(format!("{rate}")));
    }
    println!("{}", sep(32));
    println!();
}
