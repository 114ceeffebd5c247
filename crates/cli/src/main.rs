use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rav_core::aggregate::{analyze, format_mean, summarize};
use rav_core::constants::{COMPLIANCE_TARGET_PERCENT, DEFAULT_NOTE_AUTHOR};
use rav_core::patient::{PatientRecord, RiskStatus};
use rav_core::{CoreConfig, EducationCatalog, Lookup, PatientId, RecordStore, ViewState};

#[derive(Parser)]
#[command(name = "rav")]
#[command(about = "Risk Adjustment Viewer CLI")]
struct Cli {
    /// Load records from a YAML or JSON file instead of the embedded dataset
    #[arg(long, global = true)]
    records: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List patients
    List {
        /// Match against patient name or insurance ID
        #[arg(long)]
        search: Option<String>,
        /// name, riskScore, age or missingCodes
        #[arg(long)]
        sort: Option<String>,
        /// all, very high, high or moderate
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show one patient
    Show {
        /// Patient ID
        id: PatientId,
    },
    /// Population analytics
    Analytics,
    /// Explain an ICD-10, HCC or HEDIS measure code
    Explain {
        code: String,
    },
}

fn print_row(record: &PatientRecord) {
    println!(
        "{:>3}  {:<20} {:<14} {:>5.2}  {:<15} {:>2} missing  {}",
        record.id,
        record.name.as_str(),
        record.insurance_id.as_str(),
        record.risk_score,
        record.status.as_str(),
        record.missing_codes,
        record.diagnosis_codes.join(", ")
    );
}

fn print_patient(record: &PatientRecord) {
    println!("{} (ID {})", record.name, record.id);
    println!(
        "  {}, {} | Insurance {} | Last visit {}",
        record.gender.as_str(),
        record.age,
        record.insurance_id,
        record.last_visit
    );
    println!(
        "  Risk score {:.2} ({}) | {} missing code(s)",
        record.risk_score,
        record.status.as_str(),
        record.missing_codes
    );
    if !record.status_matches_band() {
        println!(
            "  Note: score falls in the {} band",
            RiskStatus::band_for_score(record.risk_score).as_str()
        );
    }

    println!("Conditions:");
    for (code, name) in record.conditions() {
        println!("  {code:<8} {name}");
    }

    let contributions = record.detail.risk_contributions();
    if !contributions.is_empty() {
        println!("Risk breakdown:");
        for (factor, pct) in contributions {
            println!("  {:<40} {:<8} {:>5.1}%", factor.condition, factor.hcc, pct);
        }
    }

    if !record.detail.missing_risk_codes.is_empty() {
        println!("Missing risk codes:");
        for missing in &record.detail.missing_risk_codes {
            println!(
                "  {} {} (last reported {}): {}",
                missing.hcc_code, missing.condition, missing.last_reported, missing.intervention
            );
        }
    }

    match &record.quality {
        Some(quality) => {
            println!(
                "HEDIS: score {}, {} gap(s)",
                quality.overall_score, quality.gap_count
            );
            for (code, result) in &quality.measures {
                println!(
                    "  {:<16} {:<9} due {}",
                    code,
                    result.status.as_str(),
                    result.due_date
                );
            }
        }
        None => println!("HEDIS: No HEDIS data available"),
    }
}

fn print_analytics(store: &RecordStore, catalog: &EducationCatalog) {
    let analytics = analyze(store.records());
    let summary = &analytics.summary;

    println!("Total patients:      {}", summary.total_patients);
    println!("High risk patients:  {}", summary.high_risk_patients);
    println!("Missing codes:       {}", summary.total_missing_codes);
    println!("Avg risk score:      {}", format_mean(summary.mean_risk_score, 2));
    println!("HEDIS gaps:          {}", summary.total_quality_gaps);
    println!("Avg HEDIS score:     {}", format_mean(analytics.mean_quality_score, 1));

    println!("Risk distribution:");
    for status in RiskStatus::ALL {
        println!("  {:<15} {}", status.as_str(), summary.distribution.count(status));
    }

    println!("Measure compliance (target {COMPLIANCE_TARGET_PERCENT}%):");
    for m in &analytics.measure_compliance {
        println!(
            "  {:<16} {:>2}/{:<2} {:>3}%  {}",
            m.code,
            m.met,
            m.eligible,
            m.rate,
            catalog.measure_title(&m.code)
        );
    }

    println!("Most common missing HCCs:");
    for m in &analytics.top_missing_hccs {
        println!("  {:<8} {:<40} {}", m.hcc_code, m.condition, m.count);
    }

    if analytics.band_mismatches > 0 {
        println!(
            "{} patient(s) have a status outside their score band",
            analytics.band_mismatches
        );
    }
}

fn explain(catalog: &EducationCatalog, code: &str) {
    if let Lookup::Known { code, entry } = catalog.code(code) {
        println!("{code}: {}", entry.title);
        if let Some(hcc) = &entry.hcc {
            println!("Maps to {hcc}");
        }
        println!("{}", entry.definition);
        for (heading, items) in [
            ("Clinical criteria", &entry.clinical_criteria),
            ("Documentation tips", &entry.documentation_tips),
            ("Common pitfalls", &entry.common_pitfalls),
        ] {
            println!("{heading}:");
            for item in items {
                println!("  - {item}");
            }
        }
        if let Some(weight) = entry.risk_weight {
            println!("Risk weight: {weight:.3}");
        }
        return;
    }

    match catalog.measure(code) {
        Lookup::Known { code, entry } => {
            println!("{code}: {}", entry.title);
            println!("{}", entry.description);
            println!("Specification: {}", entry.specification);
            println!("Target: {}", entry.target);
            println!("Rationale: {}", entry.clinical_rationale);
            println!("Interventions:");
            for item in &entry.interventions {
                println!("  - {item}");
            }
        }
        Lookup::Unknown => println!("Unknown code: no education content for {code}"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("rav=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = CoreConfig::new(cli.records, DEFAULT_NOTE_AUTHOR.into())?;

    match cli.command {
        Some(Commands::List {
            search,
            sort,
            filter,
        }) => {
            let store = RecordStore::load(&*cfg.record_source())?;
            let view = ViewState::list(search.as_deref(), sort.as_deref(), filter.as_deref());
            let visible = view.visible(store.records());
            if visible.is_empty() {
                println!("No patients match the current search and filter.");
            } else {
                for record in &visible {
                    print_row(record);
                }
            }
            let summary = summarize(store.records());
            println!(
                "Showing {} of {} patients | avg risk {} | {} high risk | {} missing codes",
                visible.len(),
                summary.total_patients,
                format_mean(summary.mean_risk_score, 2),
                summary.high_risk_patients,
                summary.total_missing_codes
            );
        }
        Some(Commands::Show { id }) => {
            let store = RecordStore::load(&*cfg.record_source())?;
            match store.get(id) {
                Some(record) => print_patient(record),
                None => eprintln!("Error: patient not found: {id}"),
            }
        }
        Some(Commands::Analytics) => {
            let store = RecordStore::load(&*cfg.record_source())?;
            let catalog = EducationCatalog::embedded()?;
            print_analytics(&store, &catalog);
        }
        Some(Commands::Explain { code }) => {
            let catalog = EducationCatalog::embedded()?;
            explain(&catalog, &code);
        }
        None => {
            println!("Use 'rav --help' for commands");
        }
    }

    Ok(())
}
