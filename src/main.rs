use std::{env, path::PathBuf, process::ExitCode, time::Instant};

use tracing_subscriber::EnvFilter;

use diaman_search::{
    config::{AppConfig, Perimeter},
    make_refine, make_search,
    pipeline::{enrich_word_dict, load_reports, train_all},
    FacetFilters, Result, SearchKernel,
};

enum Command {
    Search {
        site: String,
        shop: String,
        query: String,
        filters: FacetFilters,
        n_reports: Option<usize>,
    },
    Refine {
        site: String,
        shop: String,
        query: String,
    },
    Train {
        reports: PathBuf,
    },
    Enrich {
        language: String,
        new_words: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let program_start = Instant::now();
    let mut args = env::args().skip(1); // skip program name
    let mut config_path: Option<PathBuf> = None;
    let mut filters = FacetFilters::default();
    let mut n_reports: Option<usize> = None;
    let mut positional: Vec<String> = Vec::new();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => {
                if let Some(v) = args.next() { config_path = Some(PathBuf::from(v)); } else { eprintln!("[error] --config requires a path"); return ExitCode::FAILURE; }
            }
            "--sites" => {
                if let Some(v) = args.next() { filters.sites = split_list(&v); } else { eprintln!("[error] --sites requires a list"); return ExitCode::FAILURE; }
            }
            "--constructors" => {
                if let Some(v) = args.next() { filters.constructors = split_list(&v); } else { eprintln!("[error] --constructors requires a list"); return ExitCode::FAILURE; }
            }
            "--equipments" => {
                if let Some(v) = args.next() { filters.equipments = split_list(&v); } else { eprintln!("[error] --equipments requires a list"); return ExitCode::FAILURE; }
            }
            "--n" => {
                if let Some(v) = args.next() { match v.parse::<usize>() { Ok(n) if n > 0 => n_reports = Some(n), _ => { eprintln!("[error] --n needs positive integer"); return ExitCode::FAILURE; } } } else { eprintln!("[error] --n requires a number"); return ExitCode::FAILURE; }
            }
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            other => positional.push(other.to_string()),
        }
    }

    let command = match parse_command(positional, filters, n_reports) {
        Some(c) => c,
        None => {
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match config_path {
        Some(p) => AppConfig::load_from(p),
        None => AppConfig::load(),
    };
    let result = config.and_then(|config| run(&config, command));
    eprintln!("[time] program_total={:.2}ms", program_start.elapsed().as_secs_f64() * 1000.0);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[error] {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_command(positional: Vec<String>, filters: FacetFilters, n_reports: Option<usize>) -> Option<Command> {
    let mut it = positional.into_iter();
    let name = it.next()?;
    let rest: Vec<String> = it.collect();
    match (name.as_str(), rest.as_slice()) {
        ("search", [site, shop, query @ ..]) if !query.is_empty() => Some(Command::Search {
            site: site.clone(),
            shop: shop.clone(),
            query: query.join(" "),
            filters,
            n_reports,
        }),
        ("refine", [site, shop, query @ ..]) if !query.is_empty() => Some(Command::Refine {
            site: site.clone(),
            shop: shop.clone(),
            query: query.join(" "),
        }),
        ("train", [reports]) => Some(Command::Train {
            reports: PathBuf::from(reports),
        }),
        ("enrich", [language, new_words]) => Some(Command::Enrich {
            language: language.clone(),
            new_words: PathBuf::from(new_words),
        }),
        _ => None,
    }
}

fn run(config: &AppConfig, command: Command) -> Result<()> {
    match command {
        Command::Search { site, shop, query, filters, n_reports } => {
            let perimeter = config.load_perimeter()?;
            let kernel = load_kernel(config, &perimeter, &site, &shop)?;
            let found = make_search(&kernel, &query, &filters, n_reports.unwrap_or(config.n_reports))?;
            let columns = result_columns(&perimeter);
            for r in &found.reports {
                let report = r.report();
                let values: Vec<String> = columns
                    .iter()
                    .map(|c| report.column_value(c).unwrap_or_default())
                    .collect();
                println!("{:.6}\t{}", r.sorting_score, values.join("\t"));
            }
            println!("sites: {}", found.sites.join(", "));
            println!("constructors: {}", found.constructors.join(", "));
            println!("equipments: {}", found.equipments.join(", "));
        }
        Command::Refine { site, shop, query } => {
            let perimeter = config.load_perimeter()?;
            let kernel = load_kernel(config, &perimeter, &site, &shop)?;
            for topic in make_refine(&kernel, &query, config)? {
                println!("{topic}");
            }
        }
        Command::Train { reports } => {
            let perimeter = config.load_perimeter()?;
            let reports = load_reports(&reports)?;
            for path in train_all(config, &perimeter, reports)? {
                println!("{}", path.display());
            }
        }
        Command::Enrich { language, new_words } => {
            let added = enrich_word_dict(config, &language, &new_words)?;
            println!("{added} words added to the {language} dictionary");
        }
    }
    Ok(())
}

fn load_kernel(config: &AppConfig, perimeter: &Perimeter, site: &str, shop: &str) -> Result<SearchKernel> {
    let (language, shop) = perimeter.resolve_search(site, shop)?;
    SearchKernel::load(config, perimeter, language, shop)
}

/// Columns printed per result, `ORDER_ID` and `DESCR_ORDER` when the
/// perimeter lists none.
fn result_columns(perimeter: &Perimeter) -> Vec<&str> {
    if perimeter.diaman_search_cols.is_empty() {
        vec!["ORDER_ID", "DESCR_ORDER"]
    } else {
        perimeter.diaman_search_cols.iter().map(String::as_str).collect()
    }
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn print_usage() {
    eprintln!("Usage: diaman-search [--config FILE] <command>");
    eprintln!("  search <site> <shop> <query...> [--sites A,B] [--constructors A,B] [--equipments A,B] [--n N]");
    eprintln!("  refine <site> <shop> <query...>");
    eprintln!("  train <reports.json>");
    eprintln!("  enrich <language> <new_words.json>");
    eprintln!("Search output format: <score>\t<diaman_search_cols of the perimeter...>");
}
