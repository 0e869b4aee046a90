// Command handler implementations

use crate::cli::output::OutputFormatter;
use crate::cli::{
    Cli, Commands, ConfigAction, CpfAction, CrossingsAction, FilesAction, PageArgs,
    ResultCriteria, ResultsAction,
};
use crate::config::DashboardConfig;
use crate::cpf::{format_cpf, format_cpf_input, is_valid_cpf};
use crate::format::{
    FileSummary, format_datetime, format_execution_time, format_number, format_percentage,
    format_period_reference, percentage_color, score_color, score_label,
};
use crate::log_info;
use crate::models::{Pagination, QueryResult};
use crate::repository::{
    CrossingFilter, FileFilter, Paging, QueryFilter, QueryRepository, export_csv, export_file_name,
};
use crate::retry::RetryController;
use crate::store::{DashboardStore, DataSource};
use crate::utils::atomic_write;
use anyhow::Result;
use chrono::Local;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;
use std::path::{Path, PathBuf};

const KEY_WIDTH: usize = 22;

pub async fn handle(command: Option<Commands>) -> Result<()> {
    match command {
        Some(Commands::Cpf { action }) => handle_cpf(action),
        Some(Commands::Files { action }) => handle_files(action).await,
        Some(Commands::Crossings { action }) => handle_crossings(action).await,
        Some(Commands::Results { action }) => handle_results(action).await,
        Some(Commands::Config { action }) => handle_config(action),
        Some(Commands::Completions { shell }) => handle_completions(shell),
        None => handle_overview().await,
    }
}

/// Loads the configured data source through the configured retry policy
async fn open_store(config: &DashboardConfig) -> Result<DashboardStore> {
    let source = DataSource::from_config(config.data_file.as_ref());
    log_info!("Opening dashboard store from {}", source);

    let store = DashboardStore::new(source)
        .with_upload_limits(config.max_upload_mb, config.allowed_extensions.clone());
    store
        .refresh_with_retry(&RetryController::new(config.retry))
        .await?;
    Ok(store)
}

fn paging(args: &PageArgs, config: &DashboardConfig) -> Paging {
    Paging {
        page: args.page,
        limit: args.limit.unwrap_or(config.page_size),
    }
}

fn print_row(key: &str, value: &str) {
    println!("{}", OutputFormatter::key_value(key, value, KEY_WIDTH));
}

fn print_pagination(pagination: &Pagination) {
    println!("{}", OutputFormatter::info(&OutputFormatter::pagination(pagination)));
}

/// Handle the bare command: a short overview of the loaded data
async fn handle_overview() -> Result<()> {
    log_info!("Executing overview command");

    let config = DashboardConfig::load()?;
    let store = open_store(&config).await?;
    let repos = store.read();
    let summary = repos.crossings.summary();

    print_row("Data source", &store.source().to_string());
    print_row("Arquivos", &format_number(repos.files.len() as u64));
    print_row("Cruzamentos", &format_number(summary.total_crossings as u64));
    print_row("Resultados", &format_number(repos.results.len() as u64));
    print_row(
        "Último cruzamento",
        &summary
            .last_crossing
            .map(|at| format_datetime(&at, true))
            .unwrap_or_else(|| "Nunca".to_string()),
    );
    Ok(())
}

fn handle_cpf(action: CpfAction) -> Result<()> {
    match action {
        CpfAction::Validate { cpf } => {
            log_info!("Validating CPF");
            if is_valid_cpf(&cpf) {
                let message = format!("CPF válido: {}", format_cpf(&cpf));
                println!("{}", OutputFormatter::success(&message));
            } else {
                println!("{}", OutputFormatter::error(&format!("CPF inválido: {}", cpf)));
            }
        }
        CpfAction::Format { cpf, partial } => {
            let formatted = if partial {
                format_cpf_input(&cpf)
            } else {
                format_cpf(&cpf)
            };
            println!("{}", formatted);
        }
    }
    Ok(())
}

async fn handle_files(action: FilesAction) -> Result<()> {
    let config = DashboardConfig::load()?;
    let store = open_store(&config).await?;
    let repos = store.read();

    match action {
        FilesAction::List {
            name,
            file_type,
            status,
            from,
            to,
            page,
        } => {
            log_info!("Listing files");
            let filter = FileFilter {
                name,
                file_type,
                status,
                reference_start: from,
                reference_end: to,
                paging: paging(&page, &config),
            };
            let page = repos.files.query(&filter)?;

            for file in &page.items {
                let summary = FileSummary::from_file(file);
                println!(
                    "{:10} {:28} {:8} {:10} {} {}  {}",
                    file.id,
                    summary.name,
                    summary.file_type,
                    summary.reference,
                    summary.upload_date,
                    summary.upload_time,
                    OutputFormatter::badge(&summary.status, summary.status_severity)
                );
                println!("{:10} último cruzamento: {}", "", summary.last_crossing);
            }
            print_pagination(&page.pagination);
        }
        FilesAction::Stats => {
            log_info!("Executing file stats command");
            for (status, count) in repos.files.count_by_status() {
                print_row(
                    &OutputFormatter::badge(status.label(), status.severity()),
                    &count.to_string(),
                );
            }
            for (file_type, count) in repos.files.count_by_type() {
                print_row(file_type.label(), &count.to_string());
            }
        }
    }
    Ok(())
}

async fn handle_crossings(action: CrossingsAction) -> Result<()> {
    let config = DashboardConfig::load()?;
    let store = open_store(&config).await?;
    let repos = store.read();

    match action {
        CrossingsAction::List {
            file,
            from,
            to,
            min,
            max,
            since,
            until,
            page,
        } => {
            log_info!("Listing crossings");
            let filter = CrossingFilter {
                file_id: file,
                reference_start: from,
                reference_end: to,
                hit_percentage_min: min,
                hit_percentage_max: max,
                date_start: since,
                date_end: until,
                paging: paging(&page, &config),
            };
            let page = repos.crossings.query(&filter)?;

            for c in &page.items {
                println!(
                    "{:10} {:28} {:9} {}  {:>8} / {:>8}  {}  {}",
                    c.id,
                    c.file_name,
                    format_period_reference(&c.reference),
                    format_datetime(&c.crossing_date, true),
                    format_number(c.total_hits),
                    format_number(c.total_deaths),
                    OutputFormatter::badge(
                        &format_percentage(c.hit_percentage, 1),
                        percentage_color(c.hit_percentage)
                    ),
                    format_execution_time(c.execution_time)
                );
            }
            print_pagination(&page.pagination);

            let totals = repos.crossings.filtered_summary(&filter)?;
            println!(
                "{}",
                OutputFormatter::info(&format!(
                    "{} hits em {} óbitos ({} em média)",
                    format_number(totals.total_hits),
                    format_number(totals.total_deaths),
                    format_percentage(totals.average_hit_percentage, 1)
                ))
            );
        }
        CrossingsAction::Summary => {
            log_info!("Executing crossing summary command");
            let s = repos.crossings.summary();
            print_row("Cruzamentos", &format_number(s.total_crossings as u64));
            print_row("Óbitos", &format_number(s.total_deaths));
            print_row("Hits", &format_number(s.total_hits));
            print_row(
                "Média de hits",
                &format_percentage(s.average_hit_percentage, 1),
            );
            print_row(
                "Último cruzamento",
                &s.last_crossing
                    .map(|at| format_datetime(&at, true))
                    .unwrap_or_else(|| "Nunca".to_string()),
            );
        }
    }
    Ok(())
}

fn query_filter(criteria: ResultCriteria, paging: Paging) -> QueryFilter {
    QueryFilter {
        cpf: criteria.cpf,
        name: criteria.name,
        crossing_id: criteria.crossing,
        reference_start: criteria.from,
        reference_end: criteria.to,
        hit_types: criteria.hit_types,
        include_no_hits: criteria.include_no_hits,
        paging,
    }
}

fn print_result(r: &QueryResult) {
    let hits = if r.has_hits() {
        r.hit_types
            .iter()
            .map(|h| OutputFormatter::badge(h.short_label(), h.severity()))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        "Sem hits".to_string()
    };
    println!(
        "{:11} {:16} {:36} {}  {}",
        r.id,
        format_cpf(&r.cpf),
        r.name,
        OutputFormatter::badge(
            &format!("{}% {}", r.match_score, score_label(r.match_score)),
            score_color(r.match_score)
        ),
        hits
    );
}

async fn handle_results(action: ResultsAction) -> Result<()> {
    let config = DashboardConfig::load()?;
    let store = open_store(&config).await?;

    match action {
        ResultsAction::Search { criteria, page } => {
            log_info!("Searching results");
            let filter = query_filter(criteria, paging(&page, &config));
            for active in filter.active_filters() {
                print_row(active.label, &active.value);
            }

            let page = store.read().results.query(&filter)?;
            page.items.iter().for_each(print_result);
            print_pagination(&page.pagination);
        }
        ResultsAction::Stats { criteria } => {
            log_info!("Executing result stats command");
            let filter = query_filter(criteria, Paging::default());
            let stats = store.read().results.statistics(&filter)?;

            print_row("Total", &stats.total.to_string());
            print_row("Com hits", &stats.with_hits.to_string());
            print_row("Sem hits", &stats.without_hits.to_string());
            print_row(
                "Score médio",
                &format_percentage(stats.average_match_score, 1),
            );
            for (hit, count) in stats.hit_type_distribution {
                print_row(hit.label(), &count.to_string());
            }
        }
        ResultsAction::Compare { id } => {
            log_info!("Comparing result {}", id);
            let comparison = store.read().compare(&id)?;

            println!(
                "{}",
                OutputFormatter::badge(comparison.status_label(), comparison.status_severity())
            );
            let registry = &comparison.registry_data;
            let personal = &comparison.personal_data;
            let rows = [
                ("CPF", format_cpf(&registry.cpf), format_cpf(&personal.cpf)),
                ("Nome", registry.name.clone(), personal.name.clone()),
                ("Nome da Mãe", registry.mother_name.clone(), personal.mother_name.clone()),
                ("Data de Nascimento", registry.birth_date.clone(), personal.birth_date.clone()),
            ];
            for (field, ours, theirs) in rows {
                let differs = comparison.differences.iter().any(|d| d.field == field);
                let marker = if differs { "≠" } else { "=" };
                println!("{:20} {:36} {} {}", field, ours, marker, theirs);
            }
            print_row(
                "Data de Óbito",
                registry.death_date.as_deref().unwrap_or("-"),
            );
            print_row("Situação", &personal.status);
        }
        ResultsAction::Export { path, criteria } => {
            log_info!("Exporting results");
            let filter = query_filter(criteria, Paging::default());

            let default_name = export_file_name(Local::now().date_naive());
            let target = match path {
                Some(p) if p.is_dir() => p.join(default_name),
                Some(p) => p,
                None => PathBuf::from(default_name),
            };
            let exported = write_export(&store.read().results, &filter, &target)?;

            println!(
                "{}",
                OutputFormatter::success(&format!(
                    "{} resultados exportados para {}",
                    exported,
                    target.display()
                ))
            );
        }
    }
    Ok(())
}

/// Writes the CSV of every result matching `filter` to `target` and returns
/// how many results it holds
fn write_export(
    results: &QueryRepository,
    filter: &QueryFilter,
    target: &Path,
) -> Result<usize> {
    let matching = results.filtered(filter)?;
    atomic_write(target, &export_csv(&matching)?)?;
    Ok(matching.len())
}

fn handle_config(action: Option<ConfigAction>) -> Result<()> {
    let mut config = DashboardConfig::load()?;

    match action {
        None | Some(ConfigAction::Show) => {
            log_info!("Executing config command");
            let s = std::fs::read_to_string(config.config_path())?;
            println!("{}", s);
            return Ok(());
        }
        Some(ConfigAction::SetRetry {
            max_retries,
            delay_ms,
            max_delay_ms,
            backoff,
        }) => {
            if let Some(n) = max_retries {
                config.retry.max_retries = n;
            }
            if let Some(ms) = delay_ms {
                config.retry.retry_delay_ms = ms;
            }
            if let Some(ms) = max_delay_ms {
                config.retry.max_delay_ms = ms;
            }
            if let Some(enabled) = backoff {
                config.retry.exponential_backoff = enabled;
            }
            log_info!("Setting retry policy to {:?}", config.retry);
        }
        Some(ConfigAction::SetData { path }) => {
            if let Some(p) = &path
                && !p.is_file()
            {
                println!(
                    "{}",
                    OutputFormatter::warning(&format!("{} does not exist yet", p.display()))
                );
            }
            log_info!("Setting data file to {:?}", path);
            config.data_file = path;
        }
        Some(ConfigAction::LogLevel { level }) => {
            log_info!("Setting log level to {}", level);
            config.log_level = level;
        }
        Some(ConfigAction::PageSize { size }) => {
            log_info!("Setting page size to {}", size);
            config.page_size = size;
        }
    }

    config.validate()?;
    config.save()?;
    println!("{}", OutputFormatter::success("Configuration saved"));
    Ok(())
}

/// Handle completions command
fn handle_completions(shell: Shell) -> Result<()> {
    log_info!("Generating completions for shell: {:?}", shell);

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
