use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use rasp::config::Config;
use rasp::crawler::ScheduleRequest;
use rasp::models::SubjectKind;
use rasp::parser::extract_schedule;
use rasp::pipeline::{Lookup, ScheduleService};
use rasp::storage::{to_stored_json, FileStore, ScheduleKey};
use rasp::week::{academic_week, week_start, WeekGrid, DAYS, TIMES};

/// Subject selected on the command line
pub struct SubjectArgs {
    pub group: Option<String>,
    pub staff: Option<String>,
    pub url: Option<String>,
    pub week: Option<String>,
}

impl SubjectArgs {
    fn subject(&self) -> Option<(SubjectKind, &str)> {
        match (&self.group, &self.staff) {
            (Some(id), _) => Some((SubjectKind::Group, id.as_str())),
            (None, Some(id)) => Some((SubjectKind::Staff, id.as_str())),
            (None, None) => None,
        }
    }

    fn week_or_current(&self) -> String {
        self.week
            .clone()
            .unwrap_or_else(|| academic_week(chrono::Local::now().date_naive()).to_string())
    }
}

fn service(config: &Config) -> Result<ScheduleService> {
    let store = Arc::new(FileStore::new(&config.storage.data_dir));
    ScheduleService::new(config, store).context("Failed to create schedule service")
}

/// Fetch, extract and cache one schedule
pub async fn refresh(config: Config, args: SubjectArgs) -> Result<()> {
    let request = if let Some(url) = &args.url {
        ScheduleRequest::Url(url.clone())
    } else if let Some((kind, id)) = args.subject() {
        ScheduleRequest::subject(kind, id, Some(&args.week_or_current()))
    } else {
        bail!("Provide --url, --group or --staff");
    };

    let report = service(&config)?.refresh(&request).await?;

    println!("Schedule refreshed");
    println!("==================");
    println!("  URL: {}", report.url);
    println!("  Key: {}", report.key);
    println!("  Fallback key: {}", report.fallback_key);
    println!("  Cells: {}", report.cells);
    println!("  Removed placeholders: {}", report.removed);
    if !report.fetched {
        println!("  Warning: page could not be fetched, an empty schedule was stored");
    }

    Ok(())
}

/// Print a cached schedule as a weekly grid
pub async fn lookup(config: Config, args: SubjectArgs, json: bool) -> Result<()> {
    let (kind, id) = args
        .subject()
        .map_or((SubjectKind::Group, None), |(k, id)| (k, Some(id)));
    let week = args.week_or_current();

    let lookup = service(&config)?.lookup(kind, id, Some(&week)).await?;
    let Some(schedule) = lookup.schedule() else {
        bail!("Schedule not found. Run `rasp refresh` first");
    };

    if json {
        println!("{}", to_stored_json(&schedule.key, &schedule.cells)?);
        return Ok(());
    }

    if matches!(lookup, Lookup::Fallback(_)) {
        println!("No schedule cached for this subject, showing the most recent one");
    }
    let monday = week
        .parse::<u32>()
        .ok()
        .and_then(|n| week_start(n, chrono::Local::now().date_naive()));
    match monday {
        Some(monday) => println!(
            "Schedule {} (week {week}, from {})",
            schedule.key,
            monday.format("%d.%m.%Y")
        ),
        None => println!("Schedule {} (week {week})", schedule.key),
    }
    println!();

    let grid = WeekGrid::from_cells(
        &schedule.cells,
        config.extraction.rows,
        config.extraction.days_per_week,
    );

    for (day, name) in DAYS.iter().enumerate().take(config.extraction.days_per_week) {
        println!("{name}");
        for row in 0..grid.rows() {
            for lesson in grid.at(row, day) {
                let time = TIMES.get(row).copied().unwrap_or("?");
                println!(
                    "  {time}  {}  {}  {}",
                    lesson.discipline.as_deref().unwrap_or("-"),
                    lesson.place.as_deref().unwrap_or("-"),
                    lesson.teacher.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}

/// Run extraction on a saved HTML page and print the resulting JSON
pub fn extract(config: &Config, file: &Path) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let trimmed = extract_schedule(&html, config.extraction.leading_placeholders);
    tracing::info!(
        cells = trimmed.cells.len(),
        removed = trimmed.removed,
        "Extraction finished"
    );

    println!("{}", to_stored_json(&ScheduleKey::fallback(), &trimmed.cells)?);
    Ok(())
}
