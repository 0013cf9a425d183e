use anyhow::{Context, Result};
use std::sync::Arc;

use rasp::config::Config;
use rasp::directory::{self, DirectoryCrawler};
use rasp::storage::{FileStore, ScheduleKey};

/// Which directory to rebuild
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum DirectoryKind {
    Groups,
    Staff,
}

/// Crawl the group or staff listing and store it
pub async fn refresh(config: Config, kind: DirectoryKind, pages: u32) -> Result<()> {
    let store = Arc::new(FileStore::new(&config.storage.data_dir));
    let crawler =
        DirectoryCrawler::new(&config.source, store).context("Failed to create crawler")?;

    let (key, entries) = match kind {
        DirectoryKind::Groups => (ScheduleKey::GROUPS, crawler.refresh_groups().await?),
        DirectoryKind::Staff => (ScheduleKey::STAFF, crawler.refresh_staff(pages).await?),
    };

    println!(
        "Stored {} entries in {}",
        entries.len(),
        config.storage.data_dir.join(format!("{key}.json")).display()
    );
    Ok(())
}

/// Search the stored directories
pub async fn search(config: Config, query: String) -> Result<()> {
    let store = FileStore::new(&config.storage.data_dir);

    let groups = directory::load(&store, ScheduleKey::GROUPS).await?.unwrap_or_default();
    let staff = directory::load(&store, ScheduleKey::STAFF).await?.unwrap_or_default();
    let results = directory::search(&groups, &staff, &query, config.server.search_limit);

    println!("Groups ({}):", results.groups.len());
    for group in &results.groups {
        println!("  {:>12}  {}", group.id, group.number);
    }
    println!("Staff ({}):", results.staff.len());
    for person in &results.staff {
        println!("  {:>12}  {}", person.id, person.name);
    }
    Ok(())
}
