//! `upq list` – paginated listing of files stored on the server.

use anyhow::Result;

use upq_core::config::UpqConfig;
use upq_core::remote::RemoteClient;

pub async fn run_list(cfg: &UpqConfig, page: u64, limit: u64, search: Option<&str>) -> Result<()> {
    let client = RemoteClient::new(cfg);
    let listing = client.list_files(page, limit, search).await?;

    if listing.files.is_empty() {
        println!("no files found");
        return Ok(());
    }

    println!("{:<26} {:>10}  {:<24} {}", "ID", "SIZE", "TYPE", "NAME");
    for file in &listing.files {
        println!(
            "{:<26} {:>10}  {:<24} {}",
            file.id,
            human_size(file.size),
            file.file_type,
            file.name
        );
    }
    let p = &listing.pagination;
    println!(
        "page {} of {} ({} file(s) total)",
        p.page.max(1),
        p.pages.max(1),
        p.total
    );
    Ok(())
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
