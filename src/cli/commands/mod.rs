mod auth;
mod browse;
mod collections;
mod entries;

pub use auth::{cmd_login, cmd_logout, cmd_register, cmd_whoami};
pub use browse::{cmd_search, cmd_seasonal, cmd_show};
pub use collections::{
    cmd_collection_create, cmd_collection_delete, cmd_collection_edit, cmd_collection_list,
};
pub use entries::{AddEntryArgs, cmd_add_entry, cmd_entries};

use std::io::{self, BufRead, Write};

use crate::models::AnimeMetadata;

/// Reads one trimmed line from stdin after printing `label`.
fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_anime_line(anime: &AnimeMetadata) {
    let eps = anime
        .episodes
        .map_or_else(|| "? eps".to_string(), |e| format!("{e} eps"));
    println!("• {} ({})", anime.title, eps);
    println!("  {} | ID: {}", anime.subtitle(), anime.mal_id);
    if let Some(score) = anime.score {
        println!("  Score: {score:.2}");
    }
}
