use super::print_anime_line;
use crate::domain::MalId;
use crate::presentation::{Key, ViewState};
use crate::state::AppContext;

pub async fn cmd_search(ctx: &AppContext, query: &str) -> anyhow::Result<()> {
    let messages = ctx.messages;
    println!("Searching for: {query}");

    let view = ctx.search_view();
    view.input(query).await?;

    match view.results().await {
        ViewState::Success(results) if results.is_empty() => {
            println!("{} ('{query}')", messages.text(Key::NoResults));
        }
        ViewState::Success(results) => {
            println!();
            println!("Search Results:");
            println!("{:-<60}", "");
            for anime in &results {
                print_anime_line(anime);
                println!();
            }
            println!("To add an anime: animeshelf add <ID> --collection <COLLECTION>");
        }
        ViewState::Error(message) => anyhow::bail!(message),
        ViewState::Idle | ViewState::Loading => {}
    }

    Ok(())
}

pub async fn cmd_seasonal(ctx: &AppContext, limit: Option<u32>) -> anyhow::Result<()> {
    let messages = ctx.messages;
    let mut view = ctx.seasonal_view(limit);

    match view.load().await {
        ViewState::Success(results) => {
            println!("{}", messages.text(Key::SeasonalTitle));
            println!("{:-<60}", "");
            if results.is_empty() {
                println!("{}", messages.text(Key::NoResults));
            }
            for anime in results {
                print_anime_line(anime);
                println!();
            }
        }
        ViewState::Error(message) => anyhow::bail!(message.clone()),
        ViewState::Idle | ViewState::Loading => {}
    }

    Ok(())
}

pub async fn cmd_show(ctx: &AppContext, mal_id: i32) -> anyhow::Result<()> {
    let messages = ctx.messages;
    let mut view = ctx.detail_view();

    let anime = match view.load(MalId::new(mal_id)).await {
        ViewState::Success(anime) => anime,
        ViewState::Error(message) => anyhow::bail!(message.clone()),
        ViewState::Idle | ViewState::Loading => return Ok(()),
    };

    println!("{}", anime.title);
    println!("{:-<60}", "");
    println!("  {}", anime.subtitle());
    println!(
        "  {}: {}",
        messages.text(Key::Episodes),
        anime
            .episodes
            .map_or_else(|| "?".to_string(), |e| e.to_string())
    );
    if let Some(score) = anime.score {
        println!("  {}: {score:.2}", messages.text(Key::Score));
    }
    if let Some(status) = &anime.status {
        println!("  {}: {status}", messages.text(Key::Status));
    }
    if let Some(season) = &anime.season {
        println!("  Season: {season}");
    }
    let genres = anime.genre_names();
    if !genres.is_empty() {
        println!("  Genres: {}", genres.join(", "));
    }
    println!("  URL: {}", anime.url);
    println!("  Image: {}", anime.images.jpg.large_image_url);

    if let Some(synopsis) = &anime.synopsis {
        println!();
        println!("{synopsis}");
    }

    Ok(())
}
