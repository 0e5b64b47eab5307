use crate::domain::{CollectionId, MalId};
use crate::models::WatchStatus;
use crate::presentation::{AddEntryForm, Key, ViewState};
use crate::state::AppContext;

pub async fn cmd_entries(
    ctx: &AppContext,
    collection_id: &str,
    filter: Option<String>,
) -> anyhow::Result<()> {
    let messages = ctx.messages;
    let collection_id: CollectionId = collection_id
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid collection id '{collection_id}': {e}"))?;

    let mut view = ctx.list_view();
    if let ViewState::Error(message) = view.load(collection_id).await {
        anyhow::bail!(message.clone());
    }
    if let Some(filter) = filter {
        view.set_filter(filter);
    }

    let visible = view.visible();
    if visible.is_empty() {
        println!("{}", messages.text(Key::EmptyCollection));
        return Ok(());
    }

    println!(
        "{:<8} {:<40} {:<14} {:>9} {:>6}",
        "ID",
        "Title",
        messages.text(Key::Status),
        messages.text(Key::Progress),
        messages.text(Key::Score)
    );
    println!("{:-<81}", "");

    for (_, entry) in visible {
        let title: String = entry.anime.title.chars().take(40).collect();
        println!(
            "{:<8} {:<40} {:<14} {:>9} {:>6}",
            entry.anime.mal_id,
            title,
            entry.tracking.status,
            entry.progress_label(),
            entry.tracking.score
        );
        if !entry.tracking.notes.is_empty() {
            println!("{:<8} {}", "", entry.tracking.notes);
        }
    }

    Ok(())
}

pub struct AddEntryArgs {
    pub mal_id: i32,
    pub collection: Option<String>,
    pub status: Option<String>,
    pub score: Option<u8>,
    pub progress: u32,
    pub started: Option<String>,
    pub finished: Option<String>,
    pub notes: Option<String>,
}

pub async fn cmd_add_entry(ctx: &AppContext, args: AddEntryArgs) -> anyhow::Result<()> {
    let messages = ctx.messages;

    let mut detail = ctx.detail_view();
    let anime = match detail.load(MalId::new(args.mal_id)).await {
        ViewState::Success(anime) => anime.clone(),
        ViewState::Error(message) => anyhow::bail!(message.clone()),
        ViewState::Idle | ViewState::Loading => return Ok(()),
    };

    let mut form = AddEntryForm::new(anime);
    if let Some(collection) = &args.collection {
        form.collection_id = Some(
            collection
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid collection id '{collection}': {e}"))?,
        );
    }
    if let Some(status) = &args.status {
        form.status = status.parse::<WatchStatus>().map_err(anyhow::Error::msg)?;
    }
    if let Some(score) = args.score {
        form.score = score;
    }
    form.progress = args.progress;
    form.started_at = args.started.unwrap_or_default();
    form.finished_at = args.finished.unwrap_or_default();
    form.notes = args.notes.unwrap_or_default();

    if let Err(e) = form.validate() {
        println!("{}", messages.validation(&e));
        if form.collection_id.is_none() {
            let mut collections = ctx.collections_view();
            if let ViewState::Success(list) = collections.load().await {
                for collection in list {
                    println!("  {}  {}", collection.id, collection.name);
                }
            }
        }
        anyhow::bail!("Entry not added");
    }

    let entry = form
        .submit(&ctx.lists, messages)
        .await
        .map_err(|e| anyhow::anyhow!(messages.repository_error(&e)))?;

    println!(
        "{}: {} [{}]",
        messages.text(Key::EntryAdded),
        entry.anime.title,
        entry.tracking.status
    );
    Ok(())
}
