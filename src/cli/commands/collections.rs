use crate::domain::CollectionId;
use crate::presentation::{CollectionForm, CollectionsView, Key, ViewState};
use crate::repository::RepositoryError;
use crate::state::AppContext;

fn parse_id(id: &str) -> anyhow::Result<CollectionId> {
    id.parse()
        .map_err(|e| anyhow::anyhow!("Invalid collection id '{id}': {e}"))
}

fn fail(view: &CollectionsView, err: &RepositoryError) -> anyhow::Error {
    anyhow::anyhow!(view.describe(err))
}

pub async fn cmd_collection_list(ctx: &AppContext) -> anyhow::Result<()> {
    let messages = ctx.messages;
    let mut view = ctx.collections_view();

    match view.load().await {
        ViewState::Success(collections) if collections.is_empty() => {
            println!("{}", messages.text(Key::NoCollections));
        }
        ViewState::Success(collections) => {
            println!("{:<38} {:<30} {:>6}", "ID", "Name", "Anime");
            println!("{:-<76}", "");
            for collection in collections {
                println!(
                    "{:<38} {:<30} {:>6}",
                    collection.id, collection.name, collection.animes_count
                );
                if !collection.description.is_empty() {
                    println!("{:<38} {}", "", collection.description);
                }
            }
        }
        ViewState::Error(message) => anyhow::bail!(message.clone()),
        ViewState::Idle | ViewState::Loading => {}
    }

    Ok(())
}

pub async fn cmd_collection_create(
    ctx: &AppContext,
    name: String,
    description: String,
    images: Vec<String>,
) -> anyhow::Result<()> {
    let mut view = ctx.collections_view();

    let mut form = CollectionForm::new();
    form.name = name;
    form.description = description;
    form.set_images(images)
        .map_err(|e| anyhow::anyhow!(ctx.messages.validation(&e)))?;

    let collection = view
        .create(&form)
        .await
        .map_err(|e| fail(&view, &e))?;

    println!("{}: {} ({})", ctx.messages.text(Key::CollectionCreated), collection.name, collection.id);
    Ok(())
}

pub async fn cmd_collection_edit(
    ctx: &AppContext,
    id: &str,
    name: Option<String>,
    description: Option<String>,
    images: Vec<String>,
    clear_images: bool,
) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let mut view = ctx.collections_view();

    if let Some(message) = view.load().await.error() {
        anyhow::bail!(message.to_string());
    }
    let Some(current) = view.find(&id) else {
        anyhow::bail!("Collection not found: {id}");
    };

    let mut form = CollectionForm::from_collection(current);
    if let Some(name) = name {
        form.name = name;
    }
    if let Some(description) = description {
        form.description = description;
    }
    if clear_images {
        form.set_images(Vec::<String>::new())
            .map_err(|e| anyhow::anyhow!(ctx.messages.validation(&e)))?;
    } else if !images.is_empty() {
        form.set_images(images)
            .map_err(|e| anyhow::anyhow!(ctx.messages.validation(&e)))?;
    }

    view.update(&id, &form).await.map_err(|e| fail(&view, &e))?;
    println!("{}", ctx.messages.text(Key::CollectionUpdated));
    Ok(())
}

pub async fn cmd_collection_delete(ctx: &AppContext, id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let mut view = ctx.collections_view();

    view.delete(&id).await.map_err(|e| fail(&view, &e))?;
    println!("{}", ctx.messages.text(Key::CollectionDeleted));
    Ok(())
}
