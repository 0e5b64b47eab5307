use tracing::debug;

use super::{Messages, ViewState};
use crate::domain::CollectionId;
use crate::models::{Collection, CollectionFields, MAX_PREVIEW_IMAGES, ValidationError};
use crate::repository::{CollectionRepository, RepositoryError};

/// The signed-in user's collections. Every mutation is followed by a fresh list.
pub struct CollectionsView {
    repo: CollectionRepository,
    messages: Messages,
    pub state: ViewState<Vec<Collection>>,
}

impl CollectionsView {
    #[must_use]
    pub fn new(repo: CollectionRepository, messages: Messages) -> Self {
        Self {
            repo,
            messages,
            state: ViewState::Idle,
        }
    }

    pub async fn load(&mut self) -> &ViewState<Vec<Collection>> {
        self.state = ViewState::Loading;
        let result = self.repo.list().await;
        self.state = ViewState::from_result(result, |e| self.messages.repository_error(e));
        &self.state
    }

    pub async fn create(&mut self, form: &CollectionForm) -> Result<Collection, RepositoryError> {
        let fields = form.fields().map_err(|e| self.fail(e.into()))?;
        let collection = self
            .repo
            .create(&fields.name, &fields.description, &fields.preview_images)
            .await
            .map_err(|e| self.fail(e))?;
        self.load().await;
        Ok(collection)
    }

    pub async fn update(
        &mut self,
        id: &CollectionId,
        form: &CollectionForm,
    ) -> Result<(), RepositoryError> {
        let fields = form.fields().map_err(|e| self.fail(e.into()))?;
        self.repo
            .update(id, &fields)
            .await
            .map_err(|e| self.fail(e))?;
        self.load().await;
        Ok(())
    }

    pub async fn delete(&mut self, id: &CollectionId) -> Result<(), RepositoryError> {
        self.repo.delete(id).await.map_err(|e| self.fail(e))?;
        self.load().await;
        Ok(())
    }

    /// Shows a failed mutation in the view and hands the error back.
    fn fail(&mut self, err: RepositoryError) -> RepositoryError {
        self.state = ViewState::Error(self.messages.repository_error(&err));
        err
    }

    #[must_use]
    pub fn find(&self, id: &CollectionId) -> Option<&Collection> {
        self.state.value()?.iter().find(|c| c.id == *id)
    }

    #[must_use]
    pub fn describe(&self, err: &RepositoryError) -> String {
        self.messages.repository_error(err)
    }
}

/// Create/edit form for a collection, with up to three preview image slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionForm {
    pub name: String,
    pub description: String,
    image_slots: Vec<String>,
}

impl Default for CollectionForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            image_slots: vec![String::new()],
        }
    }
}

impl CollectionForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled for editing.
    #[must_use]
    pub fn from_collection(collection: &Collection) -> Self {
        let mut image_slots = collection.preview_images.clone();
        if image_slots.is_empty() {
            image_slots.push(String::new());
        }
        Self {
            name: collection.name.clone(),
            description: collection.description.clone(),
            image_slots,
        }
    }

    #[must_use]
    pub fn image_slots(&self) -> &[String] {
        &self.image_slots
    }

    /// Returns false when all slots are already in use.
    pub fn add_image_slot(&mut self) -> bool {
        if self.image_slots.len() >= MAX_PREVIEW_IMAGES {
            debug!("Preview image slots exhausted");
            return false;
        }
        self.image_slots.push(String::new());
        true
    }

    pub fn remove_image_slot(&mut self, index: usize) {
        if index < self.image_slots.len() {
            self.image_slots.remove(index);
        }
        if self.image_slots.is_empty() {
            self.image_slots.push(String::new());
        }
    }

    pub fn set_image(&mut self, index: usize, url: impl Into<String>) -> bool {
        match self.image_slots.get_mut(index) {
            Some(slot) => {
                *slot = url.into();
                true
            }
            None => false,
        }
    }

    /// Fills slots from a list, adding slots as needed.
    pub fn set_images<I, S>(&mut self, urls: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.len() > MAX_PREVIEW_IMAGES {
            return Err(ValidationError::TooManyPreviewImages {
                max: MAX_PREVIEW_IMAGES,
            });
        }
        self.image_slots = if urls.is_empty() {
            vec![String::new()]
        } else {
            urls
        };
        Ok(())
    }

    /// # Errors
    ///
    /// [`ValidationError::MissingField`] when the name is blank.
    pub fn fields(&self) -> Result<CollectionFields, ValidationError> {
        CollectionFields::new(&self.name, &self.description, self.image_slots.clone()).normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_capped_at_three() {
        let mut form = CollectionForm::new();
        assert!(form.add_image_slot());
        assert!(form.add_image_slot());
        assert!(!form.add_image_slot());
        assert_eq!(form.image_slots().len(), 3);

        form.remove_image_slot(0);
        form.remove_image_slot(0);
        form.remove_image_slot(0);
        assert_eq!(form.image_slots().len(), 1);
    }

    #[test]
    fn blank_slots_are_dropped_on_submit() {
        let mut form = CollectionForm::new();
        form.name = "Favourites".to_string();
        form.set_image(0, "https://img/a.jpg");
        form.add_image_slot();
        let fields = form.fields().unwrap();
        assert_eq!(fields.preview_images, vec!["https://img/a.jpg"]);
    }

    #[test]
    fn name_is_required() {
        let form = CollectionForm::new();
        assert_eq!(form.fields(), Err(ValidationError::MissingField("name")));
    }
}
