//! User-facing strings in English and Spanish.

use std::str::FromStr;

use crate::clients::jikan::MetadataError;
use crate::models::ValidationError;
use crate::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "es" | "es-es" | "es-mx" => Ok(Self::Es),
            other => Err(format!("unsupported locale '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Loading,
    NoResults,
    NoCollections,
    EmptyCollection,
    NotSignedIn,
    SignedInAs,
    SignedOut,
    ConfirmEmail,
    OpenInBrowser,
    CollectionCreated,
    CollectionUpdated,
    CollectionDeleted,
    EntryAdded,
    UnsavedChanges,
    SeasonalTitle,
    Episodes,
    Score,
    Status,
    Progress,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Falls back to English for unknown locales.
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        Self::new(locale.parse().unwrap_or_default())
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    #[must_use]
    pub const fn text(&self, key: Key) -> &'static str {
        match self.locale {
            Locale::En => match key {
                Key::Loading => "Loading...",
                Key::NoResults => "No anime found",
                Key::NoCollections => "You have no collections yet",
                Key::EmptyCollection => "This collection is empty",
                Key::NotSignedIn => "Not signed in",
                Key::SignedInAs => "Signed in as",
                Key::SignedOut => "Signed out",
                Key::ConfirmEmail => "Check your email to confirm your account",
                Key::OpenInBrowser => "Open this URL in your browser to continue",
                Key::CollectionCreated => "Collection created",
                Key::CollectionUpdated => "Collection updated",
                Key::CollectionDeleted => "Collection deleted",
                Key::EntryAdded => "Anime added to collection",
                Key::UnsavedChanges => "Status changes are not saved",
                Key::SeasonalTitle => "This season",
                Key::Episodes => "Episodes",
                Key::Score => "Score",
                Key::Status => "Status",
                Key::Progress => "Progress",
            },
            Locale::Es => match key {
                Key::Loading => "Cargando...",
                Key::NoResults => "No se encontraron animes",
                Key::NoCollections => "Todavía no tienes colecciones",
                Key::EmptyCollection => "Esta colección está vacía",
                Key::NotSignedIn => "No has iniciado sesión",
                Key::SignedInAs => "Sesión iniciada como",
                Key::SignedOut => "Sesión cerrada",
                Key::ConfirmEmail => "Revisa tu correo para confirmar tu cuenta",
                Key::OpenInBrowser => "Abre esta URL en tu navegador para continuar",
                Key::CollectionCreated => "Colección creada",
                Key::CollectionUpdated => "Colección actualizada",
                Key::CollectionDeleted => "Colección eliminada",
                Key::EntryAdded => "Anime añadido a la colección",
                Key::UnsavedChanges => "Los cambios de estado no se guardan",
                Key::SeasonalTitle => "Esta temporada",
                Key::Episodes => "Episodios",
                Key::Score => "Puntuación",
                Key::Status => "Estado",
                Key::Progress => "Progreso",
            },
        }
    }

    #[must_use]
    pub fn validation(&self, err: &ValidationError) -> String {
        match (self.locale, err) {
            (Locale::En, _) => err.to_string(),
            (Locale::Es, ValidationError::MissingField(field)) => {
                format!("El campo {field} es obligatorio")
            }
            (Locale::Es, ValidationError::TooManyPreviewImages { max }) => {
                format!("Se permiten como máximo {max} imágenes")
            }
            (Locale::Es, ValidationError::ScoreOutOfRange(score)) => {
                format!("La puntuación debe estar entre 0 y 10 (recibido {score})")
            }
            (Locale::Es, ValidationError::CollectionNotSelected) => {
                "Debes seleccionar una colección".to_string()
            }
            (Locale::Es, ValidationError::InvalidDate(value)) => {
                format!("Fecha no válida '{value}', usa AAAA-MM-DD")
            }
        }
    }

    #[must_use]
    pub fn repository_error(&self, err: &RepositoryError) -> String {
        match (self.locale, err) {
            (_, RepositoryError::ValidationFailed(inner)) => self.validation(inner),
            (Locale::En, other) => other.to_string(),
            (Locale::Es, RepositoryError::NotAuthenticated) => {
                "Necesitas iniciar sesión".to_string()
            }
            (Locale::Es, RepositoryError::Forbidden(msg)) => format!("No permitido: {msg}"),
            (Locale::Es, RepositoryError::RemoteRequestFailed(msg)) => {
                format!("La solicitud falló: {msg}")
            }
        }
    }

    #[must_use]
    pub fn metadata_error(&self, err: &MetadataError) -> String {
        match (self.locale, err) {
            (Locale::En, MetadataError::Timeout) => {
                "The anime service took too long to answer".to_string()
            }
            (Locale::Es, MetadataError::Timeout) => {
                "El servicio de anime tardó demasiado en responder".to_string()
            }
            (Locale::En, other) => format!("Could not load anime data: {other}"),
            (Locale::Es, other) => format!("No se pudieron cargar los datos: {other}"),
        }
    }
}
