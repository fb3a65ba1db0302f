//! Category resolution: caption override > user default > file-kind inference.

use crate::attachment::AttachmentKind;
use crate::prefs::{UserId, UserPreferences};
use crate::telegram::types::command_name;

use super::{CategoryRegistry, OTHER};

/// What a file caption asks for: `/<category> [desired file name]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionDirective {
    /// Set only when the `/name` token names a registered category.
    pub category: Option<String>,
    /// Remaining tokens joined by single spaces, if any.
    pub filename: Option<String>,
}

/// Parses a caption. Only captions that start with `/` carry a directive (the
/// token ends at the first space); the filename part applies even if the
/// category is unknown.
pub fn parse_caption(caption: &str, registry: &CategoryRegistry) -> CaptionDirective {
    let (first, rest) = caption.split_once(' ').unwrap_or((caption, ""));
    let Some(name) = command_name(first) else {
        return CaptionDirective::default();
    };
    let rest: Vec<&str> = rest.split_whitespace().collect();
    CaptionDirective {
        category: registry.contains(name).then(|| name.to_string()),
        filename: (!rest.is_empty()).then(|| rest.join(" ")),
    }
}

/// Which rule decided the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Caption,
    UserDefault,
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub category: String,
    pub source: ResolutionSource,
}

/// Resolves the category for an incoming file.
pub struct CategoryResolver<'a> {
    registry: &'a CategoryRegistry,
    prefs: &'a UserPreferences,
}

impl<'a> CategoryResolver<'a> {
    pub fn new(registry: &'a CategoryRegistry, prefs: &'a UserPreferences) -> Self {
        Self { registry, prefs }
    }

    /// Caption override wins over the user's stored default, which wins over
    /// the kind's category. No kind at all resolves to `other`.
    pub fn resolve(
        &self,
        caption: Option<&str>,
        user: Option<UserId>,
        kind: Option<AttachmentKind>,
    ) -> Resolution {
        if let Some(category) = caption.and_then(|c| parse_caption(c, self.registry).category) {
            return Resolution {
                category,
                source: ResolutionSource::Caption,
            };
        }
        if let Some(category) = user.and_then(|u| self.prefs.get_default(u)) {
            return Resolution {
                category,
                source: ResolutionSource::UserDefault,
            };
        }
        Resolution {
            category: kind.map_or(OTHER, AttachmentKind::default_category).to_string(),
            source: ResolutionSource::Inferred,
        }
    }
}
