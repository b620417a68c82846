use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::aggregator;

use super::catalog::CatalogEntry;
use super::moderation::ModerationList;

/// Author shown when the viewer identity carries no display name
pub const GUEST_AUTHOR: &str = "Guest";

/// Percent assigned to a freshly added component, capped by the remaining share
const DEFAULT_COMPONENT_PERCENT: u8 = 20;

/// Catalog identity of a component: which brand, which flavor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
    pub brand: String,
    pub flavor: String,
}

impl SourceId {
    pub fn new(brand: impl Into<String>, flavor: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            flavor: flavor.into(),
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.brand, self.flavor)
    }
}

/// One ingredient within a blend
///
/// Everything but `percent` is copied verbatim from the catalog entry and
/// never changes; `percent` is mutable while the draft is being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorComponent {
    pub source_id: SourceId,
    pub display_name: String,
    /// Free-text comma-separated descriptors, e.g. "fruity, tart"
    pub taste_tags: String,
    /// Inherent strength rating in [1,10]
    pub intensity: u8,
    /// Share of the blend in [0,100]
    pub percent: u8,
}

/// A finalized composition, not yet persisted.
///
/// The store assigns `id` and `created_at` on append.
#[derive(Debug, Clone)]
pub struct NewBlend {
    pub title: String,
    pub author: String,
    pub components: Vec<FlavorComponent>,
    pub average_intensity: u8,
}

/// A persisted blend. Immutable except for `like_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blend {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub components: Vec<FlavorComponent>,
    /// Derived once at creation, never recomputed
    pub average_intensity: u8,
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Checks that a component sequence is a valid finalized composition:
/// at least one component, no duplicate source ids, intensities in [1,10],
/// and percentages summing to exactly 100.
pub fn validate_composition(components: &[FlavorComponent]) -> AppResult<()> {
    if components.is_empty() {
        return Err(AppError::InvalidAllocation(
            "a blend needs at least one component".to_string(),
        ));
    }
    for (i, component) in components.iter().enumerate() {
        if !(1..=10).contains(&component.intensity) {
            return Err(AppError::InvalidInput(format!(
                "intensity of {} must be in [1,10]",
                component.source_id
            )));
        }
        if component.percent > 100 {
            return Err(AppError::InvalidInput(format!(
                "percent of {} must be in [0,100]",
                component.source_id
            )));
        }
        if components[..i]
            .iter()
            .any(|other| other.source_id == component.source_id)
        {
            return Err(AppError::InvalidInput(format!(
                "duplicate component {}",
                component.source_id
            )));
        }
    }
    let total: u32 = components.iter().map(|c| c.percent as u32).sum();
    if total != 100 {
        return Err(AppError::InvalidAllocation(format!(
            "component percentages must sum to 100, got {total}"
        )));
    }
    Ok(())
}

/// An in-progress builder session.
///
/// Lives only until `finalize`; enforces the percent allocation rules on
/// every mutation so the running total can never exceed 100.
#[derive(Debug, Clone, Default)]
pub struct BlendDraft {
    components: Vec<FlavorComponent>,
}

impl BlendDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[FlavorComponent] {
        &self.components
    }

    pub fn total_percent(&self) -> u32 {
        self.components.iter().map(|c| c.percent as u32).sum()
    }

    /// Adds a catalog entry to the draft.
    ///
    /// Silently ignored when the running total is already 100 or when a
    /// component with the same source id is already present. Returns whether
    /// the component was actually added.
    pub fn add_component(&mut self, entry: &CatalogEntry) -> bool {
        let total = self.total_percent();
        if total >= 100 {
            return false;
        }
        if self
            .components
            .iter()
            .any(|c| c.source_id == entry.source_id)
        {
            return false;
        }
        let remaining = (100 - total) as u8;
        self.components.push(FlavorComponent {
            source_id: entry.source_id.clone(),
            display_name: entry.display_name.clone(),
            taste_tags: entry.taste_tags.clone(),
            intensity: entry.intensity,
            percent: DEFAULT_COMPONENT_PERCENT.min(remaining),
        });
        true
    }

    /// Sets one component's percent, clamped so the total stays within 100.
    /// Returns the applied value, or `None` if the component is not present.
    pub fn set_percent(&mut self, source_id: &SourceId, proposed: f64) -> Option<u8> {
        let clamped = aggregator::clamp_percent_allocation(&self.components, source_id, proposed);
        let component = self
            .components
            .iter_mut()
            .find(|c| &c.source_id == source_id)?;
        component.percent = clamped;
        Some(clamped)
    }

    /// Drops a component. Remaining percentages are left as they are.
    pub fn remove_component(&mut self, source_id: &SourceId) {
        self.components.retain(|c| &c.source_id != source_id);
    }

    /// Turns the draft into a `NewBlend`, consuming it.
    ///
    /// Fails with `InvalidAllocation` unless the percentages sum to exactly
    /// 100, and with `ModerationRejected` when the title contains a banned
    /// word. The average intensity is computed here, once.
    pub fn finalize(
        self,
        title: &str,
        author: Option<&str>,
        moderation: &ModerationList,
    ) -> AppResult<NewBlend> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::InvalidInput("title must not be empty".to_string()));
        }
        moderation.check(title)?;
        validate_composition(&self.components)?;

        let average_intensity = aggregator::average_intensity(&self.components);
        let author = author
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(GUEST_AUTHOR);

        Ok(NewBlend {
            title: title.to_string(),
            author: author.to_string(),
            components: self.components,
            average_intensity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(brand: &str, flavor: &str, intensity: u8, percent: u8) -> FlavorComponent {
        FlavorComponent {
            source_id: SourceId::new(brand, flavor),
            display_name: flavor.to_string(),
            taste_tags: "fruity, tart".to_string(),
            intensity,
            percent,
        }
    }

    fn entry(brand: &str, flavor: &str, intensity: u8) -> CatalogEntry {
        CatalogEntry {
            source_id: SourceId::new(brand, flavor),
            display_name: flavor.to_string(),
            taste_tags: "fruity, tart".to_string(),
            intensity,
        }
    }

    #[test]
    fn add_component_defaults_to_twenty_percent() {
        let mut draft = BlendDraft::new();
        assert!(draft.add_component(&entry("af", "mint", 2)));
        assert_eq!(draft.components()[0].percent, 20);
    }

    #[test]
    fn add_component_caps_at_remaining_share() {
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("af", "mint", 2));
        draft.set_percent(&SourceId::new("af", "mint"), 90.0);
        assert!(draft.add_component(&entry("af", "grape", 2)));
        assert_eq!(draft.components()[1].percent, 10);
    }

    #[test]
    fn duplicate_source_id_is_a_noop() {
        let mut draft = BlendDraft::new();
        assert!(draft.add_component(&entry("af", "mint", 2)));
        assert!(!draft.add_component(&entry("af", "mint", 2)));
        assert_eq!(draft.components().len(), 1);
    }

    #[test]
    fn add_at_full_total_is_a_noop() {
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("af", "mint", 2));
        draft.set_percent(&SourceId::new("af", "mint"), 100.0);
        assert!(!draft.add_component(&entry("af", "grape", 2)));
        assert_eq!(draft.components().len(), 1);
    }

    #[test]
    fn set_percent_clamps_to_remaining() {
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("af", "mint", 2));
        draft.add_component(&entry("af", "grape", 2));
        // mint 20, grape 20 -> mint can take at most 80
        let applied = draft.set_percent(&SourceId::new("af", "mint"), 95.0);
        assert_eq!(applied, Some(80));
        assert_eq!(draft.total_percent(), 100);
    }

    #[test]
    fn remove_does_not_renormalize() {
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("af", "mint", 2));
        draft.add_component(&entry("af", "grape", 2));
        draft.remove_component(&SourceId::new("af", "mint"));
        assert_eq!(draft.components().len(), 1);
        assert_eq!(draft.components()[0].percent, 20);
    }

    #[test]
    fn finalize_requires_full_allocation() {
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("af", "mint", 2));
        let err = draft
            .finalize("Minty", None, &ModerationList::default())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidAllocation(_)));
    }

    #[test]
    fn finalize_computes_average_and_defaults_author() {
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("mh", "raspberry", 3));
        draft.set_percent(&SourceId::new("mh", "raspberry"), 60.0);
        draft.add_component(&entry("af", "mint", 2));
        draft.set_percent(&SourceId::new("af", "mint"), 40.0);

        let blend = draft
            .finalize("Forest Berries", None, &ModerationList::default())
            .unwrap();
        // round((60*3 + 40*2) / 100) = round(2.6) = 3
        assert_eq!(blend.average_intensity, 3);
        assert_eq!(blend.author, GUEST_AUTHOR);
    }

    #[test]
    fn finalize_rejects_moderated_title() {
        let moderation = ModerationList::from_words(["candy"]);
        let mut draft = BlendDraft::new();
        draft.add_component(&entry("af", "mint", 2));
        draft.set_percent(&SourceId::new("af", "mint"), 100.0);
        let err = draft.finalize("Sweet Candy", None, &moderation).unwrap_err();
        match err {
            AppError::ModerationRejected { word } => assert_eq!(word, "candy"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validate_composition_rejects_duplicates() {
        let components = vec![
            component("af", "mint", 2, 50),
            component("af", "mint", 2, 50),
        ];
        assert!(matches!(
            validate_composition(&components),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_composition_accepts_exact_hundred() {
        let components = vec![
            component("af", "mint", 2, 60),
            component("af", "grape", 2, 40),
        ];
        assert!(validate_composition(&components).is_ok());
    }
}
