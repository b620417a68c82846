pub mod blend;
pub mod catalog;
pub mod moderation;

pub use blend::{
    validate_composition, Blend, BlendDraft, FlavorComponent, NewBlend, SourceId, GUEST_AUTHOR,
};
pub use catalog::{Brand, Catalog, CatalogEntry, Flavor};
pub use moderation::ModerationList;
