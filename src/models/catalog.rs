use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::blend::SourceId;

/// One flavor offered by a brand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    /// Inherent strength rating in [1,10]
    pub intensity: u8,
    /// Free-text comma-separated descriptors
    pub taste_tags: String,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
    pub flavors: Vec<Flavor>,
}

/// The read shape consumed by the blend builder: everything a draft needs
/// to copy into a `FlavorComponent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub source_id: SourceId,
    pub display_name: String,
    pub taste_tags: String,
    pub intensity: u8,
}

/// In-memory brand/flavor catalog.
///
/// Catalog persistence is out of scope; the process starts from the seed
/// set and admin inserts live for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    brands: Vec<Brand>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The starter catalog shipped with the app.
    pub fn seeded() -> Self {
        let brands = vec![
            Brand {
                id: "alfakher".to_string(),
                name: "Al Fakher".to_string(),
                hidden: false,
                flavors: vec![
                    flavor("mint", "Mint", 2, "fresh, minty"),
                    flavor("grape", "Grape", 2, "fruity, grape"),
                    flavor("double-apple", "Double Apple", 3, "anise, apple"),
                ],
            },
            Brand {
                id: "musthave".to_string(),
                name: "Must Have".to_string(),
                hidden: false,
                flavors: vec![
                    flavor("raspberry", "Raspberry", 3, "berry, tart"),
                    flavor("cheesecake", "Cheesecake", 4, "dessert, creamy"),
                    flavor("whiskey-cola", "Whiskey Cola", 5, "boozy, cola"),
                ],
            },
            Brand {
                id: "darkside".to_string(),
                name: "Darkside".to_string(),
                hidden: false,
                flavors: vec![
                    flavor("pear", "Pear", 5, "pear, juicy"),
                    flavor("cola", "Cola", 5, "caramel"),
                    flavor("spiced-rum", "Spiced Rum", 7, "spicy, boozy"),
                ],
            },
        ];
        Self { brands }
    }

    pub fn brands(&self) -> &[Brand] {
        &self.brands
    }

    /// Adds a brand with a slug id derived from its name.
    /// Empty names and duplicate ids are silently ignored.
    pub fn add_brand(&mut self, name: &str) -> Option<&Brand> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = slug(name);
        if id.is_empty() || self.brands.iter().any(|b| b.id == id) {
            return None;
        }
        self.brands.push(Brand {
            id,
            name: name.to_string(),
            hidden: false,
            flavors: Vec::new(),
        });
        self.brands.last()
    }

    /// Adds a flavor under an existing brand, clamping intensity into [1,10].
    /// A duplicate flavor id within the brand is a no-op.
    pub fn add_flavor(
        &mut self,
        brand_id: &str,
        name: &str,
        intensity: u8,
        taste_tags: &str,
    ) -> AppResult<()> {
        let brand = self
            .brands
            .iter_mut()
            .find(|b| b.id == brand_id)
            .ok_or_else(|| AppError::NotFound(format!("brand {brand_id} not found")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("flavor name must not be empty".to_string()));
        }
        let id = slug(name);
        if brand.flavors.iter().any(|f| f.id == id) {
            return Ok(());
        }
        brand.flavors.push(Flavor {
            id,
            name: name.to_string(),
            intensity: intensity.clamp(1, 10),
            taste_tags: taste_tags.trim().to_string(),
            hidden: false,
        });
        Ok(())
    }

    /// Lists visible flavors matching a free-text filter against the flavor
    /// name or its taste tags, case-insensitively. An empty filter matches
    /// everything.
    pub fn list_flavors(&self, filter: &str) -> Vec<CatalogEntry> {
        let filter = filter.trim().to_lowercase();
        self.brands
            .iter()
            .filter(|b| !b.hidden)
            .flat_map(|brand| {
                brand
                    .flavors
                    .iter()
                    .filter(|f| !f.hidden)
                    .filter(|f| {
                        filter.is_empty()
                            || f.name.to_lowercase().contains(&filter)
                            || f.taste_tags.to_lowercase().contains(&filter)
                    })
                    .map(|f| CatalogEntry {
                        source_id: SourceId::new(&brand.id, &f.id),
                        display_name: f.name.clone(),
                        taste_tags: f.taste_tags.clone(),
                        intensity: f.intensity,
                    })
            })
            .collect()
    }
}

fn flavor(id: &str, name: &str, intensity: u8, taste_tags: &str) -> Flavor {
    Flavor {
        id: id.to_string(),
        name: name.to_string(),
        intensity,
        taste_tags: taste_tags.to_string(),
        hidden: false,
    }
}

/// Lowercases, hyphenates whitespace, and strips everything that is not
/// alphanumeric or a hyphen.
pub fn slug(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}
