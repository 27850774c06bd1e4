// Category corpus: the closed set of waste categories.
//
// Each classifiable category carries a hand-authored reference description
// (embedded once at startup as the semantic anchor) and a keyword list (used
// for rule-based corroboration). `Unclassified` is the fallback label when
// neither signal produces anything and has no corpus entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Plastic,
    Organic,
    Paper,
    Glass,
    Metal,
    Electronic,
    Hazardous,
    Textile,
    Construction,
    Mixed,
    Unclassified,
}

impl WasteCategory {
    /// Every category that has a reference description, in tie-break order.
    pub const CLASSIFIABLE: [WasteCategory; 10] = [
        WasteCategory::Plastic,
        WasteCategory::Organic,
        WasteCategory::Paper,
        WasteCategory::Glass,
        WasteCategory::Metal,
        WasteCategory::Electronic,
        WasteCategory::Hazardous,
        WasteCategory::Textile,
        WasteCategory::Construction,
        WasteCategory::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Plastic => "plastic",
            WasteCategory::Organic => "organic",
            WasteCategory::Paper => "paper",
            WasteCategory::Glass => "glass",
            WasteCategory::Metal => "metal",
            WasteCategory::Electronic => "electronic",
            WasteCategory::Hazardous => "hazardous",
            WasteCategory::Textile => "textile",
            WasteCategory::Construction => "construction",
            WasteCategory::Mixed => "mixed",
            WasteCategory::Unclassified => "unclassified",
        }
    }

    /// The canonical description embedded as this category's semantic anchor.
    pub fn reference_text(&self) -> &'static str {
        match self {
            WasteCategory::Plastic => "Plastic waste including bottles, bags, packaging, containers, wrappers, polythene, polyethylene, PET bottles, HDPE containers, PVC materials, straws, cups, lids, plastic film, and synthetic polymers",
            WasteCategory::Organic => "Organic and biodegradable waste including food scraps, kitchen waste, vegetables, fruits, compostable materials, garden waste, plant matter, banana peels, apple cores, leftovers, spoiled food, rotten produce, and natural biodegradable matter",
            WasteCategory::Paper => "Paper and cardboard waste including newspapers, magazines, cardboard boxes, cartons, tissue paper, documents, books, notebooks, envelopes, and paper packaging materials",
            WasteCategory::Glass => "Glass waste including bottles, jars, broken glass, window glass, mirrors, wine bottles, beer bottles, glassware, and glass containers",
            WasteCategory::Metal => "Metal waste including cans, aluminum, steel, tin, iron, copper, metal foil, wire, scrap metal, batteries with metal components, and metallic materials",
            WasteCategory::Electronic => "Electronic waste and e-waste including computers, phones, mobile devices, laptops, televisions, monitors, cables, chargers, batteries, appliances, electronic devices, and gadgets",
            WasteCategory::Hazardous => "Hazardous and toxic waste including chemicals, toxic substances, paint, oil, solvents, batteries, pesticides, medicines, pharmaceuticals, dangerous materials, flammable substances, and corrosive materials",
            WasteCategory::Textile => "Textile and fabric waste including clothing, fabric scraps, cloth, clothes, shirts, pants, dresses, shoes, leather items, and rags",
            WasteCategory::Construction => "Construction and demolition waste including concrete, bricks, wood, debris, rubble, tiles, drywall, lumber, and building materials",
            WasteCategory::Mixed => "Mixed and general waste including household waste, municipal waste, various types of waste, assorted waste materials, multiple waste types, and diverse waste materials",
            WasteCategory::Unclassified => "",
        }
    }

    /// Lower-case keywords matched as substrings of the lower-cased text.
    /// Multi-word keywords count once per word when matched.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            WasteCategory::Plastic => &[
                "plastic", "bottle", "bag", "packaging", "container", "wrapper", "polythene",
                "polyethylene", "pet", "hdpe", "pvc", "straw", "cup", "lid", "film",
            ],
            WasteCategory::Organic => &[
                "food", "organic", "kitchen", "vegetable", "fruit", "compost", "biodegradable",
                "garden", "plant", "waste", "banana", "apple", "leftover", "spoiled", "rotten",
            ],
            WasteCategory::Paper => &[
                "paper", "cardboard", "newspaper", "magazine", "box", "carton", "tissue",
                "document", "book", "notebook", "envelope",
            ],
            WasteCategory::Glass => &[
                "glass", "bottle", "jar", "window", "broken glass", "mirror", "wine bottle",
                "beer bottle", "glassware",
            ],
            WasteCategory::Metal => &[
                "metal", "can", "aluminum", "steel", "tin", "iron", "copper", "foil", "wire",
                "scrap metal", "battery",
            ],
            WasteCategory::Electronic => &[
                "electronic", "e-waste", "computer", "phone", "mobile", "laptop", "television",
                "tv", "monitor", "cable", "charger", "battery", "appliance", "device", "gadget",
            ],
            WasteCategory::Hazardous => &[
                "chemical", "hazardous", "toxic", "paint", "oil", "solvent", "battery",
                "pesticide", "medicine", "pharmaceutical", "dangerous", "flammable", "corrosive",
            ],
            WasteCategory::Textile => &[
                "clothing", "fabric", "textile", "cloth", "clothes", "shirt", "pants", "dress",
                "shoes", "leather", "rag",
            ],
            WasteCategory::Construction => &[
                "construction", "demolition", "concrete", "brick", "wood", "debris", "rubble",
                "tile", "drywall", "lumber",
            ],
            WasteCategory::Mixed => &[
                "mixed", "general", "household", "municipal", "various", "assorted", "multiple",
                "diverse",
            ],
            WasteCategory::Unclassified => &[],
        }
    }

    /// Title-case name for prose ("Plastic").
    pub fn title(&self) -> String {
        title_case(self.as_str())
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WasteCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        WasteCategory::CLASSIFIABLE
            .iter()
            .chain(std::iter::once(&WasteCategory::Unclassified))
            .find(|c| c.as_str() == lower)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown waste category: {s}"))
    }
}

/// Upper-case the first character of a label.
pub fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
