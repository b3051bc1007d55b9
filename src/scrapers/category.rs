//! Categorization engine.
//!
//! Maps source-native labels or free text onto the canonical [`Category`]
//! taxonomy. Every function here is pure: the same input always produces the
//! same category.

use tracing::debug;

use crate::models::Category;

/// Council directory headings and similar source-native labels.
const SOURCE_LABELS: &[(&str, Category)] = &[
    ("community", Category::CharityAndCommunity),
    ("retail", Category::Retail),
    ("food and drink", Category::FoodAndDrink),
    ("health and beauty", Category::HealthAndBeauty),
    ("business support", Category::ProfessionalServices),
    (
        "estate agents and chartered surveyors",
        Category::Property,
    ),
    ("education", Category::Education),
    ("transport", Category::Transport),
    ("places of worship", Category::CharityAndCommunity),
    ("other services", Category::ProfessionalServices),
    ("places to stay", Category::Accommodation),
];

/// Ordered keyword sets; the first category with any hit wins.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::FoodAndDrink,
        &[
            "restaurant", "cafe", "pub", "bar", "takeaway", "food", "catering", "bakery",
            "coffee", "dining", "pizza", "chinese", "indian", "fish", "chips",
        ],
    ),
    (
        Category::Retail,
        &[
            "shop", "store", "boutique", "retail", "clothes", "fashion", "gifts", "florist",
            "newsagent", "supermarket", "pharmacy", "chemist",
        ],
    ),
    (
        Category::HealthAndBeauty,
        &[
            "salon", "spa", "beauty", "health", "dental", "medical", "pharmacy", "optician",
            "physiotherapy", "massage", "nails", "barber", "hairdresser",
        ],
    ),
    (
        Category::ProfessionalServices,
        &[
            "solicitor", "accountant", "lawyer", "consultant", "service", "agency",
            "financial", "insurance", "estate agent", "recruitment",
        ],
    ),
    (
        Category::HomeAndGarden,
        &[
            "garden", "home", "furniture", "diy", "cleaning", "maintenance", "decorating",
            "plumbing", "electrical", "landscaping",
        ],
    ),
    (
        Category::Automotive,
        &[
            "garage", "car", "auto", "motor", "vehicle", "repair", "mot", "tyres", "parts",
            "dealership",
        ],
    ),
    (
        Category::Technology,
        &[
            "computer", "tech", "digital", "web", "software", "it", "mobile", "repair",
            "development",
        ],
    ),
    (
        Category::Property,
        &[
            "estate", "property", "letting", "rent", "building", "construction", "surveyor",
            "architect",
        ],
    ),
    (
        Category::Education,
        &[
            "school", "college", "training", "tuition", "education", "nursery", "childcare",
        ],
    ),
    (
        Category::SportsAndFitness,
        &[
            "gym", "fitness", "sport", "football", "rugby", "tennis", "swimming",
            "martial arts",
        ],
    ),
    (
        Category::Entertainment,
        &["cinema", "theatre", "bowling", "nightclub", "entertainment", "escape room"],
    ),
    (
        Category::CharityAndCommunity,
        &["charity", "church", "community", "volunteer", "foundation"],
    ),
    (
        Category::Transport,
        &["taxi", "coach hire", "courier", "removals", "logistics", "transport"],
    ),
    (
        Category::Accommodation,
        &["hotel", "guest house", "bed and breakfast", "accommodation"],
    ),
];

/// Geo-places `types` values.
const PLACE_TYPES: &[(&str, Category)] = &[
    ("restaurant", Category::FoodAndDrink),
    ("food", Category::FoodAndDrink),
    ("meal_takeaway", Category::FoodAndDrink),
    ("cafe", Category::FoodAndDrink),
    ("bar", Category::FoodAndDrink),
    ("bakery", Category::FoodAndDrink),
    ("store", Category::Retail),
    ("clothing_store", Category::Retail),
    ("shoe_store", Category::Retail),
    ("florist", Category::Retail),
    ("health", Category::HealthAndBeauty),
    ("beauty_salon", Category::HealthAndBeauty),
    ("hair_care", Category::HealthAndBeauty),
    ("dentist", Category::HealthAndBeauty),
    ("pharmacy", Category::HealthAndBeauty),
    ("lawyer", Category::ProfessionalServices),
    ("accounting", Category::ProfessionalServices),
    ("insurance_agency", Category::ProfessionalServices),
    ("real_estate_agency", Category::Property),
    ("car_dealer", Category::Automotive),
    ("car_repair", Category::Automotive),
    ("gas_station", Category::Automotive),
    ("electronics_store", Category::Technology),
    ("gym", Category::SportsAndFitness),
    ("school", Category::Education),
    ("movie_theater", Category::Entertainment),
    ("church", Category::CharityAndCommunity),
    ("taxi_stand", Category::Transport),
    ("lodging", Category::Accommodation),
];

/// Map a source-native label to a category.
///
/// Canonical names map to themselves; known directory headings go through
/// the label table. Returns `None` for anything else.
pub fn map_source_label(label: &str) -> Option<Category> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    if let Some(category) = Category::from_name(label) {
        return Some(category);
    }

    let normalized = label.to_lowercase().replace(" & ", " and ");
    SOURCE_LABELS
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, category)| *category)
}

/// Infer a category from free text, falling back to [`Category::DEFAULT`].
pub fn infer_from_text(text: &str) -> Category {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_keyword(&lower, k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::DEFAULT)
}

/// Explicit label first, keyword inference over `text` second.
pub fn categorize(label: Option<&str>, text: &str) -> Category {
    if let Some(label) = label {
        if let Some(category) = map_source_label(label) {
            return category;
        }
        debug!("Unmapped category label '{}', inferring from text", label);
    }
    infer_from_text(text)
}

/// Map geo-places type strings; the first known type wins.
pub fn map_place_types<S: AsRef<str>>(types: &[S]) -> Category {
    types
        .iter()
        .find_map(|t| {
            PLACE_TYPES
                .iter()
                .find(|(known, _)| *known == t.as_ref())
                .map(|(_, category)| *category)
        })
        .unwrap_or(Category::DEFAULT)
}

/// Keyword hit anywhere in the text.
///
/// Keywords of three letters or fewer must be whole words (allowing a
/// plural "s"), so "it" does not fire on "fitness" and "car" not on "cards".
/// Longer keywords match inside compounds such as "seafood" or "petstore".
fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.chars().count() > 3 {
        return text.contains(keyword);
    }
    text.match_indices(keyword).any(|(idx, _)| {
        let starts_word = text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let rest = &text[idx + keyword.len()..];
        let rest = rest.strip_prefix('s').unwrap_or(rest);
        starts_word && rest.chars().next().is_none_or(|c| !c.is_alphanumeric())
    })
}
