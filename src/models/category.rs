//! Canonical business category taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the fixed set of categories every stored business belongs to.
///
/// Source-native labels never leak past the categorization engine; anything
/// that cannot be mapped lands in [`Category::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Food & Drink")]
    FoodAndDrink,
    #[serde(rename = "Retail")]
    Retail,
    #[serde(rename = "Health & Beauty")]
    HealthAndBeauty,
    #[serde(rename = "Professional Services")]
    ProfessionalServices,
    #[serde(rename = "Home & Garden")]
    HomeAndGarden,
    #[serde(rename = "Automotive")]
    Automotive,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Technology")]
    Technology,
    #[serde(rename = "Property")]
    Property,
    #[serde(rename = "Sports & Fitness")]
    SportsAndFitness,
    #[serde(rename = "Charity & Community")]
    CharityAndCommunity,
    #[serde(rename = "Transport")]
    Transport,
    #[serde(rename = "Accommodation")]
    Accommodation,
}

impl Category {
    /// Fallback bucket for anything unmapped.
    pub const DEFAULT: Category = Category::ProfessionalServices;

    /// Every category, in display order.
    pub const ALL: [Category; 14] = [
        Category::FoodAndDrink,
        Category::Retail,
        Category::HealthAndBeauty,
        Category::ProfessionalServices,
        Category::HomeAndGarden,
        Category::Automotive,
        Category::Entertainment,
        Category::Education,
        Category::Technology,
        Category::Property,
        Category::SportsAndFitness,
        Category::CharityAndCommunity,
        Category::Transport,
        Category::Accommodation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodAndDrink => "Food & Drink",
            Self::Retail => "Retail",
            Self::HealthAndBeauty => "Health & Beauty",
            Self::ProfessionalServices => "Professional Services",
            Self::HomeAndGarden => "Home & Garden",
            Self::Automotive => "Automotive",
            Self::Entertainment => "Entertainment",
            Self::Education => "Education",
            Self::Technology => "Technology",
            Self::Property => "Property",
            Self::SportsAndFitness => "Sports & Fitness",
            Self::CharityAndCommunity => "Charity & Community",
            Self::Transport => "Transport",
            Self::Accommodation => "Accommodation",
        }
    }

    /// Match a canonical display name, ignoring case and surrounding space.
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_round_trips_every_category() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.as_str()), Some(category));
        }
    }

    #[test]
    fn from_name_ignores_case() {
        assert_eq!(
            Category::from_name("  food & drink "),
            Some(Category::FoodAndDrink)
        );
        assert_eq!(Category::from_name("Bakeries"), None);
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&Category::HealthAndBeauty).unwrap();
        assert_eq!(json, "\"Health & Beauty\"");
    }
}
