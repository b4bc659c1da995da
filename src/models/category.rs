// src/models/category.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Aptitude test category. Stored as lowercase TEXT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Quant,
    Logical,
    Verbal,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Quant => "quant",
            Category::Logical => "logical",
            Category::Verbal => "verbal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quant" => Ok(Category::Quant),
            "logical" => Ok(Category::Logical),
            "verbal" => Ok(Category::Verbal),
            other => Err(AppError::BadRequest(format!("Unknown category '{}'", other))),
        }
    }
}

/// Question difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(AppError::BadRequest(format!("Unknown difficulty '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("quant".parse::<Category>().unwrap(), Category::Quant);
        assert_eq!("verbal".parse::<Category>().unwrap(), Category::Verbal);
        assert!("Quant".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Logical).unwrap();
        assert_eq!(json, "\"logical\"");
        let back: Category = serde_json::from_str("\"quant\"").unwrap();
        assert_eq!(back, Category::Quant);
    }
}
