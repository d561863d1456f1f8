use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Splits identifiers on lower/upper case boundaries (`getPetById` -> `get Pet By Id`)
static CASE_BOUNDARY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("Invalid regex pattern"));

/// Anything that is not a letter or digit separates words
static SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("Invalid regex pattern"));

/// Tool-name formatting presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameFormat {
    Lower,
    Upper,
    Snake,
    Camel,
}

impl NameFormat {
    /// Apply the preset to an operation identifier
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameFormat::Lower => name.to_lowercase(),
            NameFormat::Upper => name.to_uppercase(),
            NameFormat::Snake => to_snake_case(name),
            NameFormat::Camel => to_camel_case(name),
        }
    }
}

impl FromStr for NameFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower" => Ok(NameFormat::Lower),
            "upper" => Ok(NameFormat::Upper),
            "snake" => Ok(NameFormat::Snake),
            "camel" => Ok(NameFormat::Camel),
            other => Err(format!(
                "Unknown tool name format '{}': expected lower, upper, snake or camel",
                other
            )),
        }
    }
}

impl fmt::Display for NameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NameFormat::Lower => "lower",
            NameFormat::Upper => "upper",
            NameFormat::Snake => "snake",
            NameFormat::Camel => "camel",
        };
        f.write_str(s)
    }
}

fn split_words(name: &str) -> Vec<String> {
    let spaced = CASE_BOUNDARY_REGEX.replace_all(name, "$1 $2");
    SEPARATOR_REGEX
        .split(&spaced)
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `getPetById` / `get-pet-by-id` -> `get_pet_by_id`
pub fn to_snake_case(name: &str) -> String {
    split_words(name).join("_")
}

/// `get_pet_by_id` / `Get Pet` -> `getPetById` / `getPet`
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, word) in split_words(name).iter().enumerate() {
        if i == 0 {
            out.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(NameFormat::Lower.apply("getPetById"), "getpetbyid");
        assert_eq!(NameFormat::Upper.apply("getPetById"), "GETPETBYID");
        assert_eq!(NameFormat::Snake.apply("getPetById"), "get_pet_by_id");
        assert_eq!(NameFormat::Camel.apply("get_pet_by_id"), "getPetById");
    }

    #[test]
    fn test_snake_case_separators() {
        assert_eq!(to_snake_case("list-all.pets"), "list_all_pets");
        assert_eq!(to_snake_case("v2GetItems"), "v2_get_items");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_camel_case_words() {
        assert_eq!(to_camel_case("Create User"), "createUser");
        assert_eq!(to_camel_case("listPets"), "listPets");
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("Snake".parse::<NameFormat>().unwrap(), NameFormat::Snake);
        assert!("kebab".parse::<NameFormat>().is_err());
    }
}
