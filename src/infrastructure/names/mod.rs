//! Default display names built from adjective and animal word lists

use rand::seq::SliceRandom;
use std::path::Path;

use crate::application::errors::ConfigError;

/// Generates `AdjectiveAnimal` names, e.g. `BraveOtter`
#[derive(Debug, Clone)]
pub struct NameGenerator {
    adjectives: Vec<String>,
    animals: Vec<String>,
}

impl NameGenerator {
    /// Load both lists from disk, one word per line
    pub fn load(adjective_path: impl AsRef<Path>, animal_path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let adjectives = read_words(adjective_path.as_ref())?;
        let animals = read_words(animal_path.as_ref())?;
        Self::from_words(adjectives, animals)
    }

    pub fn from_words<A, B>(adjectives: A, animals: B) -> Result<Self, ConfigError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        let adjectives = normalize(adjectives);
        let animals = normalize(animals);

        if adjectives.is_empty() {
            return Err(ConfigError::WordList("adjective list is empty".to_string()));
        }
        if animals.is_empty() {
            return Err(ConfigError::WordList("animal list is empty".to_string()));
        }

        tracing::debug!("Loaded {} adjectives and {} animals", adjectives.len(), animals.len());
        Ok(Self { adjectives, animals })
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        let adjective = self.adjectives.choose(&mut rng).map(String::as_str).unwrap_or_default();
        let animal = self.animals.choose(&mut rng).map(String::as_str).unwrap_or_default();
        format!("{}{}", adjective, animal)
    }

    pub fn adjectives(&self) -> &[String] {
        &self.adjectives
    }

    pub fn animals(&self) -> &[String] {
        &self.animals
    }
}

fn read_words(path: &Path) -> Result<Vec<String>, ConfigError> {
    std::fs::read_to_string(path)
        .map(|content| content.lines().map(str::to_string).collect())
        .map_err(|e| ConfigError::WordList(format!("Failed to read {}: {}", path.display(), e)))
}

/// Drop blank lines, remove whitespace and capitalize each word
fn normalize<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    words
        .into_iter()
        .map(|word| word.as_ref().split_whitespace().collect::<String>())
        .filter(|word| !word.is_empty())
        .map(|word| capitalize(&word))
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
