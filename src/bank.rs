//! Question bank: the static registry of chaser characters and their question pools.
//!
//! The bank is loaded once at startup (bundled JSON or a file on disk) and is
//! read-only afterwards, except for [`QuestionBank::register`] which appends a
//! new character under the same single-writer lock as everything else.

use crate::types::{
    Character, CharacterId, CharacterSummary, Question, QuestionId, MAX_OPTIONS, MIN_OPTIONS,
};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Question data shipped with the binary
const BUNDLED_CHARACTERS: &str = include_str!("../data/characters.json");

/// Errors raised while loading or validating question content
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("Unknown character: {0}")]
    UnknownCharacter(CharacterId),

    #[error("Character {0} has no questions")]
    EmptyPool(CharacterId),

    #[error("Character {0} is missing required field '{1}'")]
    MissingField(CharacterId, &'static str),

    #[error("Character {character} has duplicate question id {id}")]
    DuplicateQuestionId { character: CharacterId, id: QuestionId },

    #[error("Question id {id} is used by both {first} and {second}")]
    DuplicateGlobalId {
        id: QuestionId,
        first: CharacterId,
        second: CharacterId,
    },

    #[error("Question {id} of {character} has correct index {index} but {options} options")]
    InvalidAnswerIndex {
        character: CharacterId,
        id: QuestionId,
        index: usize,
        options: usize,
    },

    #[error("Question {id} of {character} has {count} options (expected 3-4)")]
    InvalidOptionCount {
        character: CharacterId,
        id: QuestionId,
        count: usize,
    },

    #[error("Character {0} already exists")]
    DuplicateCharacter(CharacterId),

    #[error("Failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse question data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk layout of the question data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BankFile {
    characters: Vec<Character>,
}

/// Summary returned by a successful full validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub characters: usize,
    pub questions: usize,
}

/// Registry of characters, in load order
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    characters: Vec<Character>,
}

impl QuestionBank {
    pub fn new(characters: Vec<Character>) -> Self {
        Self { characters }
    }

    /// The question data compiled into the binary
    pub fn bundled() -> Result<Self, BankError> {
        Self::from_json(BUNDLED_CHARACTERS)
    }

    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let file: BankFile = serde_json::from_str(json)?;
        Ok(Self::new(file.characters))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Look up a character. Unknown ids yield `None`.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    /// Question pool for a character. Unknown ids yield an empty slice.
    pub fn questions_for(&self, id: &str) -> &[Question] {
        self.character(id)
            .map(|c| c.questions.as_slice())
            .unwrap_or(&[])
    }

    pub fn list(&self) -> Vec<CharacterSummary> {
        self.characters.iter().map(CharacterSummary::from).collect()
    }

    /// Check a single character's metadata and pool
    pub fn validate_character(character: &Character) -> Result<(), BankError> {
        if character.id.trim().is_empty() {
            return Err(BankError::MissingField(character.id.clone(), "id"));
        }
        if character.name.trim().is_empty() {
            return Err(BankError::MissingField(character.id.clone(), "name"));
        }
        if character.questions.is_empty() {
            return Err(BankError::EmptyPool(character.id.clone()));
        }

        let mut seen = HashSet::new();
        for q in &character.questions {
            if !seen.insert(q.id) {
                return Err(BankError::DuplicateQuestionId {
                    character: character.id.clone(),
                    id: q.id,
                });
            }
            if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&q.options.len()) {
                return Err(BankError::InvalidOptionCount {
                    character: character.id.clone(),
                    id: q.id,
                    count: q.options.len(),
                });
            }
            if q.correct_index >= q.options.len() {
                return Err(BankError::InvalidAnswerIndex {
                    character: character.id.clone(),
                    id: q.id,
                    index: q.correct_index,
                    options: q.options.len(),
                });
            }
        }
        Ok(())
    }

    /// Validate every character and check question ids are unique across the registry
    pub fn validate_all(&self) -> Result<ValidationReport, BankError> {
        let mut owners: HashMap<QuestionId, &str> = HashMap::new();
        let mut seen_characters = HashSet::new();
        let mut questions = 0;

        for character in &self.characters {
            if !seen_characters.insert(character.id.as_str()) {
                return Err(BankError::DuplicateCharacter(character.id.clone()));
            }
            Self::validate_character(character)?;

            for q in &character.questions {
                if let Some(first) = owners.insert(q.id, &character.id) {
                    return Err(BankError::DuplicateGlobalId {
                        id: q.id,
                        first: first.to_string(),
                        second: character.id.clone(),
                    });
                }
                questions += 1;
            }
        }

        tracing::info!(
            "All {} questions have unique ids across {} characters",
            questions,
            self.characters.len()
        );

        Ok(ValidationReport {
            characters: self.characters.len(),
            questions,
        })
    }

    /// Add a character at runtime. The newcomer must be valid on its own and
    /// must not reuse a character id or any question id already in the bank.
    pub fn register(&mut self, character: Character) -> Result<(), BankError> {
        Self::validate_character(&character)?;

        if self.character(&character.id).is_some() {
            tracing::warn!("Character with id {} already exists", character.id);
            return Err(BankError::DuplicateCharacter(character.id));
        }

        for existing in &self.characters {
            if let Some(q) = character
                .questions
                .iter()
                .find(|q| existing.questions.iter().any(|e| e.id == q.id))
            {
                return Err(BankError::DuplicateGlobalId {
                    id: q.id,
                    first: existing.id.clone(),
                    second: character.id.clone(),
                });
            }
        }

        tracing::info!(
            "Registered character {} with {} questions",
            character.id,
            character.questions.len()
        );
        self.characters.push(character);
        Ok(())
    }

    /// Shuffled copy of a character's pool, truncated to `count` when given
    pub fn random_questions<R: Rng + ?Sized>(
        &self,
        id: &str,
        count: Option<usize>,
        rng: &mut R,
    ) -> Vec<Question> {
        let mut questions = self.questions_for(id).to_vec();
        questions.shuffle(rng);
        if let Some(count) = count {
            questions.truncate(count);
        }
        questions
    }
}
