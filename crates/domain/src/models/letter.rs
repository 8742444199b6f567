//! Birthday letter generation models and prompt building.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// How the guest knows the celebrant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Friend,
    Family,
    Colleague,
    Partner,
    #[default]
    Other,
}

impl Relationship {
    pub fn context(&self) -> &'static str {
        match self {
            Relationship::Friend => "as a dear friend",
            Relationship::Family => "as a beloved family member",
            Relationship::Colleague => "as a valued colleague",
            Relationship::Partner => "as a loving partner",
            Relationship::Other => "as someone special",
        }
    }
}

/// Writing style of the letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterStyle {
    Formal,
    Casual,
    #[default]
    Heartfelt,
    Humorous,
    Poetic,
}

impl LetterStyle {
    pub fn instruction(&self) -> &'static str {
        match self {
            LetterStyle::Formal => {
                "Write in a formal, elegant style with proper etiquette and sophisticated language."
            }
            LetterStyle::Casual => "Write in a warm, casual, and friendly conversational style.",
            LetterStyle::Heartfelt => {
                "Write in a deeply emotional and heartfelt style that conveys genuine care and affection."
            }
            LetterStyle::Humorous => {
                "Write in a light-hearted, playful style with gentle humor and wit."
            }
            LetterStyle::Poetic => {
                "Write in a beautiful, poetic style with elegant metaphors and flowing language."
            }
        }
    }
}

/// Request to generate a birthday letter.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct GenerateLetterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Celebrant name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub celebrant_name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Guest name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub guest_name: String,

    #[serde(default)]
    pub relationship: Relationship,

    #[serde(default)]
    #[validate(length(max = 100, message = "Tone must be at most 100 characters"))]
    pub tone: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 gift items"))]
    pub gift_items: Vec<String>,

    #[validate(length(max = 1000, message = "Personal note must be at most 1000 characters"))]
    pub personal_note: Option<String>,

    #[serde(default)]
    pub style: LetterStyle,
}

impl GenerateLetterRequest {
    fn gift_description(&self) -> String {
        let titles: Vec<&str> = self
            .gift_items
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        if titles.is_empty() {
            "I've selected a special gift for you".to_string()
        } else {
            format!("I've chosen {} for you", titles.join(" and "))
        }
    }

    /// Builds the generation prompt.
    pub fn build_prompt(&self) -> String {
        let celebrant = self.celebrant_name.trim();
        let guest = self.guest_name.trim();
        let tone = self.tone.trim();

        let mut prompt = format!(
            "Write a personalized birthday letter for {celebrant} from {guest}.\n\n\
             Context:\n\
             - Relationship: {guest} knows {celebrant} {relationship}\n\
             - Writing style: {style}\n\
             - Tone: {tone}\n\
             - Gift context: {gifts}\n",
            relationship = self.relationship.context(),
            style = self.style.instruction(),
            gifts = self.gift_description(),
        );

        if let Some(note) = self.personal_note.as_deref().map(str::trim) {
            if !note.is_empty() {
                prompt.push_str(&format!("- Personal note to include: \"{}\"\n", note));
            }
        }

        prompt.push_str(
            "\nRequirements:\n\
             - Write a complete birthday letter (not just a card message)\n\
             - Include warm birthday wishes and celebration of their special day\n\
             - Mention the gift naturally within the letter\n\
             - Make it feel personal and genuine\n\
             - Length: 150-250 words\n\
             - Format as a proper letter with greeting and closing\n",
        );
        if self.style == LetterStyle::Poetic {
            prompt.push_str("- Include some beautiful imagery or metaphors\n");
        }
        if tone.eq_ignore_ascii_case("humorous") {
            prompt.push_str("- Include some gentle, appropriate humor\n");
        }
        prompt.push_str(
            "- End with a warm closing appropriate to the relationship\n\n\
             Do not include placeholder text or brackets. Write a complete, ready-to-print letter.",
        );

        prompt
    }
}

/// Response with the generated letter.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateLetterResponse {
    pub success: bool,
    pub letter: String,
}
