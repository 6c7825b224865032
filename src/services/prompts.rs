// src/services/prompts.rs

use crate::models::level::EducationLevel;

/// Fixed system instruction describing the quiz output contract.
pub fn quiz_system_prompt() -> &'static str {
    r#"You are a professional English teacher. Your task is to create a 20-question multiple-choice English competency test appropriate for the requested education level.

IMPORTANT: You MUST return valid JSON. DO NOT include markdown, explanations, or text outside the JSON structure.

Requirements:
1. Create exactly 20 multiple-choice questions.
2. Each question must have 4 options (A, B, C, D).
3. Questions must be appropriate for the requested level.
4. Categories should include: Grammar, Vocabulary, Reading Comprehension, and Life Skills/Common Expressions.
5. Provide a brief explanation for why the correct answer is right (in English).
6. Questions and options must be in English.
7. Difficulty should be consistent with the level.

Return JSON in the following format:
{
  "questions": [
    {
      "question": "Question content?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correctAnswer": 0,
      "explanation": "Explanation of why Option A is correct",
      "category": "Grammar"
    }
  ]
}

Notes:
- correctAnswer is the index (0, 1, 2, or 3) corresponding to the correct option in the options array.
- category must be one of: "Grammar", "Vocabulary", "Reading", "Communication"."#
}

/// Curriculum hint injected into the user prompt for each level.
///
/// The match is exhaustive over the closed `EducationLevel` enum, so a
/// newly added level fails to compile until it gets a hint here.
pub fn level_context(level: EducationLevel) -> &'static str {
    match level {
        EducationLevel::Kindergarten => {
            "Pre-school level: Basic colors, shapes, numbers 1-10, common animals, and greetings."
        }
        EducationLevel::Grade1 => {
            "Grade 1: Phonics, basic nouns/verbs, self-introduction, family members."
        }
        EducationLevel::Grade2 => {
            "Grade 2: Simple sentences, present continuous, basic prepositions, school items."
        }
        EducationLevel::Grade3 => {
            "Grade 3: Past simple (basic), comparative adjectives, hobbies, weather."
        }
        EducationLevel::Grade4 => {
            "Grade 4: Frequency adverbs, modal verbs (can/must), daily routines, jobs."
        }
        EducationLevel::Grade5 => {
            "Grade 5: Future tense, directions, health problems, superlatives."
        }
        EducationLevel::Grade6 => {
            "Grade 6: Pronouns, possessives, school subjects, neighborhood."
        }
        EducationLevel::Grade7 => {
            "Grade 7: Quantifiers, compound sentences, past simple (irregular), movies."
        }
        EducationLevel::Grade8 => {
            "Grade 8: Passive voice, reported speech (basic), festivities, technology."
        }
        EducationLevel::Grade9 => {
            "Grade 9: Relative clauses, conditional sentences type 1 & 2, environment."
        }
        EducationLevel::Grade10 => {
            "Grade 10: Tense review, gerunds/infinitives, eco-tourism, inventions."
        }
        EducationLevel::Grade11 => {
            "Grade 11: Perfect tenses, modal verbs in past, friendship, population."
        }
        EducationLevel::Grade12 => {
            "Grade 12: Advanced grammar, conditional sentences type 3, careers, globalization."
        }
        EducationLevel::University => {
            "University level: Academic English, complex sentence structures, IELTS/TOEFL topics, critical thinking."
        }
        EducationLevel::Toeic => {
            "TOEIC level: Business English, office situations, travel, banking, marketing, and formal emails."
        }
    }
}

/// Per-level user instruction.
pub fn quiz_user_prompt(level: EducationLevel) -> String {
    format!(
        r#"Generate 20 multiple-choice English questions for level: {level}

Level Context: {context}

Requirements:
- Questions must be appropriate for {level} level.
- Balanced distribution of Grammar, Vocabulary, and Reading categories.
- Ensure only ONE correct answer exists for each question.
- Explanations should be clear and concise in English.

Return exactly 20 questions in the specified JSON format."#,
        level = level.as_str(),
        context = level_context(level),
    )
}
