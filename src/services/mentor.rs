// ABOUTME: Keyword-scoring FAQ matcher and chat-turn handler for the startup mentor bot
// ABOUTME: Canned replies are drawn through an injected seedable RNG for deterministic tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Mentor Chatbot
//!
//! Every message is first classified as a greeting or goodbye. Anything else is
//! scored against the active FAQ entries:
//!
//! - `+3.0` for each entry keyword found as a substring of the normalized message
//! - `+1.0` for each distinct word shared with the normalized question
//! - `+0.5 * priority`
//!
//! The highest score above `2.0` wins; ties keep the entry seen first, with
//! entries visited by descending priority then question text.

use crate::auth::AuthenticatedUser;
use crate::constants::limits::{MAX_CHAT_MESSAGE_LENGTH, MAX_SESSION_ID_LENGTH};
use crate::constants::matching::{KEYWORD_WEIGHT, MATCH_THRESHOLD, PRIORITY_WEIGHT};
use crate::database::{ChatHistoryEntry, ChatManager, FaqRecord};
use crate::errors::{AppError, AppResult};
use crate::models::{FaqCategory, Intent, ResponseType, SessionRole};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{LazyLock, Mutex, PoisonError};
use tracing::{debug, info};
use uuid::Uuid;

const GREETINGS: &[&str] = &[
    "Hello! I'm your AI Mentor. I'm here to guide you on your startup journey! 🚀 What would you like to know?",
    "Welcome, future entrepreneur! 👋 I'm here to help you with startup advice, funding tips, and platform guidance.",
    "Hi there! As your mentor, I'm excited to help you build your startup. What's on your mind today?",
];

const FALLBACKS: &[&str] = &[
    "That's an interesting question! While I specialize in startup guidance, I might not have the perfect answer. Could you try asking about funding, team building, or product development?",
    "I'm still learning! 📚 Could you rephrase that or ask about startup basics, marketing, or how to use our platform?",
    "Great question! I focus on startup mentoring. Try asking about business models, finding co-founders, or getting your first customers.",
];

const GOODBYES: &[&str] = &[
    "Best of luck with your startup journey! 🌟 Remember, every great company started with an idea. Keep pushing forward!",
    "Take care, and remember - persistence is key in entrepreneurship! Come back anytime for more guidance. 💪",
    "Goodbye for now! Keep that entrepreneurial spirit alive, and don't hesitate to reach out when you need mentoring. 🚀",
];

const ENCOURAGEMENTS: &[&str] = &[
    "\n\n💡 Pro tip: Start small and iterate based on user feedback!",
    "\n\n🚀 Remember: Every expert was once a beginner. Keep learning!",
    "\n\n⭐ You're asking the right questions - that's entrepreneurial thinking!",
];

const STARTUP_BASICS_SUGGESTIONS: &[&str] = &[
    "How do I validate my startup idea?",
    "What makes a good business model?",
    "How do I know if there's market demand?",
];

const FUNDING_SUGGESTIONS: &[&str] = &[
    "How do I raise seed funding?",
    "What do investors look for?",
    "How much equity should I give up?",
];

const TEAM_BUILDING_SUGGESTIONS: &[&str] = &[
    "How do I find a co-founder?",
    "What skills should my team have?",
    "How do I hire the right people?",
];

const PRODUCT_DEVELOPMENT_SUGGESTIONS: &[&str] = &[
    "How do I build an MVP?",
    "What features should I build first?",
    "How do I get user feedback?",
];

const GENERAL_SUGGESTIONS: &[&str] = &[
    "How do I get started with my startup?",
    "What's the biggest mistake new entrepreneurs make?",
    "How do I stay motivated?",
    "Tell me about startup funding",
    "How do I build a team?",
];

/// Categories advertised by the suggestions endpoint
pub const SUGGESTED_CATEGORIES: [FaqCategory; 6] = [
    FaqCategory::StartupBasics,
    FaqCategory::Funding,
    FaqCategory::TeamBuilding,
    FaqCategory::ProductDevelopment,
    FaqCategory::Marketing,
    FaqCategory::General,
];

static GREETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(hi|hello|hey|greetings|good\s*(morning|afternoon|evening))\b",
        r"(?i)\b(start|begin|help|mentor)\b",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

static GOODBYE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)\b(bye|goodbye|see\s*you|thanks|thank\s*you|exit|quit)\b"]
        .into_iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// Lowercase, drop everything except word characters and whitespace, then trim
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Detect greetings and goodbyes; greetings win when both match
#[must_use]
pub fn classify_intent(message: &str) -> Intent {
    let normalized = normalize(message);
    if GREETING_PATTERNS.iter().any(|re| re.is_match(&normalized)) {
        Intent::Greeting
    } else if GOODBYE_PATTERNS.iter().any(|re| re.is_match(&normalized)) {
        Intent::Goodbye
    } else {
        Intent::None
    }
}

/// Relevance of an FAQ entry to a message
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(message: &str, faq: &FaqRecord) -> f64 {
    let normalized_message = normalize(message);

    let keyword_hits = faq
        .keywords
        .iter()
        .filter(|keyword| normalized_message.contains(keyword.as_str()))
        .count();

    let normalized_question = normalize(&faq.question);
    let question_words: HashSet<&str> = normalized_question.split_whitespace().collect();
    let message_words: HashSet<&str> = normalized_message.split_whitespace().collect();
    let common_words = question_words.intersection(&message_words).count();

    (keyword_hits as f64).mul_add(
        KEYWORD_WEIGHT,
        (faq.priority as f64).mul_add(PRIORITY_WEIGHT, common_words as f64),
    )
}

/// Best-scoring active entry strictly above the match threshold
#[must_use]
pub fn find_best_match<'a>(message: &str, faqs: &'a [FaqRecord]) -> Option<&'a FaqRecord> {
    let mut candidates: Vec<&FaqRecord> = faqs.iter().filter(|faq| faq.is_active).collect();
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.question.cmp(&b.question))
    });

    let mut best = None;
    let mut highest = 0.0;
    for faq in candidates {
        let faq_score = score(message, faq);
        debug!(faq_id = %faq.id, score = faq_score, "Scored FAQ entry");
        if faq_score > highest && faq_score > MATCH_THRESHOLD {
            highest = faq_score;
            best = Some(faq);
        }
    }
    best
}

/// Follow-up questions for a category, falling back to the general list
#[must_use]
pub const fn suggestions(category: Option<FaqCategory>) -> &'static [&'static str] {
    match category {
        Some(FaqCategory::StartupBasics) => STARTUP_BASICS_SUGGESTIONS,
        Some(FaqCategory::Funding) => FUNDING_SUGGESTIONS,
        Some(FaqCategory::TeamBuilding) => TEAM_BUILDING_SUGGESTIONS,
        Some(FaqCategory::ProductDevelopment) => PRODUCT_DEVELOPMENT_SUGGESTIONS,
        _ => GENERAL_SUGGESTIONS,
    }
}

/// Reply chosen for a message before it is stored
#[derive(Debug, Clone)]
pub struct GeneratedResponse {
    /// Reply text
    pub response: String,
    /// How the reply was produced
    pub response_type: ResponseType,
    /// Follow-up questions
    pub suggestions: Vec<&'static str>,
    /// Topic of the reply, absent for goodbyes
    pub category: Option<FaqCategory>,
    /// Entry whose answer was used
    pub matched_faq: Option<FaqRecord>,
}

/// Result of one chat turn as returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnResponse {
    /// Reply text, including any encouragement suffix
    pub response: String,
    /// Session the turn was stored under
    pub session_id: String,
    /// How the reply was produced
    pub response_type: ResponseType,
    /// Follow-up questions
    pub suggestions: Vec<&'static str>,
    /// Topic of the reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FaqCategory>,
}

/// Static suggestion payload for clients opening the chat
#[derive(Debug, Clone, Serialize)]
pub struct MentorSuggestions {
    /// General follow-up questions
    pub suggestions: &'static [&'static str],
    /// Advertised categories
    pub categories: [FaqCategory; 6],
}

/// Suggestion payload shown before the first message
#[must_use]
pub const fn mentor_suggestions() -> MentorSuggestions {
    MentorSuggestions {
        suggestions: GENERAL_SUGGESTIONS,
        categories: SUGGESTED_CATEGORIES,
    }
}

/// Stored messages of a session in order; empty when the session is unknown
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn get_chat_history(
    chat: &ChatManager,
    session_id: &str,
) -> AppResult<Vec<ChatHistoryEntry>> {
    chat.history(session_id).await
}

fn validate_turn(message: &str, session_id: Option<&str>) -> AppResult<()> {
    if message.trim().is_empty() {
        return Err(AppError::missing_field("message", "Message cannot be empty."));
    }
    if message.chars().count() > MAX_CHAT_MESSAGE_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Message cannot exceed {MAX_CHAT_MESSAGE_LENGTH} characters."
        )));
    }
    if let Some(session_id) = session_id {
        if session_id.trim().is_empty() || session_id.chars().count() > MAX_SESSION_ID_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Session ID must be between 1 and {MAX_SESSION_ID_LENGTH} characters."
            )));
        }
    }
    Ok(())
}

/// Mentor chatbot with its source of randomness
pub struct MentorChatbot {
    rng: Mutex<StdRng>,
}

impl Default for MentorChatbot {
    fn default() -> Self {
        Self::new()
    }
}

impl MentorChatbot {
    /// Chatbot seeded from system entropy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Chatbot with a fixed seed; the same seed yields the same replies
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick(&self, pool: &'static [&'static str]) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.choose(&mut *rng).copied().unwrap_or_default()
    }

    /// Choose a reply for a message given the current FAQ entries
    #[must_use]
    pub fn generate_response(&self, message: &str, faqs: &[FaqRecord]) -> GeneratedResponse {
        match classify_intent(message) {
            Intent::Greeting => GeneratedResponse {
                response: self.pick(GREETINGS).to_owned(),
                response_type: ResponseType::Greeting,
                suggestions: suggestions(None).to_vec(),
                category: Some(FaqCategory::General),
                matched_faq: None,
            },
            Intent::Goodbye => GeneratedResponse {
                response: self.pick(GOODBYES).to_owned(),
                response_type: ResponseType::Goodbye,
                suggestions: Vec::new(),
                category: None,
                matched_faq: None,
            },
            Intent::None => match find_best_match(message, faqs) {
                Some(faq) => GeneratedResponse {
                    response: faq.answer.clone(),
                    response_type: ResponseType::FaqMatch,
                    suggestions: suggestions(Some(faq.category)).to_vec(),
                    category: Some(faq.category),
                    matched_faq: Some(faq.clone()),
                },
                None => GeneratedResponse {
                    response: self.pick(FALLBACKS).to_owned(),
                    response_type: ResponseType::Fallback,
                    suggestions: suggestions(None).to_vec(),
                    category: Some(FaqCategory::General),
                    matched_faq: None,
                },
            },
        }
    }

    /// Handle one user message: validate, reply, store, and decorate
    ///
    /// Student sessions get an encouragement suffix on the returned text only;
    /// the stored reply never includes it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or oversized message or session
    /// identifier, and a database error if storage fails
    pub async fn process_chat_turn(
        &self,
        chat: &ChatManager,
        message: &str,
        session_id: Option<&str>,
        identity: Option<&AuthenticatedUser>,
    ) -> AppResult<ChatTurnResponse> {
        validate_turn(message, session_id)?;

        let session_id = session_id.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);
        let role = SessionRole::for_user(identity.map(|user| user.role));
        let session = chat
            .get_or_create_session(
                &session_id,
                identity.map(|user| user.user_id.as_str()),
                role,
            )
            .await?;

        let faqs = chat.active_faqs().await?;
        let generated = self.generate_response(message, &faqs);

        chat.record_message(
            &session,
            message,
            &generated.response,
            generated.response_type,
            generated.matched_faq.as_ref().map(|faq| faq.id.as_str()),
        )
        .await?;

        info!(
            session_id = %session.session_id,
            response_type = %generated.response_type,
            "Chat turn processed"
        );

        let mut response = generated.response;
        if session.user_role.receives_encouragement() {
            response.push_str(self.pick(ENCOURAGEMENTS));
        }

        Ok(ChatTurnResponse {
            response,
            session_id: session.session_id,
            response_type: generated.response_type,
            suggestions: generated.suggestions,
            category: generated.category,
        })
    }
}
