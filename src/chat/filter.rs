//! Keyword rules that answer or reject messages without calling the model.
//!
//! Text and keywords go through the same normalization: lower-cased,
//! split on anything that is not a letter or digit, apostrophes dropped and
//! simple plurals folded. Keywords then match whole words or whole phrases
//! only, so "look" never matches "ok" and "this" never matches "hi".

use serde::{Deserialize, Serialize};

use crate::core::config::{CannedReplies, TopicFilterConfig};

fn fold_plural(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Lower-cased, plural-folded word tokens of `text`.
pub fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.replace('\'', ""))
        .filter(|w| !w.is_empty())
        .map(|w| fold_plural(&w))
        .collect()
}

/// A list of keywords or multi-word phrases.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    phrases: Vec<Vec<String>>,
}

impl KeywordSet {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            phrases: keywords
                .iter()
                .map(|k| normalize(k))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Some phrase occurs as a contiguous run of whole tokens.
    pub fn occurs_in(&self, tokens: &[String]) -> bool {
        self.phrases.iter().any(|phrase| {
            tokens
                .windows(phrase.len())
                .any(|window| window == phrase.as_slice())
        })
    }

    /// The whole token stream equals one of the phrases.
    pub fn equals(&self, tokens: &[String]) -> bool {
        self.phrases.iter().any(|phrase| phrase.as_slice() == tokens)
    }

    /// The first token is a single-word keyword.
    pub fn starts(&self, tokens: &[String]) -> bool {
        match tokens.first() {
            Some(first) => self
                .phrases
                .iter()
                .any(|phrase| phrase.len() == 1 && &phrase[0] == first),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Greeting,
    Help,
    Goodbye,
    Polite,
    OffTopic,
    NoInformation,
    Answer,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedReply {
    pub kind: ReplyKind,
    pub text: String,
}

pub struct TopicFilter {
    fast_greetings: KeywordSet,
    help_triggers: KeywordSet,
    goodbye_triggers: KeywordSet,
    fast_non_pet: KeywordSet,
    greetings: KeywordSet,
    pet_keywords: KeywordSet,
    non_pet_keywords: KeywordSet,
    polite_phrases: KeywordSet,
    replies: CannedReplies,
}

impl TopicFilter {
    pub fn new(config: &TopicFilterConfig) -> Self {
        Self {
            fast_greetings: KeywordSet::new(&config.fast_greetings),
            help_triggers: KeywordSet::new(&config.help_triggers),
            goodbye_triggers: KeywordSet::new(&config.goodbye_triggers),
            fast_non_pet: KeywordSet::new(&config.fast_non_pet_keywords),
            greetings: KeywordSet::new(&config.greetings),
            pet_keywords: KeywordSet::new(&config.pet_keywords),
            non_pet_keywords: KeywordSet::new(&config.non_pet_keywords),
            polite_phrases: KeywordSet::new(&config.polite_phrases),
            replies: config.replies.clone(),
        }
    }

    pub fn replies(&self) -> &CannedReplies {
        &self.replies
    }

    /// Whether `answer` is one of the keyword-rule replies.
    pub fn is_canned(&self, answer: &str) -> bool {
        let r = &self.replies;
        let answer = answer.trim();
        [
            &r.fast_greeting,
            &r.greeting,
            &r.help,
            &r.goodbye,
            &r.polite,
            &r.off_topic,
        ]
        .iter()
        .any(|text| text.trim() == answer)
    }

    fn reply(kind: ReplyKind, text: &str) -> Option<CannedReply> {
        Some(CannedReply {
            kind,
            text: text.to_string(),
        })
    }

    /// Chat-level shortcuts applied to the raw user message, first match wins.
    pub fn fast_path(&self, input: &str) -> Option<CannedReply> {
        let tokens = normalize(input);

        if self.fast_greetings.starts(&tokens) {
            return Self::reply(ReplyKind::Greeting, &self.replies.fast_greeting);
        }
        if self.help_triggers.occurs_in(&tokens) {
            return Self::reply(ReplyKind::Help, &self.replies.help);
        }
        if self.goodbye_triggers.equals(&tokens) {
            return Self::reply(ReplyKind::Goodbye, &self.replies.goodbye);
        }
        if self.fast_non_pet.occurs_in(&tokens) {
            return Self::reply(ReplyKind::OffTopic, &self.replies.off_topic);
        }
        None
    }

    /// Pipeline gate. The pet-topic check also looks at the user's earlier
    /// messages so follow-ups like "how often?" stay on topic; the hard
    /// rejection list only looks at the current question.
    pub fn gate(&self, question: &str, earlier_questions: &[String]) -> Option<CannedReply> {
        let tokens = normalize(question);

        if self.greetings.equals(&tokens) {
            return Self::reply(ReplyKind::Greeting, &self.replies.greeting);
        }

        let on_topic = self.pet_keywords.occurs_in(&tokens)
            || earlier_questions
                .iter()
                .any(|earlier| self.pet_keywords.occurs_in(&normalize(earlier)));
        if !on_topic {
            return Self::reply(ReplyKind::OffTopic, &self.replies.off_topic);
        }

        if self.non_pet_keywords.occurs_in(&tokens) {
            return Self::reply(ReplyKind::OffTopic, &self.replies.off_topic);
        }

        if self.polite_phrases.equals(&tokens) {
            return Self::reply(ReplyKind::Polite, &self.replies.polite);
        }

        None
    }
}
