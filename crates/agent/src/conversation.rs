use std::collections::VecDeque;

use liwa_core::domain::reservation::ReferenceCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    Guest,
    Agent,
}

impl Speaker {
    pub fn role(&self) -> &'static str {
        match self {
            Self::Guest => "user",
            Self::Agent => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

/// Bounded rolling window over the recent conversation. Older turns fall
/// off the front; reference resolution only ever sees what is retained.
#[derive(Clone, Debug)]
pub struct ConversationContext {
    turns: VecDeque<Turn>,
    window: usize,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ConversationContext {
    pub fn new(window: usize) -> Self {
        Self { turns: VecDeque::new(), window: window.max(1) }
    }

    pub fn push(&mut self, speaker: Speaker, content: impl Into<String>) {
        if self.turns.len() == self.window {
            self.turns.pop_front();
        }
        self.turns.push_back(Turn { speaker, content: content.into() });
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Resolves the reservation the guest is talking about: the most
    /// recently mentioned well-formed reference code anywhere in the
    /// retained window, newest turn first.
    pub fn find_reference(&self) -> Option<ReferenceCode> {
        self.turns.iter().rev().find_map(|turn| ReferenceCode::scan_last(&turn.content))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConversationContext, Speaker};

    #[test]
    fn window_evicts_oldest_turns() {
        let mut context = ConversationContext::new(3);
        for index in 0..5 {
            context.push(Speaker::Guest, format!("message {index}"));
        }

        assert_eq!(context.len(), 3);
        let contents: Vec<&str> =
            context.turns().map(|turn| turn.content.as_str()).collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);
    }

    #[test]
    fn most_recent_reference_mention_wins() {
        let mut context = ConversationContext::new(10);
        context.push(Speaker::Guest, "I booked REF123456001 last month");
        context.push(Speaker::Agent, "Found it.");
        context.push(Speaker::Guest, "Actually I mean REF123456002, not the first one");

        let reference = context.find_reference().expect("reference resolved");
        assert_eq!(reference.0, "REF123456002");
    }

    #[test]
    fn later_mentions_in_the_same_turn_win() {
        let mut context = ConversationContext::new(10);
        context.push(Speaker::Guest, "Compare REF111111111 with REF222222222 please");

        let reference = context.find_reference().expect("reference resolved");
        assert_eq!(reference.0, "REF222222222");
    }

    #[test]
    fn malformed_codes_are_ignored() {
        let mut context = ConversationContext::new(10);
        context.push(Speaker::Guest, "my code is REF12345 I think?");

        assert_eq!(context.find_reference(), None);
    }

    #[test]
    fn references_outside_the_window_are_forgotten() {
        let mut context = ConversationContext::new(2);
        context.push(Speaker::Guest, "booking REF123456003");
        context.push(Speaker::Agent, "Noted.");
        context.push(Speaker::Guest, "cancel it please");

        assert_eq!(context.find_reference(), None);
    }
}
