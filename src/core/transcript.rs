//! # Transcript
//!
//! The ordered list of turns for one chat session.
//!
//! ```text
//! append_user_turn ──► begin_assistant_turn ──► update_assistant_turn* ──► finalize_assistant_turn
//!        │                      │                         │
//!        └──────────────────────┴─────────────────────────┴──► abandon_exchange (failure / cancel)
//! ```
//!
//! An exchange is one user turn plus its reply. Only one exchange is in flight
//! at a time, and inside it only the newest assistant turn is ever mutable.
//! Every other turn is frozen the moment it stops being the open one.

use serde::Serialize;
use thiserror::Error;

use crate::a2ui::A2UIElement;
use crate::core::attachment::EncodedImage;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Mutability of a turn. User turns are born `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// Assistant placeholder still receiving provisional text.
    Open,
    Finalized,
    /// The exchange failed or was cancelled; the provisional text is kept as-is.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub ui: Option<A2UIElement>,
    pub attachment: Option<EncodedImage>,
    pub status: TurnStatus,
}

impl ChatTurn {
    pub fn is_open(&self) -> bool {
        self.status == TurnStatus::Open
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("a request is already in flight for this session")]
    RequestInFlight,
    #[error("an assistant turn is already open")]
    TurnAlreadyOpen,
    #[error("no user turn is awaiting a reply")]
    NoPendingExchange,
    #[error("no assistant turn is open")]
    NoOpenTurn,
}

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Exchange {
    #[default]
    Settled,
    /// User turn appended, no reply turn yet.
    AwaitingReply,
    /// Index of the open assistant turn.
    Streaming(usize),
}

#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
    exchange: Exchange,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True from `append_user_turn` until the exchange is finalized or abandoned.
    pub fn in_flight(&self) -> bool {
        self.exchange != Exchange::Settled
    }

    pub fn open_turn(&self) -> Option<&ChatTurn> {
        match self.exchange {
            Exchange::Streaming(idx) => self.turns.get(idx),
            _ => None,
        }
    }

    pub fn append_user_turn(
        &mut self,
        content: String,
        attachment: Option<EncodedImage>,
    ) -> Result<&ChatTurn, TranscriptError> {
        if self.in_flight() {
            return Err(TranscriptError::RequestInFlight);
        }
        self.turns.push(ChatTurn {
            role: Role::User,
            content,
            ui: None,
            attachment,
            status: TurnStatus::Finalized,
        });
        self.exchange = Exchange::AwaitingReply;
        Ok(&self.turns[self.turns.len() - 1])
    }

    pub fn begin_assistant_turn(&mut self) -> Result<(), TranscriptError> {
        match self.exchange {
            Exchange::AwaitingReply => {
                self.turns.push(ChatTurn {
                    role: Role::Assistant,
                    content: String::new(),
                    ui: None,
                    attachment: None,
                    status: TurnStatus::Open,
                });
                self.exchange = Exchange::Streaming(self.turns.len() - 1);
                Ok(())
            }
            Exchange::Streaming(_) => Err(TranscriptError::TurnAlreadyOpen),
            Exchange::Settled => Err(TranscriptError::NoPendingExchange),
        }
    }

    /// Replaces the open turn's content with the latest provisional text.
    pub fn update_assistant_turn(&mut self, partial_text: &str) -> Result<(), TranscriptError> {
        let turn = self.open_turn_mut()?;
        turn.content.clear();
        turn.content.push_str(partial_text);
        Ok(())
    }

    /// Sets the decoded message and element, then freezes the turn.
    pub fn finalize_assistant_turn(
        &mut self,
        message: String,
        ui: Option<A2UIElement>,
    ) -> Result<&ChatTurn, TranscriptError> {
        let Exchange::Streaming(idx) = self.exchange else {
            return Err(TranscriptError::NoOpenTurn);
        };
        let turn = &mut self.turns[idx];
        turn.content = message;
        turn.ui = ui;
        turn.status = TurnStatus::Finalized;
        self.exchange = Exchange::Settled;
        Ok(&self.turns[idx])
    }

    /// Closes the current exchange without a decoded reply. Returns whether
    /// there was anything to close.
    pub fn abandon_exchange(&mut self) -> bool {
        match self.exchange {
            Exchange::Settled => false,
            Exchange::AwaitingReply => {
                self.exchange = Exchange::Settled;
                true
            }
            Exchange::Streaming(idx) => {
                self.turns[idx].status = TurnStatus::Abandoned;
                self.exchange = Exchange::Settled;
                true
            }
        }
    }

    /// Turns worth sending upstream: everything except abandoned replies,
    /// whose content is undecoded model output.
    pub fn history(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns
            .iter()
            .filter(|turn| turn.status != TurnStatus::Abandoned)
    }

    /// Newest finalized turn carrying an element.
    pub fn latest_element(&self) -> Option<(usize, &A2UIElement)> {
        self.turns
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, turn)| turn.ui.as_ref().map(|ui| (idx, ui)))
    }

    fn open_turn_mut(&mut self) -> Result<&mut ChatTurn, TranscriptError> {
        match self.exchange {
            Exchange::Streaming(idx) => Ok(&mut self.turns[idx]),
            _ => Err(TranscriptError::NoOpenTurn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::a2ui::CardProps;

    fn card() -> A2UIElement {
        A2UIElement::Card(CardProps {
            title: "Shipping".to_string(),
            content: "Ships in 2 days".to_string(),
        })
    }

    fn open_turns(t: &Transcript) -> usize {
        t.turns().iter().filter(|turn| turn.is_open()).count()
    }

    #[test]
    fn test_full_exchange_lifecycle() {
        let mut t = Transcript::new();
        t.append_user_turn("hello".to_string(), None).unwrap();
        assert!(t.in_flight());

        t.begin_assistant_turn().unwrap();
        assert_eq!(open_turns(&t), 1);
        assert_eq!(t.open_turn().unwrap().content, "");

        t.update_assistant_turn("{\"mess").unwrap();
        t.update_assistant_turn("{\"message\":\"Hi").unwrap();
        assert_eq!(t.open_turn().unwrap().content, "{\"message\":\"Hi");

        let turn = t.finalize_assistant_turn("Hi".to_string(), Some(card())).unwrap();
        assert_eq!(turn.content, "Hi");
        assert_eq!(turn.ui, Some(card()));
        assert_eq!(turn.status, TurnStatus::Finalized);
        assert!(!t.in_flight());
        assert_eq!(open_turns(&t), 0);
    }

    #[test]
    fn test_append_user_turn_rejected_while_in_flight() {
        let mut t = Transcript::new();
        t.append_user_turn("first".to_string(), None).unwrap();
        assert_eq!(
            t.append_user_turn("second".to_string(), None).unwrap_err(),
            TranscriptError::RequestInFlight
        );

        t.begin_assistant_turn().unwrap();
        assert_eq!(
            t.append_user_turn("second".to_string(), None).unwrap_err(),
            TranscriptError::RequestInFlight
        );
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_second_assistant_turn_cannot_open() {
        let mut t = Transcript::new();
        t.append_user_turn("q".to_string(), None).unwrap();
        t.begin_assistant_turn().unwrap();
        assert_eq!(
            t.begin_assistant_turn().unwrap_err(),
            TranscriptError::TurnAlreadyOpen
        );
        assert_eq!(open_turns(&t), 1);
    }

    #[test]
    fn test_assistant_turn_requires_user_turn() {
        let mut t = Transcript::new();
        assert_eq!(
            t.begin_assistant_turn().unwrap_err(),
            TranscriptError::NoPendingExchange
        );
    }

    #[test]
    fn test_finalize_only_once() {
        let mut t = Transcript::new();
        t.append_user_turn("q".to_string(), None).unwrap();
        t.begin_assistant_turn().unwrap();
        t.finalize_assistant_turn("a".to_string(), Some(card())).unwrap();

        assert_eq!(
            t.finalize_assistant_turn("again".to_string(), None).unwrap_err(),
            TranscriptError::NoOpenTurn
        );
        assert_eq!(
            t.update_assistant_turn("late").unwrap_err(),
            TranscriptError::NoOpenTurn
        );
        assert_eq!(t.turns()[1].content, "a");
        assert_eq!(t.turns()[1].ui, Some(card()));
    }

    #[test]
    fn test_abandon_keeps_provisional_text() {
        let mut t = Transcript::new();
        t.append_user_turn("q".to_string(), None).unwrap();
        t.begin_assistant_turn().unwrap();
        t.update_assistant_turn("not json").unwrap();

        assert!(t.abandon_exchange());
        let turn = &t.turns()[1];
        assert_eq!(turn.status, TurnStatus::Abandoned);
        assert_eq!(turn.content, "not json");
        assert_eq!(turn.ui, None);
        assert!(!t.in_flight());
        assert!(!t.abandon_exchange());
    }

    #[test]
    fn test_abandon_before_reply_settles_exchange() {
        let mut t = Transcript::new();
        t.append_user_turn("q".to_string(), None).unwrap();
        assert!(t.abandon_exchange());
        assert_eq!(t.len(), 1);
        t.append_user_turn("retry".to_string(), None).unwrap();
    }

    #[test]
    fn test_history_skips_abandoned_replies() {
        let mut t = Transcript::new();
        t.append_user_turn("q1".to_string(), None).unwrap();
        t.begin_assistant_turn().unwrap();
        t.abandon_exchange();
        t.append_user_turn("q2".to_string(), None).unwrap();

        let contents: Vec<&str> = t.history().map(|turn| turn.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "q2"]);
    }

    #[test]
    fn test_turn_order_follows_exchanges() {
        let mut t = Transcript::new();
        for n in 0..3 {
            t.append_user_turn(format!("q{n}"), None).unwrap();
            t.begin_assistant_turn().unwrap();
            t.finalize_assistant_turn(format!("a{n}"), None).unwrap();
        }
        let roles: Vec<Role> = t.turns().iter().map(|turn| turn.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
    }

    #[test]
    fn test_latest_element_finds_newest() {
        let mut t = Transcript::new();
        t.append_user_turn("q".to_string(), None).unwrap();
        t.begin_assistant_turn().unwrap();
        t.finalize_assistant_turn("a".to_string(), Some(card())).unwrap();
        t.append_user_turn("q2".to_string(), None).unwrap();
        t.begin_assistant_turn().unwrap();
        t.finalize_assistant_turn("plain".to_string(), None).unwrap();

        let (idx, el) = t.latest_element().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(el, &card());
    }
}
