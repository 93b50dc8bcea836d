use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};
use recview::domain::{Message, RVConfig, RVError};

use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &RVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, RVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    if model.raw_keyevents() {
                        Some(Message::RawKey(key))
                    } else {
                        self.handle_key(key)
                    }
                }
                Event::Resize(width, height) => {
                    Some(Message::Resize(width as usize, height as usize))
                }
                _ => None,
            });
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Char('h') | KeyCode::Left, _) => Some(Message::MoveLeft),
            (KeyCode::Char('l') | KeyCode::Right, _) => Some(Message::MoveRight),
            (KeyCode::Char('n') | KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Char('p') | KeyCode::PageUp, _) => Some(Message::PreviousPage),
            (KeyCode::Char('g') | KeyCode::Home, _) => Some(Message::FirstPage),
            (KeyCode::Char('G') | KeyCode::End, _) => Some(Message::LastPage),
            (KeyCode::Char('['), _) => Some(Message::SortAscending),
            (KeyCode::Char(']'), _) => Some(Message::SortDescending),
            (KeyCode::Char('b'), _) => Some(Message::ToggleBoard),
            (KeyCode::Char('m'), _) => Some(Message::PickUp),
            (KeyCode::Enter | KeyCode::Char(' '), _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('e'), _) => Some(Message::Export),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            (KeyCode::Char('c'), _) => Some(Message::ClearFilter),
            (KeyCode::Char('/'), _) => Some(Message::Filter),
            (KeyCode::Char(':'), _) => Some(Message::GoToPage),
            (KeyCode::Char('!'), _) => Some(Message::EnterCommand),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
