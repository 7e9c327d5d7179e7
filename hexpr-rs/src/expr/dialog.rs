//! User prompts for `get_int`, `get_string` and `get_bool`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Host interface for asking the user a question.  Every method returns
/// `None` when the user cancels.
pub trait DialogProvider {
    fn get_integer(&mut self, prompt: &str, initial: i64, min: i64, max: i64) -> Option<i64>;

    fn get_string(&mut self, prompt: &str, initial: &str) -> Option<String>;

    fn get_boolean(&mut self, prompt: &str, true_text: &str, false_text: &str) -> Option<bool>;
}

impl<D: DialogProvider + ?Sized> DialogProvider for Box<D> {
    fn get_integer(&mut self, prompt: &str, initial: i64, min: i64, max: i64) -> Option<i64> {
        (**self).get_integer(prompt, initial, min, max)
    }

    fn get_string(&mut self, prompt: &str, initial: &str) -> Option<String> {
        (**self).get_string(prompt, initial)
    }

    fn get_boolean(&mut self, prompt: &str, true_text: &str, false_text: &str) -> Option<bool> {
        (**self).get_boolean(prompt, true_text, false_text)
    }
}

/// Shared handle, so the host can keep inspecting a provider after giving
/// it to an evaluator.
impl<D: DialogProvider> DialogProvider for Rc<RefCell<D>> {
    fn get_integer(&mut self, prompt: &str, initial: i64, min: i64, max: i64) -> Option<i64> {
        self.borrow_mut().get_integer(prompt, initial, min, max)
    }

    fn get_string(&mut self, prompt: &str, initial: &str) -> Option<String> {
        self.borrow_mut().get_string(prompt, initial)
    }

    fn get_boolean(&mut self, prompt: &str, true_text: &str, false_text: &str) -> Option<bool> {
        self.borrow_mut().get_boolean(prompt, true_text, false_text)
    }
}

// ── ScriptedDialog ────────────────────────────────────────────────────────────

/// One answer queued on a [`ScriptedDialog`].
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Int(i64),
    Str(String),
    Bool(bool),
    /// Accept the initial value.
    Default,
    Cancel,
}

/// A provider that replays queued answers and records every prompt.
///
/// With nothing queued it accepts the initial value (`false` for a yes/no
/// question).
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    answers: VecDeque<Answer>,
    pub prompts: Vec<String>,
}

impl ScriptedDialog {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        ScriptedDialog {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    fn next(&mut self, prompt: &str) -> Answer {
        self.prompts.push(prompt.to_owned());
        self.answers.pop_front().unwrap_or(Answer::Default)
    }
}

impl DialogProvider for ScriptedDialog {
    fn get_integer(&mut self, prompt: &str, initial: i64, min: i64, max: i64) -> Option<i64> {
        match self.next(prompt) {
            Answer::Int(n) => Some(n.clamp(min, max.max(min))),
            Answer::Cancel => None,
            _ => Some(initial),
        }
    }

    fn get_string(&mut self, prompt: &str, initial: &str) -> Option<String> {
        match self.next(prompt) {
            Answer::Str(s) => Some(s),
            Answer::Cancel => None,
            _ => Some(initial.to_owned()),
        }
    }

    fn get_boolean(&mut self, prompt: &str, _true_text: &str, _false_text: &str) -> Option<bool> {
        match self.next(prompt) {
            Answer::Bool(b) => Some(b),
            Answer::Cancel => None,
            _ => Some(false),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_in_order() {
        let mut d = ScriptedDialog::new([Answer::Int(50), Answer::Cancel]);
        assert_eq!(d.get_integer("n?", 1, 0, 10), Some(10));
        assert_eq!(d.get_string("s?", "x"), None);
        assert_eq!(d.get_boolean("b?", "Yes", "No"), Some(false));
        assert_eq!(d.prompts, ["n?", "s?", "b?"]);
    }

    #[test]
    fn shared_handle_sees_prompts() {
        let shared = Rc::new(RefCell::new(ScriptedDialog::default()));
        let mut boxed: Box<dyn DialogProvider> = Box::new(Rc::clone(&shared));
        assert_eq!(boxed.get_string("name", "abc"), Some("abc".into()));
        assert_eq!(shared.borrow().prompts, ["name"]);
    }
}
