//! One prompt -> image -> guess unit of a drawing thread

use uuid::Uuid;

use crate::protocol::DrawingDto;
use crate::room::PlayerId;

#[derive(Debug, Clone)]
pub struct Drawing {
    /// Unique id used by clients to submit and fetch the image
    pub id: String,
    /// Hand-off chain this drawing belongs to, stable across rounds
    pub thread_index: usize,
    pub drawer_id: PlayerId,
    pub guesser_id: PlayerId,
    prompt: String,
    guess: Option<String>,
    /// Opaque encoded image (base64 JPEG from the client)
    image: Option<String>,
}

impl Drawing {
    pub fn new(thread_index: usize, drawer_id: PlayerId, guesser_id: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            thread_index,
            drawer_id,
            guesser_id,
            prompt: String::new(),
            guess: None,
            image: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn guess(&self) -> Option<&str> {
        self.guess.as_deref()
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.is_empty()
    }

    pub fn has_guess(&self) -> bool {
        self.guess.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// Set the prompt once; returns false if it was already set
    pub fn set_prompt(&mut self, prompt: &str) -> bool {
        if self.has_prompt() || prompt.is_empty() {
            return false;
        }
        self.prompt = prompt.to_string();
        true
    }

    /// Record the guess once; returns false if it was already set
    pub fn set_guess(&mut self, guess: &str) -> bool {
        if self.has_guess() || guess.is_empty() {
            return false;
        }
        self.guess = Some(guess.to_string());
        true
    }

    /// Store the image, replacing any earlier submission
    pub fn set_image(&mut self, image: String) {
        self.image = Some(image);
    }

    pub fn to_dto(&self) -> DrawingDto {
        DrawingDto {
            id: self.id.clone(),
            drawer_id: self.drawer_id.clone(),
            guesser_id: self.guesser_id.clone(),
            prompt: self.prompt.clone(),
            guess: self.guess.clone(),
            thread_index: self.thread_index,
            has_image: self.image.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawing() -> Drawing {
        Drawing::new(2, "drawer".to_string(), "guesser".to_string())
    }

    #[test]
    fn test_new_drawing_is_blank() {
        let d = drawing();
        assert_eq!(d.thread_index, 2);
        assert!(!d.has_prompt());
        assert!(!d.has_guess());
        assert!(d.image().is_none());
        assert_eq!(d.id.len(), 32);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(drawing().id, drawing().id);
    }

    #[test]
    fn test_prompt_and_guess_are_set_once() {
        let mut d = drawing();
        assert!(d.set_prompt("cat"));
        assert!(!d.set_prompt("dog"));
        assert_eq!(d.prompt(), "cat");

        assert!(!d.set_guess(""));
        assert!(d.set_guess("tiger"));
        assert!(!d.set_guess("lion"));
        assert_eq!(d.guess(), Some("tiger"));
    }

    #[test]
    fn test_image_can_be_replaced() {
        let mut d = drawing();
        d.set_image("first".to_string());
        d.set_image("second".to_string());
        assert_eq!(d.image(), Some("second"));
        assert!(d.to_dto().has_image);
    }
}
