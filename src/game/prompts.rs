//! Starter prompts offered to players at the beginning of a game

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Language of the built-in prompt lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptLanguage {
    #[default]
    Fi,
    En,
}

impl PromptLanguage {
    /// Word list for this language
    pub fn prompts(&self) -> &'static [&'static str] {
        match self {
            PromptLanguage::Fi => FI_PROMPTS,
            PromptLanguage::En => EN_PROMPTS,
        }
    }
}

const FI_PROMPTS: &[&str] = &[
    "kissa",
    "koira",
    "sauna",
    "joulupukki",
    "lumiukko",
    "kuu",
    "aurinko",
    "polkupyörä",
    "juna",
    "lentokone",
    "merirosvo",
    "noita",
    "lohikäärme",
    "hirvi",
    "karhu",
    "pulla",
    "mämmi",
    "kahvikuppi",
    "saunavihta",
    "mökki",
    "järvi",
    "soutuvene",
    "kalastaja",
    "mustikka",
    "sieni",
    "revontulet",
    "pipo",
    "lapaset",
    "sukset",
    "jääkiekko",
    "muumi",
    "kummitus",
    "robotti",
    "avaruusolento",
    "tulivuori",
    "majakka",
    "sateenvarjo",
    "pizza",
    "hampurilainen",
    "jäätelö",
    "kitara",
    "rumpali",
    "kuningas",
    "prinsessa",
    "ritari",
    "linna",
    "pingviini",
    "kameli",
    "norsu",
    "kirahvi",
    "mehiläinen",
    "perhonen",
    "sammakko",
    "tonttu",
    "kuusi",
    "traktori",
    "palomies",
    "poliisi",
    "hammaslääkäri",
    "kello",
];

const EN_PROMPTS: &[&str] = &[
    "cat",
    "dog",
    "snowman",
    "moon",
    "sun",
    "bicycle",
    "train",
    "airplane",
    "pirate",
    "witch",
    "dragon",
    "moose",
    "bear",
    "coffee cup",
    "cabin",
    "lake",
    "rowboat",
    "fisherman",
    "blueberry",
    "mushroom",
    "northern lights",
    "beanie",
    "mittens",
    "skis",
    "ice hockey",
    "ghost",
    "robot",
    "alien",
    "volcano",
    "lighthouse",
    "umbrella",
    "pizza",
    "hamburger",
    "ice cream",
    "guitar",
    "drummer",
    "king",
    "princess",
    "knight",
    "castle",
    "penguin",
    "camel",
    "elephant",
    "giraffe",
    "bee",
    "butterfly",
    "frog",
    "elf",
    "spruce",
    "tractor",
    "firefighter",
    "police officer",
    "dentist",
    "clock",
    "octopus",
    "haunted house",
    "snail",
    "rainbow",
    "skateboard",
    "wizard",
];

/// Hands out prompts without repetition until the list runs out
#[derive(Debug, Clone)]
pub struct Prompter {
    language: PromptLanguage,
    deck: Vec<&'static str>,
}

impl Prompter {
    pub fn new(language: PromptLanguage) -> Self {
        Self {
            language,
            deck: Vec::new(),
        }
    }

    /// Next prompt; the list is reshuffled only once every prompt was used
    pub fn next_prompt<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        if self.deck.is_empty() {
            self.deck = self.language.prompts().to_vec();
            self.deck.shuffle(rng);
        }
        // The deck was just refilled from a non-empty list
        self.deck.pop().unwrap_or_default().to_string()
    }

    /// Draw `count` prompts
    pub fn take<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<String> {
        (0..count).map(|_| self.next_prompt(rng)).collect()
    }
}
