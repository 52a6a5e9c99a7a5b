//! Mascot speech lines for each mood.

use crate::Mood;

const HAPPY: &[&str] = &[
    "All doses in, looking great!",
    "Health on point today!",
    "Nailed it. Sleeping easy tonight.",
    "I knew you wouldn't let me down!",
    "Zero drama over here.",
    "Another checkmark for the streak!",
];

const CONCERNED: &[&str] = &[
    "Don't forget your medicine...",
    "Hey, did you skip something?",
    "I'm watching you...",
    "Don't leave me hanging!",
    "I believe in you, go take it!",
];

const SICK: &[&str] = &[
    "Feeling pretty rough here...",
    "Help me help you...",
    "Things are heating up...",
    "I'm getting weak...",
];

const VERY_SICK: &[&str] = &[
    "Can't keep this up...",
    "Running on fumes...",
    "The system is going down...",
    "This plot twist is not great...",
];

const CRITICAL: &[&str] = &["Fading out...", "Press F in the chat...", "Lights going dim..."];

const DEAD: &[&str] = &["R.I.P.", "Gone, but not forgotten.", "Game over."];

/// All lines the mascot can say in a given mood
pub fn messages(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => HAPPY,
        Mood::Concerned => CONCERNED,
        Mood::Sick => SICK,
        Mood::VerySick => VERY_SICK,
        Mood::Critical => CRITICAL,
        Mood::Dead => DEAD,
    }
}

/// Pick a line for `mood`; the same seed always picks the same line
pub fn message_for(mood: Mood, seed: u64) -> &'static str {
    let pool = messages(mood);
    pool[(seed % pool.len() as u64) as usize]
}
