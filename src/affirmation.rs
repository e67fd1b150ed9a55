use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affirmation {
    pub text: &'static str,
    pub author: &'static str,
}

const fn quote(text: &'static str, author: &'static str) -> Affirmation {
    Affirmation { text, author }
}

pub const AFFIRMATIONS: [Affirmation; 15] = [
    quote("The secret of getting ahead is getting started.", "Mark Twain"),
    quote("The only way to do great work is to love what you do.", "Steve Jobs"),
    quote(
        "Success is not final, failure is not fatal: it is the courage to continue that counts.",
        "Winston Churchill",
    ),
    quote("Don't watch the clock; do what it does. Keep going.", "Sam Levenson"),
    quote(
        "The future belongs to those who believe in the beauty of their dreams.",
        "Eleanor Roosevelt",
    ),
    quote("Well done is better than well said.", "Benjamin Franklin"),
    quote("A year from now you may wish you had started today.", "Karen Lamb"),
    quote("The expert in anything was once a beginner.", "Helen Hayes"),
    quote("Discipline is the bridge between goals and accomplishment.", "Jim Rohn"),
    quote("With self-discipline most anything is possible.", "Theodore Roosevelt"),
    quote("Focus on being productive instead of busy.", "Tim Ferriss"),
    quote(
        "The key is not to prioritize what's on your schedule, but to schedule your priorities.",
        "Stephen Covey",
    ),
    quote(
        "You don't have to be great to start, but you have to start to be great.",
        "Zig Ziglar",
    ),
    quote("The journey of a thousand miles begins with a single step.", "Lao Tzu"),
    quote("Act or accept.", "Anonymous"),
];

pub fn random_affirmation(rng: &mut impl Rng) -> Affirmation {
    *AFFIRMATIONS.choose(rng).unwrap_or(&AFFIRMATIONS[0])
}

impl std::fmt::Display for Affirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" - {}", self.text, self.author)
    }
}
