//! Daily reading prompts.
//!
//! The daily prompt is picked with a small seeded generator (xmur3 string
//! hash feeding an sfc32 stream) so every run on the same local date lands on
//! the same prompt. All arithmetic is 32-bit wrapping.

use chrono::NaiveDate;
use rand::Rng;

pub const PROMPTS: [&str; 10] = [
    "Read one paragraph like it’s a leaf you’re tasting for the first time.",
    "Pick a sentence you love and copy it somewhere. Tiny shrine.",
    "What would the main character smell right now? Be weirdly specific.",
    "Pause after a page and let the scene settle like fog.",
    "Read slower than you think you should. You’re allowed.",
    "Find one detail you’d miss if you were rushing.",
    "If this book were tea, what kind would it be?",
    "Stop mid-page when you feel “oh!” and savor it for ten seconds.",
    "Before you start: loosen your jaw. Yes, really.",
    "When you finish: close the book like you’re tucking it into a nest.",
];

const SEED_PREFIX: &str = "sloth-reading-nest:";

/// xmur3 string hash; each call yields the next 32-bit seed word.
struct Xmur3 {
    h: u32,
}

impl Xmur3 {
    fn new(seed: &str) -> Self {
        let units: Vec<u16> = seed.encode_utf16().collect();
        let mut h = 1_779_033_703u32 ^ units.len() as u32;
        for unit in units {
            h = (h ^ u32::from(unit)).wrapping_mul(3_432_918_353);
            h = h.rotate_left(13);
        }
        Self { h }
    }

    fn next_u32(&mut self) -> u32 {
        let mut h = self.h;
        h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
        h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
        h ^= h >> 16;
        self.h = h;
        h
    }
}

/// Deterministic float stream in `[0, 1)` derived from a seed string.
#[derive(Debug, Clone)]
pub struct SeededRng {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl SeededRng {
    pub fn new(seed: &str) -> Self {
        let mut hash = Xmur3::new(seed);
        Self {
            a: hash.next_u32(),
            b: hash.next_u32(),
            c: hash.next_u32(),
            d: hash.next_u32(),
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut t = self.a.wrapping_add(self.b);
        self.a = self.b ^ (self.b >> 9);
        self.b = self.c.wrapping_add(self.c << 3);
        self.c = self.c.rotate_left(21);
        self.d = self.d.wrapping_add(1);
        t = t.wrapping_add(self.d);
        self.c = self.c.wrapping_add(t);
        t
    }

    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

impl Iterator for SeededRng {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

/// `YYYY-MM-DD`, the per-day part of the seed and of export file names.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn pick(r: f64) -> &'static str {
    let idx = ((r * PROMPTS.len() as f64).floor() as usize).min(PROMPTS.len() - 1);
    PROMPTS[idx]
}

/// The prompt for a given local calendar date.
pub fn daily_prompt(date: NaiveDate) -> &'static str {
    let mut rng = SeededRng::new(&format!("{SEED_PREFIX}{}", day_key(date)));
    pick(rng.next_f64())
}

/// An unseeded pick, for "give me another one".
pub fn random_prompt() -> &'static str {
    pick(rand::thread_rng().gen::<f64>())
}
