//! Avatar fallback shown when a user has no profile picture.

use std::fmt;

/// Fixed avatar palette; the order is part of the hash mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Pink,
    Indigo,
    Teal,
    Orange,
}

pub const PALETTE: [AvatarColor; 9] = [
    AvatarColor::Red,
    AvatarColor::Green,
    AvatarColor::Blue,
    AvatarColor::Yellow,
    AvatarColor::Purple,
    AvatarColor::Pink,
    AvatarColor::Indigo,
    AvatarColor::Teal,
    AvatarColor::Orange,
];

impl AvatarColor {
    /// Utility class used by the web dashboard.
    pub fn css_class(self) -> &'static str {
        match self {
            AvatarColor::Red => "bg-red-500",
            AvatarColor::Green => "bg-green-500",
            AvatarColor::Blue => "bg-blue-500",
            AvatarColor::Yellow => "bg-yellow-500",
            AvatarColor::Purple => "bg-purple-500",
            AvatarColor::Pink => "bg-pink-500",
            AvatarColor::Indigo => "bg-indigo-500",
            AvatarColor::Teal => "bg-teal-500",
            AvatarColor::Orange => "bg-orange-500",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            AvatarColor::Red => "#ef4444",
            AvatarColor::Green => "#22c55e",
            AvatarColor::Blue => "#3b82f6",
            AvatarColor::Yellow => "#eab308",
            AvatarColor::Purple => "#a855f7",
            AvatarColor::Pink => "#ec4899",
            AvatarColor::Indigo => "#6366f1",
            AvatarColor::Teal => "#14b8a6",
            AvatarColor::Orange => "#f97316",
        }
    }
}

impl fmt::Display for AvatarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.css_class(), self.hex())
    }
}

/// Rolling string hash `hash = c + ((hash << 5) - hash)` over UTF-16 code
/// units, with the shift applied to the 32-bit truncation of `hash` the way a
/// browser evaluates it. The accumulator itself is not truncated.
pub fn name_hash(input: &str) -> i64 {
    input.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit) + (shifted - hash)
    })
}

/// Pick a palette colour from the name, else the email, else `"default"`.
pub fn avatar_color(name: Option<&str>, email: Option<&str>) -> AvatarColor {
    let key = [name, email]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or("default");
    let index = name_hash(key).unsigned_abs() % PALETTE.len() as u64;
    PALETTE[index as usize]
}

/// Up to two initials: first letters of the first and last words.
/// Missing or blank names give `"U"`.
pub fn initials(name: Option<&str>) -> String {
    let words: Vec<&str> = name.unwrap_or_default().split_whitespace().collect();
    let first_letter = |word: &str| word.chars().next().into_iter().flat_map(char::to_uppercase);
    match words.as_slice() {
        [] => "U".to_string(),
        [only] => first_letter(*only).collect(),
        [first, .., last] => first_letter(*first).chain(first_letter(*last)).collect(),
    }
}
