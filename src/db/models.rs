use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Colour of an entity as a numeric rgb triple in `0..=1`, stored as a JSON
/// array. Derived from the entity name when the user doesn't pick one, so the
/// same name always gets the same colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colour(pub [f64; 3]);

impl Colour {
    pub fn from_name(name: &str) -> Colour {
        // FNV-1a, folded into a hue. Saturation and lightness are fixed so
        // derived colours stay readable on dark and light terminals.
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in name.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        let hue = (hash % 360) as f64;
        Self::from_hsl(hue, 0.55, 0.55)
    }

    fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Colour {
        let c = (1. - (2. * lightness - 1.).abs()) * saturation;
        let x = c * (1. - ((hue / 60.) % 2. - 1.).abs());
        let m = lightness - c / 2.;
        let (r, g, b) = match hue as u32 {
            0..=59 => (c, x, 0.),
            60..=119 => (x, c, 0.),
            120..=179 => (0., c, x),
            180..=239 => (0., x, c),
            240..=299 => (x, 0., c),
            _ => (c, 0., x),
        };
        Colour([r + m, g + m, b + m])
    }

    pub fn parse(raw: &str) -> Result<Colour, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn encode(&self) -> String {
        format!("[{:.4},{:.4},{:.4}]", self.0[0], self.0[1], self.0[2])
    }

    /// Nearest colour in the 6x6x6 terminal cube.
    pub fn terminal(&self) -> ansi_term::Colour {
        let channel = |v: f64| (v.clamp(0., 1.) * 5.).round() as u8;
        ansi_term::Colour::Fixed(
            16 + 36 * channel(self.0[0]) + 6 * channel(self.0[1]) + channel(self.0[2]),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub colour: Colour,
    pub alive: bool,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub company_id: Option<i64>,
    pub name: String,
    pub abbreviation: String,
    pub colour: Colour,
    pub alive: bool,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// A unit of work time is billed against. Its id is user-chosen and numeric
/// because journal lines reference it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: i64,
    pub project_id: Option<i64>,
    pub title: Option<String>,
    pub uri: Option<String>,
    pub colour: Colour,
    pub alive: bool,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Job {
    /// Human label: the title when there is one, the id otherwise.
    pub fn label(&self) -> String {
        match &self.title {
            Some(title) => format!("{} ({})", title, self.id),
            None => format!("#{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub job_id: Option<i64>,
    pub title: String,
    pub alive: bool,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteVersion {
    pub id: i64,
    pub note_id: i64,
    pub title: String,
    pub content: String,
    pub starred: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogTask {
    pub id: i64,
    pub job_id: i64,
    pub content: String,
    pub due: Option<DateTime<Utc>>,
    pub completed: Option<DateTime<Utc>>,
    pub cancelled: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl LogTask {
    pub fn is_open(&self) -> bool {
        self.completed.is_none() && self.cancelled.is_none()
    }
}

/// Entity-side time entry. Journal lines written through `add` are mirrored
/// here when their job exists in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub job_id: i64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub company_id: Option<i64>,
    pub name: String,
    pub title: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyTerm {
    pub id: i64,
    pub job_id: Option<i64>,
    pub name: String,
    pub definition: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

/// Uppercase initials of a name, the default abbreviation for companies and
/// projects.
pub fn derive_abbreviation(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(|c| c.to_uppercase())
        .collect();
    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_abbreviation, Colour};

    #[test]
    fn test_colour_is_stable_for_a_name() {
        assert_eq!(Colour::from_name("Acme"), Colour::from_name("Acme"));
        assert_ne!(Colour::from_name("Acme"), Colour::from_name("Initech"));
    }

    #[test]
    fn test_colour_encode_round_trip() {
        let colour = Colour::from_name("Acme");
        let parsed = Colour::parse(&colour.encode()).unwrap();
        for (a, b) in colour.0.iter().zip(parsed.0.iter()) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_colour_channels_in_range() {
        for name in ["a", "zebra", "Very Long Company Name LLC"] {
            let Colour([r, g, b]) = Colour::from_name(name);
            for v in [r, g, b] {
                assert!((0. ..=1.).contains(&v), "{name} produced {v}");
            }
        }
    }

    #[test]
    fn test_derive_abbreviation() {
        assert_eq!(derive_abbreviation("Acme Widget Co"), "AWC");
        assert_eq!(derive_abbreviation("solo"), "S");
        assert_eq!(derive_abbreviation("  "), "?");
    }
}
