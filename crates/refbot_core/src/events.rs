use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

// Player and team names in event text: word characters plus apostrophes,
// hyphens, accents, and inner spaces.
const NAME: &str = r"\w[\w'\-é ]+";

/// Known game-event outcome shapes, tried in order; first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutcomeKind {
    Incineration,
    Shuffle,
    Feedback,
    Reverberating,
    Blooddrain,
    Chain,
    HitByPitch,
    Party,
    Peanut,
    RedHot,
    Deshelling,
    BigPeanut,
    Sun2,
    BlackHole,
}

impl OutcomeKind {
    /// Display label used as the `Type` template argument.
    pub fn label(self) -> &'static str {
        match self {
            OutcomeKind::Incineration => "Incineration",
            OutcomeKind::Shuffle => "Shuffle",
            OutcomeKind::Feedback => "Feedback",
            OutcomeKind::Reverberating => "Reverberating",
            OutcomeKind::Blooddrain => "Blooddrain",
            OutcomeKind::Chain => "Chain",
            OutcomeKind::HitByPitch => "Hit By Pitch",
            OutcomeKind::Party => "Party",
            OutcomeKind::Peanut => "Peanut",
            OutcomeKind::RedHot => "Red Hot",
            OutcomeKind::Deshelling => "Deshelling",
            OutcomeKind::BigPeanut => "Big Peanut",
            OutcomeKind::Sun2 => "Sun 2",
            OutcomeKind::BlackHole => "Black Hole",
        }
    }
}

static OUTCOME_TABLE: LazyLock<Vec<(OutcomeKind, Regex)>> = LazyLock::new(|| {
    let patterns: [(OutcomeKind, String); 14] = [
        (
            OutcomeKind::Incineration,
            format!(
                "Rogue Umpire incinerated {NAME} (?:pitch|hitt)er (?P<Player1>{NAME})! Replaced by (?P<Player2>{NAME})"
            ),
        ),
        (
            OutcomeKind::Shuffle,
            format!(
                r"The (?P<Team1>{NAME}) (?:had several players|were completely|had their \w+) shuffled in the Reverb!"
            ),
        ),
        (
            OutcomeKind::Feedback,
            format!("(?P<Player1>{NAME}) and (?P<Player2>{NAME}) switched teams in the feedback!"),
        ),
        (
            OutcomeKind::Reverberating,
            format!("(?P<Player1>{NAME}) is now Reverberating wildly!"),
        ),
        (
            OutcomeKind::Blooddrain,
            format!(
                "The Blooddrain gurgled! (?P<Player1>{NAME}) siphoned some of (?P<Player2>{NAME})'s (?P<Notes>{NAME}) ability!"
            ),
        ),
        (
            OutcomeKind::Chain,
            format!("The Instability (?:chains|spreads) to the {NAME}'s (?P<Player1>{NAME})!"),
        ),
        (
            OutcomeKind::HitByPitch,
            format!(
                "(?P<Player1>{NAME}) hits (?P<Player2>{NAME}) with a pitch! {NAME} is now (?P<Notes>{NAME})!"
            ),
        ),
        (
            OutcomeKind::Party,
            format!("(?P<Player1>{NAME}) is Partying!"),
        ),
        (
            OutcomeKind::Peanut,
            format!(
                r"[\w ]+ (?:pitch|hitt)er (?P<Player1>{NAME}) swallowed a stray Peanut and had an? (?P<Notes>{NAME}) reaction!"
            ),
        ),
        (
            OutcomeKind::RedHot,
            format!("(?P<Player1>{NAME}) is (?:no longer )?Red Hot"),
        ),
        (
            OutcomeKind::Deshelling,
            format!("The Birds pecked (?P<Player1>{NAME}) free!"),
        ),
        (
            OutcomeKind::BigPeanut,
            format!("A Big Peanut crashes into the field, encasing (?P<Player1>{NAME})!"),
        ),
        (
            OutcomeKind::Sun2,
            format!("Sun 2 set a Win upon the (?P<Team1>{NAME})"),
        ),
        (
            OutcomeKind::BlackHole,
            format!("The Black Hole swallowed a Win from the (?P<Team1>{NAME})!"),
        ),
    ];
    patterns
        .into_iter()
        .map(|(kind, pattern)| {
            let compiled = Regex::new(&pattern).expect("outcome pattern");
            (kind, compiled)
        })
        .collect()
});

/// A classified outcome with its derived template fields. Player names are
/// raw; rendering wraps them as wiki links. Live team lookups are the
/// caller's concern, so only the team name captured from the text itself is
/// carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeMatch {
    pub kind: OutcomeKind,
    pub player1: Option<String>,
    pub player2: Option<String>,
    pub team: Option<String>,
    pub notes: Option<String>,
}

/// Classify one game-event line against the outcome table. Returns `None`
/// for text matching no known shape.
pub fn classify_outcome(text: &str) -> Option<OutcomeMatch> {
    for (kind, pattern) in OUTCOME_TABLE.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };

        let player1 = caps.name("Player1").map(|m| m.as_str().to_string());
        let player2 = caps.name("Player2").map(|m| m.as_str().to_string());
        let team = caps
            .name("Team1")
            .map(|m| normalize_team_name(m.as_str()).to_string());

        let notes = match kind {
            // Scope of the shuffle comes from the sentence body.
            OutcomeKind::Shuffle => Some(
                if text.contains("lineup") {
                    "Lineup"
                } else if text.contains("rotation") {
                    "Rotation"
                } else {
                    "Full"
                }
                .to_string(),
            ),
            OutcomeKind::RedHot => Some(
                if text.contains("no longer") {
                    "Cooldown"
                } else {
                    "Red Hot"
                }
                .to_string(),
            ),
            _ => caps.name("Notes").map(|m| capitalize(m.as_str())),
        };

        return Some(OutcomeMatch {
            kind: *kind,
            player1,
            player2,
            team,
            notes,
        });
    }
    None
}

/// Render the `{{GameEvent}}` template invocation for one outcome line.
pub fn render_game_event(
    outcome: &str,
    season: u32,
    day: u32,
    game_id: &str,
    home_team: &str,
    away_team: &str,
) -> String {
    let mut args: Vec<(String, String)> = vec![
        ("Outcome".to_string(), outcome.to_string()),
        ("Season".to_string(), season.to_string()),
        ("Day".to_string(), day.to_string()),
        ("Game".to_string(), game_id.to_string()),
        ("HomeTeam".to_string(), format!("[[{home_team}]]")),
        ("AwayTeam".to_string(), format!("[[{away_team}]]")),
    ];

    match classify_outcome(outcome) {
        Some(matched) => {
            args.push(("Type".to_string(), matched.kind.label().to_string()));
            if let Some(player1) = &matched.player1 {
                args.push(("Player1".to_string(), format!("[[{player1}]]")));
            }
            if let Some(player2) = &matched.player2 {
                args.push(("Player2".to_string(), format!("[[{player2}]]")));
            }
            if let Some(team) = &matched.team {
                args.push(("Player1Team".to_string(), format!("[[{team}]]")));
            }
            if let Some(notes) = &matched.notes {
                args.push(("Notes".to_string(), notes.clone()));
            }
        }
        None => args.push(("Type".to_string(), "Unknown".to_string())),
    }

    let mut rendered = String::from("{{GameEvent");
    for (name, value) in &args {
        rendered.push_str(&format!("\n|{name}={value}"));
    }
    rendered.push_str("\n}}");
    rendered
}

/// The wiki titles team articles without the accent.
fn normalize_team_name(name: &str) -> &str {
    if name == "Dalé" { "Dale" } else { name }
}

// Python-style capitalize: first letter upper, the rest lower.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incineration_captures_both_players() {
        let matched = classify_outcome(
            "Rogue Umpire incinerated Crabs pitcher Tot Fox! Replaced by Sixpack Dogwalker",
        )
        .expect("match");
        assert_eq!(matched.kind, OutcomeKind::Incineration);
        assert_eq!(matched.player1.as_deref(), Some("Tot Fox"));
        assert_eq!(matched.player2.as_deref(), Some("Sixpack Dogwalker"));
    }

    #[test]
    fn shuffle_scope_from_sentence_body() {
        let full = classify_outcome("The Spies were completely shuffled in the Reverb!")
            .expect("match");
        assert_eq!(full.kind, OutcomeKind::Shuffle);
        assert_eq!(full.team.as_deref(), Some("Spies"));
        assert_eq!(full.notes.as_deref(), Some("Full"));

        let rotation = classify_outcome("The Sunbeams had their rotation shuffled in the Reverb!")
            .expect("match");
        assert_eq!(rotation.notes.as_deref(), Some("Rotation"));

        let lineup = classify_outcome("The Tacos had their lineup shuffled in the Reverb!")
            .expect("match");
        assert_eq!(lineup.notes.as_deref(), Some("Lineup"));
    }

    #[test]
    fn feedback_swaps_two_players() {
        let matched =
            classify_outcome("Alyssa Harrell and Hiroto Wilcox switched teams in the feedback!")
                .expect("match");
        assert_eq!(matched.kind, OutcomeKind::Feedback);
        assert_eq!(matched.player1.as_deref(), Some("Alyssa Harrell"));
        assert_eq!(matched.player2.as_deref(), Some("Hiroto Wilcox"));
    }

    #[test]
    fn blooddrain_notes_are_capitalized() {
        let matched = classify_outcome(
            "The Blooddrain gurgled! York Silk siphoned some of Wyatt Glover's hitting ability!",
        )
        .expect("match");
        assert_eq!(matched.kind, OutcomeKind::Blooddrain);
        assert_eq!(matched.notes.as_deref(), Some("Hitting"));
    }

    #[test]
    fn red_hot_toggles_to_cooldown() {
        let hot = classify_outcome("Gia Holbrook is Red Hot!").expect("match");
        assert_eq!(hot.kind, OutcomeKind::RedHot);
        assert_eq!(hot.notes.as_deref(), Some("Red Hot"));

        let cooled = classify_outcome("Gia Holbrook is no longer Red Hot!").expect("match");
        assert_eq!(cooled.notes.as_deref(), Some("Cooldown"));
    }

    #[test]
    fn dale_accent_is_normalized() {
        let matched =
            classify_outcome("The Black Hole swallowed a Win from the Dalé!").expect("match");
        assert_eq!(matched.kind, OutcomeKind::BlackHole);
        assert_eq!(matched.team.as_deref(), Some("Dale"));
    }

    #[test]
    fn sun_2_captures_team() {
        let matched = classify_outcome("Sun 2 set a Win upon the Moist Talkers.").expect("match");
        assert_eq!(matched.kind, OutcomeKind::Sun2);
        assert_eq!(matched.team.as_deref(), Some("Moist Talkers"));
    }

    #[test]
    fn unknown_outcome_is_none() {
        assert!(classify_outcome("The peanut shimmered ominously.").is_none());
    }

    #[test]
    fn render_links_players_and_labels_type() {
        let rendered = render_game_event(
            "Wyatt Mason is Partying!",
            5,
            27,
            "1b2c",
            "Hawai'i Fridays",
            "Hellmouth Sunbeams",
        );
        assert!(rendered.starts_with("{{GameEvent"));
        assert!(rendered.contains("|Type=Party"));
        assert!(rendered.contains("|Player1=[[Wyatt Mason]]"));
        assert!(rendered.contains("|HomeTeam=[[Hawai'i Fridays]]"));
        assert!(rendered.contains("|Season=5"));
        assert!(rendered.ends_with("\n}}"));
    }

    #[test]
    fn render_unknown_outcome_still_emits_template() {
        let rendered =
            render_game_event("Something inexplicable.", 1, 1, "id", "Home", "Away");
        assert!(rendered.contains("|Type=Unknown"));
        assert!(!rendered.contains("|Player1="));
    }
}
