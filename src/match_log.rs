use serde_json::Value;

/// One recorded delivery of the first innings. Wides and no-balls appear as
/// ordinary entries in the source format, so they are deliveries here too.
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    pub batter: Option<String>,
    pub non_striker: Option<String>,
    pub runs_total: u32,
    pub wickets: u32,
}

/// First-innings view of one ball-by-ball match file.
#[derive(Debug, Clone)]
pub struct MatchRecord {
    pub venue: String,
    pub city: Option<String>,
    pub match_date: String,
    pub batting_team: String,
    pub bowling_team: String,
    pub batting_roster: Vec<String>,
    pub bowling_roster: Vec<String>,
    pub deliveries: Vec<Delivery>,
}

impl MatchRecord {
    /// Total runs across every recorded delivery. A zero here marks the match
    /// as unusable downstream.
    pub fn final_score(&self) -> u32 {
        self.deliveries.iter().map(|d| d.runs_total).sum()
    }
}

/// Parse one match document. Returns None for anything that cannot yield a
/// usable first innings: invalid json, missing `info`/`innings`, or a
/// `players` map with other than exactly two teams.
pub fn parse_match_json(raw: &str) -> Option<MatchRecord> {
    let value = serde_json::from_str::<Value>(raw).ok()?;
    parse_match_value(&value)
}

pub fn parse_match_value(value: &Value) -> Option<MatchRecord> {
    let info = value.get("info")?;
    let first_innings = value.get("innings")?.as_array()?.first()?;

    let venue = info
        .get("venue")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let city = info
        .get("city")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .or_else(|| Some(venue.split(',').next().unwrap_or(&venue).trim().to_string()));
    let match_date = info
        .get("dates")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();

    let players = info.get("players")?.as_object()?;
    if players.len() != 2 {
        return None;
    }

    let batting_team = first_innings
        .get("team")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let bowling_team = players
        .keys()
        .find(|team| **team != batting_team)
        .cloned()?;

    let batting_roster = roster_names(players.get(&batting_team));
    let bowling_roster = roster_names(players.get(&bowling_team));

    let mut deliveries = Vec::new();
    if let Some(overs) = first_innings.get("overs").and_then(|v| v.as_array()) {
        for over in overs {
            let Some(balls) = over.get("deliveries").and_then(|v| v.as_array()) else {
                continue;
            };
            for ball in balls {
                deliveries.push(parse_delivery(ball));
            }
        }
    }

    Some(MatchRecord {
        venue,
        city,
        match_date,
        batting_team,
        bowling_team,
        batting_roster,
        bowling_roster,
        deliveries,
    })
}

fn parse_delivery(ball: &Value) -> Delivery {
    let batter = ball
        .get("batter")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let non_striker = ball
        .get("non_striker")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());
    let runs_total = ball
        .get("runs")
        .and_then(|v| v.get("total"))
        .and_then(as_u32_any)
        .unwrap_or(0);
    let wickets = ball
        .get("wickets")
        .and_then(|v| v.as_array())
        .map(|arr| arr.len() as u32)
        .unwrap_or(0);

    Delivery {
        batter,
        non_striker,
        runs_total,
        wickets,
    }
}

fn roster_names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).ok();
    }
    if let Some(f) = v.as_f64()
        && f >= 0.0
    {
        return Some(f as u32);
    }
    v.as_str()?.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_garbage_do_not_parse() {
        assert!(parse_match_json("null").is_none());
        assert!(parse_match_json("not json").is_none());
        assert!(parse_match_json(r#"{"info": {}}"#).is_none());
    }

    #[test]
    fn three_team_players_map_is_rejected() {
        let raw = r#"{
            "info": {"venue": "V", "players": {"A": [], "B": [], "C": []}},
            "innings": [{"team": "A", "overs": []}]
        }"#;
        assert!(parse_match_json(raw).is_none());
    }

    #[test]
    fn wicket_count_and_runs_accumulate_per_delivery() {
        let raw = r#"{
            "info": {"venue": "V", "players": {"A": ["a1"], "B": ["b1"]}},
            "innings": [{"team": "A", "overs": [{"deliveries": [
                {"batter": "a1", "non_striker": "a2", "runs": {"total": 4}},
                {"batter": "a1", "non_striker": "a2", "runs": {"total": 0},
                 "wickets": [{"kind": "bowled"}, {"kind": "run out"}]}
            ]}]}]
        }"#;
        let rec = parse_match_json(raw).expect("should parse");
        assert_eq!(rec.deliveries.len(), 2);
        assert_eq!(rec.deliveries[0].runs_total, 4);
        assert_eq!(rec.deliveries[1].wickets, 2);
        assert_eq!(rec.final_score(), 4);
        assert_eq!(rec.bowling_team, "B");
    }
}
