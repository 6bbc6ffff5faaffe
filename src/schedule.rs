//! # Schedule: Read-Only Pass-Through to the MLB Stats API
//!
//! Two lookups the lobby UI uses to pick a real game to play along with:
//! the day's schedule and the latest pitch of a live game. Nothing in the
//! session core depends on this module.
//!
//! Parsing is split from fetching so the JSON shapes can be tested without
//! the network.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    BadDate(String),
    #[error("game {0} not found")]
    GameNotFound(u64),
    #[error("schedule provider error: {0}")]
    Provider(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledGame {
    /// Position in the provider's response.
    pub id: usize,
    pub game_id: u64,
    pub home_team: String,
    pub away_team: String,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePitch {
    pub is_pitch: Option<bool>,
    pub strike: Option<bool>,
    pub ball: Option<bool>,
    pub pitch_x_location: Option<f64>,
    pub pitch_y_location: Option<f64>,
    pub count: Option<Value>,
    pub state: Option<String>,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ScheduleError::BadDate(raw.to_string()))
}

/// Flatten `dates[].games[]` into schedule rows. Games missing a `gamePk`
/// are skipped.
pub fn parse_schedule(body: &Value) -> Vec<ScheduledGame> {
    let games = body["dates"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|d| d["games"].as_array())
        .flatten();

    let text = |v: &Value| v.as_str().unwrap_or_default().to_string();
    games
        .filter_map(|g| {
            let game_id = g["gamePk"].as_u64()?;
            let start_time = g["gameDate"]
                .as_str()
                .and_then(|d| d.split_once('T'))
                .map(|(_, time)| time.to_string())
                .unwrap_or_default();
            Some((game_id, g, start_time))
        })
        .enumerate()
        .map(|(id, (game_id, g, start_time))| ScheduledGame {
            id,
            game_id,
            home_team: text(&g["teams"]["home"]["team"]["name"]),
            away_team: text(&g["teams"]["away"]["team"]["name"]),
            start_time,
        })
        .collect()
}

/// Summarize the last event of the current play.
pub fn parse_live(body: &Value) -> LivePitch {
    let state = body["gameData"]["status"]["abstractGameState"]
        .as_str()
        .map(str::to_string);
    let play = &body["liveData"]["plays"]["currentPlay"];
    let Some(event) = play["playEvents"].as_array().and_then(|e| e.last()) else {
        return LivePitch {
            is_pitch: None,
            strike: None,
            ball: None,
            pitch_x_location: None,
            pitch_y_location: None,
            count: None,
            state,
        };
    };

    let is_pitch = event["isPitch"].as_bool().unwrap_or(false);
    if !is_pitch {
        // Pickoffs, mound visits and the like carry no location.
        return LivePitch {
            is_pitch: Some(false),
            strike: Some(false),
            ball: Some(false),
            pitch_x_location: None,
            pitch_y_location: None,
            count: None,
            state,
        };
    }
    let coords = &event["pitchData"]["coordinates"];
    LivePitch {
        is_pitch: Some(true),
        strike: event["details"]["isStrike"].as_bool(),
        ball: event["details"]["isBall"].as_bool(),
        pitch_x_location: coords["x"].as_f64(),
        pitch_y_location: coords["y"].as_f64(),
        count: play.get("count").cloned(),
        state,
    }
}

pub struct ScheduleClient {
    base_url: String,
    http: reqwest::Client,
}

impl ScheduleClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ScheduleError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(ScheduleClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_schedule(&self, date: NaiveDate) -> Result<Vec<ScheduledGame>, ScheduleError> {
        let url = format!("{}/api/v1/schedule", self.base_url);
        let body: Value = self
            .http
            .get(&url)
            .query(&[("date", date.format("%Y-%m-%d").to_string()), ("sportId", "1".into())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(parse_schedule(&body))
    }

    pub async fn fetch_live(&self, game_pk: u64) -> Result<LivePitch, ScheduleError> {
        let url = format!("{}/api/v1.1/game/{}/feed/live", self.base_url, game_pk);
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ScheduleError::GameNotFound(game_pk));
        }
        let body: Value = response.error_for_status()?.json().await?;
        Ok(parse_live(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schedule_fixture() -> Value {
        json!({
            "totalGames": 3,
            "dates": [
                {"date": "2025-03-14", "games": [
                    {"gamePk": 778899, "gameDate": "2025-03-14T17:05:00Z",
                     "teams": {"home": {"team": {"name": "Boston Red Sox"}},
                               "away": {"team": {"name": "New York Yankees"}}}},
                    {"gamePk": 778900, "gameDate": "2025-03-14T23:10:00Z",
                     "teams": {"home": {"team": {"name": "Chicago Cubs"}},
                               "away": {"team": {"name": "San Diego Padres"}}}}
                ]},
                {"date": "2025-03-15", "games": [
                    {"gameDate": "2025-03-15T18:00:00Z"}
                ]}
            ]
        })
    }

    #[test]
    fn schedule_rows_are_indexed_and_trimmed_to_time() {
        let rows = parse_schedule(&schedule_fixture());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 0);
        assert_eq!(rows[0].game_id, 778899);
        assert_eq!(rows[0].home_team, "Boston Red Sox");
        assert_eq!(rows[0].start_time, "17:05:00Z");
        assert_eq!(rows[1].id, 1);
        assert_eq!(rows[1].away_team, "San Diego Padres");
    }

    #[test]
    fn empty_schedule() {
        assert!(parse_schedule(&json!({"totalGames": 0})).is_empty());
        assert!(parse_schedule(&json!({"dates": []})).is_empty());
    }

    #[test]
    fn schedule_row_wire_names() {
        let row = &parse_schedule(&schedule_fixture())[0];
        let v = serde_json::to_value(row).unwrap();
        assert_eq!(v["gameId"], 778899);
        assert_eq!(v["homeTeam"], "Boston Red Sox");
        assert_eq!(v["startTime"], "17:05:00Z");
    }

    #[test]
    fn live_pitch_reads_last_event() {
        let body = json!({
            "gameData": {"status": {"abstractGameState": "Live"}},
            "liveData": {"plays": {"currentPlay": {
                "count": {"balls": 1, "strikes": 2, "outs": 0},
                "playEvents": [
                    {"isPitch": true, "details": {"isStrike": false, "isBall": true},
                     "pitchData": {"coordinates": {"x": 90.1, "y": 170.4}}},
                    {"isPitch": true, "details": {"isStrike": true, "isBall": false},
                     "pitchData": {"coordinates": {"x": 117.3, "y": 188.0}}}
                ]
            }}}
        });
        let live = parse_live(&body);
        assert_eq!(live.is_pitch, Some(true));
        assert_eq!(live.strike, Some(true));
        assert_eq!(live.ball, Some(false));
        assert_eq!(live.pitch_x_location, Some(117.3));
        assert_eq!(live.count.unwrap()["strikes"], 2);
        assert_eq!(live.state.as_deref(), Some("Live"));
    }

    #[test]
    fn live_without_events_is_all_null() {
        let body = json!({
            "gameData": {"status": {"abstractGameState": "Preview"}},
            "liveData": {"plays": {"currentPlay": {"playEvents": []}}}
        });
        let v = serde_json::to_value(parse_live(&body)).unwrap();
        assert!(v["isPitch"].is_null());
        assert!(v["pitchXLocation"].is_null());
        assert_eq!(v["state"], "Preview");
    }

    #[test]
    fn non_pitch_event_has_no_location() {
        let body = json!({
            "liveData": {"plays": {"currentPlay": {"playEvents": [{"isPitch": false}]}}}
        });
        let live = parse_live(&body);
        assert_eq!(live.is_pitch, Some(false));
        assert_eq!(live.strike, Some(false));
        assert_eq!(live.pitch_y_location, None);
        assert_eq!(live.state, None);
    }

    #[test]
    fn date_parsing() {
        assert!(parse_date("2025-03-14").is_ok());
        assert!(matches!(parse_date("03/14/2025"), Err(ScheduleError::BadDate(_))));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let c = ScheduleClient::new("http://localhost:9/", Duration::from_secs(1)).unwrap();
        assert_eq!(c.base_url(), "http://localhost:9");
    }
}
