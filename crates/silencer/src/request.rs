use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::SilenceDuration;

/// How far in the future a silence starts.
pub static START_DELAY_SECONDS: i64 = 2 * 60;

/// The label a silence matches on.
pub static ALERTNAME_LABEL: &str = "alertname";

/// Present in the silencing API's response when a silence was created.
pub static SUCCESS_MARKER: &str = "silenceID";

/// Body of a `POST /api/v2/silences` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilenceRequest {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_by: String,
    pub comment: String,
    pub matchers: Vec<Matcher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub name: String,
    pub value: String,
    pub is_regex: bool,
    pub is_equal: bool,
}

impl SilenceRequest {
    /// A silence of exactly `alert`, starting shortly after `now`.
    pub fn new(
        alert: &str,
        duration: SilenceDuration,
        now: DateTime<Utc>,
        created_by: String,
        comment: String,
    ) -> Self {
        let starts_at = now.trunc_subsecs(0) + TimeDelta::seconds(START_DELAY_SECONDS);
        let ends_at = starts_at + duration.as_time_delta();

        Self {
            starts_at,
            ends_at,
            created_by,
            comment,
            matchers: vec![Matcher {
                name: ALERTNAME_LABEL.to_owned(),
                value: alert.to_owned(),
                is_regex: false,
                is_equal: true,
            }],
        }
    }
}

/// Comment used when the operator does not give one.
pub fn default_comment(alert: &str, duration: SilenceDuration) -> String {
    format!("silence {alert} for {duration}")
}

/// Address of the silencing API behind a service.
pub fn silences_url(service: &str, namespace: &str, port: u16) -> String {
    format!("http://{service}.{namespace}.svc:{port}/api/v2/silences")
}

///////////////////////////////////////////////////////////////////////////////

/// What the silencing API said, judged from the pod's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The silence was created.  The ID is known if the response parsed.
    Accepted { silence_id: Option<String> },
    Rejected,
}

#[derive(Debug, Deserialize)]
struct SilenceResponse {
    #[serde(rename = "silenceID")]
    silence_id: String,
}

/// Judge the output of the request pod.
pub fn inspect(output: &str) -> Outcome {
    for line in output.lines() {
        if let Ok(response) = serde_json::from_str::<SilenceResponse>(line.trim()) {
            return Outcome::Accepted {
                silence_id: Some(response.silence_id),
            };
        }
    }

    if output.contains(SUCCESS_MARKER) {
        Outcome::Accepted { silence_id: None }
    } else {
        Outcome::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::str::FromStr;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + TimeDelta::milliseconds(250)
    }

    #[test]
    fn request_shape() {
        let request = SilenceRequest::new(
            "HighCPU",
            SilenceDuration::from_str("30M").unwrap(),
            now(),
            "alice".to_owned(),
            "maintenance".to_owned(),
        );

        assert_eq!(
            json!({
                "startsAt": "2024-05-01T12:02:00Z",
                "endsAt": "2024-05-01T12:32:00Z",
                "createdBy": "alice",
                "comment": "maintenance",
                "matchers": [{
                    "name": "alertname",
                    "value": "HighCPU",
                    "isRegex": false,
                    "isEqual": true,
                }],
            }),
            serde_json::to_value(&request).unwrap()
        );
    }

    #[test]
    fn ends_after_duration() {
        for input in ["0S", "1S", "90M", "12H", "876000H"] {
            let duration = SilenceDuration::from_str(input).unwrap();
            let request =
                SilenceRequest::new("A", duration, now(), String::new(), String::new());
            assert_eq!(
                duration.as_seconds() as i64,
                (request.ends_at - request.starts_at).num_seconds(),
                "{input}"
            );
            assert_eq!(
                START_DELAY_SECONDS,
                (request.starts_at - now().trunc_subsecs(0)).num_seconds()
            );
        }
    }

    #[test]
    fn url() {
        assert_eq!(
            "http://alertmanager.monitoring.svc:9093/api/v2/silences",
            silences_url("alertmanager", "monitoring", 9093)
        );
    }

    #[test]
    fn inspect_parsed_response() {
        assert_eq!(
            Outcome::Accepted {
                silence_id: Some("6b3f5c1e".to_owned())
            },
            inspect("{\"silenceID\":\"6b3f5c1e\"}")
        );
        assert_eq!(
            Outcome::Accepted {
                silence_id: Some("abc".to_owned())
            },
            inspect("some preamble\n  {\"silenceID\": \"abc\"}  \n")
        );
    }

    #[test]
    fn inspect_falls_back_to_marker() {
        assert_eq!(
            Outcome::Accepted { silence_id: None },
            inspect("silenceID: abc")
        );
    }

    #[test]
    fn inspect_rejection() {
        assert_eq!(Outcome::Rejected, inspect(""));
        assert_eq!(
            Outcome::Rejected,
            inspect("{\"code\":400,\"message\":\"start time must be before end time\"}")
        );
        assert_eq!(
            Outcome::Rejected,
            inspect("curl: (6) Could not resolve host: alertmanager.default.svc")
        );
    }
}
