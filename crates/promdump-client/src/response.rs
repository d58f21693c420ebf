// Prometheus /api/v1/query response envelope
//
// {"status": "success", "data": {"resultType": "matrix", "result": [...]}, "warnings": [...]}
// {"status": "error", "errorType": "bad_data", "error": "..."}

use promdump_core::{QueryValue, ValueType};
use serde::Deserialize;

use crate::error::{ClientError, Result};

const MAX_BODY_IN_ERROR: usize = 512;

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: ValueType,
    pub result: serde_json::Value,
}

/// Decoded successful response
#[derive(Debug)]
pub(crate) struct Decoded {
    pub value: QueryValue,
    pub warnings: Vec<String>,
}

/// Decode a response body, using the HTTP status only when the body is not an API envelope.
pub(crate) fn decode(status: u16, body: &[u8]) -> Result<Decoded> {
    let response: QueryResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(e) if (200..300).contains(&status) => return Err(ClientError::Decode(e.to_string())),
        Err(_) => {
            return Err(ClientError::Status {
                status,
                body: truncate(&String::from_utf8_lossy(body)),
            })
        }
    };

    if response.status != "success" {
        return Err(ClientError::Api {
            error_type: response.error_type.unwrap_or_else(|| "unknown".to_string()),
            message: response.error.unwrap_or_default(),
        });
    }

    let data = response
        .data
        .ok_or_else(|| ClientError::Decode("response has no data".to_string()))?;
    let value = QueryValue::from_json(data.result_type, data.result)
        .map_err(|e| ClientError::Decode(format!("{} result: {}", data.result_type, e)))?;

    Ok(Decoded {
        value,
        warnings: response.warnings,
    })
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_BODY_IN_ERROR {
        return body.to_string();
    }
    let mut end = MAX_BODY_IN_ERROR;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use promdump_core::SamplePair;

    #[test]
    fn decodes_matrix() {
        let body = br#"{
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [
                    {"metric": {"__name__": "up", "job": "node"}, "values": [[1700000000, "1"], [1700000015, "0"]]},
                    {"metric": {"__name__": "up", "job": "api"}, "values": [[1700000000, "1"]]}
                ]
            }
        }"#;

        let decoded = decode(200, body).unwrap();
        let QueryValue::Matrix(series) = decoded.value else {
            panic!("expected matrix");
        };
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].labels["job"], "node");
        assert_eq!(
            series[0].points,
            vec![
                SamplePair::new(1_700_000_000_000, 1.0),
                SamplePair::new(1_700_000_015_000, 0.0)
            ]
        );
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn decodes_other_result_types() {
        let body = br#"{"status":"success","data":{"resultType":"vector","result":[{"metric":{},"value":[1,"2"]}]}}"#;
        assert_eq!(decode(200, body).unwrap().value.value_type(), ValueType::Vector);

        let body = br#"{"status":"success","data":{"resultType":"scalar","result":[1,"2"]}}"#;
        assert_eq!(decode(200, body).unwrap().value.value_type(), ValueType::Scalar);
    }

    #[test]
    fn keeps_warnings() {
        let body = br#"{"status":"success","data":{"resultType":"matrix","result":[]},"warnings":["partial response"]}"#;
        let decoded = decode(200, body).unwrap();
        assert_eq!(decoded.warnings, vec!["partial response".to_string()]);
        assert_eq!(decoded.value, QueryValue::Matrix(vec![]));
    }

    #[test]
    fn api_errors_win_over_http_status() {
        let body = br#"{"status":"error","errorType":"bad_data","error":"parse error at char 4"}"#;
        match decode(400, body) {
            Err(ClientError::Api {
                error_type,
                message,
            }) => {
                assert_eq!(error_type, "bad_data");
                assert_eq!(message, "parse error at char 4");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn non_json_bodies() {
        assert!(matches!(
            decode(502, b"<html>Bad Gateway</html>"),
            Err(ClientError::Status { status: 502, .. })
        ));
        assert!(matches!(
            decode(200, b"not json"),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2048);
        let truncated = truncate(&body);
        assert_eq!(truncated.len(), MAX_BODY_IN_ERROR + 3);
    }
}
