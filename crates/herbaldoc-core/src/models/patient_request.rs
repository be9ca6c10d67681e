use serde::{Deserialize, Serialize};

use crate::utils::format_date;

/// A patient's consultation request, as sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "appointmentId")]
    pub appointment_id: Option<String>,
    #[serde(rename = "doctorName")]
    pub doctor_name: Option<String>,
    #[serde(rename = "doctorPhoneNumber")]
    pub doctor_phone_number: Option<String>,
    #[serde(rename = "patientName")]
    pub patient_name: Option<String>,
    #[serde(rename = "patientPhoneNumber")]
    pub patient_phone_number: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "reqTime")]
    pub req_time: Option<String>,
    #[serde(rename = "acceptTime")]
    pub accept_time: Option<String>,
}

/// Envelope of `GET doctor/patient-requests`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientRequestsResponse {
    #[serde(default)]
    pub data: Option<Vec<PatientRequest>>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Other,
}

impl RequestStatus {
    pub fn parse(status: Option<&str>) -> Self {
        match status.map(str::to_lowercase).as_deref() {
            Some("pending") => RequestStatus::Pending,
            Some("accepted") => RequestStatus::Accepted,
            Some("rejected") => RequestStatus::Rejected,
            _ => RequestStatus::Other,
        }
    }

    pub fn priority(self) -> Priority {
        match self {
            RequestStatus::Pending => Priority::High,
            RequestStatus::Accepted => Priority::Medium,
            RequestStatus::Rejected | RequestStatus::Other => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::Low => write!(f, "LOW"),
        }
    }
}

impl PatientRequest {
    pub fn request_status(&self) -> RequestStatus {
        RequestStatus::parse(self.status.as_deref())
    }

    pub fn priority(&self) -> Priority {
        self.request_status().priority()
    }

    pub fn requested_at_display(&self) -> String {
        self.req_time.as_deref().map(format_date).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requests_response() {
        let json = r#"{"data": [{"_id": "6650","appointmentId": "APT-1001","doctorName": "Dr. Prieyan","doctorPhoneNumber": "9876543210","patientName": "Meena","patientPhoneNumber": "9123456780","status": "Pending","reqTime": "2025-06-02T09:30:00Z"}]}"#;

        let resp: PatientRequestsResponse =
            serde_json::from_str(json).expect("Failed to parse patient requests test JSON");
        let requests = resp.data.unwrap_or_default();
        assert_eq!(requests.len(), 1);

        let r = &requests[0];
        assert_eq!(r.id.as_deref(), Some("6650"));
        assert_eq!(r.patient_name.as_deref(), Some("Meena"));
        assert_eq!(r.accept_time, None);
        assert_eq!(r.request_status(), RequestStatus::Pending);
        assert_eq!(r.priority(), Priority::High);
        assert_eq!(r.requested_at_display(), "Jun 02, 2025");
    }

    #[test]
    fn test_missing_data_field() {
        let resp: PatientRequestsResponse = serde_json::from_str(r#"{"message": "ok"}"#).unwrap();
        assert!(resp.data.is_none());
    }

    #[test]
    fn test_status_priority() {
        assert_eq!(RequestStatus::parse(Some("ACCEPTED")).priority(), Priority::Medium);
        assert_eq!(RequestStatus::parse(Some("rejected")).priority(), Priority::Low);
        assert_eq!(RequestStatus::parse(Some("on-hold")), RequestStatus::Other);
        assert_eq!(RequestStatus::parse(None).priority(), Priority::Low);
        assert_eq!(Priority::High.to_string(), "HIGH");
    }
}
