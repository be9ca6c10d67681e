use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read-only view of the doctor record returned by the auth endpoints.
///
/// The record itself is server-owned and stored as-is; this only picks out the
/// fields the app displays. Non-string scalars are rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phonenumber: Option<String>,
    pub nmr_number: Option<String>,
    pub hospital: Option<String>,
    pub specialization: Option<String>,
    pub aboutme: Option<String>,
    pub booked: Option<String>,
    pub bookedby: Option<String>,
}

fn text_field(record: &Value, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Doctor {
    pub fn from_record(record: &Value) -> Self {
        Self {
            name: text_field(record, "name"),
            email: text_field(record, "email"),
            phonenumber: text_field(record, "phonenumber"),
            nmr_number: text_field(record, "nmr_number"),
            hospital: text_field(record, "hospital"),
            specialization: text_field(record, "specialization"),
            aboutme: text_field(record, "aboutme"),
            booked: text_field(record, "booked"),
            bookedby: text_field(record, "bookedby"),
        }
    }

    /// First word of the name, for greetings
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_deref()?.split_whitespace().next()
    }

    /// Avatar letter; `P` when the name is unknown
    pub fn initial(&self) -> char {
        self.name
            .as_deref()
            .and_then(|n| n.chars().next())
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('P')
    }

    pub fn summary(&self) -> String {
        let field = |v: &Option<String>| v.as_deref().unwrap_or("-").to_string();
        format!(
            "Name: {}\nEmail: {}\nPhone: {}\nNMR: {}\nHospital: {}\nSpecialization: {}\nAbout: {}\nBooked: {}\nBooked By: {}",
            field(&self.name),
            field(&self.email),
            field(&self.phonenumber),
            field(&self.nmr_number),
            field(&self.hospital),
            field(&self.specialization),
            field(&self.aboutme),
            field(&self.booked),
            field(&self.bookedby),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_record() {
        let record = json!({
            "_id": "66a1",
            "name": "prieyan kumar",
            "email": "dr.prieyan@herbdoctor.com",
            "phonenumber": 9876543210u64,
            "nmr_number": "NMR-1203",
            "specialization": "Ayurveda",
            "booked": false,
            "bookedby": null
        });
        let doctor = Doctor::from_record(&record);
        assert_eq!(doctor.name.as_deref(), Some("prieyan kumar"));
        assert_eq!(doctor.phonenumber.as_deref(), Some("9876543210"));
        assert_eq!(doctor.booked.as_deref(), Some("false"));
        assert_eq!(doctor.bookedby, None);
        assert_eq!(doctor.hospital, None);
    }

    #[test]
    fn test_first_name_and_initial() {
        let doctor = Doctor::from_record(&json!({"name": "prieyan kumar"}));
        assert_eq!(doctor.first_name(), Some("prieyan"));
        assert_eq!(doctor.initial(), 'P');

        let doctor = Doctor::from_record(&json!({"name": "anita rao"}));
        assert_eq!(doctor.initial(), 'A');

        let unknown = Doctor::default();
        assert_eq!(unknown.first_name(), None);
        assert_eq!(unknown.initial(), 'P');
    }

    #[test]
    fn test_summary_marks_missing_fields() {
        let doctor = Doctor::from_record(&json!({"name": "Anita Rao", "hospital": "City Care"}));
        let summary = doctor.summary();
        assert!(summary.starts_with("Name: Anita Rao\nEmail: -\n"));
        assert!(summary.contains("Hospital: City Care"));
        assert!(summary.ends_with("Booked By: -"));
    }
}
