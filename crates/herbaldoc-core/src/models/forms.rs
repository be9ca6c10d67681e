use serde::Serialize;

use crate::api::ApiError;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(ApiError::validation("Please enter both email and password"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub nmr_number: String,
    pub password: String,
    pub specialization: String,
    pub about_me: String,
}

impl SignupForm {
    /// Wire names of required fields that are empty, in form order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("phoneNumber", &self.phone_number),
            ("email", &self.email),
            ("nmrNumber", &self.nmr_number),
            ("password", &self.password),
            ("specialization", &self.specialization),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ApiError::validation(format!(
                "Please fill in: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;

    fn complete_signup() -> SignupForm {
        SignupForm {
            name: "Anita Rao".to_string(),
            phone_number: "9876543210".to_string(),
            email: "anita@herbdoctor.com".to_string(),
            nmr_number: "NMR-1203".to_string(),
            password: "secret".to_string(),
            specialization: "Ayurveda".to_string(),
            about_me: String::new(),
        }
    }

    #[test]
    fn test_login_validation() {
        assert!(LoginForm::new("a@b.com", "pw").validate().is_ok());

        let err = LoginForm::new("a@b.com", "").validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Please enter both email and password");
    }

    #[test]
    fn test_signup_missing_fields() {
        assert!(complete_signup().validate().is_ok());

        let form = SignupForm {
            phone_number: String::new(),
            specialization: String::new(),
            ..complete_signup()
        };
        assert_eq!(form.missing_fields(), vec!["phoneNumber", "specialization"]);
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Please fill in: phoneNumber, specialization"
        );
    }

    #[test]
    fn test_signup_serializes_camel_case() {
        let value = serde_json::to_value(complete_signup()).unwrap();
        assert_eq!(value["phoneNumber"], "9876543210");
        assert_eq!(value["nmrNumber"], "NMR-1203");
        assert_eq!(value["aboutMe"], "");
    }
}
