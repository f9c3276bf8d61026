//! Form input validation.
//!
//! Raw inputs arrive as strings (form posts or JSON bodies). Each
//! `validate_*` function trims, checks and converts them, returning either a
//! typed value or every field error found. Output escaping is left to the
//! rendering layer; inputs are stored as typed.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::inventory::VehicleForm;

/// Earliest accepted model year.
pub const MIN_VEHICLE_YEAR: i32 = 1886;

/// Minimum password length for new passwords.
pub const MIN_PASSWORD_LEN: usize = 12;

/// Largest price the `inv_price NUMERIC(12, 2)` column holds.
pub const MAX_PRICE: f64 = 9_999_999_999.99;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All rule failures for one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.first_message().unwrap_or("Invalid input."))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() { Ok(value()) } else { Err(self) }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|e| e.message.as_str())
    }

    /// Messages, in rule order.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(|e| e.message.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Raw inputs
// ---------------------------------------------------------------------------

/// Accepts a JSON number where a form would send a string.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationInput {
    pub account_firstname: String,
    pub account_lastname: String,
    pub account_email: String,
    pub account_password: String,
    pub account_password_confirm: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginInput {
    pub account_email: String,
    pub account_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountUpdateInput {
    #[serde(deserialize_with = "lenient_string")]
    pub account_id: String,
    pub account_firstname: String,
    pub account_lastname: String,
    pub account_email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PasswordChangeInput {
    #[serde(deserialize_with = "lenient_string")]
    pub account_id: String,
    pub account_password: String,
    pub account_password_confirm: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassificationInput {
    pub classification_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct VehicleInput {
    #[serde(deserialize_with = "lenient_string")]
    pub inv_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub classification_id: String,
    pub inv_make: String,
    pub inv_model: String,
    #[serde(deserialize_with = "lenient_string")]
    pub inv_year: String,
    pub inv_description: String,
    pub inv_image: String,
    pub inv_thumbnail: String,
    #[serde(deserialize_with = "lenient_string")]
    pub inv_price: String,
    #[serde(deserialize_with = "lenient_string")]
    pub inv_miles: String,
    pub inv_color: String,
}

/// Body of the delete and favorite posts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VehicleRef {
    #[serde(deserialize_with = "lenient_string")]
    pub inv_id: String,
    /// Toggle only: `add` or `remove`.
    pub action: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub account_id: i32,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub account_id: i32,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Lower-cased, trimmed email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Minimal structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// 12+ chars with at least one lowercase, uppercase, digit and symbol.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// Parse a strictly positive integer id.
pub fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id >= 1)
}

fn check_name(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
) {
    let len = value.chars().count();
    if len == 0 {
        errors.push(field, format!("{label} is required."));
    } else if len < min || len > 50 {
        errors.push(field, format!("{label} must be {min}-50 characters."));
    }
}

const STRONG_PASSWORD_MSG: &str =
    "Password must be 12+ chars and include upper, lower, number, and symbol.";

fn check_confirm(errors: &mut ValidationErrors, password: &str, confirm: Option<&str>) {
    if let Some(confirm) = confirm.map(str::trim).filter(|c| !c.is_empty())
        && confirm != password
    {
        errors.push("account_password_confirm", "Passwords do not match.");
    }
}

pub fn validate_registration(input: &RegistrationInput) -> Result<Registration, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let firstname = input.account_firstname.trim();
    let lastname = input.account_lastname.trim();
    let email = normalize_email(&input.account_email);
    let password = input.account_password.trim();

    check_name(&mut errors, "account_firstname", "First name", firstname, 2);
    check_name(&mut errors, "account_lastname", "Last name", lastname, 2);

    if email.is_empty() {
        errors.push("account_email", "Email is required.");
    } else if !is_valid_email(&email) {
        errors.push("account_email", "Please enter a valid email.");
    }

    if password.is_empty() {
        errors.push("account_password", "Password is required.");
    } else if !is_strong_password(password) {
        errors.push("account_password", STRONG_PASSWORD_MSG);
    }
    check_confirm(&mut errors, password, input.account_password_confirm.as_deref());

    errors.into_result(|| Registration {
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        email,
        password: password.to_string(),
    })
}

/// Login only checks shape; strength rules do not apply to existing passwords.
pub fn validate_login(input: &LoginInput) -> Result<Login, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let email = normalize_email(&input.account_email);
    let password = input.account_password.trim();

    if !is_valid_email(&email) {
        errors.push("account_email", "Please enter a valid email address.");
    }
    if password.is_empty() {
        errors.push("account_password", "Please enter your password.");
    }

    errors.into_result(|| Login {
        email,
        password: password.to_string(),
    })
}

pub fn validate_account_update(input: &AccountUpdateInput) -> Result<AccountUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let account_id = parse_id(&input.account_id);
    let firstname = input.account_firstname.trim();
    let lastname = input.account_lastname.trim();
    let email = normalize_email(&input.account_email);

    if account_id.is_none() {
        errors.push("account_id", "Invalid account id.");
    }
    check_name(&mut errors, "account_firstname", "First name", firstname, 1);
    check_name(&mut errors, "account_lastname", "Last name", lastname, 2);
    if !is_valid_email(&email) {
        errors.push("account_email", "A valid email is required.");
    }

    errors.into_result(|| AccountUpdate {
        account_id: account_id.unwrap_or_default(),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        email,
    })
}

pub fn validate_password_change(
    input: &PasswordChangeInput,
) -> Result<PasswordChange, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let account_id = parse_id(&input.account_id);
    let password = input.account_password.trim();

    if account_id.is_none() {
        errors.push("account_id", "Invalid account id.");
    }
    if password.is_empty() {
        errors.push("account_password", "Please enter a new password.");
    } else if !is_strong_password(password) {
        errors.push("account_password", STRONG_PASSWORD_MSG);
    }
    check_confirm(&mut errors, password, input.account_password_confirm.as_deref());

    errors.into_result(|| PasswordChange {
        account_id: account_id.unwrap_or_default(),
        password: password.to_string(),
    })
}

/// Letters only, at least two of them.
pub fn validate_classification(input: &ClassificationInput) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let name = input.classification_name.trim();

    if name.is_empty() {
        errors.push("classification_name", "Please provide a classification name.");
    } else if name.chars().count() < 2 {
        errors.push(
            "classification_name",
            "Classification name must be at least 2 characters.",
        );
    } else if !name.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.push(
            "classification_name",
            "Letters only (no spaces or special characters).",
        );
    }

    errors.into_result(|| name.to_string())
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    missing: &str,
    max: Option<(usize, &str)>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, missing);
    } else if let Some((max, too_long)) = max
        && value.chars().count() > max
    {
        errors.push(field, too_long);
    }
    value.to_string()
}

/// Vehicle rules for add and update. `current_year` bounds the model year.
pub fn validate_vehicle(input: &VehicleInput, current_year: i32) -> Result<VehicleForm, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let classification_id = input.classification_id.trim();
    let classification_id = if classification_id.is_empty() {
        errors.push("classification_id", "Please choose a classification.");
        0
    } else {
        parse_id(classification_id).unwrap_or_else(|| {
            errors.push("classification_id", "Classification is invalid.");
            0
        })
    };

    let make = required_text(
        &mut errors,
        "inv_make",
        &input.inv_make,
        "Please provide a make.",
        Some((50, "Make must be 50 characters or fewer.")),
    );
    let model = required_text(
        &mut errors,
        "inv_model",
        &input.inv_model,
        "Please provide a model.",
        Some((50, "Model must be 50 characters or fewer.")),
    );

    let max_year = current_year + 1;
    let year = match input.inv_year.trim() {
        "" => {
            errors.push("inv_year", "Please provide a year.");
            0
        }
        raw => match raw.parse::<i32>() {
            Ok(y) if (MIN_VEHICLE_YEAR..=max_year).contains(&y) => y,
            _ => {
                errors.push(
                    "inv_year",
                    format!("Year must be a 4-digit year between {MIN_VEHICLE_YEAR} and {max_year}."),
                );
                0
            }
        },
    };

    let description = input.inv_description.trim();
    if description.is_empty() {
        errors.push("inv_description", "Please provide a description.");
    } else if description.chars().count() < 5 {
        errors.push("inv_description", "Description must be at least 5 characters.");
    }

    let image = required_text(
        &mut errors,
        "inv_image",
        &input.inv_image,
        "Please provide an image path (e.g., /images/vehicles/no-image.png).",
        None,
    );
    let thumbnail = required_text(
        &mut errors,
        "inv_thumbnail",
        &input.inv_thumbnail,
        "Please provide a thumbnail path (e.g., /images/vehicles/no-image-tn.png).",
        None,
    );

    let price = match input.inv_price.trim() {
        "" => {
            errors.push("inv_price", "Please provide a price.");
            0.0
        }
        raw => match raw.parse::<f64>() {
            Ok(p) if p.is_finite() && (0.0..=MAX_PRICE).contains(&p) => p,
            _ => {
                errors.push("inv_price", "Price must be a positive number.");
                0.0
            }
        },
    };

    let miles = match input.inv_miles.trim() {
        "" => {
            errors.push("inv_miles", "Please provide mileage.");
            0
        }
        raw => match raw.parse::<i32>() {
            Ok(m) if m >= 0 => m,
            _ => {
                errors.push("inv_miles", "Mileage must be zero or greater.");
                0
            }
        },
    };

    let color = required_text(
        &mut errors,
        "inv_color",
        &input.inv_color,
        "Please provide a color.",
        Some((30, "Color must be 30 characters or fewer.")),
    );

    errors.into_result(|| VehicleForm {
        make,
        model,
        year,
        description: description.to_string(),
        image,
        thumbnail,
        price,
        miles,
        color,
        classification_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationInput {
        RegistrationInput {
            account_firstname: "  Basic ".into(),
            account_lastname: "Client".into(),
            account_email: " Basic@340.EDU ".into(),
            account_password: "I@mABas1cCl!3nt".into(),
            account_password_confirm: None,
        }
    }

    fn vehicle() -> VehicleInput {
        VehicleInput {
            inv_id: String::new(),
            classification_id: "2".into(),
            inv_make: "Jeep".into(),
            inv_model: "Wrangler".into(),
            inv_year: "2019".into(),
            inv_description: "The Jeep Wrangler is small and compact.".into(),
            inv_image: "/images/vehicles/wrangler.jpg".into(),
            inv_thumbnail: "/images/vehicles/wrangler-tn.jpg".into(),
            inv_price: "28045".into(),
            inv_miles: "41205".into(),
            inv_color: "Yellow".into(),
        }
    }

    #[test]
    fn registration_normalizes_fields() {
        let ok = validate_registration(&registration()).unwrap();
        assert_eq!(ok.firstname, "Basic");
        assert_eq!(ok.email, "basic@340.edu");
    }

    #[test]
    fn registration_rejects_weak_password_and_mismatch() {
        let mut input = registration();
        input.account_password = "password".into();
        input.account_password_confirm = Some("different".into());
        let errs = validate_registration(&input).unwrap_err();
        let fields: Vec<_> = errs.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, ["account_password", "account_password_confirm"]);
    }

    #[test]
    fn registration_reports_every_missing_field() {
        let errs = validate_registration(&RegistrationInput::default()).unwrap_err();
        assert_eq!(errs.errors().len(), 4);
        assert_eq!(errs.first_message(), Some("First name is required."));
        assert_eq!(errs.to_string(), "First name is required.");
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b..co"));
    }

    #[test]
    fn strong_password_rules() {
        assert!(is_strong_password("I@mABas1cCl!3nt"));
        assert!(!is_strong_password("Sh0rt!a"));
        assert!(!is_strong_password("alllowercase1!x"));
        assert!(!is_strong_password("NoDigitsHere!!x"));
        assert!(!is_strong_password("NoSymbols123abc"));
    }

    #[test]
    fn login_does_not_apply_strength_rules() {
        let ok = validate_login(&LoginInput {
            account_email: "USER@example.com".into(),
            account_password: "x".into(),
        })
        .unwrap();
        assert_eq!(ok.email, "user@example.com");
    }

    #[test]
    fn classification_letters_only() {
        let ok = |n: &str| {
            validate_classification(&ClassificationInput {
                classification_name: n.into(),
            })
        };
        assert_eq!(ok(" Custom ").unwrap(), "Custom");
        assert!(ok("A").is_err());
        assert!(ok("Mini Van").is_err());
        assert!(ok("").is_err());
    }

    #[test]
    fn vehicle_valid() {
        let form = validate_vehicle(&vehicle(), 2026).unwrap();
        assert_eq!(form.classification_id, 2);
        assert_eq!(form.year, 2019);
        assert_eq!(form.price, 28045.0);
    }

    #[test]
    fn vehicle_year_bounds() {
        let mut input = vehicle();
        input.inv_year = "2028".into();
        let errs = validate_vehicle(&input, 2026).unwrap_err();
        assert_eq!(
            errs.first_message(),
            Some("Year must be a 4-digit year between 1886 and 2027.")
        );
        input.inv_year = "2027".into();
        assert!(validate_vehicle(&input, 2026).is_ok());
    }

    #[test]
    fn vehicle_numeric_fields() {
        let mut input = vehicle();
        input.inv_price = "-1".into();
        input.inv_miles = "lots".into();
        input.classification_id = "0".into();
        let errs = validate_vehicle(&input, 2026).unwrap_err();
        let fields: Vec<_> = errs.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, ["classification_id", "inv_price", "inv_miles"]);

        // Larger than the NUMERIC(12, 2) column holds.
        let mut input = vehicle();
        input.inv_price = "1e15".into();
        let errs = validate_vehicle(&input, 2026).unwrap_err();
        let fields: Vec<_> = errs.errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, ["inv_price"]);

        input.inv_price = "9999999999.99".into();
        assert!(validate_vehicle(&input, 2026).is_ok());
    }

    #[test]
    fn numeric_json_fields_are_accepted() {
        let input: VehicleRef = serde_json::from_value(serde_json::json!({"inv_id": 12})).unwrap();
        assert_eq!(parse_id(&input.inv_id), Some(12));
        let input: VehicleInput =
            serde_json::from_value(serde_json::json!({"inv_price": 199.5, "inv_year": "2020"})).unwrap();
        assert_eq!(input.inv_price, "199.5");
        assert_eq!(input.inv_year, "2020");
        assert_eq!(input.inv_make, "");
    }

    #[test]
    fn parse_id_requires_positive() {
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("x"), None);
    }
}
