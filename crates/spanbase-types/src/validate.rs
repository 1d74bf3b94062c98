//! Request validation.
//!
//! Every request passes through here before any storage call is made. A
//! refusal carries the offending input and one of the stable
//! [`ValidationReason`] messages.

use bytes::Bytes;

use crate::error::{ValidationError, ValidationReason};
use crate::field::FieldValue;
use crate::target::Target;

/// Longest accepted textual target, in characters.
pub const MAX_TARGET_LEN: usize = 10;

/// A validated read-side request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Query {
    /// No target given: list the most recent objects.
    ListRecent,
    /// Reassemble one object.
    Read(Target),
}

/// A validated upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    pub text: String,
    /// `None` when no attachment was supplied; the object is stored with `len == 0`.
    pub payload: Option<Bytes>,
}

impl Upload {
    /// Total payload length the object will be allocated with.
    pub fn len(&self) -> u64 {
        self.payload.as_ref().map_or(0, |p| p.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a textual target.
///
/// Accepts 1 to [`MAX_TARGET_LEN`] ASCII digits. Checks run in a fixed order
/// (length, digits, numeric range) so the reported reason is deterministic.
pub fn validate_target(input: &str) -> Result<Target, ValidationError> {
    if input.chars().count() > MAX_TARGET_LEN {
        return Err(ValidationError::new(ValidationReason::TargetTooLong, input));
    }
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::new(ValidationReason::TargetNotDigits, input));
    }
    input
        .parse::<u64>()
        .map(Target::new)
        .map_err(|_| ValidationError::new(ValidationReason::TargetNotFinite, input))
}

/// Validate the read-side query. An absent or empty target means "list".
pub fn validate_query(target: Option<&str>) -> Result<Query, ValidationError> {
    match target {
        None | Some("") => Ok(Query::ListRecent),
        Some(raw) => validate_target(raw).map(Query::Read),
    }
}

/// Validate an upload's `text` and optional `file` fields.
///
/// `file` is accepted when it is any recognized binary representation, either
/// a file part or raw bytes.
pub fn validate_upload(
    text: Option<&FieldValue>,
    file: Option<&FieldValue>,
) -> Result<Upload, ValidationError> {
    let text = match text {
        Some(value) => match value.as_text() {
            Some(s) => s.to_owned(),
            None => {
                return Err(ValidationError::new(ValidationReason::TextType, value.kind()));
            }
        },
        None => return Err(ValidationError::without_input(ValidationReason::TextType)),
    };

    let payload = match file {
        None => None,
        Some(value) => match value.as_binary() {
            Some(data) => Some(data.clone()),
            None => {
                return Err(ValidationError::new(ValidationReason::FileType, value.kind()));
            }
        },
    };

    Ok(Upload { text, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FilePart;
    use proptest::prelude::*;

    #[test]
    fn accepts_plain_digits() {
        assert_eq!(validate_target("1").unwrap(), Target::new(1));
        assert_eq!(validate_target("0000000042").unwrap(), Target::new(42));
        assert_eq!(validate_target("9999999999").unwrap(), Target::new(9_999_999_999));
    }

    #[test]
    fn rejects_eleven_digits_as_too_long() {
        let err = validate_target("12345678901").unwrap_err();
        assert_eq!(err.reason, ValidationReason::TargetTooLong);
        assert_eq!(err.input.as_deref(), Some("12345678901"));
    }

    #[test]
    fn rejects_letters_as_non_digit() {
        let err = validate_target("12a").unwrap_err();
        assert_eq!(err.reason, ValidationReason::TargetNotDigits);
        assert_eq!(err.to_string(), "target has not 0-9 char");
    }

    #[test]
    fn rejects_sign_and_decimal_point() {
        for input in ["-1", "+1", "1.5", "1e3", " 1", "NaN", "Infinity"] {
            let err = validate_target(input).unwrap_err();
            assert_eq!(err.reason, ValidationReason::TargetNotDigits, "input {input:?}");
        }
    }

    #[test]
    fn length_checked_before_digits() {
        let err = validate_target("abcdefghijk").unwrap_err();
        assert_eq!(err.reason, ValidationReason::TargetTooLong);
    }

    #[test]
    fn query_without_target_lists() {
        assert_eq!(validate_query(None).unwrap(), Query::ListRecent);
        assert_eq!(validate_query(Some("")).unwrap(), Query::ListRecent);
        assert_eq!(validate_query(Some("5")).unwrap(), Query::Read(Target::new(5)));
    }

    #[test]
    fn upload_requires_text() {
        let err = validate_upload(None, None).unwrap_err();
        assert_eq!(err.reason, ValidationReason::TextType);
        assert!(err.input.is_none());

        let binary = FieldValue::Binary(Bytes::from_static(b"x"));
        let err = validate_upload(Some(&binary), None).unwrap_err();
        assert_eq!(err.reason, ValidationReason::TextType);
    }

    #[test]
    fn upload_without_file_has_no_payload() {
        let text = FieldValue::from("doc");
        let upload = validate_upload(Some(&text), None).unwrap();
        assert_eq!(upload.text, "doc");
        assert!(upload.payload.is_none());
        assert_eq!(upload.len(), 0);
    }

    #[test]
    fn upload_accepts_file_part_or_raw_binary() {
        let text = FieldValue::from("img");
        let file = FieldValue::from(
            FilePart::new(vec![1u8; 8])
                .with_file_name("a.png")
                .with_content_type("image/png"),
        );
        assert_eq!(validate_upload(Some(&text), Some(&file)).unwrap().len(), 8);

        let raw = FieldValue::Binary(Bytes::from(vec![2u8; 4]));
        assert_eq!(validate_upload(Some(&text), Some(&raw)).unwrap().len(), 4);
    }

    #[test]
    fn upload_rejects_text_as_file() {
        let text = FieldValue::from("img");
        let file = FieldValue::from("not a file");
        let err = validate_upload(Some(&text), Some(&file)).unwrap_err();
        assert_eq!(err.reason, ValidationReason::FileType);
        assert_eq!(err.input.as_deref(), Some("text"));
    }

    proptest! {
        #[test]
        fn any_short_digit_string_is_accepted(s in "[0-9]{1,10}") {
            let target = validate_target(&s).unwrap();
            prop_assert_eq!(target.get(), s.parse::<u64>().unwrap());
        }

        #[test]
        fn any_long_string_is_too_long(s in "[0-9a-z]{11,40}") {
            let err = validate_target(&s).unwrap_err();
            prop_assert_eq!(err.reason, ValidationReason::TargetTooLong);
        }

        #[test]
        fn any_short_string_with_a_non_digit_is_refused(
            prefix in "[0-9]{0,4}",
            bad in "[^0-9]",
            suffix in "[0-9]{0,4}",
        ) {
            let s = format!("{prefix}{bad}{suffix}");
            let err = validate_target(&s).unwrap_err();
            prop_assert_eq!(err.reason, ValidationReason::TargetNotDigits);
        }
    }
}
