// File: poolside-forms/src/value.rs
// Purpose: Field values, raw field inputs and the form value map

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A file picked in a file input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Value held by one form field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Files(Vec<FileRef>),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Text form used by single-field rules
    ///
    /// An unchecked box, an empty file list and `Null` read as empty text.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Bool(true) => Cow::Borrowed("true"),
            FieldValue::Bool(false) | FieldValue::Null => Cow::Borrowed(""),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    Cow::Owned(format!("{}", *n as i64))
                } else {
                    Cow::Owned(n.to_string())
                }
            }
            FieldValue::Files(files) => Cow::Owned(
                files
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            FieldValue::List(items) => Cow::Owned(
                items
                    .iter()
                    .map(|v| v.as_text().into_owned())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null | FieldValue::Bool(false) => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Files(files) => files.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Bool(true) | FieldValue::Number(_) => false,
        }
    }
}

// Whole numbers serialize as integers so they decode into integer fields
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Files(files) => files.serialize(serializer),
            FieldValue::List(items) => items.serialize(serializer),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<Vec<FileRef>> for FieldValue {
    fn from(files: Vec<FileRef>) -> Self {
        FieldValue::Files(files)
    }
}

/// Kind of input element a change came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
    FileList,
}

/// Raw change coming from an input element
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    Checkbox { checked: bool },
    FileList(Vec<FileRef>),
}

impl FieldInput {
    pub fn text(value: impl Into<String>) -> Self {
        FieldInput::Text(value.into())
    }

    pub fn checkbox(checked: bool) -> Self {
        FieldInput::Checkbox { checked }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldInput::Text(_) => FieldKind::Text,
            FieldInput::Checkbox { .. } => FieldKind::Checkbox,
            FieldInput::FileList(_) => FieldKind::FileList,
        }
    }

    /// Extract the value to store for this input
    pub fn into_value(self) -> FieldValue {
        match self {
            FieldInput::Text(text) => FieldValue::Text(text),
            FieldInput::Checkbox { checked } => FieldValue::Bool(checked),
            FieldInput::FileList(files) => FieldValue::Files(files),
        }
    }
}

/// Field name to failure message; only failing fields are present
pub type FieldErrors = BTreeMap<String, String>;

/// Current values of every known field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Text of a field, empty when the field is unknown
    pub fn text(&self, name: &str) -> Cow<'_, str> {
        self.0
            .get(name)
            .map(FieldValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(name.into(), value)
    }

    /// Overwrite the fields present in `partial`, keep the rest
    pub fn merge(&mut self, partial: FormValues) {
        self.0.extend(partial.0);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the values into a caller type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::to_value(self).and_then(serde_json::from_value)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, FieldValue>> for FormValues {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(FieldInput::text("200 free"), FieldKind::Text, FieldValue::Text("200 free".into()))]
    #[case(FieldInput::checkbox(true), FieldKind::Checkbox, FieldValue::Bool(true))]
    #[case(FieldInput::checkbox(false), FieldKind::Checkbox, FieldValue::Bool(false))]
    #[case(
        FieldInput::FileList(vec![FileRef::new("plan.pdf", 1024)]),
        FieldKind::FileList,
        FieldValue::Files(vec![FileRef::new("plan.pdf", 1024)])
    )]
    fn test_input_extraction(
        #[case] input: FieldInput,
        #[case] kind: FieldKind,
        #[case] expected: FieldValue,
    ) {
        assert_eq!(input.kind(), kind);
        assert_eq!(input.into_value(), expected);
    }

    #[rstest]
    #[case(FieldValue::Text("abc".into()), "abc")]
    #[case(FieldValue::Bool(true), "true")]
    #[case(FieldValue::Bool(false), "")]
    #[case(FieldValue::Number(25.0), "25")]
    #[case(FieldValue::Number(1.5), "1.5")]
    #[case(FieldValue::Null, "")]
    fn test_as_text(#[case] value: FieldValue, #[case] expected: &str) {
        assert_eq!(value.as_text(), expected);
    }

    #[test]
    fn test_is_empty() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::Text(String::new()).is_empty());
        assert!(FieldValue::Files(vec![]).is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_decode_into_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct NewWorkout {
            name: String,
            distance: u32,
            public: bool,
        }

        let values = FormValues::new()
            .with("name", "Sprint ladder")
            .with("distance", 1500i64)
            .with("public", true);

        assert_eq!(
            values.decode::<NewWorkout>().unwrap(),
            NewWorkout {
                name: "Sprint ladder".to_string(),
                distance: 1500,
                public: true,
            }
        );
    }

    #[test]
    fn test_deserialize_untagged() {
        let values: FormValues = serde_json::from_value(json!({
            "name": "Kick set",
            "reps": 8,
            "notes": null,
            "attachments": [{"name": "set.png", "size": 2048, "mime": "image/png"}],
        }))
        .unwrap();

        assert_eq!(values.get("name"), Some(&FieldValue::Text("Kick set".into())));
        assert_eq!(values.get("reps"), Some(&FieldValue::Number(8.0)));
        assert_eq!(values.get("notes"), Some(&FieldValue::Null));
        assert_eq!(
            values.get("attachments"),
            Some(&FieldValue::Files(vec![
                FileRef::new("set.png", 2048).with_mime("image/png")
            ]))
        );
    }

    #[test]
    fn test_merge_overwrites_present_fields() {
        let mut values = FormValues::new().with("name", "A").with("pool", "25m");
        values.merge(FormValues::new().with("name", "B"));

        assert_eq!(values.text("name"), "B");
        assert_eq!(values.text("pool"), "25m");
        assert_eq!(values.text("missing"), "");
    }
}
