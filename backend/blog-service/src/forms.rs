//! HTML form handling: parsing, cleaning and field-level error messages.
//!
//! Forms are re-rendered with their submitted values and a `FormErrors` map
//! when validation fails; only a valid form reaches the repository.

use actix_multipart::Multipart;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

use crate::db::BlogRepository;
use crate::error::Result;
use crate::media::UploadedFile;

pub const TEXT_REQUIRED: &str = "Enter some text";
pub const INVALID_GROUP_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const IMAGE_TOO_LARGE: &str = "The uploaded file is too large.";
pub const VALUE_TOO_LARGE: &str = "The submitted value is too large.";

/// Field name -> messages, keyed and ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Replace whatever messages `field` already has.
    pub fn set(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), vec![message.into()]);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}

/// Outcome of cleaning a bound form.
#[derive(Debug)]
pub enum Validated<T> {
    Valid(T),
    Invalid(FormErrors),
}

/// Label and help text shown next to a field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldMeta {
    pub name: &'static str,
    pub label: &'static str,
    pub help_text: &'static str,
    pub required: bool,
}

pub const POST_FORM_FIELDS: &[FieldMeta] = &[
    FieldMeta {
        name: "text",
        label: "Text",
        help_text: "Write any text you like",
        required: true,
    },
    FieldMeta {
        name: "group",
        label: "Group",
        help_text: "Pick a group for the post",
        required: false,
    },
    FieldMeta {
        name: "image",
        label: "Image",
        help_text: "",
        required: false,
    },
];

pub const COMMENT_FORM_FIELDS: &[FieldMeta] = &[FieldMeta {
    name: "text",
    label: "Text",
    help_text: "Write any text you like",
    required: true,
}];

/// Bound post form as submitted by the browser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Enter some text"))]
    pub text: String,
    /// Raw `<select>` value; empty means no group
    #[serde(default)]
    pub group: Option<String>,
    /// Checkbox on the edit form that drops the current image
    #[serde(default, rename = "image-clear")]
    pub image_clear: Option<String>,
    #[serde(skip)]
    pub image: Option<UploadedFile>,
    /// Parts that went over the size limit and were dropped
    #[serde(skip)]
    pub oversized: Vec<String>,
}

/// A post form that passed validation.
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedFile>,
    pub clear_image: bool,
}

impl PostForm {
    /// Initial values for editing an existing post.
    pub fn for_post(text: &str, group_id: Option<i64>) -> Self {
        Self {
            text: text.to_string(),
            group: group_id.map(|id| id.to_string()),
            ..Default::default()
        }
    }

    /// Read a `multipart/form-data` body. Parts larger than `max_upload_bytes`
    /// are dropped and flagged, whatever the field.
    pub async fn from_multipart(mut payload: Multipart, max_upload_bytes: usize) -> Result<Self> {
        let mut form = PostForm::default();

        while let Some(mut field) = payload.try_next().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);

            let mut bytes = Vec::new();
            let mut oversized = false;
            while let Some(chunk) = field.try_next().await? {
                if oversized {
                    continue;
                }
                if bytes.len() + chunk.len() > max_upload_bytes {
                    oversized = true;
                    bytes.clear();
                    continue;
                }
                bytes.extend_from_slice(&chunk);
            }

            if oversized {
                form.oversized.push(name);
                continue;
            }

            match name.as_str() {
                "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
                "group" => form.group = Some(String::from_utf8_lossy(&bytes).into_owned()),
                "image-clear" => {
                    form.image_clear = Some(String::from_utf8_lossy(&bytes).into_owned())
                }
                "image" => {
                    // browsers send an empty part when no file was chosen
                    let file_name = file_name.unwrap_or_default();
                    if !file_name.is_empty() || !bytes.is_empty() {
                        form.image = Some(UploadedFile { file_name, bytes });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn group_value(&self) -> Option<&str> {
        self.group.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }

    /// Strip the text and check every field, including that the chosen group
    /// exists and the upload decodes as an image.
    pub async fn clean(&mut self, repo: &dyn BlogRepository) -> Result<Validated<CleanedPost>> {
        self.text = self.text.trim().to_string();

        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };

        let mut group_id = None;
        if let Some(raw) = self.group_value() {
            match raw.parse::<i64>() {
                Ok(id) if repo.find_group_by_id(id).await?.is_some() => group_id = Some(id),
                _ => errors.add("group", INVALID_GROUP_CHOICE),
            }
        }

        if let Some(upload) = &self.image {
            if !upload.is_valid_image() {
                errors.add("image", INVALID_IMAGE);
            }
        }

        // a dropped part explains the field's other errors
        for field in &self.oversized {
            match field.as_str() {
                "image" => errors.set("image", IMAGE_TOO_LARGE),
                "text" | "group" => errors.set(field, VALUE_TOO_LARGE),
                _ => {}
            }
        }

        if !errors.is_empty() {
            return Ok(Validated::Invalid(errors));
        }

        Ok(Validated::Valid(CleanedPost {
            text: self.text.clone(),
            group_id,
            image: self.image.clone(),
            clear_image: self.image_clear.is_some(),
        }))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Enter some text"))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&mut self) -> Validated<String> {
        self.text = self.text.trim().to_string();
        match self.validate() {
            Ok(()) => Validated::Valid(self.text.clone()),
            Err(e) => Validated::Invalid(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;
    use crate::models::NewGroup;
    use actix_web::error::PayloadError;
    use actix_web::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use actix_web::web::Bytes;
    use futures::stream;

    #[test]
    fn test_comment_form_rejects_blank_text() {
        let mut form = CommentForm {
            text: "   ".into(),
        };
        match form.clean() {
            Validated::Invalid(errors) => assert_eq!(errors.field("text"), [TEXT_REQUIRED]),
            Validated::Valid(_) => panic!("blank comment accepted"),
        }

        let mut form = CommentForm {
            text: "  nice post ".into(),
        };
        assert!(matches!(form.clean(), Validated::Valid(t) if t == "nice post"));
    }

    #[actix_web::test]
    async fn test_post_form_validates_group_and_image() {
        let repo = MemoryRepository::new();
        let group = repo
            .create_group(NewGroup {
                title: "Cats".into(),
                slug: "cats".into(),
                description: String::new(),
            })
            .await
            .unwrap();

        let mut form = PostForm {
            text: "".into(),
            group: Some("9999".into()),
            image: Some(UploadedFile {
                file_name: "fake.png".into(),
                bytes: b"GIF? no".to_vec(),
            }),
            ..Default::default()
        };
        match form.clean(&repo).await.unwrap() {
            Validated::Invalid(errors) => {
                assert_eq!(errors.field("text"), [TEXT_REQUIRED]);
                assert_eq!(errors.field("group"), [INVALID_GROUP_CHOICE]);
                assert_eq!(errors.field("image"), [INVALID_IMAGE]);
            }
            Validated::Valid(_) => panic!("invalid post accepted"),
        }

        let mut form = PostForm {
            text: " hello ".into(),
            group: Some(group.id.to_string()),
            ..Default::default()
        };
        match form.clean(&repo).await.unwrap() {
            Validated::Valid(cleaned) => {
                assert_eq!(cleaned.text, "hello");
                assert_eq!(cleaned.group_id, Some(group.id));
                assert!(!cleaned.clear_image);
            }
            Validated::Invalid(errors) => panic!("unexpected errors: {errors:?}"),
        }
    }

    #[test]
    fn test_form_errors_are_ordered_by_field_name() {
        let mut errors = FormErrors::default();
        errors.add("text", TEXT_REQUIRED);
        errors.add("image", INVALID_IMAGE);
        errors.add("group", INVALID_GROUP_CHOICE);
        let keys: Vec<String> = match serde_json::to_value(&errors).unwrap() {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            other => panic!("expected an object, got {other}"),
        };
        assert_eq!(keys, ["group", "image", "text"]);

        errors.set("text", VALUE_TOO_LARGE);
        assert_eq!(errors.field("text"), [VALUE_TOO_LARGE]);
    }

    fn multipart(body: &'static str) -> Multipart {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=xyz"),
        );
        let body = body.replace('\n', "\r\n");
        let stream = stream::once(async move { Ok::<_, PayloadError>(Bytes::from(body)) });
        Multipart::new(&headers, stream)
    }

    #[actix_web::test]
    async fn test_oversized_text_part_is_reported() {
        let payload = multipart(
            "--xyz\n\
             Content-Disposition: form-data; name=\"text\"\n\
             \n\
             far more than sixteen bytes of text\n\
             --xyz\n\
             Content-Disposition: form-data; name=\"group\"\n\
             \n\
             \n\
             --xyz--\n",
        );
        let mut form = PostForm::from_multipart(payload, 16).await.unwrap();
        assert_eq!(form.oversized, ["text"]);
        assert_eq!(form.group.as_deref(), Some(""));

        let repo = MemoryRepository::new();
        match form.clean(&repo).await.unwrap() {
            Validated::Invalid(errors) => {
                assert_eq!(errors.field("text"), [VALUE_TOO_LARGE]);
                assert!(errors.field("group").is_empty());
            }
            Validated::Valid(_) => panic!("oversized text accepted as empty"),
        }
    }

    #[actix_web::test]
    async fn test_oversized_image_replaces_other_image_errors() {
        let repo = MemoryRepository::new();
        let mut form = PostForm {
            text: "caption".into(),
            oversized: vec!["image".into()],
            ..Default::default()
        };
        match form.clean(&repo).await.unwrap() {
            Validated::Invalid(errors) => {
                assert_eq!(errors.field("image"), [IMAGE_TOO_LARGE]);
                assert!(errors.field("text").is_empty());
            }
            Validated::Valid(_) => panic!("oversized image accepted"),
        }
    }

    #[actix_web::test]
    async fn test_empty_group_means_no_group() {
        let repo = MemoryRepository::new();
        let mut form = PostForm {
            text: "text".into(),
            group: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            form.clean(&repo).await.unwrap(),
            Validated::Valid(CleanedPost { group_id: None, .. })
        ));
    }
}
