use serde_json::{json, Value};

use crate::content::caption::Caption;
use crate::error::CoreError;
use crate::forms::SubmittedForm;
use crate::types::{DbId, Timestamp};

/// The type-specific half of a free-form post.
///
/// A closed sum: every serialization boundary matches exhaustively, so a new
/// variant cannot be added without the compiler pointing at every place that
/// must learn about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBody {
    /// A text post with a title and body.
    Text { title: String, body: String },
    /// An image hosted elsewhere, referenced by URL.
    RemoteImage {
        src: String,
        caption: Option<Caption>,
    },
    /// An image stored directly in the database.
    LocalImage {
        mime_type: String,
        /// `None` when fetched without the blob (list queries).
        blob: Option<Vec<u8>>,
        caption: Option<Caption>,
    },
    /// A video stored directly in the database.
    LocalVideo {
        mime_type: String,
        blob: Option<Vec<u8>>,
        caption: Option<Caption>,
    },
    /// A link shown as-is.
    Link {
        url: String,
        caption: Option<Caption>,
    },
    /// A link shown as a QR code.
    QrCode {
        url: String,
        caption: Option<Caption>,
    },
    /// A URL embedded in an iframe.
    IFrame {
        url: String,
        caption: Option<Caption>,
    },
}

impl ContentBody {
    /// The storage/wire type discriminator.
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentBody::Text { .. } => "text",
            ContentBody::RemoteImage { .. } => "remote_image",
            ContentBody::LocalImage { .. } => "local_image",
            ContentBody::LocalVideo { .. } => "local_video",
            ContentBody::Link { .. } => "link",
            ContentBody::QrCode { .. } => "qrcode_content",
            ContentBody::IFrame { .. } => "iframe_content",
        }
    }

    pub fn caption(&self) -> Option<&Caption> {
        match self {
            ContentBody::Text { .. } => None,
            ContentBody::RemoteImage { caption, .. }
            | ContentBody::LocalImage { caption, .. }
            | ContentBody::LocalVideo { caption, .. }
            | ContentBody::Link { caption, .. }
            | ContentBody::QrCode { caption, .. }
            | ContentBody::IFrame { caption, .. } => caption.as_ref(),
        }
    }

    /// The binary payload, for variants that carry one.
    pub fn blob(&self) -> Option<(&str, Option<&[u8]>)> {
        match self {
            ContentBody::LocalImage { mime_type, blob, .. }
            | ContentBody::LocalVideo { mime_type, blob, .. } => {
                Some((mime_type, blob.as_deref()))
            }
            _ => None,
        }
    }

    /// The JSON persisted alongside the row. The blob is stored separately
    /// in binary form and never appears here.
    pub fn to_storage_json(&self) -> Value {
        let mut obj = match self {
            ContentBody::Text { title, body } => json!({ "title": title, "body": body }),
            ContentBody::RemoteImage { src, .. } => json!({ "src": src }),
            ContentBody::LocalImage { .. } | ContentBody::LocalVideo { .. } => json!({}),
            ContentBody::Link { url, .. }
            | ContentBody::QrCode { url, .. }
            | ContentBody::IFrame { url, .. } => json!({ "url": url }),
        };
        if let Some(caption) = self.caption() {
            obj["caption"] = caption.to_storage_json();
        }
        obj
    }

    /// Rebuild a body from its persisted parts. Exactly inverts
    /// [`to_storage_json`] plus the separately-stored blob columns.
    pub fn from_storage(
        type_name: &str,
        data: &Value,
        mime_type: Option<&str>,
        blob: Option<Vec<u8>>,
    ) -> Result<Self, CoreError> {
        let caption = data.get("caption").and_then(Caption::from_storage_json);
        let str_field = |field: &str| -> Result<String, CoreError> {
            data.get(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    CoreError::Storage(format!(
                        "stored {type_name} content is missing '{field}'"
                    ))
                })
        };
        let stored_mime = || -> Result<String, CoreError> {
            mime_type.map(str::to_string).ok_or_else(|| {
                CoreError::Storage(format!("stored {type_name} content has no mime type"))
            })
        };

        match type_name {
            "text" => Ok(ContentBody::Text {
                title: str_field("title")?,
                body: str_field("body")?,
            }),
            "remote_image" => Ok(ContentBody::RemoteImage {
                src: str_field("src")?,
                caption,
            }),
            "local_image" => Ok(ContentBody::LocalImage {
                mime_type: stored_mime()?,
                blob,
                caption,
            }),
            "local_video" => Ok(ContentBody::LocalVideo {
                mime_type: stored_mime()?,
                blob,
                caption,
            }),
            "link" => Ok(ContentBody::Link {
                url: str_field("url")?,
                caption,
            }),
            "qrcode_content" => Ok(ContentBody::QrCode {
                url: str_field("url")?,
                caption,
            }),
            "iframe_content" => Ok(ContentBody::IFrame {
                url: str_field("url")?,
                caption,
            }),
            other => Err(CoreError::UnknownContentType(other.to_string())),
        }
    }
}

/// A free-form post: the shared envelope plus its typed body.
///
/// `id` and `posted` are assigned exactly once, by the persistence boundary
/// at insert time. Constructors leave them unset and the repository rejects
/// any pre-set value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeFormContent {
    pub id: Option<DbId>,
    pub posted: Option<Timestamp>,
    /// The streams this post belongs to (at least one).
    pub streams: Vec<DbId>,
    pub body: ContentBody,
}

impl FreeFormContent {
    pub fn new(streams: Vec<DbId>, body: ContentBody) -> Self {
        Self {
            id: None,
            posted: None,
            streams,
            body,
        }
    }

    /// Build a post from a submitted form, dispatching on the required
    /// `type` discriminator.
    ///
    /// The resulting content has no id or post timestamp; those belong to
    /// the persistence boundary. The form itself is read, never modified.
    pub fn from_submission(form: &SubmittedForm) -> Result<Self, CoreError> {
        let content_type = form
            .first("type")
            .ok_or_else(|| CoreError::MalformedSubmission("missing content 'type'".into()))?;

        let streams = form
            .all("stream")
            .map(|raw| {
                raw.parse::<DbId>().map_err(|_| {
                    CoreError::MalformedSubmission(format!("bad stream id '{raw}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if streams.is_empty() {
            return Err(CoreError::MalformedSubmission(
                "content must belong to at least one stream".into(),
            ));
        }

        let caption = Caption::from_fields(form.first("caption_title"), form.first("caption_body"));
        let text_field = |field: &str| -> Result<String, CoreError> {
            form.first(field)
                .map(str::to_string)
                .ok_or_else(|| CoreError::MalformedSubmission(format!("missing '{field}'")))
        };

        let body = match content_type {
            "text" => ContentBody::Text {
                title: text_field("title")?,
                body: text_field("body")?,
            },
            "remote_image" => ContentBody::RemoteImage {
                src: text_field("src")?,
                caption,
            },
            "local_image" => {
                let file = form.file("image_data").ok_or_else(|| {
                    CoreError::MalformedSubmission("missing 'image_data' file".into())
                })?;
                let (mime_type, blob) = verify_image(&file.data)?;
                ContentBody::LocalImage {
                    mime_type,
                    blob: Some(blob),
                    caption,
                }
            }
            "local_video" => {
                let file = form.file("video_data").ok_or_else(|| {
                    CoreError::MalformedSubmission("missing 'video_data' file".into())
                })?;
                if !file.content_type.starts_with("video/") {
                    return Err(CoreError::InvalidMedia(format!(
                        "expected a video payload, got '{}'",
                        file.content_type
                    )));
                }
                ContentBody::LocalVideo {
                    mime_type: file.content_type.clone(),
                    blob: Some(file.data.clone()),
                    caption,
                }
            }
            "link" => ContentBody::Link {
                url: text_field("url")?,
                caption,
            },
            "qrcode_content" => ContentBody::QrCode {
                url: text_field("url")?,
                caption,
            },
            "iframe_content" => ContentBody::IFrame {
                url: text_field("url")?,
                caption,
            },
            other => return Err(CoreError::UnknownContentType(other.to_string())),
        };

        Ok(Self::new(streams, body))
    }

    /// The JSON sent over HTTP: the storage form plus the envelope. The
    /// caption travels as structured JSON; rendering it is the consumer's
    /// decision, with its own trust rules.
    pub fn to_wire_json(&self) -> Result<Value, CoreError> {
        let id = self.id.ok_or_else(|| {
            CoreError::Validation("content must be posted before wire serialization".into())
        })?;
        let posted = self.posted.ok_or_else(|| {
            CoreError::Validation("content must be posted before wire serialization".into())
        })?;

        let mut obj = self.body.to_storage_json();
        obj["type"] = json!(self.body.type_name());
        obj["id"] = json!(id);
        obj["posted"] = json!(posted.timestamp());
        obj["streams"] = json!(self.streams);
        Ok(obj)
    }
}

/// Decode and verify an uploaded image, returning its sniffed mime type and
/// the original bytes. Only the header is decoded.
fn verify_image(data: &[u8]) -> Result<(String, Vec<u8>), CoreError> {
    let reader = image::ImageReader::new(std::io::Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CoreError::InvalidMedia(format!("could not sniff image: {e}")))?;
    let format = reader
        .format()
        .ok_or_else(|| CoreError::InvalidMedia("unrecognised image format".into()))?;
    reader
        .into_dimensions()
        .map_err(|e| CoreError::InvalidMedia(format!("broken image payload: {e}")))?;
    Ok((format.to_mime_type().to_string(), data.to_vec()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::forms::UploadedFile;

    /// Smallest valid 1x1 PNG (fixed header + IHDR), enough for header
    /// verification.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn form(pairs: &[(&str, &str)]) -> SubmittedForm {
        let mut form = SubmittedForm::default();
        for (k, v) in pairs {
            form.push_field(*k, *v);
        }
        form
    }

    fn sample_bodies() -> Vec<ContentBody> {
        let caption = Some(Caption {
            title: Some("T".into()),
            body: "B".into(),
        });
        vec![
            ContentBody::Text {
                title: "Hello".into(),
                body: "World".into(),
            },
            ContentBody::RemoteImage {
                src: "https://example.com/x.png".into(),
                caption: caption.clone(),
            },
            ContentBody::LocalImage {
                mime_type: "image/png".into(),
                blob: Some(TINY_PNG.to_vec()),
                caption: None,
            },
            ContentBody::LocalVideo {
                mime_type: "video/mp4".into(),
                blob: Some(vec![0, 1, 2]),
                caption: caption.clone(),
            },
            ContentBody::Link {
                url: "https://example.com".into(),
                caption: None,
            },
            ContentBody::QrCode {
                url: "https://example.com/menu".into(),
                caption: caption.clone(),
            },
            ContentBody::IFrame {
                url: "https://example.com/embed".into(),
                caption,
            },
        ]
    }

    #[test]
    fn storage_round_trip_every_variant() {
        for body in sample_bodies() {
            let json = body.to_storage_json();
            let (mime, blob) = match body.blob() {
                Some((mime, blob)) => (Some(mime.to_string()), blob.map(<[u8]>::to_vec)),
                None => (None, None),
            };
            let back =
                ContentBody::from_storage(body.type_name(), &json, mime.as_deref(), blob)
                    .unwrap();
            assert_eq!(back, body);
        }
    }

    #[test]
    fn storage_json_never_contains_the_blob() {
        for body in sample_bodies() {
            let json = body.to_storage_json();
            assert!(json.get("blob").is_none());
            assert!(json.get("data").is_none());
        }
    }

    #[test]
    fn unknown_stored_type_is_rejected() {
        let err = ContentBody::from_storage("calendar", &json!({}), None, None).unwrap_err();
        assert_matches!(err, CoreError::UnknownContentType(t) if t == "calendar");
    }

    #[test]
    fn submission_dispatches_on_type() {
        let content = FreeFormContent::from_submission(&form(&[
            ("type", "link"),
            ("stream", "5"),
            ("stream", "7"),
            ("url", "https://example.com"),
        ]))
        .unwrap();

        assert_eq!(content.id, None);
        assert_eq!(content.posted, None);
        assert_eq!(content.streams, vec![5, 7]);
        assert_matches!(content.body, ContentBody::Link { ref url, .. } if url == "https://example.com");
    }

    #[test]
    fn submission_with_unknown_type_is_rejected() {
        let err = FreeFormContent::from_submission(&form(&[
            ("type", "hologram"),
            ("stream", "1"),
        ]))
        .unwrap_err();
        assert_matches!(err, CoreError::UnknownContentType(t) if t == "hologram");
    }

    #[test]
    fn submission_requires_a_stream() {
        let err = FreeFormContent::from_submission(&form(&[
            ("type", "text"),
            ("title", "t"),
            ("body", "b"),
        ]))
        .unwrap_err();
        assert_matches!(err, CoreError::MalformedSubmission(_));
    }

    #[test]
    fn caption_title_folds_without_body() {
        let content = FreeFormContent::from_submission(&form(&[
            ("type", "link"),
            ("stream", "1"),
            ("url", "https://example.com"),
            ("caption_title", "X"),
        ]))
        .unwrap();

        let caption = content.body.caption().unwrap();
        assert_eq!(caption.title, None);
        assert_eq!(caption.body, "X");
    }

    #[test]
    fn valid_image_upload_is_sniffed() {
        let mut form = form(&[("type", "local_image"), ("stream", "1")]);
        form.files.push(UploadedFile {
            field: "image_data".into(),
            file_name: "pixel.png".into(),
            // deliberately wrong: the sniffed type wins
            content_type: "application/octet-stream".into(),
            data: TINY_PNG.to_vec(),
        });

        let content = FreeFormContent::from_submission(&form).unwrap();
        assert_matches!(
            content.body,
            ContentBody::LocalImage { ref mime_type, .. } if mime_type == "image/png"
        );
    }

    #[test]
    fn broken_image_upload_is_rejected() {
        let mut form = form(&[("type", "local_image"), ("stream", "1")]);
        form.files.push(UploadedFile {
            field: "image_data".into(),
            file_name: "junk.png".into(),
            content_type: "image/png".into(),
            data: vec![0xde, 0xad, 0xbe, 0xef],
        });

        assert_matches!(
            FreeFormContent::from_submission(&form),
            Err(CoreError::InvalidMedia(_))
        );
    }

    #[test]
    fn non_video_payload_is_rejected() {
        let mut form = form(&[("type", "local_video"), ("stream", "1")]);
        form.files.push(UploadedFile {
            field: "video_data".into(),
            file_name: "x.txt".into(),
            content_type: "text/plain".into(),
            data: vec![1, 2, 3],
        });

        assert_matches!(
            FreeFormContent::from_submission(&form),
            Err(CoreError::InvalidMedia(_))
        );
    }

    #[test]
    fn wire_form_requires_assigned_identity() {
        let content = FreeFormContent::new(
            vec![1],
            ContentBody::Text {
                title: "t".into(),
                body: "b".into(),
            },
        );
        assert_matches!(content.to_wire_json(), Err(CoreError::Validation(_)));

        let posted = FreeFormContent {
            id: Some(9),
            posted: Some(chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap()),
            ..content
        };
        let wire = posted.to_wire_json().unwrap();
        assert_eq!(wire["type"], "text");
        assert_eq!(wire["id"], 9);
        assert_eq!(wire["posted"], 1_700_000_000_i64);
        assert_eq!(wire["streams"], json!([1]));
    }
}
