use serde_json::json;

/// A caption for a piece of content: a body and an optional title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub title: Option<String>,
    pub body: String,
}

impl Caption {
    /// Build a caption from submitted `caption_title` / `caption_body`
    /// fields. Empty strings count as absent.
    ///
    /// A title without a body folds into a body-only caption: a title needs
    /// a body to anchor it, so the title value becomes the body.
    pub fn from_fields(title: Option<&str>, body: Option<&str>) -> Option<Self> {
        let title = title.filter(|t| !t.is_empty());
        let body = body.filter(|b| !b.is_empty());

        match (title, body) {
            (_, None) => title.map(|t| Caption {
                title: None,
                body: t.to_string(),
            }),
            (title, Some(body)) => Some(Caption {
                title: title.map(str::to_string),
                body: body.to_string(),
            }),
        }
    }

    pub fn to_storage_json(&self) -> serde_json::Value {
        match &self.title {
            Some(title) => json!({ "title": title, "body": self.body }),
            None => json!({ "body": self.body }),
        }
    }

    pub fn from_storage_json(value: &serde_json::Value) -> Option<Self> {
        let body = value.get("body")?.as_str()?.to_string();
        Some(Caption {
            title: value
                .get("title")
                .and_then(|t| t.as_str())
                .map(str::to_string),
            body,
        })
    }
}
