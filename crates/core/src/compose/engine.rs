//! Assembles submissions into rendered displays.
//!
//! One engine instance is shared across requests: the template registry and
//! storage handles are read-mostly and safely concurrent. A composition is
//! synchronous and non-reentrant per request; preview compositions never
//! touch storage, so aborting one leaves no residue.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::compose::fields::{parse_field_key, FieldKey};
use crate::compose::submission::{page_draft, PageDraft, ParsedSubmission};
use crate::display::{Display, Page, PropertyValue};
use crate::error::CoreError;
use crate::forms::{SubmittedForm, UploadedFile};
use crate::naming;
use crate::store::{DisplayStore, FileStore, StoredFile};
use crate::template::TemplateRegistry;
use crate::types::DbId;

/// Duration for pages whose submission carries no `duration-page-<n>` field.
pub const DEFAULT_PAGE_DURATION_SECS: u32 = 30;

/// How a composition is finalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionMode {
    /// Persist files and the display record, then render.
    Commit,
    /// Render only, with uploads inlined as data URIs. `pages` optionally
    /// restricts the rendered output to a subset of page numbers.
    Preview { pages: Option<BTreeSet<u32>> },
}

/// The result of a composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    Committed { display: Display, document: String },
    Preview { document: String },
}

impl Composition {
    pub fn document(&self) -> &str {
        match self {
            Composition::Committed { document, .. } | Composition::Preview { document } => {
                document
            }
        }
    }
}

/// The display composition engine. Generic over its storage handle so tests
/// can inject an in-memory fake.
pub struct CompositionEngine<S> {
    templates: Arc<TemplateRegistry>,
    store: S,
}

impl<S> CompositionEngine<S>
where
    S: DisplayStore + FileStore,
{
    pub fn new(templates: Arc<TemplateRegistry>, store: S) -> Self {
        Self { templates, store }
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Compose a display from a submitted form.
    ///
    /// A commit fully validates the submission, writes its files, replaces
    /// the display record and returns the rendered document. A preview
    /// produces visually-identical output without persisting anything or
    /// reserving an identity.
    pub async fn compose(
        &self,
        department: DbId,
        form: &SubmittedForm,
        mode: CompositionMode,
    ) -> Result<Composition, CoreError> {
        let parsed = ParsedSubmission::parse(form)?;
        match mode {
            CompositionMode::Commit => self.commit(department, parsed, &form.files).await,
            CompositionMode::Preview { pages } => {
                self.preview(department, parsed, &form.files, pages)
            }
        }
    }

    /// Re-derive the rendered document for a stored display.
    pub async fn render_existing(&self, id: DbId) -> Result<String, CoreError> {
        let display = self
            .store
            .fetch_display_by_id(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Display",
                id,
            })?;
        self.render_display(&display)
    }

    /// Render a display's pages into the composed document. Markup is always
    /// derived from the stored pages, never cached.
    pub fn render_display(&self, display: &Display) -> Result<String, CoreError> {
        self.render_pages(display.pages.iter())
    }

    async fn commit(
        &self,
        department: DbId,
        mut parsed: ParsedSubmission,
        files: &[UploadedFile],
    ) -> Result<Composition, CoreError> {
        // Reuse the existing identity on edit; otherwise reserve one up
        // front, since stored file names embed it.
        let (display_id, is_edit) = match parsed.display_id {
            Some(id) => (id, true),
            None => (self.store.reserve_display_id(department).await?, false),
        };

        for file in files {
            let (page, variable) = file_field(&file.field)?;
            let draft = page_draft(&mut parsed.pages, page, &file.field)?;

            let name = naming::display_file_name(
                display_id,
                &parsed.name,
                &file.field,
                naming::file_extension(&file.file_name),
            );
            self.store
                .store_file(
                    &StoredFile {
                        name: name.clone(),
                        department,
                        mime_type: file.content_type.clone(),
                        data: file.data.clone(),
                    },
                    false,
                )
                .await?;
            tracing::debug!(file = %name, display = display_id, "Stored display file");

            draft
                .properties
                .insert(variable, PropertyValue::Single(naming::file_url(department, &name)));
        }

        if is_edit {
            self.delete_orphaned_files(department, display_id, &parsed)
                .await?;
        }

        let pages = order_pages(parsed.pages);
        let document = self.render_pages(pages.iter())?;

        let display = Display {
            id: display_id,
            name: parsed.name,
            department,
            pages,
        };
        self.store.replace_display(&display).await?;
        tracing::info!(
            display = display_id,
            department,
            pages = display.pages.len(),
            "Display committed"
        );

        Ok(Composition::Committed { display, document })
    }

    /// Preview path: no identity is reserved and nothing is stored. Uploads
    /// become inline data URIs so the render matches a committed one.
    fn preview(
        &self,
        department: DbId,
        mut parsed: ParsedSubmission,
        files: &[UploadedFile],
        subset: Option<BTreeSet<u32>>,
    ) -> Result<Composition, CoreError> {
        let _ = department;
        for file in files {
            let (page, variable) = file_field(&file.field)?;
            // Every page is parsed and extracted, previewed or not; only
            // the render below is restricted to the requested subset.
            let draft = page_draft(&mut parsed.pages, page, &file.field)?;
            let url = format!(
                "data:{};base64,{}",
                file.content_type,
                BASE64.encode(&file.data)
            );
            draft.properties.insert(variable, PropertyValue::Single(url));
        }

        // The subset names caller page numbers, so filter before
        // `order_pages` discards them.
        let wanted: BTreeMap<u32, PageDraft> = parsed
            .pages
            .into_iter()
            .filter(|(number, _)| subset.as_ref().is_none_or(|s| s.contains(number)))
            .collect();
        let pages = order_pages(wanted);
        let document = self.render_pages(pages.iter())?;

        Ok(Composition::Preview { document })
    }

    /// Delete every stored file belonging to this display that the new page
    /// list no longer references. Files are tied 1:1 to a (display, page,
    /// property) triple and must not accumulate across edits.
    async fn delete_orphaned_files(
        &self,
        department: DbId,
        display_id: DbId,
        parsed: &ParsedSubmission,
    ) -> Result<(), CoreError> {
        // A property holding a previously-issued fetch URL (the user did
        // not re-upload on edit) keeps its file alive.
        let in_use: HashSet<&str> = parsed
            .pages
            .values()
            .flat_map(|draft| draft.properties.values())
            .filter_map(|value| value.as_single())
            .filter_map(|value| naming::file_name_from_url(department, value))
            .collect();

        for name in self.store.list_file_names(department).await? {
            if naming::belongs_to_display(&name, display_id) && !in_use.contains(name.as_str())
            {
                self.store.delete_file_by_name(department, &name).await?;
                tracing::debug!(file = %name, display = display_id, "Deleted orphaned file");
            }
        }
        Ok(())
    }

    /// Concatenate per-page renders into the outer composition document: an
    /// ordered sequence of `(duration, markup)` pairs in one container.
    fn render_pages<'a>(
        &self,
        pages: impl Iterator<Item = &'a Page>,
    ) -> Result<String, CoreError> {
        let mut document = String::from("<display>\n");
        for page in pages {
            let template = self
                .templates
                .fetch_by_id(page.template)
                .ok_or(CoreError::UnknownTemplate(page.template))?;
            let markup = template.render(&page.properties)?;
            document.push_str(&format!(
                "  <page duration=\"{}\">{}</page>\n",
                page.duration_secs, markup
            ));
        }
        document.push_str("</display>\n");
        Ok(document)
    }
}

fn file_field(field: &str) -> Result<(u32, String), CoreError> {
    match parse_field_key(field)? {
        Some(FieldKey::File { page, variable }) => Ok((page, variable)),
        _ => Err(CoreError::MalformedSubmission(format!(
            "unexpected file field '{field}'"
        ))),
    }
}

/// Sort drafts by page number, discard the number (it is positional only)
/// and default missing durations.
fn order_pages(pages: BTreeMap<u32, PageDraft>) -> Vec<Page> {
    pages
        .into_values()
        .map(|draft| Page {
            template: draft.template_id,
            duration_secs: draft.duration_secs.unwrap_or(DEFAULT_PAGE_DURATION_SECS),
            properties: draft.properties,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;

    use super::*;

    /// In-memory stand-in for the storage collaborator, counting the calls
    /// preview must never make.
    #[derive(Default)]
    struct FakeStoreInner {
        displays: Mutex<HashMap<DbId, Display>>,
        files: Mutex<BTreeMap<(DbId, String), StoredFile>>,
        next_display_id: AtomicI64,
        reserve_calls: AtomicUsize,
        store_file_calls: AtomicUsize,
    }

    #[derive(Clone, Default)]
    struct FakeStore(Arc<FakeStoreInner>);

    impl FakeStore {
        fn file_names(&self, department: DbId) -> Vec<String> {
            self.0
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|(dept, _)| *dept == department)
                .map(|(_, name)| name.clone())
                .collect()
        }

        fn display(&self, id: DbId) -> Option<Display> {
            self.0.displays.lock().unwrap().get(&id).cloned()
        }

        fn seed_file(&self, department: DbId, name: &str) {
            self.0.files.lock().unwrap().insert(
                (department, name.to_string()),
                StoredFile {
                    name: name.to_string(),
                    department,
                    mime_type: "image/png".into(),
                    data: vec![1],
                },
            );
        }
    }

    #[async_trait]
    impl DisplayStore for FakeStore {
        async fn reserve_display_id(&self, _department: DbId) -> Result<DbId, CoreError> {
            self.0.reserve_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.next_display_id.fetch_add(1, Ordering::SeqCst) + 1)
        }

        async fn replace_display(&self, display: &Display) -> Result<DbId, CoreError> {
            self.0
                .displays
                .lock()
                .unwrap()
                .insert(display.id, display.clone());
            Ok(display.id)
        }

        async fn fetch_display_by_id(&self, id: DbId) -> Result<Option<Display>, CoreError> {
            Ok(self.display(id))
        }
    }

    #[async_trait]
    impl FileStore for FakeStore {
        async fn store_file(
            &self,
            file: &StoredFile,
            _temporary: bool,
        ) -> Result<(), CoreError> {
            self.0.store_file_calls.fetch_add(1, Ordering::SeqCst);
            self.0
                .files
                .lock()
                .unwrap()
                .insert((file.department, file.name.clone()), file.clone());
            Ok(())
        }

        async fn fetch_file_by_name(
            &self,
            department: DbId,
            name: &str,
        ) -> Result<Option<StoredFile>, CoreError> {
            Ok(self
                .0
                .files
                .lock()
                .unwrap()
                .get(&(department, name.to_string()))
                .cloned())
        }

        async fn delete_file_by_name(
            &self,
            department: DbId,
            name: &str,
        ) -> Result<bool, CoreError> {
            Ok(self
                .0
                .files
                .lock()
                .unwrap()
                .remove(&(department, name.to_string()))
                .is_some())
        }

        async fn list_file_names(&self, department: DbId) -> Result<Vec<String>, CoreError> {
            Ok(self.file_names(department))
        }
    }

    const DEPT: DbId = 3;

    fn engine() -> (CompositionEngine<FakeStore>, FakeStore) {
        let store = FakeStore::default();
        let engine = CompositionEngine::new(
            Arc::new(TemplateRegistry::with_builtins().unwrap()),
            store.clone(),
        );
        (engine, store)
    }

    fn form(pairs: &[(&str, &str)]) -> SubmittedForm {
        let mut form = SubmittedForm::default();
        for (k, v) in pairs {
            form.push_field(*k, *v);
        }
        form
    }

    fn png_upload(field: &str) -> UploadedFile {
        UploadedFile {
            field: field.into(),
            file_name: "bg.png".into(),
            content_type: "image/png".into(),
            data: vec![0x89, 0x50, 0x4e, 0x47],
        }
    }

    /// The two-page scenario: Simple with a clock format and one stream,
    /// then Content Only with a blank page size.
    fn two_page_form() -> SubmittedForm {
        form(&[
            ("name", "Foyer"),
            ("template-page-0", "1"),
            ("page-0-property-clock_format", "H:mm"),
            ("page-0-property-streams[]", "5"),
            ("template-page-1", "2"),
            ("page-1-property-page_size", ""),
        ])
    }

    #[tokio::test]
    async fn commit_renders_and_persists_the_two_page_scenario() {
        let (engine, store) = engine();
        let result = engine
            .compose(DEPT, &two_page_form(), CompositionMode::Commit)
            .await
            .unwrap();

        let Composition::Committed { display, document } = result else {
            panic!("commit must return a committed composition");
        };

        let segments: Vec<_> = document.match_indices("<page ").collect();
        assert_eq!(segments.len(), 2);
        assert!(document.contains("H:mm"));
        assert!(document.contains(r#"streams="5""#));

        assert_eq!(display.pages.len(), 2);
        assert_eq!(display.pages[0].template, 1);
        assert_eq!(display.pages[1].template, 2);
        assert_eq!(store.display(display.id).unwrap(), display);
    }

    #[tokio::test]
    async fn pages_render_in_page_number_order_regardless_of_submission_order() {
        let (engine, _) = engine();
        let form = form(&[
            ("name", "Foyer"),
            ("template-page-2", "3"),
            ("page-2-property-room_name", "third"),
            ("template-page-0", "3"),
            ("page-0-property-room_name", "first"),
            ("template-page-1", "3"),
            ("page-1-property-room_name", "second"),
        ]);

        let result = engine
            .compose(DEPT, &form, CompositionMode::Commit)
            .await
            .unwrap();
        let document = result.document();

        let first = document.find("first").unwrap();
        let second = document.find("second").unwrap();
        let third = document.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn durations_default_and_annotate_each_page() {
        let (engine, _) = engine();
        let form = form(&[
            ("name", "Foyer"),
            ("template-page-0", "1"),
            ("duration-page-0", "45"),
            ("template-page-1", "2"),
        ]);

        let result = engine
            .compose(DEPT, &form, CompositionMode::Commit)
            .await
            .unwrap();
        let document = result.document();
        assert!(document.contains(r#"duration="45""#));
        assert!(document.contains(r#"duration="30""#));
    }

    #[tokio::test]
    async fn commit_stores_uploads_and_substitutes_fetch_urls() {
        let (engine, store) = engine();
        let mut form = form(&[("name", "Lab"), ("template-page-0", "3")]);
        form.files.push(png_upload("page-0-file-background_image"));

        let result = engine
            .compose(DEPT, &form, CompositionMode::Commit)
            .await
            .unwrap();
        let Composition::Committed { display, document } = result else {
            panic!("expected commit");
        };

        let expected_name =
            "_display-1-Lab-page-0-file-background_image.png".to_string();
        assert_eq!(store.file_names(DEPT), vec![expected_name.clone()]);

        let url = format!("/api/departments/{DEPT}/files/{expected_name}");
        assert_eq!(
            display.pages[0].properties["background_image"],
            PropertyValue::Single(url.clone())
        );
        assert!(document.contains(&format!(r#"background="{url}""#)));
    }

    #[tokio::test]
    async fn preview_never_reserves_or_stores_but_shows_the_file() {
        let (engine, store) = engine();
        let mut form = form(&[("name", "Lab"), ("template-page-0", "3")]);
        form.files.push(png_upload("page-0-file-background_image"));

        let result = engine
            .compose(DEPT, &form, CompositionMode::Preview { pages: None })
            .await
            .unwrap();

        let Composition::Preview { document } = result else {
            panic!("preview must not commit");
        };
        assert!(document.contains("data:image/png;base64,iVBORw=="));

        assert_eq!(store.0.reserve_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.0.store_file_calls.load(Ordering::SeqCst), 0);
        assert!(store.0.displays.lock().unwrap().is_empty());
        assert!(store.0.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_preview_renders_the_subset_but_parses_every_page() {
        let (engine, _) = engine();
        // page numbers are arbitrary caller keys; the subset must match
        // them, not the pages' positions after ordering
        let mut form = form(&[
            ("name", "Lab"),
            ("template-page-4", "1"),
            ("page-4-property-clock_format", "H:mm"),
            ("template-page-7", "3"),
            ("page-7-property-room_name", "omitted room"),
        ]);
        form.files.push(png_upload("page-7-file-background_image"));

        let result = engine
            .compose(
                DEPT,
                &form,
                CompositionMode::Preview {
                    pages: Some(BTreeSet::from([4])),
                },
            )
            .await
            .unwrap();
        let document = result.document();
        assert!(document.contains("H:mm"));
        assert!(!document.contains("omitted room"));

        // a malformed file field on an omitted page still rejects the whole
        // preview: every page is parsed, rendered or not
        let mut broken = form.clone();
        broken.files.push(png_upload("page-7-file-"));
        let err = engine
            .compose(
                DEPT,
                &broken,
                CompositionMode::Preview {
                    pages: Some(BTreeSet::from([4])),
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::MalformedSubmission(_));
    }

    #[tokio::test]
    async fn editing_away_a_file_deletes_the_orphan() {
        let (engine, store) = engine();

        // first commit uploads a background image
        let mut create = form(&[("name", "Lab"), ("template-page-0", "3")]);
        create.files.push(png_upload("page-0-file-background_image"));
        let Composition::Committed { display, .. } = engine
            .compose(DEPT, &create, CompositionMode::Commit)
            .await
            .unwrap()
        else {
            panic!("expected commit");
        };
        assert_eq!(store.file_names(DEPT).len(), 1);

        // the edit drops the upload and the property entirely
        let edit = form(&[
            ("name", "Lab"),
            ("display_id", &display.id.to_string()),
            ("template-page-0", "3"),
        ]);
        engine
            .compose(DEPT, &edit, CompositionMode::Commit)
            .await
            .unwrap();

        assert!(store.file_names(DEPT).is_empty());
    }

    #[tokio::test]
    async fn a_kept_fetch_url_counts_as_in_use() {
        let (engine, store) = engine();

        let mut create = form(&[("name", "Lab"), ("template-page-0", "3")]);
        create.files.push(png_upload("page-0-file-background_image"));
        let Composition::Committed { display, .. } = engine
            .compose(DEPT, &create, CompositionMode::Commit)
            .await
            .unwrap()
        else {
            panic!("expected commit");
        };
        let stored = store.file_names(DEPT)[0].clone();
        let url = naming::file_url(DEPT, &stored);

        // the edit re-submits the issued URL instead of re-uploading
        let edit = form(&[
            ("name", "Lab"),
            ("display_id", &display.id.to_string()),
            ("template-page-0", "3"),
            ("page-0-property-background_image", &url),
        ]);
        engine
            .compose(DEPT, &edit, CompositionMode::Commit)
            .await
            .unwrap();

        assert_eq!(store.file_names(DEPT), vec![stored]);
    }

    #[tokio::test]
    async fn cleanup_leaves_other_displays_files_alone() {
        let (engine, store) = engine();
        store.seed_file(DEPT, "_display-99-Other-page-0-file-logo.png");
        store.seed_file(DEPT, "prospectus.pdf");

        let mut create = form(&[("name", "Lab"), ("template-page-0", "3")]);
        create.files.push(png_upload("page-0-file-background_image"));
        let Composition::Committed { display, .. } = engine
            .compose(DEPT, &create, CompositionMode::Commit)
            .await
            .unwrap()
        else {
            panic!("expected commit");
        };

        let edit = form(&[
            ("name", "Lab"),
            ("display_id", &display.id.to_string()),
            ("template-page-0", "3"),
        ]);
        engine
            .compose(DEPT, &edit, CompositionMode::Commit)
            .await
            .unwrap();

        let mut remaining = store.file_names(DEPT);
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "_display-99-Other-page-0-file-logo.png".to_string(),
                "prospectus.pdf".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_template_rejects_the_whole_commit() {
        let (engine, store) = engine();
        let form = form(&[("name", "Foyer"), ("template-page-0", "99")]);

        let err = engine
            .compose(DEPT, &form, CompositionMode::Commit)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::UnknownTemplate(99));
        assert!(store.0.displays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_property_rejects_the_whole_commit() {
        let (engine, store) = engine();
        let form = form(&[
            ("name", "Foyer"),
            ("template-page-0", "1"),
            ("page-0-property-does_not_exist", "x"),
        ]);

        let err = engine
            .compose(DEPT, &form, CompositionMode::Commit)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::UnknownProperty(p) if p == "does_not_exist");
        assert!(store.0.displays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn render_existing_rederives_the_document() {
        let (engine, _) = engine();
        let Composition::Committed { display, document } = engine
            .compose(DEPT, &two_page_form(), CompositionMode::Commit)
            .await
            .unwrap()
        else {
            panic!("expected commit");
        };

        let rerendered = engine.render_existing(display.id).await.unwrap();
        assert_eq!(rerendered, document);

        assert_matches!(
            engine.render_existing(999).await,
            Err(CoreError::NotFound { entity: "Display", id: 999 })
        );
    }
}
