use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;

use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

use super::*;

/// In-memory backend that counts calls and can hold list responses back.
#[derive(Default)]
struct FakeBackend {
    notes: Mutex<Vec<Note>>,
    calls: AtomicUsize,
    fail_with: Mutex<Option<ApiError>>,
    pending_lists: Mutex<VecDeque<oneshot::Receiver<Vec<Note>>>>,
    next_id: AtomicU64,
}

impl FakeBackend {
    fn with_notes(notes: Vec<Note>) -> Self {
        let backend = Self::default();
        backend.next_id.store(100, Ordering::SeqCst);
        *backend.notes.lock().unwrap() = notes;
        backend
    }

    fn fail_next(&self, error: ApiError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    /// The next `list_notes` call waits for the returned sender.
    fn hold_next_list(&self) -> oneshot::Sender<Vec<Note>> {
        let (sender, receiver) = oneshot::channel();
        self.pending_lists.lock().unwrap().push_back(receiver);
        sender
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fail_with.lock().unwrap().take().map_or(Ok(()), Err)
    }
}

impl NotesBackend for FakeBackend {
    async fn list_notes(&self) -> ApiResult<Vec<Note>> {
        self.begin()?;
        let pending = self.pending_lists.lock().unwrap().pop_front();
        match pending {
            Some(receiver) => receiver
                .await
                .map_err(|_| ApiError::Network("dropped".to_string())),
            None => Ok(self.notes.lock().unwrap().clone()),
        }
    }

    async fn get_note(&self, id: NoteId) -> ApiResult<Note> {
        self.begin()?;
        self.notes
            .lock()
            .unwrap()
            .iter()
            .find(|note| note.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Backend {
                status: 404,
                message: "Note not found".to_string(),
            })
    }

    async fn create_note(&self, draft: &NoteDraft, images: &[NewImage]) -> ApiResult<Note> {
        self.begin()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let images = images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                Image::new(
                    ImageId::new(i64::try_from(index).unwrap()),
                    format!("http://localhost:8080/image/{}", image.filename),
                )
            })
            .collect();
        Ok(Note {
            id: NoteId::new(i64::try_from(id).unwrap()),
            title: draft.title.clone(),
            content: draft.content.clone(),
            tags: draft.tags.clone(),
            images,
            created_at: None,
        })
    }

    async fn update_note(
        &self,
        note: &Note,
        _removed_images: &[ImageId],
        _new_images: &[NewImage],
    ) -> ApiResult<Note> {
        self.begin()?;
        Ok(note.clone())
    }

    async fn delete_note(&self, _id: NoteId) -> ApiResult<()> {
        self.begin()
    }

    async fn list_images(&self, _note_id: NoteId) -> ApiResult<Vec<Image>> {
        self.begin()?;
        Ok(vec![image(50)])
    }

    async fn add_image(&self, _note_id: NoteId, new_image: &NewImage) -> ApiResult<Image> {
        self.begin()?;
        Ok(Image::new(
            ImageId::new(60),
            format!("http://localhost:8080/image/{}", new_image.filename),
        ))
    }

    async fn delete_image(&self, _image_id: ImageId) -> ApiResult<()> {
        self.begin()
    }
}

fn note(id: i64, title: &str, content: &str) -> Note {
    Note {
        id: NoteId::new(id),
        title: title.to_string(),
        content: content.to_string(),
        tags: vec!["t".to_string()],
        images: vec![image(id * 10)],
        created_at: None,
    }
}

fn image(id: i64) -> Image {
    Image::new(
        ImageId::new(id),
        format!("http://localhost:8080/image/{id}.png"),
    )
}

fn backend_error() -> ApiError {
    ApiError::Backend {
        status: 500,
        message: "Oops!".to_string(),
    }
}

async fn loaded(notes: Vec<Note>) -> NoteListController<FakeBackend> {
    let controller = NoteListController::new(FakeBackend::with_notes(notes));
    controller.load_all().await.unwrap();
    controller
}

#[tokio::test]
async fn load_all_populates_items_and_filtered() {
    let notes = vec![note(1, "X", "Y"), note(2, "A", "B")];
    let controller = NoteListController::new(FakeBackend::with_notes(notes.clone()));

    let outcome = controller.load_all().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Applied(2));
    let state = controller.snapshot();
    assert_eq!(state.items, notes);
    assert_eq!(state.filtered, notes);
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn failed_load_keeps_items_and_sets_error() {
    let controller = loaded(vec![note(1, "X", "Y")]).await;
    controller
        .backend()
        .fail_next(ApiError::Network("connection failed".to_string()));

    assert!(controller.load_all().await.is_err());

    let state = controller.snapshot();
    assert_eq!(state.items.len(), 1);
    assert!(state.error.unwrap().contains("connection failed"));
    assert!(!state.is_loading);
}

#[tokio::test]
async fn late_response_after_unmount_is_ignored() {
    let controller = NoteListController::new(FakeBackend::default());
    let release = controller.backend().hold_next_list();

    let load = controller.load_all();
    let view_closes = async {
        tokio::task::yield_now().await;
        controller.unmount();
        release.send(vec![note(1, "X", "Y")]).unwrap();
    };
    let (outcome, ()) = tokio::join!(load, view_closes);

    assert_eq!(outcome.unwrap(), LoadOutcome::Unmounted);
    let state = controller.snapshot();
    assert!(state.items.is_empty());
    assert!(state.filtered.is_empty());
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn newer_load_wins_over_slower_older_one() {
    let controller = NoteListController::new(FakeBackend::default());
    let release_older = controller.backend().hold_next_list();
    let release_newer = controller.backend().hold_next_list();

    let older = controller.load_all();
    let newer = controller.load_all();
    let responses = async {
        tokio::task::yield_now().await;
        release_newer.send(vec![note(2, "new", "n")]).unwrap();
        tokio::task::yield_now().await;
        release_older.send(vec![note(1, "old", "o")]).unwrap();
    };
    let (older, newer, ()) = tokio::join!(older, newer, responses);

    let mut outcomes = vec![older.unwrap(), newer.unwrap()];
    outcomes.sort_by_key(|outcome| matches!(outcome, LoadOutcome::Applied(_)));
    assert_eq!(outcomes, vec![LoadOutcome::Stale, LoadOutcome::Applied(1)]);

    let state = controller.snapshot();
    assert_eq!(state.items, vec![note(2, "new", "n")]);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn create_with_empty_title_makes_no_backend_call() {
    let controller = NoteListController::new(FakeBackend::default());

    let error = controller
        .create(NoteDraft::new("  ", "body"), Vec::new())
        .await
        .unwrap_err();

    let ApiError::Validation(errors) = error else {
        panic!("expected validation error, got {error:?}");
    };
    assert!(errors.field("title").is_some());
    assert_eq!(controller.backend().calls(), 0);
    assert_eq!(controller.snapshot().error, None);
}

#[tokio::test]
async fn create_appends_server_copy_and_refilters() {
    let controller = loaded(vec![note(1, "Groceries", "milk")]).await;
    controller.apply_filter("travel");

    let created = controller
        .create(
            NoteDraft::new("Travel plan", "Lisbon").with_tags(["trips"]),
            vec![NewImage::new("map.png", vec![1, 2])],
        )
        .await
        .unwrap();

    assert_eq!(created.id, NoteId::new(100));
    assert_eq!(created.images[0].filename, "map.png");
    let state = controller.snapshot();
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.items[1], created);
    assert_eq!(state.filtered, vec![created]);
}

#[tokio::test]
async fn failed_create_leaves_collection_untouched() {
    let controller = loaded(vec![note(1, "X", "Y")]).await;
    controller.backend().fail_next(backend_error());

    assert!(controller
        .create(NoteDraft::new("a", "b"), Vec::new())
        .await
        .is_err());

    let state = controller.snapshot();
    assert_eq!(state.items, vec![note(1, "X", "Y")]);
    assert_eq!(state.error.as_deref(), Some("Oops!"));
}

#[tokio::test]
async fn update_replaces_only_the_title_in_place() {
    let controller = loaded(vec![note(1, "Old", "keep"), note(2, "Other", "z")]).await;

    let updated = controller
        .update(NoteId::new(1), NotePatch::title("New"), None)
        .await
        .unwrap();

    let mut expected = note(1, "Old", "keep");
    expected.title = "New".to_string();
    assert_eq!(updated, expected);
    let state = controller.snapshot();
    assert_eq!(state.items, vec![expected, note(2, "Other", "z")]);
}

#[tokio::test]
async fn update_fetches_notes_that_are_not_loaded() {
    let controller = NoteListController::new(FakeBackend::with_notes(vec![note(7, "t", "c")]));

    let updated = controller
        .update(NoteId::new(7), NotePatch::title("fresh"), None)
        .await
        .unwrap();

    assert_eq!(updated.content, "c");
    assert_eq!(controller.backend().calls(), 2);
    assert!(controller.snapshot().items.is_empty());
}

#[tokio::test]
async fn update_after_open_fetches_the_note_once() {
    let controller = NoteListController::new(FakeBackend::with_notes(vec![note(7, "t", "c")]));

    let opened = controller.open(NoteId::new(7)).await.unwrap();
    assert_eq!(opened.content, "c");
    let updated = controller
        .update(
            NoteId::new(7),
            NotePatch {
                content: Some("edited".to_string()),
                ..NotePatch::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(updated.content, "edited");
    assert_eq!(controller.backend().calls(), 2);
    assert_eq!(controller.snapshot().items, vec![updated]);
}

#[tokio::test]
async fn open_replaces_a_stale_local_copy() {
    let controller = loaded(vec![note(1, "t", "c")]).await;
    controller.backend().notes.lock().unwrap()[0].content = "newer".to_string();

    controller.open(NoteId::new(1)).await.unwrap();

    assert_eq!(controller.snapshot().items, vec![note(1, "t", "newer")]);
}

#[tokio::test]
async fn update_rejects_blanked_content_before_sending() {
    let controller = loaded(vec![note(1, "t", "c")]).await;
    let calls = controller.backend().calls();

    let patch = NotePatch {
        content: Some(" ".to_string()),
        ..NotePatch::default()
    };
    assert!(matches!(
        controller.update(NoteId::new(1), patch, None).await,
        Err(ApiError::Validation(_))
    ));
    assert_eq!(controller.backend().calls(), calls);
}

#[tokio::test]
async fn remove_drops_exactly_one_note() {
    let controller = loaded(vec![note(1, "a", "b"), note(2, "c", "d")]).await;

    controller.remove(NoteId::new(1)).await.unwrap();

    let state = controller.snapshot();
    assert_eq!(state.items, vec![note(2, "c", "d")]);
    assert_eq!(state.filtered, vec![note(2, "c", "d")]);
}

#[tokio::test]
async fn failed_remove_keeps_items_and_sets_error() {
    let controller = loaded(vec![note(1, "a", "b"), note(2, "c", "d")]).await;
    controller.backend().fail_next(backend_error());

    assert!(controller.remove(NoteId::new(1)).await.is_err());

    let state = controller.snapshot();
    assert_eq!(state.items.len(), 2);
    assert_eq!(state.filtered.len(), 2);
    assert_eq!(state.error.as_deref(), Some("Oops!"));
}

#[tokio::test]
async fn empty_filter_shows_every_item() {
    let controller = loaded(vec![note(1, "a", "b"), note(2, "c", "d")]).await;

    assert_eq!(controller.apply_filter("c"), 1);
    assert_eq!(controller.apply_filter(""), 2);

    let state = controller.snapshot();
    assert_eq!(state.filtered, state.items);
}

#[tokio::test]
async fn remove_image_only_touches_its_note() {
    let controller = loaded(vec![note(1, "a", "b"), note(2, "c", "d")]).await;

    controller
        .remove_image(NoteId::new(1), ImageId::new(10))
        .await
        .unwrap();

    let state = controller.snapshot();
    assert!(state.items[0].images.is_empty());
    assert_eq!(state.items[1].images, vec![image(20)]);
}

#[tokio::test]
async fn image_additions_and_refresh_update_the_note() {
    let controller = loaded(vec![note(1, "a", "b")]).await;

    let uploaded = controller
        .add_image(NoteId::new(1), NewImage::new("cat.jpg", vec![9]))
        .await
        .unwrap();
    assert_eq!(controller.snapshot().items[0].images.last(), Some(&uploaded));

    controller.refresh_images(NoteId::new(1)).await.unwrap();
    assert_eq!(controller.snapshot().items[0].images, vec![image(50)]);
}

#[tokio::test]
async fn mutations_after_unmount_return_but_do_not_apply() {
    let controller = loaded(vec![note(1, "a", "b")]).await;
    controller.unmount();

    controller.remove(NoteId::new(1)).await.unwrap();
    assert_eq!(controller.snapshot().items.len(), 1);
    assert_eq!(
        controller.load_all().await.unwrap(),
        LoadOutcome::Unmounted
    );
}
