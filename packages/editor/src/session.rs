//! # Edit Session
//!
//! One editing session's worth of shared coordination state, explicitly
//! constructed and explicitly torn down. The session owns the entity
//! document, the handler tree, the slot binding, the undo/redo history, and
//! the validation scheduler, and choreographs them: every mutation applies to
//! the entity, then the tree, then the views, and only afterwards does the
//! session drain the document's change queue into history recording and
//! validation scheduling.
//!
//! All of this runs on the host's single UI loop. Time-dependent entry
//! points take the host's clock in milliseconds, so the debounce behavior is
//! deterministic under test.

use crate::binding::SlotBinding;
use crate::errors::EditorError;
use crate::handlers::{build_tree, AttributeHandler, HandlerTree, SlotControls};
use crate::history::{History, HistoryStep};
use crate::mutations::{EditContext, IdMint, Mutation};
use crate::reorder::ReorderMove;
use crate::service::{
    AttributeConfig, ContentDefinition, ContentService, SerializedEntity,
};
use crate::validation::{route_report, ValidationReport, ValidationRequest, ValidationScheduler};
use facet_model::{AttributePath, ChangeKind, Entity, EntityDocument, Schema};
use tracing::debug;

pub struct EditorSession {
    document: EntityDocument,
    schema: Schema,
    config: AttributeConfig,
    locale: String,
    tree: HandlerTree,
    binding: Box<dyn SlotBinding>,
    history: History,
    scheduler: ValidationScheduler,
    ids: IdMint,
    closed: bool,
}

impl EditorSession {
    /// Begin editing a loaded content definition. Builds the handler tree,
    /// seeds the undo history with the initial snapshot, and asks the binding
    /// for the initial render.
    pub fn open(
        definition: ContentDefinition,
        mut binding: Box<dyn SlotBinding>,
    ) -> Result<Self, EditorError> {
        let ContentDefinition {
            entity,
            schema,
            config,
            locale,
        } = definition;

        let tree = build_tree(&entity, &schema)?;
        let snapshot = entity.to_snapshot()?;
        let scheduler = ValidationScheduler::new(config.debounce_ms);
        let ids = IdMint::new(entity.id.clone());
        binding.render_all(&entity);

        Ok(Self {
            document: EntityDocument::new(entity),
            schema,
            config,
            locale,
            tree,
            binding,
            history: History::seed(snapshot),
            scheduler,
            ids,
            closed: false,
        })
    }

    pub fn entity(&self) -> &Entity {
        self.document.root()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn handler(&self, path: &AttributePath) -> Option<&AttributeHandler> {
        self.tree.resolve(path)
    }

    /// Button visibility for the slot addressed by `path`.
    pub fn controls(&self, path: &AttributePath) -> Option<SlotControls> {
        let handler = self.tree.resolve(path)?;
        let owner = self.document.root().entity_at(path.parent().segments())?;
        Some(handler.controls(owner))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), EditorError> {
        if self.closed {
            return Err(EditorError::SessionClosed);
        }
        Ok(())
    }

    /// Apply one mutation. Completes synchronously across entity, tree, and
    /// views before recording history and arming the validation debounce.
    pub fn apply(&mut self, mutation: Mutation, now_ms: u64) -> Result<(), EditorError> {
        self.ensure_open()?;
        {
            let mut ctx = EditContext {
                document: &mut self.document,
                schema: &self.schema,
                config: &self.config,
                tree: &mut self.tree,
                binding: self.binding.as_mut(),
                ids: &mut self.ids,
            };
            mutation.apply(&mut ctx)?;
        }
        self.after_change(now_ms)
    }

    /// Feed a completed drag gesture into the move operation.
    pub fn apply_reorder(&mut self, mv: ReorderMove, now_ms: u64) -> Result<(), EditorError> {
        self.apply(
            Mutation::Move {
                path: mv.attribute,
                from: mv.from,
                to: mv.to,
            },
            now_ms,
        )
    }

    fn after_change(&mut self, now_ms: u64) -> Result<(), EditorError> {
        let changes = self.document.take_changes();
        let Some(last) = changes.into_iter().last() else {
            return Ok(());
        };
        let snapshot = self.document.snapshot()?;
        if self.history.record(snapshot, last.path.clone(), last.kind) {
            debug!(path = %last.path, kind = ?last.kind, "recorded history state");
        }
        self.scheduler.note_change(now_ms);
        Ok(())
    }

    /// Step the history back one state. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self, now_ms: u64) -> Result<bool, EditorError> {
        self.ensure_open()?;
        let Some(step) = self.history.undo() else {
            return Ok(false);
        };
        self.reconcile(step)?;
        self.scheduler.note_change(now_ms);
        Ok(true)
    }

    /// Step the history forward again after an undo.
    pub fn redo(&mut self, now_ms: u64) -> Result<bool, EditorError> {
        self.ensure_open()?;
        let Some(step) = self.history.redo() else {
            return Ok(false);
        };
        self.reconcile(step)?;
        self.scheduler.note_change(now_ms);
        Ok(true)
    }

    /// Bring the live entity and view tree in line with a restored snapshot.
    /// A value-kind change whose handler and index still resolve gets a
    /// targeted in-place update; everything else rebuilds the form.
    fn reconcile(&mut self, step: HistoryStep) -> Result<(), EditorError> {
        let restored = Entity::from_snapshot(&step.snapshot)?;

        if step.change.kind == Some(ChangeKind::Value) {
            if let Some(seg) = step.change.path.last() {
                let event_path = step.change.path.parent().child(&seg.name, 0);
                let index = seg.index;
                let resolvable = self.tree.resolve(&event_path).is_some();
                let live = self.document.root().value_at(&step.change.path).is_some();
                let text = restored
                    .value_at(&step.change.path)
                    .and_then(|v| v.as_text())
                    .map(str::to_string);
                if resolvable && live {
                    if let Some(text) = text {
                        self.document.set_text(&step.change.path, &text)?;
                        // Reconciliation is not a fresh edit.
                        let _ = self.document.take_changes();
                        self.binding.value_changed(&event_path, index, &text);
                        return Ok(());
                    }
                }
            }
        }

        self.tree = build_tree(&restored, &self.schema)?;
        self.document.replace_root(restored);
        self.binding.render_all(self.document.root());
        Ok(())
    }

    fn serialized(&self) -> Result<SerializedEntity, EditorError> {
        Ok(SerializedEntity {
            id: self.document.entity_id().to_string(),
            body: self.document.snapshot()?,
        })
    }

    /// Pump the validation debounce. Returns the payload for a round-trip
    /// once the delay elapsed and no call is outstanding; the caller performs
    /// the call and reports back through [`EditorSession::apply_validation`].
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<ValidationRequest>, EditorError> {
        if self.closed || !self.scheduler.begin(now_ms) {
            return Ok(None);
        }
        Ok(Some(ValidationRequest {
            entities: vec![self.serialized()?],
        }))
    }

    /// Route a validation response to the owning slots. A response arriving
    /// after [`EditorSession::close`] is dropped.
    pub fn apply_validation(&mut self, report: &ValidationReport) {
        if self.closed {
            return;
        }
        self.scheduler.complete();
        route_report(
            report,
            self.document.entity_id(),
            &self.tree,
            self.binding.as_mut(),
        );
    }

    /// Convenience pump for hosts with a synchronous service handle: claims
    /// the round-trip, performs it, and routes the response. Transport
    /// failures are returned to the caller; retrying is their concern.
    pub fn run_validation(
        &mut self,
        service: &mut dyn ContentService,
        now_ms: u64,
    ) -> Result<bool, EditorError> {
        let Some(request) = self.tick(now_ms)? else {
            return Ok(false);
        };
        match service.validate(&request.entities) {
            Ok(report) => {
                self.apply_validation(&report);
                Ok(true)
            }
            Err(err) => {
                self.scheduler.complete();
                Err(err.into())
            }
        }
    }

    /// Save through the service. The returned report (empty on success) is
    /// also routed to the slots.
    pub fn save(&mut self, service: &mut dyn ContentService) -> Result<ValidationReport, EditorError> {
        self.ensure_open()?;
        let payload = vec![self.serialized()?];
        let report = service.save(&payload)?;
        route_report(
            &report,
            self.document.entity_id(),
            &self.tree,
            self.binding.as_mut(),
        );
        Ok(report)
    }

    /// End the session: disarm the validation timer and reject further
    /// mutations. Dropping the session releases everything else.
    pub fn close(&mut self) {
        self.scheduler.cancel();
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::RecordingBinding;
    use facet_model::{AttributeDecl, TypeDef, Value};

    fn definition() -> ContentDefinition {
        let schema = Schema::new().with_type(
            TypeDef::new("article").with_attribute("title", AttributeDecl::simple(1, Some(1))),
        );
        ContentDefinition {
            entity: Entity::new("e1", "article").with_value("title", Value::Text("Hello".into())),
            schema,
            config: AttributeConfig::default(),
            locale: "en".to_string(),
        }
    }

    #[test]
    fn test_open_seeds_history_and_renders() {
        let session = EditorSession::open(definition(), Box::new(RecordingBinding::new())).unwrap();
        assert!(!session.can_undo());
        assert!(!session.can_redo());
        assert_eq!(session.locale(), "en");
    }

    #[test]
    fn test_closed_session_rejects_mutations() {
        let mut session =
            EditorSession::open(definition(), Box::new(RecordingBinding::new())).unwrap();
        session.close();
        assert!(session.is_closed());

        let result = session.apply(
            Mutation::ChangeValue {
                path: AttributePath::decode("title"),
                text: "x".to_string(),
            },
            0,
        );
        assert!(matches!(result, Err(EditorError::SessionClosed)));
    }

    #[test]
    fn test_closed_session_drops_late_validation_response() {
        let binding = RecordingBinding::new();
        let mut session =
            EditorSession::open(definition(), Box::new(binding.clone())).unwrap();
        binding.take();
        session.close();

        let mut report = ValidationReport::new();
        report.add_issue("e1", "title", "required");
        session.apply_validation(&report);
        assert!(binding.events().is_empty());
    }

    #[test]
    fn test_controls_reflect_entity_state() {
        let session = EditorSession::open(definition(), Box::new(RecordingBinding::new())).unwrap();
        let controls = session.controls(&AttributePath::decode("title")).unwrap();
        // fixed single occurrence: nothing to add, remove, or sort
        assert!(!controls.may_add);
        assert!(!controls.may_remove);
        assert!(!controls.may_sort);
    }
}
