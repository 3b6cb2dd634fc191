//! Model import pipeline.
//!
//! Upload-shaped work never runs on the event loop: file reads and decodes
//! happen on spawned worker threads, and finished results come back over an
//! mpsc queue that the event loop drains once per frame. Each completed
//! import is applied to the scene registry in a single call (arena insert +
//! draggable append), so a failed or in-flight import can never leave a
//! half-inserted model behind. Overlapping imports resolve independently and
//! may complete in either order.

pub mod gltf_decoder;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::error::{Result, ViewerError};
use crate::gfx::scene::{Mesh, ModelId, Object, SceneRegistry};

pub use gltf_decoder::GltfDecoder;

/// One decoded triangle mesh; `normals` may be empty when the source file
/// carried none.
pub struct DecodedMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

/// Decoder output: a named group of meshes ready to become an [`Object`].
pub struct DecodedModel {
    pub name: String,
    pub meshes: Vec<DecodedMesh>,
}

/// Binary model decoding capability.
pub trait ModelDecoder: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<DecodedModel>;
}

/// Everything one drain pass produced: models that joined the scene and
/// errors to surface.
#[derive(Default)]
pub struct DrainOutcome {
    pub added: Vec<ModelId>,
    pub errors: Vec<ViewerError>,
}

/// Accepts import requests and applies completed decodes to the registry.
pub struct ImportPipeline {
    decoder: Arc<dyn ModelDecoder>,
    tx: Sender<Result<DecodedModel>>,
    rx: Receiver<Result<DecodedModel>>,
    in_flight: usize,
}

impl ImportPipeline {
    pub fn new(decoder: Arc<dyn ModelDecoder>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            decoder,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Imports already-loaded file bytes. Returns immediately; the result
    /// arrives through [`ImportPipeline::drain_completed`].
    pub fn import_bytes(&mut self, bytes: Vec<u8>) {
        let decoder = self.decoder.clone();
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let _ = tx.send(decoder.parse(&bytes));
        });
    }

    /// Imports a file by path; the read happens on the worker too, so a slow
    /// disk never stalls a frame.
    pub fn import_file(&mut self, path: PathBuf) {
        let decoder = self.decoder.clone();
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let outcome = std::fs::read(&path)
                .map_err(|err| {
                    ViewerError::Decode(format!("could not read {}: {err}", path.display()))
                })
                .and_then(|bytes| decoder.parse(&bytes));
            let _ = tx.send(outcome);
        });
    }

    /// Number of imports started but not yet drained.
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// Applies every import that finished since the last call.
    ///
    /// Runs on the event loop; because this is the only place results leave
    /// the queue, registry mutation is serialized no matter how many workers
    /// finish simultaneously.
    pub fn drain_completed(&mut self, registry: &mut SceneRegistry) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();
        loop {
            match self.rx.try_recv() {
                Ok(Ok(model)) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    let name = registry.ensure_unique_name(&model.name);
                    let object = build_object(name.clone(), model);
                    let id = registry.add_model(object);
                    log::info!("imported `{name}`");
                    outcome.added.push(id);
                }
                Ok(Err(err)) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    log::warn!("import failed: {err}");
                    outcome.errors.push(err);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        outcome
    }
}

/// Turns a decoded model into a scene object, deriving normals for meshes
/// that shipped without them.
fn build_object(name: String, model: DecodedModel) -> Object {
    let meshes = model
        .meshes
        .into_iter()
        .map(|mesh| {
            let normals = if mesh.normals.len() == mesh.positions.len() {
                mesh.normals
            } else {
                Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
            };
            Mesh::new(mesh.positions, normals, mesh.indices)
        })
        .collect();
    Object::new(name, meshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Decoder that fails on empty input and otherwise produces a triangle.
    struct MockDecoder;

    impl ModelDecoder for MockDecoder {
        fn parse(&self, bytes: &[u8]) -> Result<DecodedModel> {
            if bytes.is_empty() {
                return Err(ViewerError::Decode("empty file".into()));
            }
            Ok(DecodedModel {
                name: "mock".into(),
                meshes: vec![DecodedMesh {
                    positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
                    normals: Vec::new(),
                    indices: vec![0, 1, 2],
                }],
            })
        }
    }

    fn drain_until_settled(
        pipeline: &mut ImportPipeline,
        registry: &mut SceneRegistry,
    ) -> DrainOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut total = DrainOutcome::default();
        while pipeline.pending() > 0 {
            assert!(Instant::now() < deadline, "imports never settled");
            let pass = pipeline.drain_completed(registry);
            total.added.extend(pass.added);
            total.errors.extend(pass.errors);
            thread::sleep(Duration::from_millis(1));
        }
        total
    }

    #[test]
    fn test_successful_import_joins_graph_and_draggable_set() {
        let mut pipeline = ImportPipeline::new(Arc::new(MockDecoder));
        let mut registry = SceneRegistry::new();

        pipeline.import_bytes(vec![1, 2, 3]);
        let outcome = drain_until_settled(&mut pipeline, &mut registry);

        assert_eq!(outcome.added.len(), 1);
        assert!(outcome.errors.is_empty());
        let id = outcome.added[0];
        assert!(registry.contains(id));
        assert!(registry.current_draggables().contains(&id));
    }

    #[test]
    fn test_failed_decode_leaves_scene_unchanged() {
        let mut pipeline = ImportPipeline::new(Arc::new(MockDecoder));
        let mut registry = SceneRegistry::new();

        pipeline.import_bytes(Vec::new());
        let outcome = drain_until_settled(&mut pipeline, &mut registry);

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], ViewerError::Decode(_)));
        assert!(registry.is_empty());
        assert!(registry.current_draggables().is_empty());
    }

    #[test]
    fn test_overlapping_imports_resolve_independently() {
        let mut pipeline = ImportPipeline::new(Arc::new(MockDecoder));
        let mut registry = SceneRegistry::new();

        // First import fails to decode, second succeeds; both were started
        // before either completed.
        pipeline.import_bytes(Vec::new());
        pipeline.import_bytes(vec![7]);
        assert_eq!(pipeline.pending(), 2);

        let outcome = drain_until_settled(&mut pipeline, &mut registry);
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.current_draggables().len(), 1);
    }

    #[test]
    fn test_duplicate_names_are_uniqued_on_apply() {
        let mut pipeline = ImportPipeline::new(Arc::new(MockDecoder));
        let mut registry = SceneRegistry::new();

        pipeline.import_bytes(vec![1]);
        pipeline.import_bytes(vec![2]);
        let outcome = drain_until_settled(&mut pipeline, &mut registry);

        assert_eq!(outcome.added.len(), 2);
        let mut names: Vec<String> = outcome
            .added
            .iter()
            .map(|&id| registry.object(id).unwrap().name.clone())
            .collect();
        names.sort();
        assert_eq!(names, vec!["mock".to_string(), "mock (1)".to_string()]);
    }

    #[test]
    fn test_missing_file_surfaces_a_decode_error() {
        let mut pipeline = ImportPipeline::new(Arc::new(MockDecoder));
        let mut registry = SceneRegistry::new();

        pipeline.import_file(PathBuf::from("/nonexistent/model.glb"));
        let outcome = drain_until_settled(&mut pipeline, &mut registry);

        assert_eq!(outcome.errors.len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_normals_are_derived_when_absent() {
        let mut pipeline = ImportPipeline::new(Arc::new(MockDecoder));
        let mut registry = SceneRegistry::new();

        pipeline.import_bytes(vec![1]);
        let outcome = drain_until_settled(&mut pipeline, &mut registry);
        let object = registry.object(outcome.added[0]).unwrap();
        let normal = object.meshes[0].vertices()[0].normal;
        let length =
            (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        assert!((length - 1.0).abs() < 1e-5);
    }
}
